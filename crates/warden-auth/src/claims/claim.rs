//! Individual claims and their validation rules.

use serde_json::Value;
use time::OffsetDateTime;

use super::value::{ClaimMap, ClaimValue};
use crate::error::AuthError;
use crate::AuthResult;

/// Returns the current time in unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Well-known claim types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimKind {
    /// `sub`: subject identifier.
    Subject,
    /// `iss`: issuer.
    Issuer,
    /// `jti`: unique token id.
    JwtId,
    /// `iat`: issued-at timestamp.
    IssuedAt,
    /// `nbf`: not-before timestamp.
    NotBefore,
    /// `exp`: expiry timestamp.
    Expiration,
    /// Any caller-defined claim.
    Custom,
}

impl ClaimKind {
    /// Resolves the kind for a claim name. Unknown names are `Custom`.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        match name {
            "sub" => Self::Subject,
            "iss" => Self::Issuer,
            "jti" => Self::JwtId,
            "iat" => Self::IssuedAt,
            "nbf" => Self::NotBefore,
            "exp" => Self::Expiration,
            _ => Self::Custom,
        }
    }

    /// Registered claim name, `None` for custom claims.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Subject => Some("sub"),
            Self::Issuer => Some("iss"),
            Self::JwtId => Some("jti"),
            Self::IssuedAt => Some("iat"),
            Self::NotBefore => Some("nbf"),
            Self::Expiration => Some("exp"),
            Self::Custom => None,
        }
    }

    /// Returns `true` for claims holding a unix timestamp.
    #[must_use]
    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::IssuedAt | Self::NotBefore | Self::Expiration)
    }
}

/// Clock used when a claim value is validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimContext {
    /// Current time in unix seconds.
    pub now: i64,
    /// Tolerated clock skew in seconds.
    pub leeway: i64,
}

impl ClaimContext {
    /// Context pinned to the current wall clock, without leeway.
    #[must_use]
    pub fn now() -> Self {
        Self::at(unix_now())
    }

    /// Context pinned to an explicit instant.
    #[must_use]
    pub fn at(now: i64) -> Self {
        Self { now, leeway: 0 }
    }

    /// Sets the tolerated clock skew.
    #[must_use]
    pub fn with_leeway(mut self, leeway: i64) -> Self {
        self.leeway = leeway;
        self
    }

    fn horizon(&self) -> i64 {
        self.now.saturating_add(self.leeway)
    }
}

/// A single named, validated claim.
///
/// A claim only ever holds a value that passed its kind's rule:
/// construction and [`Claim::set_value`] fail without side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    kind: ClaimKind,
    name: String,
    value: ClaimValue,
}

impl Claim {
    /// Builds a claim of the kind registered for `name`, validating the value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` if the value breaks the kind's rule.
    pub fn with_context(
        name: impl Into<String>,
        value: impl Into<ClaimValue>,
        ctx: &ClaimContext,
    ) -> AuthResult<Self> {
        let name = name.into();
        let kind = ClaimKind::for_name(&name);
        let value = validate_value(kind, &name, value.into(), ctx)?;
        Ok(Self { kind, name, value })
    }

    /// `sub` claim.
    #[must_use]
    pub fn subject(value: impl Into<ClaimValue>) -> Self {
        Self::unchecked(ClaimKind::Subject, value.into())
    }

    /// `iss` claim.
    #[must_use]
    pub fn issuer(value: impl Into<ClaimValue>) -> Self {
        Self::unchecked(ClaimKind::Issuer, value.into())
    }

    /// `jti` claim.
    #[must_use]
    pub fn jwt_id(value: impl Into<ClaimValue>) -> Self {
        Self::unchecked(ClaimKind::JwtId, value.into())
    }

    /// `iat` claim. Must be numeric and not in the future.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` on a non-numeric or future value.
    pub fn issued_at(value: impl Into<ClaimValue>, ctx: &ClaimContext) -> AuthResult<Self> {
        Self::with_context("iat", value, ctx)
    }

    /// `nbf` claim. Must be numeric and not in the future.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` on a non-numeric or future value.
    pub fn not_before(value: impl Into<ClaimValue>, ctx: &ClaimContext) -> AuthResult<Self> {
        Self::with_context("nbf", value, ctx)
    }

    /// `exp` claim. Must be numeric.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` on a non-numeric value.
    pub fn expiration(value: impl Into<ClaimValue>) -> AuthResult<Self> {
        Self::with_context("exp", value, &ClaimContext::now())
    }

    /// Caller-defined claim. Any value is accepted.
    #[must_use]
    pub fn custom(name: impl Into<String>, value: impl Into<ClaimValue>) -> Self {
        Self {
            kind: ClaimKind::Custom,
            name: name.into(),
            value: value.into(),
        }
    }

    fn unchecked(kind: ClaimKind, value: ClaimValue) -> Self {
        Self {
            kind,
            name: kind.name().unwrap_or_default().to_string(),
            value,
        }
    }

    pub fn kind(&self) -> ClaimKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ClaimValue {
        &self.value
    }

    /// Timestamp carried by the claim, if the value is numeric.
    pub fn timestamp(&self) -> Option<i64> {
        self.value.as_timestamp()
    }

    /// Replaces the value after validating it. On failure the old value is kept.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` if the value breaks the kind's rule.
    pub fn set_value(&mut self, value: impl Into<ClaimValue>, ctx: &ClaimContext) -> AuthResult<()> {
        self.value = validate_value(self.kind, &self.name, value.into(), ctx)?;
        Ok(())
    }

    /// Single-entry `{name: value}` map.
    #[must_use]
    pub fn to_map(&self) -> ClaimMap {
        let mut map = ClaimMap::new();
        map.insert(self.name.clone(), self.to_json());
        map
    }

    pub fn to_json(&self) -> Value {
        self.value.to_json()
    }

    /// Temporal check applied when a payload is validated in normal mode.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if `nbf` or `iat` lies in the future
    /// - `AuthError::TokenExpired` if `exp` lies in the past
    pub fn validate_payload(&self, now: i64, leeway: i64) -> AuthResult<()> {
        let Some(ts) = self.timestamp() else {
            return Ok(());
        };

        match self.kind {
            ClaimKind::NotBefore if ts > now.saturating_add(leeway) => Err(
                AuthError::token_invalid("Not Before (nbf) timestamp cannot be in the future"),
            ),
            ClaimKind::IssuedAt if ts > now.saturating_add(leeway) => Err(
                AuthError::token_invalid("Issued At (iat) timestamp cannot be in the future"),
            ),
            ClaimKind::Expiration if ts.saturating_add(leeway) < now => {
                Err(AuthError::TokenExpired)
            }
            _ => Ok(()),
        }
    }

    /// Refresh-window check applied in refresh mode. Only `iat` participates.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` once `iat + refresh_ttl` has passed.
    pub fn validate_refresh(&self, now: i64, refresh_ttl: i64) -> AuthResult<()> {
        if self.kind != ClaimKind::IssuedAt {
            return Ok(());
        }
        let Some(iat) = self.timestamp() else {
            return Ok(());
        };

        let deadline = iat
            .checked_add(refresh_ttl)
            .ok_or_else(|| AuthError::token_invalid("refresh window overflows"))?;
        if deadline < now {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }
}

fn validate_value(
    kind: ClaimKind,
    name: &str,
    value: ClaimValue,
    ctx: &ClaimContext,
) -> AuthResult<ClaimValue> {
    if !kind.is_datetime() {
        return Ok(value);
    }

    let ts = value
        .as_timestamp()
        .ok_or_else(|| AuthError::invalid_claim(name, "expected a unix timestamp"))?;

    if matches!(kind, ClaimKind::IssuedAt | ClaimKind::NotBefore) && ts > ctx.horizon() {
        return Err(AuthError::invalid_claim(name, "timestamp cannot be in the future"));
    }

    Ok(ClaimValue::Integer(ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const T: i64 = 1_700_000_000;

    #[test]
    fn test_kind_for_name() {
        assert_eq!(ClaimKind::for_name("nbf"), ClaimKind::NotBefore);
        assert_eq!(ClaimKind::for_name("role"), ClaimKind::Custom);
        assert_eq!(ClaimKind::Expiration.name(), Some("exp"));
        assert!(ClaimKind::IssuedAt.is_datetime());
        assert!(!ClaimKind::Subject.is_datetime());
    }

    #[test]
    fn test_not_before_rejects_future() {
        let ctx = ClaimContext::at(T);
        let err = Claim::not_before(T + 3600, &ctx).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaim { ref claim, .. } if claim == "nbf"));

        let claim = Claim::not_before(T, &ctx).unwrap();
        assert_eq!(claim.timestamp(), Some(T));
    }

    #[test]
    fn test_issued_at_rejects_future() {
        let ctx = ClaimContext::at(T);
        assert!(Claim::issued_at(T + 1, &ctx).is_err());
        assert!(Claim::issued_at(T - 1, &ctx).is_ok());
    }

    #[test]
    fn test_leeway_allows_small_skew() {
        let ctx = ClaimContext::at(T).with_leeway(30);
        assert!(Claim::not_before(T + 30, &ctx).is_ok());
        assert!(Claim::not_before(T + 31, &ctx).is_err());
    }

    #[test]
    fn test_datetime_rejects_non_numeric() {
        let ctx = ClaimContext::at(T);
        for name in ["iat", "nbf", "exp"] {
            let err = Claim::with_context(name, "foo", &ctx).unwrap_err();
            assert!(matches!(err, AuthError::InvalidClaim { .. }), "{name}");
        }
        assert!(Claim::with_context("exp", json!({"a": 1}), &ctx).is_err());
    }

    #[test]
    fn test_numeric_string_normalized() {
        let claim = Claim::expiration(T.to_string()).unwrap();
        assert_eq!(claim.value(), &ClaimValue::Integer(T));
    }

    #[test]
    fn test_expiration_accepts_past() {
        assert!(Claim::expiration(T - 3600).is_ok());
    }

    #[test]
    fn test_set_value_is_atomic() {
        let ctx = ClaimContext::at(T);
        let mut claim = Claim::not_before(T - 10, &ctx).unwrap();

        assert!(claim.set_value(T + 3600, &ctx).is_err());
        assert_eq!(claim.timestamp(), Some(T - 10));

        claim.set_value(T, &ctx).unwrap();
        assert_eq!(claim.timestamp(), Some(T));
    }

    #[test]
    fn test_custom_accepts_anything() {
        let claim = Claim::custom("roles", json!(["admin", "editor"]));
        assert_eq!(claim.kind(), ClaimKind::Custom);
        assert_eq!(claim.to_map(), json!({"roles": ["admin", "editor"]}).as_object().cloned().unwrap());
    }

    #[test]
    fn test_with_context_dispatches_by_name() {
        let claim = Claim::with_context("sub", 1, &ClaimContext::at(T)).unwrap();
        assert_eq!(claim.kind(), ClaimKind::Subject);
        assert_eq!(claim, Claim::subject(1));
    }

    #[test]
    fn test_validate_payload() {
        let ctx = ClaimContext::at(T);
        let nbf = Claim::not_before(T, &ctx).unwrap();
        assert!(nbf.validate_payload(T, 0).is_ok());
        assert!(matches!(
            nbf.validate_payload(T - 1, 0),
            Err(AuthError::TokenInvalid { .. })
        ));

        let exp = Claim::expiration(T).unwrap();
        assert!(exp.validate_payload(T, 0).is_ok());
        assert!(matches!(exp.validate_payload(T + 1, 0), Err(AuthError::TokenExpired)));
        assert!(exp.validate_payload(T + 1, 5).is_ok());

        assert!(Claim::subject("x").validate_payload(T, 0).is_ok());
    }

    #[test]
    fn test_validate_refresh() {
        let iat = Claim::issued_at(T, &ClaimContext::at(T)).unwrap();
        assert!(iat.validate_refresh(T + 60, 60).is_ok());
        assert!(matches!(iat.validate_refresh(T + 61, 60), Err(AuthError::TokenExpired)));

        let exp = Claim::expiration(T - 1000).unwrap();
        assert!(exp.validate_refresh(T, 60).is_ok());
    }
}
