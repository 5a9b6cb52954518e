//! Validated, immutable token payloads.

use serde::{Serialize, Serializer};

use crate::claims::{Claim, ClaimMap, ClaimSet, ClaimValue, unix_now};
use crate::validator::{PayloadValidator, ValidationMode};
use crate::AuthResult;

/// The complete, validated set of claims for one token.
///
/// A `Payload` can only be obtained through validation and is never
/// mutated afterwards. The validation mode is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    claims: ClaimSet,
}

impl Payload {
    /// Validates `claims` and wraps them.
    ///
    /// # Errors
    ///
    /// Whatever [`PayloadValidator::check`] reports.
    pub fn new(claims: ClaimSet, validator: &PayloadValidator, mode: ValidationMode) -> AuthResult<Self> {
        Self::new_at(claims, validator, mode, unix_now())
    }

    /// [`Payload::new`] validated as of `now`.
    ///
    /// # Errors
    ///
    /// Whatever [`PayloadValidator::check_at`] reports.
    pub fn new_at(
        claims: ClaimSet,
        validator: &PayloadValidator,
        mode: ValidationMode,
        now: i64,
    ) -> AuthResult<Self> {
        let claims = validator.check_at(claims, mode, now)?;
        Ok(Self { claims })
    }

    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Claim> {
        self.claims.get(name)
    }

    /// Value of the named claim.
    pub fn get(&self, name: &str) -> Option<&ClaimValue> {
        self.claims.get_value(name)
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.claims.contains(name)
    }

    /// Returns `true` if every `(name, value)` pair is present with an equal value.
    pub fn matches<V>(&self, expected: &[(&str, V)]) -> bool
    where
        V: Clone + Into<ClaimValue>,
    {
        expected
            .iter()
            .all(|(name, value)| self.get(name) == Some(&value.clone().into()))
    }

    pub fn subject(&self) -> Option<&ClaimValue> {
        self.get("sub")
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(ClaimValue::as_str)
    }

    pub fn jwt_id(&self) -> Option<&str> {
        self.get("jti").and_then(ClaimValue::as_str)
    }

    pub fn expiration(&self) -> Option<i64> {
        self.timestamp("exp")
    }

    pub fn issued_at(&self) -> Option<i64> {
        self.timestamp("iat")
    }

    pub fn not_before(&self) -> Option<i64> {
        self.timestamp("nbf")
    }

    fn timestamp(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ClaimValue::as_timestamp)
    }

    /// Whether the refresh window, measured from `iat`, has elapsed.
    ///
    /// Without an `iat` or a `refresh_ttl` the payload never expires for refresh.
    pub fn is_refresh_expired(&self, refresh_ttl: Option<i64>) -> bool {
        self.is_refresh_expired_at(refresh_ttl, unix_now())
    }

    pub fn is_refresh_expired_at(&self, refresh_ttl: Option<i64>, now: i64) -> bool {
        match (self.issued_at(), refresh_ttl) {
            (Some(iat), Some(ttl)) => iat.saturating_add(ttl) < now,
            _ => false,
        }
    }

    /// Plain `name -> value` map, as handed to the signer.
    #[must_use]
    pub fn to_map(&self) -> ClaimMap {
        self.claims.to_map()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::ClaimContext;
    use crate::AuthError;
    use serde_json::json;

    const T: i64 = 1_700_000_000;

    fn claims() -> ClaimSet {
        let ctx = ClaimContext::at(T);
        ClaimSet::new()
            .with(Claim::issuer("https://issuer.test"))
            .with(Claim::issued_at(T, &ctx).unwrap())
            .with(Claim::expiration(T + 3600).unwrap())
            .with(Claim::not_before(T, &ctx).unwrap())
            .with(Claim::subject(1))
            .with(Claim::jwt_id("foo"))
            .with(Claim::custom("role", "admin"))
    }

    fn payload() -> Payload {
        Payload::new_at(claims(), &PayloadValidator::new(), ValidationMode::Normal, T).unwrap()
    }

    #[test]
    fn test_accessors() {
        let payload = payload();
        assert_eq!(payload.subject(), Some(&ClaimValue::Integer(1)));
        assert_eq!(payload.issuer(), Some("https://issuer.test"));
        assert_eq!(payload.jwt_id(), Some("foo"));
        assert_eq!(payload.expiration(), Some(T + 3600));
        assert_eq!(payload.issued_at(), Some(T));
        assert_eq!(payload.not_before(), Some(T));
        assert!(payload.has_key("role"));
        assert!(!payload.has_key("scope"));
    }

    #[test]
    fn test_matches() {
        let payload = payload();
        assert!(payload.matches(&[("sub", 1)]));
        assert!(payload.matches(&[("role", "admin"), ("jti", "foo")]));
        assert!(!payload.matches(&[("role", "user")]));
        assert!(!payload.matches(&[("missing", 1)]));
    }

    #[test]
    fn test_construction_validates() {
        let err = Payload::new_at(claims(), &PayloadValidator::new(), ValidationMode::Normal, T + 3601)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));

        let refreshed =
            Payload::new_at(claims(), &PayloadValidator::new(), ValidationMode::Refresh, T + 3601);
        assert!(refreshed.is_ok());
    }

    #[test]
    fn test_refresh_expiry() {
        let payload = payload();
        assert!(!payload.is_refresh_expired_at(Some(60), T + 60));
        assert!(payload.is_refresh_expired_at(Some(60), T + 61));
        assert!(!payload.is_refresh_expired_at(None, T + 1_000_000));
    }

    #[test]
    fn test_serializes_as_map() {
        let value = serde_json::to_value(payload()).unwrap();
        assert_eq!(value["sub"], json!(1));
        assert_eq!(value["role"], json!("admin"));
        assert_eq!(value["exp"], json!(T + 3600));
        assert_eq!(value.as_object().map(|m| m.len()), Some(7));
    }
}
