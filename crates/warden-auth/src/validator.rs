//! Structural and temporal payload validation.

use std::time::Duration;

use crate::claims::{ClaimSet, unix_now};
use crate::claims::factory::duration_secs;
use crate::error::AuthError;
use crate::AuthResult;

/// Claims a payload must carry unless configured otherwise.
pub const DEFAULT_REQUIRED_CLAIMS: [&str; 6] = ["iss", "iat", "exp", "nbf", "sub", "jti"];

/// Selects which temporal rules a payload is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Issue and decode time: `nbf`/`iat` not in the future, `exp` not in the past.
    #[default]
    Normal,
    /// Refresh time: only the refresh window measured from `iat` applies.
    Refresh,
}

/// Validates claim sets before they become a [`Payload`](crate::Payload).
#[derive(Debug, Clone)]
pub struct PayloadValidator {
    required_claims: Vec<String>,
    refresh_ttl: Option<i64>,
    leeway: i64,
}

impl Default for PayloadValidator {
    fn default() -> Self {
        Self {
            required_claims: DEFAULT_REQUIRED_CLAIMS.iter().map(|s| s.to_string()).collect(),
            refresh_ttl: Some(20_160 * 60),
            leeway: 0,
        }
    }
}

impl PayloadValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_required_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the refresh window. `None` means tokens can be refreshed forever.
    #[must_use]
    pub fn with_refresh_ttl(mut self, refresh_ttl: Option<Duration>) -> Self {
        self.refresh_ttl = refresh_ttl.map(duration_secs);
        self
    }

    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = duration_secs(leeway);
        self
    }

    pub fn required_claims(&self) -> &[String] {
        &self.required_claims
    }

    /// Refresh window in seconds.
    pub fn refresh_ttl(&self) -> Option<i64> {
        self.refresh_ttl
    }

    pub fn leeway(&self) -> i64 {
        self.leeway
    }

    /// Validates `claims` against the current time.
    ///
    /// # Errors
    ///
    /// See [`PayloadValidator::check_at`].
    pub fn check(&self, claims: ClaimSet, mode: ValidationMode) -> AuthResult<ClaimSet> {
        self.check_at(claims, mode, unix_now())
    }

    /// Validates `claims` as of `now`.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if a required claim is missing, or (normal
    ///   mode) `nbf`/`iat` lies in the future
    /// - `AuthError::TokenExpired` if `exp` has passed (normal mode) or the
    ///   refresh window has elapsed (refresh mode)
    pub fn check_at(&self, claims: ClaimSet, mode: ValidationMode, now: i64) -> AuthResult<ClaimSet> {
        // 1. Structure
        if !claims.has_all(&self.required_claims) {
            return Err(AuthError::token_invalid(
                "JWT payload does not contain the required claims",
            ));
        }

        // 2. Timestamps
        match mode {
            ValidationMode::Normal => claims.validate_payload_at(now, self.leeway)?,
            ValidationMode::Refresh => {
                if let Some(refresh_ttl) = self.refresh_ttl {
                    claims.validate_refresh_at(now, refresh_ttl)?;
                }
            }
        }

        Ok(claims)
    }

    /// Boolean form of [`PayloadValidator::check`]; any failure yields `false`.
    pub fn is_valid(&self, claims: &ClaimSet, mode: ValidationMode) -> bool {
        self.check(claims.clone(), mode).is_ok()
    }

    /// Boolean form of [`PayloadValidator::check_at`].
    pub fn is_valid_at(&self, claims: &ClaimSet, mode: ValidationMode, now: i64) -> bool {
        self.check_at(claims.clone(), mode, now).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claim, ClaimContext};

    const T: i64 = 1_700_000_000;

    fn full_set(nbf: i64, exp: i64) -> ClaimSet {
        let ctx = ClaimContext::at(T + 3600);
        ClaimSet::new()
            .with(Claim::issuer("https://issuer.test"))
            .with(Claim::issued_at(T, &ctx).unwrap())
            .with(Claim::expiration(exp).unwrap())
            .with(Claim::not_before(nbf, &ctx).unwrap())
            .with(Claim::subject(1))
            .with(Claim::jwt_id("foo"))
    }

    #[test]
    fn test_future_nbf_is_invalid() {
        let validator = PayloadValidator::new();
        let err = validator
            .check_at(full_set(T + 3600, T + 7200), ValidationMode::Normal, T)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid { .. }));
    }

    #[test]
    fn test_valid_set_passes() {
        let validator = PayloadValidator::new();
        let set = full_set(T, T + 3600);
        let checked = validator
            .check_at(set.clone(), ValidationMode::Normal, T)
            .unwrap();
        assert_eq!(checked, set);
    }

    #[test]
    fn test_missing_required_claim() {
        let validator = PayloadValidator::new();
        let mut set = full_set(T, T + 3600);
        set.remove("jti");

        let err = validator.check_at(set, ValidationMode::Normal, T).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid { .. }));
    }

    #[test]
    fn test_structure_checked_in_refresh_mode() {
        let validator = PayloadValidator::new();
        let mut set = full_set(T, T + 3600);
        set.remove("sub");
        assert!(!validator.is_valid_at(&set, ValidationMode::Refresh, T));
    }

    #[test]
    fn test_expired_in_normal_mode() {
        let validator = PayloadValidator::new();
        let err = validator
            .check_at(full_set(T, T + 10), ValidationMode::Normal, T + 11)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_expired_token_still_refreshable() {
        let validator = PayloadValidator::new().with_refresh_ttl(Some(Duration::from_secs(600)));
        let set = full_set(T, T + 10);
        assert!(validator.is_valid_at(&set, ValidationMode::Refresh, T + 600));

        let err = validator
            .check_at(set, ValidationMode::Refresh, T + 601)
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_no_refresh_ttl_never_expires() {
        let validator = PayloadValidator::new().with_refresh_ttl(None);
        let set = full_set(T, T + 10);
        assert!(validator.is_valid_at(&set, ValidationMode::Refresh, T + 100 * 365 * 86_400));
    }

    #[test]
    fn test_custom_required_claims() {
        let validator = PayloadValidator::new().with_required_claims(["sub"]);
        let set = ClaimSet::new().with(Claim::subject(1));
        assert!(validator.is_valid_at(&set, ValidationMode::Normal, T));
    }

    #[test]
    fn test_is_valid_is_idempotent() {
        let validator = PayloadValidator::new();
        let set = full_set(T + 3600, T + 7200);
        let first = validator.is_valid_at(&set, ValidationMode::Normal, T);
        let second = validator.is_valid_at(&set, ValidationMode::Normal, T);
        assert_eq!(first, second);
        assert!(!first);
    }

    #[test]
    fn test_leeway_tolerates_recent_expiry() {
        let validator = PayloadValidator::new().with_leeway(Duration::from_secs(60));
        assert!(validator.is_valid_at(&full_set(T, T + 10), ValidationMode::Normal, T + 70));
    }
}
