//! Payload assembly: default claims, caller claims, validation.

use crate::claims::{ClaimFactory, ClaimMap, ClaimSet, ClaimsBuilder, unix_now};
use crate::error::AuthError;
use crate::payload::Payload;
use crate::validator::{PayloadValidator, ValidationMode};
use crate::AuthResult;

/// Claims synthesized for every new token unless configured otherwise.
pub const DEFAULT_CLAIMS: [&str; 5] = ["iss", "iat", "exp", "nbf", "jti"];

/// Builds payloads for new tokens and for decoded claim maps.
#[derive(Debug, Clone)]
pub struct PayloadFactory {
    claim_factory: ClaimFactory,
    validator: PayloadValidator,
    default_claims: Vec<String>,
}

impl PayloadFactory {
    #[must_use]
    pub fn new(claim_factory: ClaimFactory, validator: PayloadValidator) -> Self {
        Self {
            claim_factory,
            validator,
            default_claims: DEFAULT_CLAIMS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replaces the ordered list of claims synthesized for every token.
    #[must_use]
    pub fn with_default_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    pub fn claim_factory(&self) -> &ClaimFactory {
        &self.claim_factory
    }

    pub fn claim_factory_mut(&mut self) -> &mut ClaimFactory {
        &mut self.claim_factory
    }

    pub fn validator(&self) -> &PayloadValidator {
        &self.validator
    }

    pub fn default_claims(&self) -> &[String] {
        &self.default_claims
    }

    /// Builds and validates a payload for a new token.
    ///
    /// With `reset` set, `claims` is emptied once the payload was built.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidClaim` if a caller-supplied value is rejected
    /// - `AuthError::TokenInvalid` / `AuthError::TokenExpired` from validation
    pub fn make(&self, claims: &mut ClaimsBuilder, reset: bool) -> AuthResult<Payload> {
        self.make_at(claims, reset, unix_now())
    }

    /// [`PayloadFactory::make`] with an explicit current time.
    ///
    /// # Errors
    ///
    /// See [`PayloadFactory::make`].
    pub fn make_at(&self, claims: &mut ClaimsBuilder, reset: bool, now: i64) -> AuthResult<Payload> {
        let set = self.build_claims_at(claims, now)?;
        let payload = Payload::new_at(set, &self.validator, ValidationMode::Normal, now)?;

        if reset {
            claims.clear();
        }
        Ok(payload)
    }

    /// Default claims overlaid with the caller's claims, all resolved.
    ///
    /// `exp` is skipped when no TTL is configured.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` if any value is rejected.
    pub fn build_claims_at(&self, claims: &ClaimsBuilder, now: i64) -> AuthResult<ClaimSet> {
        let has_ttl = self.claim_factory.ttl().is_some();

        let defaults = self
            .default_claims
            .iter()
            .filter(|name| has_ttl || name.as_str() != "exp")
            // Overridden defaults are never synthesized.
            .filter(|name| !claims.contains(name))
            .map(|name| self.claim_factory.make_at(name, now))
            .collect::<AuthResult<ClaimSet>>()?;

        let ctx = self.claim_factory.context_at(now);
        claims.resolve_onto(defaults, &self.claim_factory, &ctx)
    }

    /// Wraps an already-built claim set, validating it in `mode`.
    ///
    /// # Errors
    ///
    /// Whatever [`PayloadValidator::check`] reports.
    pub fn with_claims(&self, claims: ClaimSet, mode: ValidationMode) -> AuthResult<Payload> {
        Payload::new(claims, &self.validator, mode)
    }

    /// Builds a payload from a decoded claim map. No defaults are added.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if a decoded value breaks its claim's rule
    ///   or the structural/`nbf` checks fail
    /// - `AuthError::TokenExpired` from validation
    pub fn from_map(&self, map: ClaimMap, mode: ValidationMode) -> AuthResult<Payload> {
        self.from_map_at(map, mode, unix_now())
    }

    /// [`PayloadFactory::from_map`] validated as of `now`.
    ///
    /// # Errors
    ///
    /// See [`PayloadFactory::from_map`].
    pub fn from_map_at(&self, map: ClaimMap, mode: ValidationMode, now: i64) -> AuthResult<Payload> {
        let ctx = self.claim_factory.context_at(now);
        let set = map
            .into_iter()
            .map(|(name, value)| self.claim_factory.get_with(&name, value.into(), &ctx))
            .collect::<AuthResult<ClaimSet>>()
            .map_err(|e| match e {
                AuthError::InvalidClaim { claim, message } => {
                    AuthError::token_invalid(format!("claim [{}] {}", claim, message))
                }
                other => other,
            })?;

        Payload::new_at(set, &self.validator, mode, now)
    }
}
