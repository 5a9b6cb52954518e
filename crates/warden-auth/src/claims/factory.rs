//! Claim catalog: name-to-constructor registry plus default-value synthesis.

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use super::claim::{Claim, ClaimContext, unix_now};
use super::value::ClaimValue;
use crate::error::AuthError;
use crate::AuthResult;

/// Builds a validated claim from a raw value.
pub type ClaimConstructor = fn(ClaimValue, &ClaimContext) -> AuthResult<Claim>;

/// Produces claims by name.
///
/// Well-known names resolve to their typed constructor; anything not in the
/// registry becomes a custom claim. Additional constructors can be
/// registered with [`ClaimFactory::extend`].
#[derive(Debug, Clone)]
pub struct ClaimFactory {
    issuer: String,
    ttl: Option<i64>,
    leeway: i64,
    registry: HashMap<String, ClaimConstructor>,
}

impl ClaimFactory {
    /// Creates a factory issuing claims for `issuer` with no TTL.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        let mut registry: HashMap<String, ClaimConstructor> = HashMap::new();
        registry.insert("sub".into(), |v, _| Ok(Claim::subject(v)));
        registry.insert("iss".into(), |v, _| Ok(Claim::issuer(v)));
        registry.insert("jti".into(), |v, _| Ok(Claim::jwt_id(v)));
        registry.insert("iat".into(), |v, ctx| Claim::issued_at(v, ctx));
        registry.insert("nbf".into(), |v, ctx| Claim::not_before(v, ctx));
        registry.insert("exp".into(), |v, ctx| Claim::with_context("exp", v, ctx));

        Self {
            issuer: issuer.into(),
            ttl: None,
            leeway: 0,
            registry,
        }
    }

    /// Sets the token lifetime used for the default `exp`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl.map(duration_secs);
        self
    }

    /// Sets the clock skew added to the default `nbf` and tolerated by validation.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = duration_secs(leeway);
        self
    }

    /// Registers a constructor for a claim name.
    ///
    /// Claims produced earlier are unaffected.
    pub fn extend(&mut self, name: impl Into<String>, constructor: ClaimConstructor) -> &mut Self {
        self.registry.insert(name.into(), constructor);
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Token lifetime in seconds.
    pub fn ttl(&self) -> Option<i64> {
        self.ttl
    }

    pub fn leeway(&self) -> i64 {
        self.leeway
    }

    /// Validation context for the current wall clock.
    #[must_use]
    pub fn context(&self) -> ClaimContext {
        self.context_at(unix_now())
    }

    #[must_use]
    pub fn context_at(&self, now: i64) -> ClaimContext {
        ClaimContext::at(now).with_leeway(self.leeway)
    }

    /// Builds the claim registered for `name` from a raw value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` if the value is unacceptable for the name.
    pub fn get(&self, name: &str, value: impl Into<ClaimValue>) -> AuthResult<Claim> {
        self.get_with(name, value.into(), &self.context())
    }

    /// [`ClaimFactory::get`] against an explicit clock.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidClaim` if the value is unacceptable for the name.
    pub fn get_with(&self, name: &str, value: ClaimValue, ctx: &ClaimContext) -> AuthResult<Claim> {
        match self.registry.get(name) {
            Some(constructor) => constructor(value, ctx),
            None => Ok(Claim::custom(name, value)),
        }
    }

    /// Synthesizes the default claim for a well-known name.
    ///
    /// # Errors
    ///
    /// - `AuthError::InvalidClaim` if `name` has no default value
    /// - `AuthError::Configuration` if `exp` is requested without a TTL
    pub fn make(&self, name: &str) -> AuthResult<Claim> {
        self.make_at(name, unix_now())
    }

    /// [`ClaimFactory::make`] with an explicit current time.
    ///
    /// # Errors
    ///
    /// See [`ClaimFactory::make`].
    pub fn make_at(&self, name: &str, now: i64) -> AuthResult<Claim> {
        let value = self.default_value(name, now)?;
        self.get_with(name, value, &self.context_at(now))
    }

    fn default_value(&self, name: &str, now: i64) -> AuthResult<ClaimValue> {
        let value = match name {
            "iss" => ClaimValue::from(self.issuer.clone()),
            "iat" => ClaimValue::from(now),
            "nbf" => ClaimValue::from(checked_offset(now, self.leeway)?),
            "exp" => {
                let ttl = self.ttl.ok_or_else(|| {
                    AuthError::configuration("cannot synthesize exp without a ttl")
                })?;
                ClaimValue::from(checked_offset(now, ttl)?)
            }
            "jti" => ClaimValue::from(Uuid::new_v4().to_string()),
            other => {
                return Err(AuthError::invalid_claim(other, "no default value available"));
            }
        };
        Ok(value)
    }
}

pub(crate) fn duration_secs(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}

fn checked_offset(now: i64, offset: i64) -> AuthResult<i64> {
    now.checked_add(offset)
        .ok_or_else(|| AuthError::token_invalid("timestamp overflow"))
}
