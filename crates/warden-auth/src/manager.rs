//! Token lifecycle manager.
//!
//! Orchestrates the four lifecycle transitions over a token string:
//!
//! - **encode**: payload to signed token
//! - **decode**: token to validated payload, with an optional revocation check
//! - **refresh**: revoke the old token and issue a successor carrying selected claims
//! - **invalidate**: record the token in the revocation ledger
//!
//! # Usage
//!
//! ```ignore
//! use warden_auth::{AuthConfig, ClaimsBuilder, TokenManager};
//!
//! let manager = TokenManager::from_config(&config, ledger_storage)?;
//!
//! let mut claims = ClaimsBuilder::new().with_claim("sub", 42);
//! let payload = manager.payload_factory().make(&mut claims, true)?;
//! let token = manager.encode(&payload)?;
//!
//! let payload = manager.decode(&token, true).await?;
//! let successor = manager.refresh(&token, &mut ClaimsBuilder::new(), false, false).await?;
//! ```
//!
//! # Concurrency
//!
//! The manager holds no per-token state. Two concurrent refreshes of the same
//! token can both succeed, because the revocation write and the following
//! decode are separate ledger round-trips; callers that need one successor
//! per token must serialize refreshes themselves.

use std::sync::Arc;

use crate::blacklist::Blacklist;
use crate::claims::{ClaimFactory, ClaimsBuilder};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::factory::PayloadFactory;
use crate::payload::Payload;
use crate::storage::LedgerStorage;
use crate::token::{JwtSigner, Signer, Token};
use crate::validator::{PayloadValidator, ValidationMode};
use crate::AuthResult;

/// Claims always carried from an old token into its refreshed successor.
const REFRESH_CARRIED_CLAIMS: [&str; 2] = ["sub", "iat"];

/// Issues, decodes, refreshes and revokes tokens.
pub struct TokenManager {
    /// Signs and verifies token strings.
    signer: Arc<dyn Signer>,

    /// Revocation ledger.
    blacklist: Blacklist,

    /// Builds and validates payloads.
    payload_factory: PayloadFactory,

    /// Whether the revocation ledger is consulted and written.
    blacklist_enabled: bool,

    /// Claims carried over on refresh, besides `sub` and `iat`.
    persistent_claims: Vec<String>,
}

impl TokenManager {
    /// Creates a manager with the blacklist enabled and no persistent claims.
    #[must_use]
    pub fn new(signer: Arc<dyn Signer>, blacklist: Blacklist, payload_factory: PayloadFactory) -> Self {
        Self {
            signer,
            blacklist,
            payload_factory,
            blacklist_enabled: true,
            persistent_claims: Vec::new(),
        }
    }

    /// Wires a manager from configuration and a ledger backend.
    ///
    /// When no TTL is configured, `exp` is dropped from the required claims
    /// since tokens will not carry one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the configuration is invalid or
    /// the signing key cannot be loaded.
    pub fn from_config(config: &AuthConfig, storage: Arc<dyn LedgerStorage>) -> AuthResult<Self> {
        config.validate()?;

        let signer = JwtSigner::from_config(&config.signing)
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let required_claims = config
            .required_claims
            .iter()
            .filter(|name| config.ttl.is_some() || name.as_str() != "exp")
            .cloned();

        let claim_factory = ClaimFactory::new(config.issuer.clone())
            .with_ttl(config.ttl)
            .with_leeway(config.leeway);
        let validator = PayloadValidator::new()
            .with_required_claims(required_claims)
            .with_refresh_ttl(config.refresh_ttl)
            .with_leeway(config.leeway);
        let payload_factory = PayloadFactory::new(claim_factory, validator)
            .with_default_claims(config.default_claims.iter().cloned());

        let blacklist = Blacklist::new(storage)
            .with_grace_period(config.blacklist.grace_period)
            .with_refresh_ttl(config.refresh_ttl)
            .with_key_claim(config.blacklist.key_claim.clone());

        tracing::debug!(
            issuer = %config.issuer,
            algorithm = %signer.algorithm(),
            blacklist_enabled = config.blacklist.enabled,
            "Token manager configured"
        );

        Ok(Self::new(Arc::new(signer), blacklist, payload_factory)
            .with_blacklist_enabled(config.blacklist.enabled)
            .with_persistent_claims(config.persistent_claims.iter().cloned()))
    }

    #[must_use]
    pub fn with_blacklist_enabled(mut self, enabled: bool) -> Self {
        self.blacklist_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_persistent_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.persistent_claims = claims.into_iter().map(Into::into).collect();
        self
    }

    pub fn payload_factory(&self) -> &PayloadFactory {
        &self.payload_factory
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn is_blacklist_enabled(&self) -> bool {
        self.blacklist_enabled
    }

    pub fn persistent_claims(&self) -> &[String] {
        &self.persistent_claims
    }

    /// Signs a payload.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Jwt` if the signer fails.
    pub fn encode(&self, payload: &Payload) -> AuthResult<Token> {
        let raw = self.signer.encode(&payload.to_map())?;
        tracing::debug!(jti = ?payload.jwt_id(), "Token encoded");
        Token::new(raw)
    }

    /// Verifies a token and returns its payload, validated in normal mode.
    ///
    /// # Errors
    ///
    /// - `AuthError::Jwt` if the signature or framing is bad
    /// - `AuthError::TokenInvalid` / `AuthError::TokenExpired` from validation
    /// - `AuthError::TokenBlacklisted` if `check_blacklist` is set, the
    ///   blacklist is enabled and the token is revoked
    pub async fn decode(&self, token: &Token, check_blacklist: bool) -> AuthResult<Payload> {
        self.decode_in(token, check_blacklist, ValidationMode::Normal).await
    }

    async fn decode_in(
        &self,
        token: &Token,
        check_blacklist: bool,
        mode: ValidationMode,
    ) -> AuthResult<Payload> {
        let claims = self.signer.decode(token.as_str())?;

        let payload = self
            .payload_factory
            .from_map(claims, mode)
            .inspect_err(|e| tracing::debug!(error = %e, ?mode, "Token rejected"))?;

        if check_blacklist && self.blacklist_enabled && self.blacklist.has(&payload).await? {
            tracing::debug!(jti = ?payload.jwt_id(), "Token rejected: blacklisted");
            return Err(AuthError::TokenBlacklisted);
        }

        Ok(payload)
    }

    /// Revokes `token` and issues a successor.
    ///
    /// The successor carries the caller's `claims` overlaid with the old
    /// token's `sub`, `iat` and persistent claims; `exp`, `nbf` and `jti` are
    /// regenerated. Carrying `iat` is deliberate: it anchors the refresh
    /// window to the first issue, so refreshing never extends a token's
    /// total lifetime. The old token is validated in refresh mode, so an
    /// expired token can be refreshed until the refresh window (measured
    /// from its original `iat`) elapses. With `reset_claims` set, `claims`
    /// is emptied once the successor was built.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenExpired` if the refresh window has elapsed
    /// - `AuthError::TokenInvalid` if the old token is malformed
    /// - `AuthError::Jwt` if signing fails
    /// - `AuthError::Storage` if the ledger fails
    pub async fn refresh(
        &self,
        token: &Token,
        claims: &mut ClaimsBuilder,
        force_forever: bool,
        reset_claims: bool,
    ) -> AuthResult<Token> {
        // 1. Revoke the old token
        if self.blacklist_enabled {
            self.invalidate_in(token, force_forever, ValidationMode::Refresh)
                .await?;
        }

        // 2. Decode it again; it was just revoked, so skip the ledger
        let old = self
            .decode_in(token, false, ValidationMode::Refresh)
            .await?;

        // 3. Select carried claims and build the successor
        let mut carried = self.build_refresh_claims(&old, claims);
        let payload = self.payload_factory.make(&mut carried, false)?;
        let successor = self.encode(&payload)?;

        if reset_claims {
            claims.clear();
        }

        tracing::info!(
            old_jti = ?old.jwt_id(),
            new_jti = ?payload.jwt_id(),
            "Token refreshed"
        );
        Ok(successor)
    }

    /// Records `token` in the revocation ledger.
    ///
    /// With `force_forever` set the token is revoked permanently, otherwise
    /// it stays usable for the configured grace period.
    ///
    /// # Errors
    ///
    /// - `AuthError::Jwt` if the blacklist is disabled or the token is bad
    /// - `AuthError::TokenInvalid` / `AuthError::TokenExpired` from validation
    /// - `AuthError::Storage` if the ledger fails
    pub async fn invalidate(&self, token: &Token, force_forever: bool) -> AuthResult<bool> {
        self.invalidate_in(token, force_forever, ValidationMode::Normal)
            .await
    }

    async fn invalidate_in(
        &self,
        token: &Token,
        force_forever: bool,
        mode: ValidationMode,
    ) -> AuthResult<bool> {
        if !self.blacklist_enabled {
            return Err(AuthError::jwt(
                "You must have the blacklist enabled to invalidate a token.",
            ));
        }

        let payload = self.decode_in(token, false, mode).await?;
        if force_forever {
            self.blacklist.add_forever(&payload).await
        } else {
            self.blacklist.add(&payload).await
        }
    }

    /// Caller claims overlaid with `sub`, `iat` and the persistent claims of
    /// the old payload. Old values win on conflict.
    fn build_refresh_claims(&self, old: &Payload, claims: &ClaimsBuilder) -> ClaimsBuilder {
        let mut carried = claims.clone();

        let names = self
            .persistent_claims
            .iter()
            .map(String::as_str)
            .chain(REFRESH_CARRIED_CLAIMS);
        for name in names {
            if let Some(value) = old.get(name) {
                carried.add_claim(name, value.clone());
            }
        }

        carried
    }
}
