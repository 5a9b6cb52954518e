//! Revocation ledger.
//!
//! An invalidated token is recorded under the value of a configurable claim
//! (the token id by default). A token with an expiry stays usable for a grace
//! period after invalidation so that requests already in flight complete; a
//! token without one, or one invalidated "forever", is revoked permanently.

use std::sync::Arc;
use std::time::Duration;

use crate::claims::factory::duration_secs;
use crate::claims::unix_now;
use crate::error::AuthError;
use crate::payload::Payload;
use crate::storage::{LedgerEntry, LedgerStorage};
use crate::AuthResult;

/// Records and answers which tokens have been revoked.
#[derive(Clone)]
pub struct Blacklist {
    storage: Arc<dyn LedgerStorage>,
    grace_period: i64,
    refresh_ttl: Option<i64>,
    key_claim: String,
}

impl std::fmt::Debug for Blacklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blacklist")
            .field("grace_period", &self.grace_period)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("key_claim", &self.key_claim)
            .finish_non_exhaustive()
    }
}

impl Blacklist {
    /// Creates a ledger keyed by `jti` with no grace period and a two week
    /// refresh window.
    #[must_use]
    pub fn new(storage: Arc<dyn LedgerStorage>) -> Self {
        Self {
            storage,
            grace_period: 0,
            refresh_ttl: Some(20_160 * 60),
            key_claim: "jti".to_string(),
        }
    }

    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = duration_secs(grace_period);
        self
    }

    /// Refresh window; sizes how long the backend must keep entries.
    #[must_use]
    pub fn with_refresh_ttl(mut self, refresh_ttl: Option<Duration>) -> Self {
        self.refresh_ttl = refresh_ttl.map(duration_secs);
        self
    }

    #[must_use]
    pub fn with_key_claim(mut self, key_claim: impl Into<String>) -> Self {
        self.key_claim = key_claim.into();
        self
    }

    /// Grace period in seconds.
    pub fn grace_period(&self) -> i64 {
        self.grace_period
    }

    pub fn key_claim(&self) -> &str {
        &self.key_claim
    }

    /// Ledger key for a payload: the value of the key claim.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` if the payload lacks the key claim.
    pub fn key_for(&self, payload: &Payload) -> AuthResult<String> {
        payload
            .get(&self.key_claim)
            .map(ToString::to_string)
            .ok_or_else(|| {
                AuthError::token_invalid(format!(
                    "payload has no '{}' claim to key the blacklist",
                    self.key_claim
                ))
            })
    }

    /// Revokes a payload once its grace window elapses.
    ///
    /// A key already revoked forever is left untouched.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if the key claim is missing
    /// - `AuthError::Storage` if the backend fails
    pub async fn add(&self, payload: &Payload) -> AuthResult<bool> {
        self.add_at(payload, unix_now()).await
    }

    /// [`Blacklist::add`] as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Blacklist::add`].
    pub async fn add_at(&self, payload: &Payload, now: i64) -> AuthResult<bool> {
        let Some(exp) = payload.expiration() else {
            return self.add_forever(payload).await;
        };

        let key = self.key_for(payload)?;

        // A permanent ban never reverts to a grace window
        let existing = self
            .storage
            .get(&key)
            .await
            .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Failed to read blacklist entry"))?;
        if existing == Some(LedgerEntry::Forever) {
            tracing::debug!(key = %key, "Token already blacklisted forever");
            return Ok(true);
        }

        let entry = LedgerEntry::ValidUntil(exp.min(now).saturating_add(self.grace_period));

        let stored = match self.storage_ttl_minutes(payload, exp, now) {
            Some(ttl_minutes) => self.storage.add(&key, entry, ttl_minutes).await,
            None => self.storage.forever(&key, entry).await,
        }
        .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Failed to write blacklist entry"))?;

        tracing::info!(key = %key, ?entry, "Token added to blacklist");
        Ok(stored)
    }

    /// Revokes a payload permanently, regardless of its expiry.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if the key claim is missing
    /// - `AuthError::Storage` if the backend fails
    pub async fn add_forever(&self, payload: &Payload) -> AuthResult<bool> {
        let key = self.key_for(payload)?;
        let stored = self
            .storage
            .forever(&key, LedgerEntry::Forever)
            .await
            .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Failed to write blacklist entry"))?;

        tracing::info!(key = %key, "Token blacklisted forever");
        Ok(stored)
    }

    /// Whether the payload is revoked and past its grace window.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if the key claim is missing
    /// - `AuthError::Storage` if the backend fails
    pub async fn has(&self, payload: &Payload) -> AuthResult<bool> {
        self.has_at(payload, unix_now()).await
    }

    /// [`Blacklist::has`] as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Blacklist::has`].
    pub async fn has_at(&self, payload: &Payload, now: i64) -> AuthResult<bool> {
        let key = self.key_for(payload)?;
        let entry = self
            .storage
            .get(&key)
            .await
            .inspect_err(|e| tracing::warn!(key = %key, error = %e, "Failed to read blacklist entry"))?;

        Ok(match entry {
            None => false,
            Some(LedgerEntry::Forever) => true,
            Some(LedgerEntry::ValidUntil(valid_until)) => valid_until <= now,
        })
    }

    /// Removes the payload's entry.
    ///
    /// # Errors
    ///
    /// - `AuthError::TokenInvalid` if the key claim is missing
    /// - `AuthError::Storage` if the backend fails
    pub async fn remove(&self, payload: &Payload) -> AuthResult<bool> {
        let key = self.key_for(payload)?;
        let removed = self.storage.destroy(&key).await?;
        tracing::debug!(key = %key, removed, "Blacklist entry removed");
        Ok(removed)
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the backend fails.
    pub async fn clear(&self) -> AuthResult<bool> {
        self.storage
            .flush()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to clear blacklist"))?;
        tracing::info!("Blacklist cleared");
        Ok(true)
    }

    /// Minutes the backend must keep an entry: until the later of `exp` and
    /// the end of the refresh window, plus the grace period, plus one minute.
    /// `None` when there is no refresh window.
    fn storage_ttl_minutes(&self, payload: &Payload, exp: i64, now: i64) -> Option<u64> {
        let refresh_ttl = self.refresh_ttl?;
        let iat = payload.issued_at().unwrap_or(now);

        let horizon = exp
            .max(iat.saturating_add(refresh_ttl))
            .saturating_add(self.grace_period);
        let seconds = u64::try_from(horizon.saturating_sub(now)).unwrap_or(0);
        Some(seconds.div_ceil(60) + 1)
    }
}
