//! Revocation ledger storage trait.
//!
//! The [`Blacklist`](crate::Blacklist) records revoked tokens in a key-value
//! store supplied by the application. Keys are derived from a token claim
//! (the token id by default); values are [`LedgerEntry`] records.
//!
//! # Implementation Notes
//!
//! - `add` stores an entry that the backend may drop once `ttl_minutes` elapse
//! - `forever` stores an entry that never expires
//! - Re-adding a key overwrites the previous entry; the blacklist itself
//!   never calls `add` for a key that already holds [`LedgerEntry::Forever`]
//! - Durability, retries and timeouts are the backend's concern

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// Value stored for a revoked token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntry {
    /// Token stays usable until this unix timestamp (the grace window).
    ValidUntil(i64),
    /// Token is permanently revoked.
    Forever,
}

/// Key-value backend for the revocation ledger.
///
/// # Implementations
///
/// - `warden-auth-memory` - in-process store with TTL expiry
/// - `warden-cli` - JSON file store
///
/// # Example Implementation
///
/// ```ignore
/// use warden_auth::storage::{LedgerEntry, LedgerStorage};
/// use warden_auth::AuthResult;
///
/// struct MapLedger {
///     entries: std::sync::RwLock<std::collections::HashMap<String, LedgerEntry>>,
/// }
///
/// #[async_trait::async_trait]
/// impl LedgerStorage for MapLedger {
///     async fn get(&self, key: &str) -> AuthResult<Option<LedgerEntry>> {
///         Ok(self.entries.read().unwrap().get(key).copied())
///     }
///     // ... other methods
/// }
/// ```
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Looks up the entry for a key.
    ///
    /// # Returns
    ///
    /// `None` if the key was never added, was destroyed, or its storage TTL
    /// elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get(&self, key: &str) -> AuthResult<Option<LedgerEntry>>;

    /// Stores an entry that may be evicted after `ttl_minutes`.
    ///
    /// Overwrites any existing entry. Callers check for a
    /// [`LedgerEntry::Forever`] entry first, since a permanent ban must not
    /// be replaced by a grace window.
    ///
    /// # Arguments
    ///
    /// * `key` - The ledger key (usually the token id)
    /// * `entry` - The entry to store
    /// * `ttl_minutes` - How long the backend must keep the entry
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add(&self, key: &str, entry: LedgerEntry, ttl_minutes: u64) -> AuthResult<bool>;

    /// Stores an entry with no expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn forever(&self, key: &str, entry: LedgerEntry) -> AuthResult<bool>;

    /// Deletes the entry for a key.
    ///
    /// # Returns
    ///
    /// `true` if an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn destroy(&self, key: &str) -> AuthResult<bool>;

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn flush(&self) -> AuthResult<()>;
}
