//! In-memory revocation ledger for warden-auth.
//!
//! [`InMemoryLedgerStorage`] implements [`LedgerStorage`] on a concurrent
//! map. Entries added with a TTL are dropped once it elapses: lazily when
//! they are read, or in bulk through [`InMemoryLedgerStorage::cleanup_expired`]
//! (which [`InMemoryLedgerStorage::spawn_cleanup`] runs periodically).
//!
//! Entries are lost when the process exits, so this backend suits tests,
//! single-instance deployments and short-lived tools.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use warden_auth::{AuthConfig, TokenManager};
//! use warden_auth_memory::InMemoryLedgerStorage;
//!
//! let ledger = Arc::new(InMemoryLedgerStorage::new());
//! let manager = TokenManager::from_config(&config, ledger.clone())?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use warden_auth::{AuthResult, LedgerEntry, LedgerStorage};

/// Stored entry with its eviction deadline.
struct StoredEntry {
    entry: LedgerEntry,
    /// `None` for entries stored with `forever`.
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Revocation ledger kept in process memory.
#[derive(Default)]
pub struct InMemoryLedgerStorage {
    entries: DashMap<String, StoredEntry>,
    /// Entries dropped because their TTL elapsed.
    evictions: AtomicU64,
}

impl InMemoryLedgerStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            size: self.entries.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drops every entry whose TTL elapsed.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, stored| !stored.is_expired(now));

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.evictions.fetch_add(removed as u64, Ordering::Relaxed);
            tracing::debug!(removed, "Expired ledger entries evicted");
        }
        removed
    }

    /// Runs [`InMemoryLedgerStorage::cleanup_expired`] every `interval`.
    ///
    /// The task holds a weak reference and stops once the ledger is dropped.
    pub fn spawn_cleanup(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let ledger: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(ledger) = ledger.upgrade() else {
                    break;
                };
                ledger.cleanup_expired();
            }
        })
    }

    /// Inserts `entry`, evicted after `ttl` (never when `None`).
    fn store(&self, key: &str, entry: LedgerEntry, ttl: Option<Duration>) {
        // A deadline past the clock's range means the entry never expires
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.entries
            .insert(key.to_string(), StoredEntry { entry, expires_at });
    }
}

#[async_trait]
impl LedgerStorage for InMemoryLedgerStorage {
    async fn get(&self, key: &str) -> AuthResult<Option<LedgerEntry>> {
        let now = Instant::now();

        if let Some(stored) = self.entries.get(key) {
            if !stored.is_expired(now) {
                return Ok(Some(stored.entry));
            }
            // Expired, drop it
            drop(stored);
            if self
                .entries
                .remove_if(key, |_, stored| stored.is_expired(now))
                .is_some()
            {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(None)
    }

    async fn add(&self, key: &str, entry: LedgerEntry, ttl_minutes: u64) -> AuthResult<bool> {
        let ttl = Duration::from_secs(ttl_minutes.saturating_mul(60));
        self.store(key, entry, Some(ttl));
        Ok(true)
    }

    async fn forever(&self, key: &str, entry: LedgerEntry) -> AuthResult<bool> {
        self.store(key, entry, None);
        Ok(true)
    }

    async fn destroy(&self, key: &str) -> AuthResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn flush(&self) -> AuthResult<()> {
        self.entries.clear();
        Ok(())
    }
}

/// Snapshot of ledger counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    /// Number of stored entries.
    pub size: usize,
    /// Entries evicted because their TTL elapsed.
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_auth::claims::unix_now;
    use warden_auth::{AuthConfig, AuthError, ClaimsBuilder, TokenManager};

    const SHORT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_add_and_get() {
        let ledger = InMemoryLedgerStorage::new();
        assert!(ledger.add("jti-1", LedgerEntry::ValidUntil(10), 5).await.unwrap());

        assert_eq!(
            ledger.get("jti-1").await.unwrap(),
            Some(LedgerEntry::ValidUntil(10))
        );
        assert_eq!(ledger.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_overwrites() {
        let ledger = InMemoryLedgerStorage::new();
        ledger.add("jti-1", LedgerEntry::ValidUntil(10), 5).await.unwrap();
        ledger.forever("jti-1", LedgerEntry::Forever).await.unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get("jti-1").await.unwrap(), Some(LedgerEntry::Forever));
    }

    #[tokio::test]
    async fn test_expired_entry_dropped_on_read() {
        let ledger = InMemoryLedgerStorage::new();
        ledger.store("jti-1", LedgerEntry::ValidUntil(10), Some(SHORT));
        tokio::time::sleep(SHORT * 2).await;

        assert_eq!(ledger.get("jti-1").await.unwrap(), None);
        assert!(ledger.is_empty());
        assert_eq!(ledger.stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let ledger = InMemoryLedgerStorage::new();
        ledger.store("short-1", LedgerEntry::ValidUntil(1), Some(SHORT));
        ledger.store("short-2", LedgerEntry::ValidUntil(2), Some(SHORT));
        ledger.add("long", LedgerEntry::ValidUntil(3), 60).await.unwrap();
        ledger.forever("ban", LedgerEntry::Forever).await.unwrap();
        tokio::time::sleep(SHORT * 2).await;

        assert_eq!(ledger.cleanup_expired(), 2);
        assert_eq!(
            ledger.stats(),
            LedgerStats {
                size: 2,
                evictions: 2
            }
        );
        assert!(ledger.get("long").await.unwrap().is_some());
        assert!(ledger.get("ban").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_spawn_cleanup() {
        let ledger = Arc::new(InMemoryLedgerStorage::new());
        ledger.store("jti-1", LedgerEntry::ValidUntil(1), Some(SHORT));
        let handle = ledger.spawn_cleanup(SHORT);

        tokio::time::sleep(SHORT * 5).await;
        assert!(ledger.is_empty());

        drop(ledger);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("cleanup task stops with the ledger")
            .unwrap();
    }

    #[tokio::test]
    async fn test_destroy_and_flush() {
        let ledger = InMemoryLedgerStorage::new();
        ledger.add("a", LedgerEntry::ValidUntil(1), 5).await.unwrap();
        ledger.add("b", LedgerEntry::ValidUntil(2), 5).await.unwrap();

        assert!(ledger.destroy("a").await.unwrap());
        assert!(!ledger.destroy("a").await.unwrap());

        ledger.flush().await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_backs_token_manager() {
        let mut config = AuthConfig::default();
        config.signing.secret = Some("memory-secret".to_string());
        let ledger = Arc::new(InMemoryLedgerStorage::new());
        let manager = TokenManager::from_config(&config, ledger.clone()).unwrap();

        let mut claims = ClaimsBuilder::new()
            .with_claim("sub", 1)
            .with_claim("meta", json!({"tier": "gold"}));
        let payload = manager.payload_factory().make(&mut claims, false).unwrap();
        let token = manager.encode(&payload).unwrap();

        manager.invalidate(&token, false).await.unwrap();
        let jti = payload.jwt_id().unwrap();
        assert!(matches!(
            ledger.get(jti).await.unwrap(),
            Some(LedgerEntry::ValidUntil(until)) if until <= unix_now()
        ));
        assert!(matches!(
            manager.decode(&token, true).await,
            Err(AuthError::TokenBlacklisted)
        ));

        manager.blacklist().clear().await.unwrap();
        assert!(manager.decode(&token, true).await.is_ok());
    }
}
