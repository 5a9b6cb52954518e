//! Revocation ledger persisted as a JSON file.
//!
//! Every operation reads the whole file and writes it back, so the ledger is
//! shared between invocations of the tool. Entries whose storage TTL elapsed
//! are dropped on read and on every write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use warden_auth::claims::unix_now;
use warden_auth::{AuthError, AuthResult, LedgerEntry, LedgerStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub entry: LedgerEntry,
    /// Unix timestamp after which the entry may be dropped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl FileEntry {
    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Entries = BTreeMap<String, FileEntry>;

pub struct FileLedgerStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileLedgerStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Live entries, sorted by key.
    pub async fn entries(&self) -> AuthResult<Vec<(String, FileEntry)>> {
        let _guard = self.lock.lock().await;
        let now = unix_now();
        Ok(self
            .read()
            .await?
            .into_iter()
            .filter(|(_, stored)| !stored.is_expired(now))
            .collect())
    }

    async fn read(&self) -> AuthResult<Entries> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(storage_error(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&content).map_err(|e| storage_error(&self.path, e))
    }

    async fn write(&self, mut entries: Entries) -> AuthResult<()> {
        let now = unix_now();
        entries.retain(|_, stored| !stored.is_expired(now));

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }
        let content =
            serde_json::to_string_pretty(&entries).map_err(|e| storage_error(&self.path, e))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| storage_error(&self.path, e))
    }

    async fn insert(&self, key: &str, stored: FileEntry) -> AuthResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        entries.insert(key.to_string(), stored);
        self.write(entries).await?;
        Ok(true)
    }
}

fn storage_error(path: &Path, error: impl std::fmt::Display) -> AuthError {
    AuthError::storage(format!("{}: {}", path.display(), error))
}

#[async_trait]
impl LedgerStorage for FileLedgerStorage {
    async fn get(&self, key: &str) -> AuthResult<Option<LedgerEntry>> {
        let _guard = self.lock.lock().await;
        let now = unix_now();
        Ok(self
            .read()
            .await?
            .get(key)
            .filter(|stored| !stored.is_expired(now))
            .map(|stored| stored.entry))
    }

    async fn add(&self, key: &str, entry: LedgerEntry, ttl_minutes: u64) -> AuthResult<bool> {
        let ttl = i64::try_from(ttl_minutes.saturating_mul(60)).unwrap_or(i64::MAX);
        let stored = FileEntry {
            entry,
            expires_at: unix_now().checked_add(ttl),
        };
        self.insert(key, stored).await
    }

    async fn forever(&self, key: &str, entry: LedgerEntry) -> AuthResult<bool> {
        self.insert(
            key,
            FileEntry {
                entry,
                expires_at: None,
            },
        )
        .await
    }

    async fn destroy(&self, key: &str) -> AuthResult<bool> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        let removed = entries.remove(key).is_some();
        if removed {
            self.write(entries).await?;
        }
        Ok(removed)
    }

    async fn flush(&self) -> AuthResult<()> {
        let _guard = self.lock.lock().await;
        self.write(Entries::new()).await
    }
}
