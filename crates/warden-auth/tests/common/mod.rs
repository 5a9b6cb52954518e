use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use warden_auth::{
    AuthConfig, AuthResult, ClaimsBuilder, LedgerEntry, LedgerStorage, Token, TokenManager,
};

/// Ledger double recording the storage TTL of every entry.
#[derive(Default)]
pub struct RecordingLedger {
    pub entries: RwLock<HashMap<String, (LedgerEntry, Option<u64>)>>,
}

impl RecordingLedger {
    pub fn entry(&self, key: &str) -> Option<(LedgerEntry, Option<u64>)> {
        self.entries.read().unwrap().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

#[async_trait]
impl LedgerStorage for RecordingLedger {
    async fn get(&self, key: &str) -> AuthResult<Option<LedgerEntry>> {
        Ok(self.entry(key).map(|(entry, _)| entry))
    }

    async fn add(&self, key: &str, entry: LedgerEntry, ttl_minutes: u64) -> AuthResult<bool> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), (entry, Some(ttl_minutes)));
        Ok(true)
    }

    async fn forever(&self, key: &str, entry: LedgerEntry) -> AuthResult<bool> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), (entry, None));
        Ok(true)
    }

    async fn destroy(&self, key: &str) -> AuthResult<bool> {
        Ok(self.entries.write().unwrap().remove(key).is_some())
    }

    async fn flush(&self) -> AuthResult<()> {
        self.entries.write().unwrap().clear();
        Ok(())
    }
}

pub fn config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.issuer = "https://issuer.test".to_string();
    config.ttl = Some(Duration::from_secs(3600));
    config.signing.secret = Some("integration-secret".to_string());
    config
}

pub fn manager_with(config: &AuthConfig) -> (Arc<RecordingLedger>, TokenManager) {
    let ledger = Arc::new(RecordingLedger::default());
    let manager = TokenManager::from_config(config, ledger.clone()).expect("valid config");
    (ledger, manager)
}

pub fn issue(manager: &TokenManager, claims: ClaimsBuilder) -> Token {
    let mut claims = claims;
    let payload = manager
        .payload_factory()
        .make(&mut claims, false)
        .expect("payload");
    manager.encode(&payload).expect("token")
}
