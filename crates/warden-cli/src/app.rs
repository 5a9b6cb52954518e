use std::sync::Arc;

use anyhow::{Context, Result};
use warden_auth::{LedgerStorage, TokenManager};
use warden_auth_memory::InMemoryLedgerStorage;

use crate::config::{CliConfig, LedgerBackend, LedgerConfig};
use crate::ledger::FileLedgerStorage;

/// The configured ledger backend.
pub enum Ledger {
    File(Arc<FileLedgerStorage>),
    Memory(Arc<InMemoryLedgerStorage>),
}

impl Ledger {
    pub fn open(cfg: &LedgerConfig) -> Result<Self> {
        Ok(match cfg.backend {
            LedgerBackend::File => Self::File(Arc::new(FileLedgerStorage::new(cfg.resolve_path()?))),
            LedgerBackend::Memory => Self::Memory(Arc::new(InMemoryLedgerStorage::new())),
        })
    }

    pub fn storage(&self) -> Arc<dyn LedgerStorage> {
        match self {
            Self::File(ledger) => ledger.clone(),
            Self::Memory(ledger) => ledger.clone(),
        }
    }
}

pub struct App {
    pub manager: TokenManager,
    pub ledger: Ledger,
}

impl App {
    pub fn new(cfg: &CliConfig) -> Result<Self> {
        let ledger = Ledger::open(&cfg.ledger)?;
        tracing::debug!(backend = ?cfg.ledger.backend, "Revocation ledger opened");
        if cfg.ledger.backend == LedgerBackend::Memory {
            tracing::warn!("Memory ledger in use; revocations end with this process");
        }

        let manager = TokenManager::from_config(&cfg.auth, ledger.storage())
            .context("Cannot set up the token manager")?;
        Ok(Self { manager, ledger })
    }
}
