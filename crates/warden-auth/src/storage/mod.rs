//! Storage traits for lifecycle state.
//!
//! The only state the lifecycle engine keeps is the revocation ledger.
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `warden-auth-memory` - in-process storage backend
//! - `warden-cli` - JSON file backend used by the `warden` tool

pub mod ledger;

pub use ledger::{LedgerEntry, LedgerStorage};
