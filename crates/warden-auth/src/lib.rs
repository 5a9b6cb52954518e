//! # warden-auth
//!
//! Signed bearer token lifecycle: issue, validate, refresh and revoke.
//!
//! This crate provides:
//! - A typed claim model with set-time validation
//! - Payload assembly from default and caller-supplied claims
//! - Structural and temporal payload validation (normal and refresh modes)
//! - A revocation ledger with grace periods and permanent bans
//! - A lifecycle manager tying signer, ledger and payloads together
//!
//! ## Overview
//!
//! Tokens are stateless: everything needed to authenticate a caller lives in
//! the signed claim set. The only server-side state is the revocation ledger,
//! consulted on every decode, which lets tokens be invalidated before they
//! expire.
//!
//! ## Modules
//!
//! - [`claims`] - Claims, the claim catalog, claim sets and builders
//! - [`config`] - Lifecycle configuration
//! - [`validator`] - Payload validation rules
//! - [`payload`] - Validated, immutable payloads
//! - [`factory`] - Payload assembly
//! - [`blacklist`] - The revocation ledger
//! - [`manager`] - Lifecycle orchestration
//! - [`auth`] - Facade bound to a current token
//! - [`token`] - Token strings and signing
//! - [`storage`] - Storage traits for the revocation ledger

pub mod auth;
pub mod blacklist;
pub mod claims;
pub mod config;
pub mod error;
pub mod factory;
pub mod manager;
pub mod payload;
pub mod storage;
pub mod token;
pub mod validator;

pub use auth::{JwtAuth, JwtSubject};
pub use blacklist::Blacklist;
pub use claims::{
    Claim, ClaimConstructor, ClaimContext, ClaimFactory, ClaimKind, ClaimMap, ClaimSet,
    ClaimValue, ClaimsBuilder,
};
pub use config::{AuthConfig, BlacklistConfig, ConfigError, SigningConfig};
pub use error::{AuthError, ErrorCategory};
pub use factory::PayloadFactory;
pub use manager::TokenManager;
pub use payload::Payload;
pub use storage::{LedgerEntry, LedgerStorage};
pub use token::{JwtError, JwtSigner, KeyPair, Signer, SigningAlgorithm, SigningKey, Token};
pub use validator::{PayloadValidator, ValidationMode};

/// Type alias for token lifecycle results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use warden_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::auth::{JwtAuth, JwtSubject};
    pub use crate::blacklist::Blacklist;
    pub use crate::claims::{Claim, ClaimMap, ClaimValue, ClaimsBuilder};
    pub use crate::config::AuthConfig;
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::manager::TokenManager;
    pub use crate::payload::Payload;
    pub use crate::storage::{LedgerEntry, LedgerStorage};
    pub use crate::token::{Signer, Token};
    pub use crate::validator::ValidationMode;
}
