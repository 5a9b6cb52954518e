//! Claim data model.
//!
//! This module provides:
//!
//! - Typed claims with set-time validation
//! - The claim catalog (name to constructor registry, default values)
//! - An insertion-ordered claim set
//! - A per-call builder for caller-supplied claims

pub mod builder;
pub mod claim;
pub mod factory;
pub mod set;
pub mod value;

pub use builder::ClaimsBuilder;
pub use claim::{Claim, ClaimContext, ClaimKind, unix_now};
pub use factory::{ClaimConstructor, ClaimFactory};
pub use set::ClaimSet;
pub use value::{ClaimMap, ClaimValue};
