//! Token strings and signing.
//!
//! This module provides:
//!
//! - The [`Token`] value object (three dot-separated segments)
//! - The [`Signer`] collaborator trait and a JWT implementation

pub mod jwt;

use std::fmt;

pub use jwt::{JwtError, JwtSigner, KeyPair, Signer, SigningAlgorithm, SigningKey};

use crate::error::AuthError;
use crate::AuthResult;

/// A raw token string with a well-formed `header.payload.signature` shape.
///
/// The content of each segment is the signer's concern; only the framing is
/// checked here.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Wraps a raw token string.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` unless the string has exactly three
    /// non-empty segments separated by `.`.
    pub fn new(value: impl Into<String>) -> AuthResult<Self> {
        let value = value.into();

        let segments: Vec<&str> = value.split('.').collect();
        if segments.len() != 3 {
            return Err(AuthError::token_invalid("Wrong number of segments"));
        }
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(AuthError::token_invalid("Malformed token"));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(..)")
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Token {
    type Error = AuthError;

    fn try_from(value: &str) -> AuthResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for Token {
    type Error = AuthError;

    fn try_from(value: String) -> AuthResult<Self> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_token() {
        let token = Token::new("foo.bar.baz").unwrap();
        assert_eq!(token.as_str(), "foo.bar.baz");
        assert_eq!(token.to_string(), "foo.bar.baz");
    }

    #[test]
    fn test_wrong_segment_count() {
        for raw in ["", "foo", "foo.bar", "foo.bar.baz.qux"] {
            let err = Token::new(raw).unwrap_err();
            assert!(matches!(err, AuthError::TokenInvalid { .. }), "{raw}");
        }
    }

    #[test]
    fn test_empty_segment() {
        for raw in ["foo..baz", ".bar.baz", "foo.bar.", "foo. .baz"] {
            assert!(Token::new(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn test_debug_hides_value() {
        let token = Token::try_from("foo.bar.baz").unwrap();
        assert_eq!(format!("{:?}", token), "Token(..)");
    }
}
