//! Token lifecycle error types.
//!
//! Every failure the lifecycle engine can surface is a variant of
//! [`AuthError`]. None of them are programming errors: callers at the
//! network boundary map them to transport-level responses.

use std::fmt;

/// Errors that can occur while issuing, validating, refreshing or revoking tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A claim value failed the validation rule of its claim type.
    #[error("Invalid value provided for claim [{claim}]: {message}")]
    InvalidClaim {
        /// Name of the offending claim.
        claim: String,
        /// Description of why the value was rejected.
        message: String,
    },

    /// The token is structurally or semantically invalid.
    #[error("Token invalid: {message}")]
    TokenInvalid {
        /// Why the token was rejected.
        message: String,
    },

    /// The token has expired, or its refresh window has elapsed.
    #[error("Token has expired")]
    TokenExpired,

    /// The token has been revoked through the blacklist.
    #[error("The token has been blacklisted")]
    TokenBlacklisted,

    /// Generic token failure: signer errors, a missing token, or a
    /// disabled blacklist.
    #[error("{message}")]
    Jwt {
        /// Description of the failure.
        message: String,
    },

    /// The ledger storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// What the backend reported.
        message: String,
    },

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// The offending setting and what is wrong with it.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidClaim` error.
    #[must_use]
    pub fn invalid_claim(claim: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidClaim {
            claim: claim.into(),
            message: message.into(),
        }
    }

    /// Creates a new `TokenInvalid` error.
    #[must_use]
    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::TokenInvalid {
            message: message.into(),
        }
    }

    /// Creates a new generic `Jwt` error.
    #[must_use]
    pub fn jwt(message: impl Into<String>) -> Self {
        Self::Jwt {
            message: message.into(),
        }
    }

    /// Shorthand for [`AuthError::Storage`].
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Shorthand for [`AuthError::Configuration`].
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller presented something unacceptable.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidClaim { .. }
                | Self::TokenInvalid { .. }
                | Self::TokenExpired
                | Self::TokenBlacklisted
                | Self::Jwt { .. }
        )
    }

    /// Returns `true` if the failure originates in infrastructure or setup.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Configuration { .. })
    }

    /// Returns `true` if the token itself was rejected.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::TokenInvalid { .. } | Self::TokenExpired | Self::TokenBlacklisted
        )
    }

    /// Coarse grouping used in log fields.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidClaim { .. } => ErrorCategory::Claim,
            Self::TokenInvalid { .. } => ErrorCategory::Token,
            Self::TokenExpired => ErrorCategory::Token,
            Self::TokenBlacklisted => ErrorCategory::Revocation,
            Self::Jwt { .. } => ErrorCategory::Token,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

/// Categories of lifecycle errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A single claim was rejected.
    Claim,
    /// Token validation errors (structure, expiry, signature).
    Token,
    /// The token was revoked.
    Revocation,
    /// Ledger storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claim => write!(f, "claim"),
            Self::Token => write!(f, "token"),
            Self::Revocation => write!(f, "revocation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_claim("nbf", "timestamp is in the future");
        assert_eq!(
            err.to_string(),
            "Invalid value provided for claim [nbf]: timestamp is in the future"
        );

        let err = AuthError::token_invalid("missing required claims");
        assert_eq!(err.to_string(), "Token invalid: missing required claims");

        assert_eq!(AuthError::TokenExpired.to_string(), "Token has expired");
        assert_eq!(
            AuthError::TokenBlacklisted.to_string(),
            "The token has been blacklisted"
        );
        assert_eq!(AuthError::jwt("A token is required").to_string(), "A token is required");
    }

    #[test]
    fn test_error_predicates() {
        assert!(AuthError::TokenExpired.is_client_error());
        assert!(AuthError::TokenExpired.is_token_error());
        assert!(!AuthError::TokenExpired.is_server_error());

        let err = AuthError::invalid_claim("iat", "not numeric");
        assert!(err.is_client_error());
        assert!(!err.is_token_error());

        let err = AuthError::storage("connection refused");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            AuthError::invalid_claim("exp", "x").category(),
            ErrorCategory::Claim
        );
        assert_eq!(AuthError::TokenBlacklisted.category(), ErrorCategory::Revocation);
        assert_eq!(
            AuthError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::Revocation.to_string(), "revocation");
    }
}
