//! Token lifecycle configuration.
//!
//! All settings deserialize from TOML/JSON with sensible defaults; durations
//! use human-readable strings (`"60m"`, `"2weeks"`). `ttl` and `refresh_ttl`
//! also accept `"none"`, since TOML and environment variables have no null.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::factory::DEFAULT_CLAIMS;

/// Root token lifecycle configuration.
///
/// # Example (TOML)
///
/// ```toml
/// issuer = "https://api.example.com"
/// ttl = "1h"
/// refresh_ttl = "2weeks"
/// persistent_claims = ["role"]
///
/// [blacklist]
/// enabled = true
/// grace_period = "30s"
///
/// [signing]
/// algorithm = "HS256"
/// secret = "change-me"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Default value of the `iss` claim.
    pub issuer: String,

    /// Token lifetime. When `"none"`, tokens carry no `exp` claim.
    #[serde(with = "optional_duration")]
    pub ttl: Option<Duration>,

    /// Window, measured from the original `iat`, during which a token may
    /// be refreshed. When `"none"`, tokens can be refreshed forever.
    #[serde(with = "optional_duration")]
    pub refresh_ttl: Option<Duration>,

    /// Clock skew tolerated by the temporal claim checks. Also added to the
    /// default `nbf` claim.
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,

    /// Claims every token must carry.
    pub required_claims: Vec<String>,

    /// Claims synthesized for every new token, in order. Only names with a
    /// generated default (`iss`, `iat`, `exp`, `nbf`, `jti`) are allowed.
    pub default_claims: Vec<String>,

    /// Claims carried over from an old token into its refreshed successor
    /// (`sub` and `iat` are always carried).
    pub persistent_claims: Vec<String>,

    /// Revocation ledger configuration.
    pub blacklist: BlacklistConfig,

    /// Token signing configuration.
    pub signing: SigningConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost".to_string(),
            ttl: Some(Duration::from_secs(60 * 60)),
            refresh_ttl: Some(Duration::from_secs(20_160 * 60)), // 2 weeks
            leeway: Duration::ZERO,
            required_claims: ["iss", "iat", "exp", "nbf", "sub", "jti"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_claims: ["iss", "iat", "exp", "nbf", "jti"]
                .into_iter()
                .map(String::from)
                .collect(),
            persistent_claims: Vec::new(),
            blacklist: BlacklistConfig::default(),
            signing: SigningConfig::default(),
        }
    }
}

/// `Option<Duration>` as a humantime string, with `"none"` for `None`.
mod optional_duration {
    use std::time::Duration;

    use humantime_serde::re::humantime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const NONE: &str = "none";

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => {
                serializer.serialize_str(&humantime::format_duration(*duration).to_string())
            }
            None => serializer.serialize_str(NONE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(NONE) {
            return Ok(None);
        }
        humantime::parse_duration(raw)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid duration '{raw}': {e}")))
    }
}

/// Revocation ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// Enable the ledger. When disabled, tokens cannot be invalidated and
    /// decoding skips the revocation check.
    pub enabled: bool,

    /// How long an invalidated token stays usable, to tolerate requests
    /// that were in flight when it was revoked.
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,

    /// Claim whose value keys the ledger entry.
    pub key_claim: String,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grace_period: Duration::ZERO,
            key_claim: "jti".to_string(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "HS256", "HS384", "HS512", "RS256", "RS384", "ES384"
    pub algorithm: String,

    /// Shared secret for the HMAC algorithms.
    pub secret: Option<String>,

    /// PKCS#8 PEM private key for RS256/RS384/ES384.
    pub private_key: Option<String>,

    /// PEM public key; required for RS256/RS384, derived for ES384 when unset.
    pub public_key: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret: None,
            private_key: None,
            public_key: None,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl From<ConfigError> for crate::AuthError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty
    /// - A TTL is zero
    /// - A claim list contains a blank name
    /// - A default claim has no generated value
    /// - The blacklist key claim is empty, or is not a required claim while
    ///   the blacklist is enabled
    /// - The signing algorithm is not supported
    ///
    /// Returns `ConfigError::Missing` if the key material the algorithm
    /// needs is absent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ConfigError::InvalidValue(
                "ttl must be > 0 when set".to_string(),
            ));
        }

        if self.refresh_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ConfigError::InvalidValue(
                "refresh_ttl must be > 0 when set".to_string(),
            ));
        }

        for (list, names) in [
            ("required_claims", &self.required_claims),
            ("default_claims", &self.default_claims),
            ("persistent_claims", &self.persistent_claims),
        ] {
            if names.iter().any(|name| name.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(format!(
                    "{} cannot contain blank claim names",
                    list
                )));
            }
        }

        if let Some(name) = self
            .default_claims
            .iter()
            .find(|name| !DEFAULT_CLAIMS.contains(&name.as_str()))
        {
            return Err(ConfigError::InvalidValue(format!(
                "default_claims entry '{}' has no generated value; expected one of {}",
                name,
                DEFAULT_CLAIMS.join(", ")
            )));
        }

        if self.blacklist.key_claim.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "blacklist key_claim cannot be empty".to_string(),
            ));
        }

        // Decoding looks up every token by its key claim
        if self.blacklist.enabled && !self.required_claims.contains(&self.blacklist.key_claim) {
            return Err(ConfigError::InvalidValue(format!(
                "blacklist key_claim '{}' must be listed in required_claims",
                self.blacklist.key_claim
            )));
        }

        match self.signing.algorithm.as_str() {
            "HS256" | "HS384" | "HS512" => {
                if self.signing.secret.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigError::Missing(format!(
                        "signing.secret is required for {}",
                        self.signing.algorithm
                    )));
                }
            }
            "RS256" | "RS384" => {
                if self.signing.private_key.is_none() || self.signing.public_key.is_none() {
                    return Err(ConfigError::Missing(format!(
                        "signing.private_key and signing.public_key are required for {}",
                        self.signing.algorithm
                    )));
                }
            }
            "ES384" => {
                if self.signing.private_key.is_none() {
                    return Err(ConfigError::Missing(
                        "signing.private_key is required for ES384".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be HS256, HS384, HS512, RS256, RS384, or ES384",
                    other
                )));
            }
        }

        Ok(())
    }
}
