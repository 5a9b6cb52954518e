//! Token signing and verification.
//!
//! The lifecycle engine treats signing as an external concern behind the
//! [`Signer`] trait: a claim map goes in, an opaque token string comes out,
//! and back. [`JwtSigner`] is the `jsonwebtoken`-backed implementation.
//!
//! ## Supported Algorithms
//!
//! - **HS256 / HS384 / HS512**: HMAC with a shared secret
//! - **RS256 / RS384**: RSA with SHA-256 / SHA-384
//! - **ES384**: ECDSA with P-384 curve
//!
//! ## Example
//!
//! ```ignore
//! use warden_auth::token::jwt::{JwtSigner, KeyPair, Signer, SigningAlgorithm, SigningKey};
//!
//! let key = SigningKey::from_secret(SigningAlgorithm::HS256, b"change-me")?;
//! let signer = JwtSigner::new(key);
//!
//! let token = signer.encode(&claims)?;
//! let claims = signer.decode(&token)?;
//!
//! // Asymmetric keys go through a PEM key pair
//! let pair = KeyPair::generate(SigningAlgorithm::ES384)?;
//! let signer = JwtSigner::new(SigningKey::from_key_pair("2026-10", &pair)?);
//! ```
//!
//! Only the signature and the token framing are verified here. Temporal and
//! structural claim checks belong to the payload validator.

use std::fmt;
use std::str::FromStr;

use elliptic_curve::pkcs8::{
    DecodePrivateKey as _, EncodePrivateKey as _, EncodePublicKey as _,
    LineEnding as EcLineEnding,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use p384::SecretKey as EcSecretKey;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey as _, EncodePublicKey as _, LineEnding};

use crate::claims::ClaimMap;
use crate::config::SigningConfig;

const RSA_KEY_BITS: usize = 2048;

// ============================================================================
// Error Types
// ============================================================================

/// Signing, verification and key setup failures.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Could not sign token: {message}")]
    Encoding { message: String },

    /// Malformed token: bad framing, base64 or JSON.
    #[error("Could not decode token: {message}")]
    Decoding { message: String },

    #[error("Token signature could not be verified")]
    InvalidSignature,

    #[error("Could not generate key: {message}")]
    KeyGeneration { message: String },

    /// Unusable key material or algorithm mismatch.
    #[error("Invalid key: {message}")]
    InvalidKey { message: String },
}

impl JwtError {
    #[must_use]
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::Decoding {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn key_generation(message: impl Into<String>) -> Self {
        Self::KeyGeneration {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Whether the failure comes from key setup rather than a token.
    #[must_use]
    pub fn is_key_error(&self) -> bool {
        matches!(self, Self::KeyGeneration { .. } | Self::InvalidKey { .. })
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding(err.to_string()),
        }
    }
}

impl From<JwtError> for crate::AuthError {
    fn from(err: JwtError) -> Self {
        Self::jwt(err.to_string())
    }
}

// ============================================================================
// Signer
// ============================================================================

/// Turns a claim map into a signed token string and back.
///
/// Implementations must be safe for concurrent use.
pub trait Signer: Send + Sync {
    /// Signs a claim map.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be serialized or signed.
    fn encode(&self, claims: &ClaimMap) -> Result<String, JwtError>;

    /// Verifies a token string and returns its claim map.
    ///
    /// # Errors
    /// Returns an error on a malformed token or a bad signature.
    fn decode(&self, token: &str) -> Result<ClaimMap, JwtError>;
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// HMAC with SHA-384.
    HS384,
    /// HMAC with SHA-512.
    HS512,
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
    /// ECDSA with P-384 curve.
    ES384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    /// Returns `true` if this is an HMAC algorithm.
    #[must_use]
    pub fn is_hmac(&self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    /// Returns `true` if this is an RSA-based algorithm.
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }

    /// Returns `true` if this is an EC-based algorithm.
    #[must_use]
    pub fn is_ec(&self) -> bool {
        matches!(self, Self::ES384)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "HS384" => Ok(Self::HS384),
            "HS512" => Ok(Self::HS512),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "ES384" => Ok(Self::ES384),
            other => Err(JwtError::invalid_key(format!(
                "Unsupported signing algorithm: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// Key Material
// ============================================================================

/// PEM-encoded key pair for an RSA or ECDSA algorithm.
///
/// Private keys are PKCS#8, public keys SubjectPublicKeyInfo.
#[derive(Clone)]
pub struct KeyPair {
    algorithm: SigningAlgorithm,
    private_pem: String,
    public_pem: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .field("public_pem", &self.public_pem)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generates a fresh key pair: 2048-bit RSA or P-384.
    ///
    /// # Errors
    /// Returns an error for HMAC algorithms or if generation fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        let (private_pem, public_pem) = if algorithm.is_rsa() {
            let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
                .map_err(|e| JwtError::key_generation(e.to_string()))?;
            let private_pem = private_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| JwtError::key_generation(e.to_string()))?;
            let public_pem = private_key
                .to_public_key()
                .to_public_key_pem(LineEnding::LF)
                .map_err(|e| JwtError::key_generation(e.to_string()))?;
            (private_pem.to_string(), public_pem)
        } else if algorithm.is_ec() {
            let secret_key = EcSecretKey::random(&mut OsRng);
            let private_pem = secret_key
                .to_pkcs8_pem(EcLineEnding::LF)
                .map_err(|e| JwtError::key_generation(e.to_string()))?;
            (private_pem.to_string(), ec_public_pem(&secret_key)?)
        } else {
            return Err(JwtError::invalid_key(format!(
                "{} signs with a shared secret, not a key pair",
                algorithm
            )));
        };

        Ok(Self {
            algorithm,
            private_pem,
            public_pem,
        })
    }

    /// Wraps existing PEM keys.
    ///
    /// RSA needs both halves. For ES384 the public half is derived from the
    /// private key when omitted.
    ///
    /// # Errors
    /// Returns an error for HMAC algorithms, a missing RSA public key or an
    /// unreadable EC private key.
    pub fn from_pem(
        algorithm: SigningAlgorithm,
        private_pem: impl Into<String>,
        public_pem: Option<&str>,
    ) -> Result<Self, JwtError> {
        let private_pem = private_pem.into();

        let public_pem = match public_pem {
            Some(public_pem) if !algorithm.is_hmac() => public_pem.to_string(),
            None if algorithm.is_ec() => {
                let secret_key = EcSecretKey::from_pkcs8_pem(&private_pem)
                    .map_err(|e| JwtError::invalid_key(e.to_string()))?;
                ec_public_pem(&secret_key)?
            }
            None if algorithm.is_rsa() => {
                return Err(JwtError::invalid_key(format!(
                    "{} needs a public key",
                    algorithm
                )));
            }
            _ => {
                return Err(JwtError::invalid_key(format!(
                    "{} does not use PEM keys",
                    algorithm
                )));
            }
        };

        Ok(Self {
            algorithm,
            private_pem,
            public_pem,
        })
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn private_pem(&self) -> &str {
        &self.private_pem
    }

    pub fn public_pem(&self) -> &str {
        &self.public_pem
    }
}

fn invalid_pem(err: jsonwebtoken::errors::Error) -> JwtError {
    JwtError::invalid_key(err.to_string())
}

fn ec_public_pem(secret_key: &EcSecretKey) -> Result<String, JwtError> {
    secret_key
        .public_key()
        .to_public_key_pem(EcLineEnding::LF)
        .map_err(|e| JwtError::invalid_key(e.to_string()))
}

/// Keys for one signing algorithm, ready for `jsonwebtoken`.
pub struct SigningKey {
    /// Key ID, written to the token header.
    pub kid: String,

    pub algorithm: SigningAlgorithm,

    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// HMAC key from a shared secret, with a random key ID.
    ///
    /// # Errors
    /// Returns an error if the algorithm is not HMAC or the secret is empty.
    pub fn from_secret(algorithm: SigningAlgorithm, secret: &[u8]) -> Result<Self, JwtError> {
        if !algorithm.is_hmac() {
            return Err(JwtError::invalid_key(format!(
                "{} does not sign with a shared secret",
                algorithm
            )));
        }
        if secret.is_empty() {
            return Err(JwtError::invalid_key("HMAC secret cannot be empty"));
        }

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Parses a [`KeyPair`] into signing and verification keys.
    ///
    /// # Errors
    /// Returns an error if either PEM is not a key for the pair's algorithm.
    pub fn from_key_pair(kid: impl Into<String>, pair: &KeyPair) -> Result<Self, JwtError> {
        let private_pem = pair.private_pem.as_bytes();
        let public_pem = pair.public_pem.as_bytes();

        let (encoding_key, decoding_key) = if pair.algorithm.is_rsa() {
            (
                EncodingKey::from_rsa_pem(private_pem).map_err(invalid_pem)?,
                DecodingKey::from_rsa_pem(public_pem).map_err(invalid_pem)?,
            )
        } else {
            (
                EncodingKey::from_ec_pem(private_pem).map_err(invalid_pem)?,
                DecodingKey::from_ec_pem(public_pem).map_err(invalid_pem)?,
            )
        };

        Ok(Self {
            kid: kid.into(),
            algorithm: pair.algorithm,
            encoding_key,
            decoding_key,
        })
    }
}

// ============================================================================
// JWT Signer
// ============================================================================

/// `jsonwebtoken`-backed [`Signer`].
///
/// Thread-safe (`Send + Sync`); share it behind an `Arc`.
#[derive(Debug)]
pub struct JwtSigner {
    signing_key: SigningKey,
}

impl JwtSigner {
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Builds a signer from configuration.
    ///
    /// # Errors
    /// Returns an error if the algorithm is unknown or its key material is
    /// missing or invalid.
    pub fn from_config(config: &SigningConfig) -> Result<Self, JwtError> {
        let algorithm: SigningAlgorithm = config.algorithm.parse()?;

        let key = if algorithm.is_hmac() {
            let secret = config
                .secret
                .as_deref()
                .ok_or_else(|| JwtError::invalid_key("signing.secret is not set"))?;
            SigningKey::from_secret(algorithm, secret.as_bytes())?
        } else {
            let private_pem = config
                .private_key
                .as_deref()
                .ok_or_else(|| JwtError::invalid_key("signing.private_key is not set"))?;
            let pair = KeyPair::from_pem(algorithm, private_pem, config.public_key.as_deref())?;
            SigningKey::from_key_pair("default", &pair)?
        };

        Ok(Self::new(key))
    }

    /// Returns the current signing key ID.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.signing_key.kid
    }

    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.signing_key.algorithm
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        // Claims are checked by the payload validator.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation
    }
}

impl Signer for JwtSigner {
    fn encode(&self, claims: &ClaimMap) -> Result<String, JwtError> {
        let mut header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());
        header.kid = Some(self.signing_key.kid.clone());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding(e.to_string()))
    }

    fn decode(&self, token: &str) -> Result<ClaimMap, JwtError> {
        decode::<ClaimMap>(token, &self.signing_key.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}
