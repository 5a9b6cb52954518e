//! High-level token facade.
//!
//! [`JwtAuth`] wraps a [`TokenManager`] around a "current token" so request
//! handling code can issue a token for a subject, then check, refresh or
//! invalidate whatever token the request carried.

use std::sync::Arc;

use crate::claims::{ClaimMap, ClaimValue, ClaimsBuilder};
use crate::error::AuthError;
use crate::manager::TokenManager;
use crate::payload::Payload;
use crate::token::Token;
use crate::AuthResult;

/// Something tokens can be issued for, typically a user.
pub trait JwtSubject {
    /// Value of the `sub` claim.
    fn jwt_identifier(&self) -> ClaimValue;

    /// Extra claims embedded in every token issued for this subject.
    fn jwt_custom_claims(&self) -> ClaimMap {
        ClaimMap::new()
    }
}

/// Token operations bound to one current token.
pub struct JwtAuth {
    manager: Arc<TokenManager>,
    token: Option<Token>,
    claims: ClaimsBuilder,
}

impl JwtAuth {
    #[must_use]
    pub fn new(manager: Arc<TokenManager>) -> Self {
        Self {
            manager,
            token: None,
            claims: ClaimsBuilder::new(),
        }
    }

    /// Claims added to tokens issued or refreshed through this facade.
    #[must_use]
    pub fn with_claims(mut self, claims: ClaimsBuilder) -> Self {
        self.claims = claims;
        self
    }

    pub fn add_claim(&mut self, name: impl Into<String>, value: impl Into<ClaimValue>) -> &mut Self {
        self.claims.add_claim(name, value);
        self
    }

    pub fn claims(&self) -> &ClaimsBuilder {
        &self.claims
    }

    pub fn manager(&self) -> &Arc<TokenManager> {
        &self.manager
    }

    /// Issues a token for `subject`.
    ///
    /// # Errors
    ///
    /// Whatever payload construction or signing reports.
    pub fn from_subject(&self, subject: &impl JwtSubject) -> AuthResult<Token> {
        let payload = self.make_payload(subject)?;
        self.manager.encode(&payload)
    }

    /// Builds the payload for `subject`: `sub`, then the facade's claims,
    /// then the subject's own custom claims, over the configured defaults.
    ///
    /// # Errors
    ///
    /// Whatever payload construction reports.
    pub fn make_payload(&self, subject: &impl JwtSubject) -> AuthResult<Payload> {
        let mut claims = ClaimsBuilder::new().with_claim("sub", subject.jwt_identifier());
        claims
            .merge(&self.claims)
            .extend_from_map(subject.jwt_custom_claims());

        self.manager.payload_factory().make(&mut claims, false)
    }

    /// Sets the current token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenInvalid` if the string is not a well-formed token.
    pub fn set_token(&mut self, token: impl Into<String>) -> AuthResult<&mut Self> {
        self.token = Some(Token::new(token)?);
        Ok(self)
    }

    pub fn unset_token(&mut self) -> &mut Self {
        self.token = None;
        self
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    fn require_token(&self) -> AuthResult<&Token> {
        self.token
            .as_ref()
            .ok_or_else(|| AuthError::jwt("A token is required"))
    }

    /// Decodes the current token, including the revocation check.
    ///
    /// # Errors
    ///
    /// - `AuthError::Jwt` if no token is set
    /// - Whatever [`TokenManager::decode`] reports
    pub async fn payload(&self) -> AuthResult<Payload> {
        let token = self.require_token()?;
        self.manager.decode(token, true).await
    }

    /// Alias of [`JwtAuth::payload`].
    ///
    /// # Errors
    ///
    /// See [`JwtAuth::payload`].
    pub async fn check_or_fail(&self) -> AuthResult<Payload> {
        self.payload().await
    }

    /// Whether the current token is valid; every failure yields `false`.
    pub async fn check(&self) -> bool {
        self.check_or_fail().await.is_ok()
    }

    /// Refreshes the current token and returns its successor.
    ///
    /// The current token is left unchanged.
    ///
    /// # Errors
    ///
    /// - `AuthError::Jwt` if no token is set
    /// - Whatever [`TokenManager::refresh`] reports
    pub async fn refresh(&mut self, force_forever: bool, reset_claims: bool) -> AuthResult<Token> {
        let token = self.require_token()?.clone();
        self.manager
            .refresh(&token, &mut self.claims, force_forever, reset_claims)
            .await
    }

    /// Invalidates the current token.
    ///
    /// # Errors
    ///
    /// - `AuthError::Jwt` if no token is set or the blacklist is disabled
    /// - Whatever [`TokenManager::invalidate`] reports
    pub async fn invalidate(&self, force_forever: bool) -> AuthResult<bool> {
        let token = self.require_token()?;
        self.manager.invalidate(token, force_forever).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blacklist::Blacklist;
    use crate::claims::ClaimFactory;
    use crate::factory::PayloadFactory;
    use crate::storage::{LedgerEntry, LedgerStorage};
    use crate::token::{JwtSigner, SigningAlgorithm, SigningKey};
    use crate::validator::PayloadValidator;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use std::time::Duration;

    #[derive(Default)]
    struct MockLedger {
        entries: RwLock<HashMap<String, LedgerEntry>>,
    }

    #[async_trait]
    impl LedgerStorage for MockLedger {
        async fn get(&self, key: &str) -> AuthResult<Option<LedgerEntry>> {
            Ok(self.entries.read().unwrap().get(key).copied())
        }

        async fn add(&self, key: &str, entry: LedgerEntry, _ttl_minutes: u64) -> AuthResult<bool> {
            self.entries.write().unwrap().insert(key.to_string(), entry);
            Ok(true)
        }

        async fn forever(&self, key: &str, entry: LedgerEntry) -> AuthResult<bool> {
            self.entries.write().unwrap().insert(key.to_string(), entry);
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

    struct User {
        id: i64,
    }

    impl JwtSubject for User {
        fn jwt_identifier(&self) -> ClaimValue {
            ClaimValue::from(self.id)
        }

        fn jwt_custom_claims(&self) -> ClaimMap {
            json!({"role": "admin"}).as_object().cloned().unwrap_or_default()
        }
    }

    fn auth() -> JwtAuth {
        let signer =
            JwtSigner::new(SigningKey::from_secret(SigningAlgorithm::HS256, b"secret").unwrap());
        let payload_factory = PayloadFactory::new(
            ClaimFactory::new("https://issuer.test").with_ttl(Some(Duration::from_secs(3600))),
            PayloadValidator::new(),
        );
        let blacklist = Blacklist::new(Arc::new(MockLedger::default()));
        let manager = TokenManager::new(Arc::new(signer), blacklist, payload_factory);
        JwtAuth::new(Arc::new(manager))
    }

    #[tokio::test]
    async fn test_from_subject() {
        let mut auth = auth();
        auth.add_claim("scope", "read");

        let token = auth.from_subject(&User { id: 7 }).unwrap();
        auth.set_token(token.as_str()).unwrap();

        let payload = auth.payload().await.unwrap();
        assert!(payload.matches(&[("sub", 7)]));
        assert!(payload.matches(&[("role", "admin"), ("scope", "read")]));
    }

    #[tokio::test]
    async fn test_token_required() {
        let mut auth = auth();
        let err = auth.payload().await.unwrap_err();
        assert_eq!(err.to_string(), "A token is required");
        assert!(auth.invalidate(false).await.is_err());
        assert!(auth.refresh(false, false).await.is_err());
        assert!(!auth.check().await);
    }

    #[tokio::test]
    async fn test_set_token_validates_shape() {
        let mut auth = auth();
        assert!(matches!(
            auth.set_token("not-a-token"),
            Err(AuthError::TokenInvalid { .. })
        ));
        assert!(auth.token().is_none());
    }

    #[tokio::test]
    async fn test_check_and_invalidate() {
        let mut auth = auth();
        let token = auth.from_subject(&User { id: 1 }).unwrap();
        auth.set_token(token.into_string()).unwrap();

        assert!(auth.check().await);
        assert!(auth.check().await);

        assert!(auth.invalidate(false).await.unwrap());
        assert!(!auth.check().await);
        assert!(matches!(
            auth.check_or_fail().await,
            Err(AuthError::TokenBlacklisted)
        ));
    }

    #[tokio::test]
    async fn test_refresh_returns_successor() {
        let mut auth = auth();
        let token = auth.from_subject(&User { id: 1 }).unwrap();
        auth.set_token(token.as_str()).unwrap();

        let successor = auth.refresh(false, false).await.unwrap();
        assert_ne!(successor, token);
        assert_eq!(auth.token(), Some(&token));

        auth.unset_token().set_token(successor.as_str()).unwrap();
        assert!(auth.check().await);
    }
}
