use anyhow::{Context, Result};
use colored::Colorize;
use serde_json::Value;
use warden_auth::{ClaimsBuilder, Payload, Token, TokenManager};

use crate::cli::{DecodeArgs, InvalidateArgs, IssueArgs, RefreshArgs, TokenArgs};
use crate::output::{print_field, print_json, print_success};

pub fn issue(manager: &TokenManager, args: &IssueArgs) -> Result<()> {
    let token = issue_token(manager, args)?;
    println!("{token}");
    Ok(())
}

pub async fn decode(manager: &TokenManager, args: &DecodeArgs) -> Result<()> {
    let token = parse_token(&args.token)?;
    let payload = manager.decode(&token, !args.skip_ledger).await?;
    print_json(&Value::Object(payload.to_map()))
}

pub async fn check(manager: &TokenManager, args: &TokenArgs) -> Result<()> {
    let token = parse_token(args)?;
    let payload = manager
        .decode(&token, true)
        .await
        .context("Token is not valid")?;

    print_success("Token is valid");
    print_summary(&payload);
    Ok(())
}

pub async fn refresh(manager: &TokenManager, args: &RefreshArgs) -> Result<()> {
    let token = parse_token(&args.token)?;
    let mut claims = parse_claims(&args.claims)?;
    let successor = manager
        .refresh(&token, &mut claims, args.forever, true)
        .await?;
    println!("{successor}");
    Ok(())
}

pub async fn invalidate(manager: &TokenManager, args: &InvalidateArgs) -> Result<()> {
    let token = parse_token(&args.token)?;
    manager.invalidate(&token, args.forever).await?;

    if args.forever {
        print_success("Token revoked permanently");
    } else {
        print_success("Token revoked");
    }
    Ok(())
}

fn issue_token(manager: &TokenManager, args: &IssueArgs) -> Result<Token> {
    let mut claims = parse_claims(&args.claims)?;
    claims.add_claim("sub", parse_value(&args.subject));

    let payload = manager.payload_factory().make(&mut claims, false)?;
    Ok(manager.encode(&payload)?)
}

fn parse_token(args: &TokenArgs) -> Result<Token> {
    Ok(Token::new(args.token.trim())?)
}

/// Parses `key=value` pairs into claims.
fn parse_claims(pairs: &[String]) -> Result<ClaimsBuilder> {
    let mut claims = ClaimsBuilder::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Invalid claim '{pair}', expected KEY=VALUE"))?;
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid claim '{pair}': empty name");
        }
        claims.add_claim(name, parse_value(value));
    }
    Ok(claims)
}

/// JSON when it parses, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_summary(payload: &Payload) {
    if let Some(sub) = payload.subject() {
        print_field("Subject", &sub.to_string());
    }
    if let Some(jti) = payload.jwt_id() {
        print_field("Token id", jti);
    }
    match payload.expiration() {
        Some(exp) => print_field("Expires", &exp.to_string()),
        None => print_field("Expires", &"never".yellow().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use warden_auth::{AuthConfig, AuthError, ClaimValue};
    use warden_auth_memory::InMemoryLedgerStorage;

    fn manager() -> TokenManager {
        let mut config = AuthConfig::default();
        config.signing.secret = Some("cli-secret".to_string());
        TokenManager::from_config(&config, Arc::new(InMemoryLedgerStorage::new())).unwrap()
    }

    fn token_args(token: &Token) -> TokenArgs {
        TokenArgs {
            token: token.as_str().to_string(),
        }
    }

    #[test]
    fn test_parse_claims() {
        let claims = parse_claims(&[
            "role=admin".to_string(),
            "level=3".to_string(),
            "tags=[\"a\",\"b\"]".to_string(),
        ])
        .unwrap();

        assert_eq!(claims.get("role"), Some(&ClaimValue::from("admin")));
        assert_eq!(claims.get("level"), Some(&ClaimValue::Integer(3)));
        assert!(matches!(claims.get("tags"), Some(ClaimValue::Structured(_))));
    }

    #[test]
    fn test_parse_claims_rejects_malformed_pairs() {
        assert!(parse_claims(&["role".to_string()]).is_err());
        assert!(parse_claims(&["=admin".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_issue_then_decode() {
        let manager = manager();
        let args = IssueArgs {
            subject: "42".to_string(),
            claims: vec!["role=admin".to_string()],
        };

        let token = issue_token(&manager, &args).unwrap();
        let payload = manager.decode(&token, true).await.unwrap();
        assert!(payload.matches(&[("sub", 42)]));
        assert!(payload.matches(&[("role", "admin")]));
    }

    #[tokio::test]
    async fn test_invalidate_then_check_fails() {
        let manager = manager();
        let args = IssueArgs {
            subject: "alice".to_string(),
            claims: Vec::new(),
        };
        let token = issue_token(&manager, &args).unwrap();

        check(&manager, &token_args(&token)).await.unwrap();

        let revoke = InvalidateArgs {
            token: token_args(&token),
            forever: false,
        };
        invalidate(&manager, &revoke).await.unwrap();

        let err = check(&manager, &token_args(&token)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuthError>(),
            Some(AuthError::TokenBlacklisted)
        ));
    }

    #[test]
    fn test_parse_token_rejects_garbage() {
        let args = TokenArgs {
            token: "garbage".to_string(),
        };
        assert!(parse_token(&args).is_err());
    }
}
