use anyhow::{Context, Result};
use serde::Serialize;
use warden_auth::{KeyPair, SigningAlgorithm, SigningConfig};

use crate::cli::KeygenArgs;

#[derive(Serialize)]
struct AuthSection {
    signing: SigningConfig,
}

#[derive(Serialize)]
struct KeygenOutput {
    auth: AuthSection,
}

/// Prints a fresh key pair as a `warden.toml` fragment.
pub fn keygen(args: &KeygenArgs) -> Result<()> {
    print!("{}", render_key_pair(&args.algorithm)?);
    Ok(())
}

fn render_key_pair(algorithm: &str) -> Result<String> {
    let algorithm: SigningAlgorithm = algorithm.parse()?;
    let pair = KeyPair::generate(algorithm)
        .with_context(|| format!("Cannot generate a {algorithm} key pair"))?;

    let output = KeygenOutput {
        auth: AuthSection {
            signing: SigningConfig {
                algorithm: algorithm.to_string(),
                secret: None,
                private_key: Some(pair.private_pem().to_string()),
                public_key: Some(pair.public_pem().to_string()),
            },
        },
    };
    Ok(toml::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_auth::{JwtSigner, Signer};

    #[test]
    fn test_rendered_pair_loads_as_config() {
        let rendered = render_key_pair("ES384").unwrap();
        assert!(rendered.contains("[auth.signing]"));

        let parsed: toml::Table = toml::from_str(&rendered).unwrap();
        let signing: SigningConfig = parsed["auth"]["signing"].clone().try_into().unwrap();
        assert_eq!(signing.algorithm, "ES384");

        let signer = JwtSigner::from_config(&signing).unwrap();
        let claims = serde_json::json!({"sub": 1}).as_object().cloned().unwrap();
        let token = signer.encode(&claims).unwrap();
        assert_eq!(signer.decode(&token).unwrap(), claims);
    }

    #[test]
    fn test_hmac_has_no_key_pair() {
        assert!(render_key_pair("HS256").is_err());
        assert!(render_key_pair("none").is_err());
    }
}
