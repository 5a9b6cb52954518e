use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use warden_auth::AuthConfig;

const DEFAULT_CONFIG_FILE: &str = "warden.toml";

/// Everything the `warden` tool reads from `warden.toml` and the environment.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    pub auth: AuthConfig,
    pub ledger: LedgerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// JSON file, shared between invocations
    #[default]
    File,
    /// Process memory. Every `warden` invocation starts empty and forgets
    /// its revocations on exit, so this only suits tests and dry runs.
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub backend: LedgerBackend,
    /// Ledger file, defaults to ~/.warden/ledger.json
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(dirs::home_dir()
                .context("Cannot determine home directory")?
                .join(".warden")
                .join("ledger.json")),
        }
    }
}

/// Loads the configuration file (if present) overlaid by environment
/// variables, e.g. `WARDEN__AUTH__SIGNING__SECRET=...`.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let mut builder = Config::builder();

    match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("Config file not found: {}", p.display());
            }
            builder = builder.add_source(File::from(p.to_path_buf()));
        }
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                builder = builder.add_source(File::from(default_path));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("WARDEN")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg: CliConfig = builder
        .build()
        .context("config build error")?
        .try_deserialize()
        .context("config deserialize error")?;

    cfg.auth.validate().context("invalid auth configuration")?;
    Ok(cfg)
}

/// Configuration as TOML with secrets masked.
pub fn render(cfg: &CliConfig) -> Result<String> {
    let mut masked = cfg.clone();
    let signing = &mut masked.auth.signing;
    for secret in [&mut signing.secret, &mut signing.private_key] {
        if secret.is_some() {
            *secret = Some("********".to_string());
        }
    }
    Ok(toml::to_string_pretty(&masked)?)
}
