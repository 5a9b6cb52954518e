use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Issue, check, refresh and revoke signed tokens")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file (defaults to ./warden.toml)
    #[arg(short, long, global = true, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a token for a subject
    Issue(IssueArgs),
    /// Verify a token and print its claims
    Decode(DecodeArgs),
    /// Check whether a token is valid
    Check(TokenArgs),
    /// Revoke a token and print its successor
    Refresh(RefreshArgs),
    /// Revoke a token
    Invalidate(InvalidateArgs),
    /// Inspect or clear the revocation ledger
    Ledger(LedgerArgs),
    /// Show the effective configuration
    Config,
    /// Generate an asymmetric signing key pair
    Keygen(KeygenArgs),
}

#[derive(clap::Args)]
pub struct IssueArgs {
    /// Subject identifier (the `sub` claim)
    pub subject: String,
    /// Extra claims as key=value pairs; values are parsed as JSON when possible
    #[arg(long = "claim", value_name = "KEY=VALUE")]
    pub claims: Vec<String>,
}

#[derive(clap::Args)]
pub struct TokenArgs {
    /// The token to use
    #[arg(env = "WARDEN_TOKEN")]
    pub token: String,
}

#[derive(clap::Args)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Skip the revocation ledger lookup
    #[arg(long)]
    pub skip_ledger: bool,
}

#[derive(clap::Args)]
pub struct RefreshArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Revoke the old token permanently instead of after the grace period
    #[arg(long)]
    pub forever: bool,
    /// Extra claims for the successor as key=value pairs
    #[arg(long = "claim", value_name = "KEY=VALUE")]
    pub claims: Vec<String>,
}

#[derive(clap::Args)]
pub struct InvalidateArgs {
    #[command(flatten)]
    pub token: TokenArgs,
    /// Revoke permanently, ignoring the grace period
    #[arg(long)]
    pub forever: bool,
}

#[derive(clap::Args)]
pub struct KeygenArgs {
    /// Signing algorithm: RS256, RS384 or ES384
    #[arg(short, long, default_value = "ES384")]
    pub algorithm: String,
}

#[derive(clap::Args)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommands,
}

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// List ledger entries
    Show,
    /// Remove every ledger entry
    Clear,
}
