mod app;
mod cli;
mod commands;
mod config;
mod ledger;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;

use app::App;
use cli::{Cli, Commands, LedgerCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Key generation needs no configuration
    if let Commands::Keygen(args) = &cli.command {
        return commands::keygen::keygen(args);
    }

    let cfg = config::load_config(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&cfg.logging.level);
    logging::init_tracing(level);

    let app = App::new(&cfg)?;
    let manager = &app.manager;

    match &cli.command {
        Commands::Issue(args) => commands::token::issue(manager, args)?,
        Commands::Decode(args) => commands::token::decode(manager, args).await?,
        Commands::Check(args) => commands::token::check(manager, args).await?,
        Commands::Refresh(args) => commands::token::refresh(manager, args).await?,
        Commands::Invalidate(args) => commands::token::invalidate(manager, args).await?,
        Commands::Ledger(args) => match &args.command {
            LedgerCommands::Show => commands::ledger::show(&app.ledger).await?,
            LedgerCommands::Clear => commands::ledger::clear(&app.ledger).await?,
        },
        Commands::Config => print!("{}", config::render(&cfg)?),
        Commands::Keygen(args) => commands::keygen::keygen(args)?,
    }

    Ok(())
}
