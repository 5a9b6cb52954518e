use anyhow::Result;
use colored::Colorize;
use warden_auth::LedgerEntry;

use crate::app::Ledger;
use crate::output::{print_field, print_success};

pub async fn show(ledger: &Ledger) -> Result<()> {
    match ledger {
        Ledger::File(file) => {
            print_field("Ledger", &file.path().display().to_string());
            let entries = file.entries().await?;
            if entries.is_empty() {
                println!("No revoked tokens.");
                return Ok(());
            }
            for (key, stored) in entries {
                let status = match stored.entry {
                    LedgerEntry::Forever => "forever".red().to_string(),
                    LedgerEntry::ValidUntil(until) => format!("valid until {until}"),
                };
                println!("{}  {}", key.cyan(), status);
            }
        }
        Ledger::Memory(memory) => {
            print_field("Ledger", "memory");
            println!("{} entries", memory.len());
            println!(
                "{}",
                "The memory ledger is empty at the start of every run; use the file backend to keep revocations."
                    .yellow()
            );
        }
    }
    Ok(())
}

pub async fn clear(ledger: &Ledger) -> Result<()> {
    ledger.storage().flush().await?;
    print_success("Ledger cleared");
    Ok(())
}
