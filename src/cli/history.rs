//! History command handler
//!
//! View and clear the search history picker sessions record.

use super::open_history;
use crate::config::Config;
use crate::error::Result;
use clap::{Args, Subcommand};

/// History command arguments
#[derive(Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: Option<HistoryCommand>,

    /// Number of entries to show (default: 10)
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,
}

/// History subcommands
#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List history entries, most recent first
    List {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },
    /// Clear all history
    Clear,
}

/// Run the history command
pub fn run(args: HistoryArgs) -> Result<()> {
    let config = Config::load()?;
    let command = args.command.unwrap_or(HistoryCommand::List { count: args.count });

    match command {
        HistoryCommand::List { count } => list_history(&config, count),
        HistoryCommand::Clear => clear_history(&config),
    }
}

/// List recent history entries
fn list_history(config: &Config, count: usize) -> Result<()> {
    let history = open_history(config)?;

    if history.is_empty() {
        println!("No search history.");
        return Ok(());
    }

    println!(
        "{} ({} of {}):\n",
        config.picker.history_label,
        count.min(history.len()),
        history.len()
    );

    for entry in history.entries().iter().take(count) {
        let location = &entry.location;
        println!(
            "  {}\n    ({:.6}, {:.6}) | {}\n",
            location.title(),
            location.coordinates.lat,
            location.coordinates.lng,
            entry.added_at.format("%Y-%m-%d %H:%M UTC")
        );
    }

    Ok(())
}

/// Clear all history
fn clear_history(config: &Config) -> Result<()> {
    let mut history = open_history(config)?;
    let count = history.len();

    history.clear()?;

    println!("Cleared {} history entries.", count);
    Ok(())
}
