//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions. `search` and
//! `reverse` drive a real `LocationPickerSession` with a terminal display.

pub mod config;
pub mod display;
pub mod history;
pub mod reverse;
pub mod search;

use crate::config::{Config, PickerOptions};
use crate::error::Result;
use crate::geo::nominatim::NominatimBackend;
use crate::geo::LocationSource;
use crate::history::HistoryStore;
use crate::location::Location;
use crate::session::{Collaborators, LocationPickerSession};
use crate::store::FileStore;
use clap::{Parser, Subcommand};
use display::TerminalDisplay;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Search for places and pick a location
#[derive(Parser)]
#[command(name = "location-picker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for a place, optionally picking a result
    Search(search::SearchArgs),

    /// Resolve a coordinate to a place
    Reverse(reverse::ReverseArgs),

    /// View and manage search history
    History(history::HistoryArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => search::run(args).await,
        Commands::Reverse(args) => reverse::run(args).await,
        Commands::History(args) => history::run(args),
        Commands::Config(args) => config::run(args),
    }
}

pub(crate) type PickerSession = LocationPickerSession<NominatimBackend, NominatimBackend>;

/// Where the session's completion lands
pub(crate) type Picked = Rc<RefCell<Option<Location>>>;

/// Open the history file for the configured capacity
pub(crate) fn open_history(config: &Config) -> Result<HistoryStore> {
    HistoryStore::load(
        Box::new(FileStore::open_default()?),
        config.picker.history_capacity,
    )
}

/// Build a session backed by Nominatim and the on-disk history
pub(crate) fn open_session(
    config: &Config,
    options: PickerOptions,
    location_source: Box<dyn LocationSource>,
    display: TerminalDisplay,
) -> Result<(PickerSession, Picked)> {
    let backend = Arc::new(NominatimBackend::with_options(
        &config.geocoder.base_url,
        &config.geocoder.user_agent,
        config.search.result_limit,
    )?);

    let collaborators = Collaborators {
        search_provider: Arc::clone(&backend),
        geocoder: backend,
        location_source,
        history: open_history(config)?,
        display: Box::new(display),
    };

    let picked: Picked = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&picked);
    let session = LocationPickerSession::new(options, collaborators, move |location| {
        *sink.borrow_mut() = location;
    })
    .with_debounce(config.search.debounce());

    Ok((session, picked))
}
