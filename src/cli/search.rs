//! Search command handler
//!
//! Runs a search through a picker session and prints the results, or picks
//! one of them and records it in the search history.

use super::display::{print_picked, print_results, TerminalDisplay};
use super::open_session;
use crate::config::Config;
use crate::constants::api::LOCATION_TIMEOUT_SECS;
use crate::error::{Error, Result};
use crate::geo::ip_location::IpLocationSource;
use crate::geo::{get_ip_locator, LocationSource, NoLocationSource};
use clap::Args;
use std::time::Duration;
use tokio::sync::mpsc;

/// Search command arguments
#[derive(Args)]
pub struct SearchArgs {
    /// Search text; an empty string lists the search history
    pub query: String,

    /// Pick the Nth result (1-based) and save it to history
    #[arg(long, short = 'p')]
    pub pick: Option<usize>,

    /// Bias results towards the current location (IP geolocation)
    #[arg(long)]
    pub here: bool,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the search command
pub async fn run(args: SearchArgs) -> Result<()> {
    let config = Config::load()?;

    let mut options = config.picker.clone();
    options.use_current_location_as_hint |= args.here;
    options.show_current_location_initially = false;
    options.select_current_location_initially = false;

    let (updates_tx, mut updates) = mpsc::unbounded_channel();
    let source: Box<dyn LocationSource> = if options.use_current_location_as_hint {
        Box::new(IpLocationSource::new(get_ip_locator(), updates_tx))
    } else {
        Box::new(NoLocationSource)
    };

    let (display, screen) = TerminalDisplay::new();
    let (mut session, picked) = open_session(&config, options, source, display)?;
    session.start();

    if session.options().use_current_location_as_hint {
        let wait = Duration::from_secs(LOCATION_TIMEOUT_SECS);
        match tokio::time::timeout(wait, updates.recv()).await {
            Ok(Some(coordinates)) => {
                eprintln!("Searching near {}", coordinates);
                session.location_updated(coordinates);
            }
            _ => eprintln!("Current location unavailable, searching without it"),
        }
    }

    session.search_text_changed(&args.query);
    while !screen.borrow().settled() {
        tokio::select! {
            result = session.process_next() => result?,
            Some(coordinates) = updates.recv() => session.location_updated(coordinates),
        }
    }

    let results = screen.borrow().results.clone().unwrap_or_default();

    let Some(n) = args.pick else {
        session.cancel();
        let label = screen.borrow().history_label.clone();
        return print_results(&results, &label, args.json);
    };

    let location = n
        .checked_sub(1)
        .and_then(|i| results.locations.get(i))
        .cloned()
        .ok_or_else(|| {
            Error::Config(format!(
                "No result #{} ({} results)",
                n,
                results.locations.len()
            ))
        })?;

    session.pick_result(location);
    session.confirm().await?;

    let location = picked
        .borrow_mut()
        .take()
        .ok_or_else(|| Error::SearchFailed("nothing was picked".to_string()))?;
    print_picked(&location, args.json)
}
