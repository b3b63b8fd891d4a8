//! Reverse command handler
//!
//! Resolves a coordinate the way the picker does when the user confirms a
//! map position without choosing a search result.

use super::display::{print_picked, TerminalDisplay};
use super::open_session;
use crate::config::Config;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::NoLocationSource;
use clap::Args;

/// Reverse command arguments
#[derive(Args)]
pub struct ReverseArgs {
    /// Latitude
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the reverse command
pub async fn run(args: ReverseArgs) -> Result<()> {
    let coordinates = Coordinates::new(args.lat, args.lng);
    coordinates.validate()?;

    let config = Config::load()?;
    let mut options = config.picker.clone();
    options.initial_location = None;
    options.initial_request = None;
    options.use_current_location_as_hint = false;
    options.show_current_location_initially = false;
    options.select_current_location_initially = false;

    let (display, screen) = TerminalDisplay::new();
    let (mut session, picked) =
        open_session(&config, options, Box::new(NoLocationSource), display)?;
    session.start();

    session.map_region_changed(coordinates, false);
    session.confirm().await?;

    let Some(location) = picked.borrow_mut().take() else {
        let reason = screen
            .borrow()
            .notices
            .last()
            .cloned()
            .unwrap_or_else(|| format!("nothing found at {}", coordinates));
        return Err(Error::GeocodeFailed(reason));
    };

    print_picked(&location, args.json)
}
