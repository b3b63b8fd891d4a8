//! Terminal rendering for picker sessions
//!
//! The CLI has no map, so map movements and pins only go to the debug log.
//! Result sets are kept for the command to print once the search settles.

use crate::coord::Region;
use crate::error::Result;
use crate::location::Location;
use crate::search::SearchResultSet;
use crate::session::{PickerChrome, PickerDisplay};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// What the session last put on screen
#[derive(Debug, Default)]
pub struct Screen {
    pub results: Option<SearchResultSet>,
    /// Number of result sets shown so far
    pub updates: usize,
    pub notices: Vec<String>,
    pub history_label: String,
}

impl Screen {
    /// True once a search has produced its final rows
    ///
    /// Submitting text first shows an empty live set, so live results count
    /// only from the second update on. History is shown right away.
    pub fn settled(&self) -> bool {
        self.results.as_ref().is_some_and(|r| r.is_history) || self.updates > 1
    }
}

pub struct TerminalDisplay {
    screen: Rc<RefCell<Screen>>,
}

impl TerminalDisplay {
    pub fn new() -> (Self, Rc<RefCell<Screen>>) {
        let screen = Rc::new(RefCell::new(Screen::default()));
        (
            Self {
                screen: Rc::clone(&screen),
            },
            screen,
        )
    }
}

impl PickerDisplay for TerminalDisplay {
    fn display(&mut self, results: &SearchResultSet) {
        let mut screen = self.screen.borrow_mut();
        screen.results = Some(results.clone());
        screen.updates += 1;
    }

    fn show_annotation(&mut self, location: Option<&Location>) {
        match location {
            Some(l) => debug!(location = %l.title(), "pin placed"),
            None => debug!("pin removed"),
        }
    }

    fn center_map(&mut self, region: Region, animated: bool) {
        debug!(center = %region.center, animated, "map centered");
    }

    fn set_confirm_enabled(&mut self, enabled: bool) {
        debug!(enabled, "confirm button");
    }

    fn show_notice(&mut self, message: &str) {
        eprintln!("Warning: {}", message);
        self.screen.borrow_mut().notices.push(message.to_string());
    }

    fn apply_chrome(&mut self, chrome: &PickerChrome) {
        self.screen.borrow_mut().history_label = chrome.history_label.clone();
    }
}

/// Multi-line text block for one location
pub fn format_location(location: &Location) -> String {
    let mut out = location.title();
    if let Some(address) = &location.address {
        if location.name.is_some() && location.name.as_ref() != Some(address) {
            out.push_str(&format!("\n    {}", address));
        }
    }
    out.push_str(&format!(
        "\n    ({:.6}, {:.6})",
        location.coordinates.lat, location.coordinates.lng
    ));
    out
}

/// Print a result list, numbered from 1
pub fn print_results(results: &SearchResultSet, history_label: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&results.locations)?);
        return Ok(());
    }

    if results.locations.is_empty() {
        if results.is_history {
            println!("No search history.");
        } else {
            println!("No results.");
        }
        return Ok(());
    }

    if results.is_history {
        println!("{}:\n", history_label);
    }
    for (i, location) in results.locations.iter().enumerate() {
        println!("  {}. {}\n", i + 1, format_location(location));
    }

    Ok(())
}

/// Print the location a session completed with
pub fn print_picked(location: &Location, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(location)?);
    } else {
        println!("{}", format_location(location));
    }
    Ok(())
}
