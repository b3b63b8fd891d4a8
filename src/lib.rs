//! location-picker: the UI-agnostic core of a map location picker
//!
//! A picker lets a user choose a place by typing an address, dragging a pin or
//! jumping to their current position. This crate holds the logic behind it;
//! the host supplies the map, the list and the buttons through
//! `session::PickerDisplay`.
//!
//! ## Features
//!
//! - Debounced search-as-you-type with stale-result suppression
//! - Bounded, persistent, de-duplicated search history
//! - Current-location fan-out that only runs the position source while needed
//! - Reverse geocoding of dropped pins, with newer drags superseding older ones
//! - Nominatim and IP-geolocation backends, plus a CLI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use location_picker::config::PickerOptions;
//! use location_picker::geo::{get_geocoder, NoLocationSource};
//! use location_picker::history::HistoryStore;
//! use location_picker::session::{Collaborators, LocationPickerSession, PickerDisplay};
//! use location_picker::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn demo(display: Box<dyn PickerDisplay>) -> location_picker::Result<()> {
//! let backend = Arc::new(get_geocoder()?);
//! let collaborators = Collaborators {
//!     search_provider: Arc::clone(&backend),
//!     geocoder: backend,
//!     location_source: Box::new(NoLocationSource),
//!     history: HistoryStore::load(Box::new(MemoryStore::new()), 20)?,
//!     display,
//! };
//!
//! let mut session = LocationPickerSession::new(PickerOptions::default(), collaborators, |picked| {
//!     println!("picked: {:?}", picked);
//! });
//! session.start();
//! session.search_text_changed("Eiffel Tower");
//! while !session.is_closed() {
//!     session.process_next().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod geo;
pub mod history;
pub mod location;
pub mod search;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use broker::CurrentLocationBroker;
pub use config::{Config, PickerOptions};
pub use coord::{Coordinates, Region};
pub use error::{Error, Result};
pub use history::HistoryStore;
pub use location::Location;
pub use search::{SearchCoordinator, SearchResultSet};
pub use session::{LocationPickerSession, PickerDisplay, PickerState};
