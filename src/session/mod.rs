//! Location picker session
//!
//! `LocationPickerSession` owns the current selection and wires the search
//! coordinator, reverse geocoding, search history and current-location
//! broker together. The host UI calls the event methods (`search_text_changed`,
//! `select_coordinates`, `confirm`, ...) and keeps `process_next` running so
//! asynchronous results get applied.
//!
//! ```text
//! NoSelection --select--> Resolving --geocoded--> Selected --confirm--> Closed
//!      ^                      |                      |
//!      +------ failure -------+<----- select --------+
//! ```
//!
//! Any state moves to Closed on `cancel`. The completion callback is invoked
//! exactly once: on confirm, on cancel, or when an open session is dropped.

pub mod display;
#[cfg(test)]
mod tests;

pub use display::{PickerChrome, PickerDisplay};

use crate::broker::CurrentLocationBroker;
use crate::config::defaults::DEFAULT_DEBOUNCE_MS;
use crate::config::{ConfirmFallback, PickerOptions};
use crate::constants::geo::SEARCH_HINT_SPAN_DEGREES;
use crate::coord::{Coordinates, Region};
use crate::error::{Error, Result};
use crate::geo::{Geocoder, LocationSource, SearchProvider};
use crate::history::HistoryStore;
use crate::location::Location;
use crate::search::SearchCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    NoSelection,
    Resolving,
    Selected,
    Closed,
}

/// What to do with a current-location fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocationIntent {
    Center { animated: bool },
    SelectIfUnset,
    /// Only needed so the broker records a position for search hints
    Hint,
}

enum SessionEvent {
    Geocoded {
        generation: u64,
        coordinates: Coordinates,
        outcome: Result<Option<Location>>,
    },
    CurrentLocation {
        intent: LocationIntent,
        coordinates: Coordinates,
    },
    InitialAddress(Result<Vec<Location>>),
}

/// The external services a session runs against
pub struct Collaborators<P, G> {
    pub search_provider: Arc<P>,
    pub geocoder: Arc<G>,
    pub location_source: Box<dyn LocationSource>,
    pub history: HistoryStore,
    pub display: Box<dyn PickerDisplay>,
}

/// Receives the picked location, or `None` when the picker was dismissed
pub type Completion = Box<dyn FnOnce(Option<Location>)>;

/// One run of the location picker, from open to confirm or cancel
pub struct LocationPickerSession<P: SearchProvider, G: Geocoder> {
    options: PickerOptions,
    search: SearchCoordinator<P>,
    search_provider: Arc<P>,
    geocoder: Arc<G>,
    history: HistoryStore,
    broker: CurrentLocationBroker,
    display: Box<dyn PickerDisplay>,
    completion: Option<Completion>,
    state: PickerState,
    selected: Option<Location>,
    resolving: Option<Coordinates>,
    map_center: Option<Coordinates>,
    geocode_generation: u64,
    geocode: Option<JoinHandle<()>>,
    initial_lookup: Option<JoinHandle<()>>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
}

impl<P: SearchProvider, G: Geocoder> LocationPickerSession<P, G> {
    pub fn new(
        options: PickerOptions,
        collaborators: Collaborators<P, G>,
        completion: impl FnOnce(Option<Location>) + 'static,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let Collaborators {
            search_provider,
            geocoder,
            location_source,
            history,
            display,
        } = collaborators;

        Self {
            options,
            search: SearchCoordinator::new(
                Arc::clone(&search_provider),
                Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            ),
            search_provider,
            geocoder,
            history,
            broker: CurrentLocationBroker::new(location_source),
            display,
            completion: Some(Box::new(completion)),
            state: PickerState::NoSelection,
            selected: None,
            resolving: None,
            map_center: None,
            geocode_generation: 0,
            geocode: None,
            initial_lookup: None,
            events_tx,
            events_rx,
        }
    }

    /// Use a different search debounce interval
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.search = SearchCoordinator::new(Arc::clone(&self.search_provider), debounce);
        self
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == PickerState::Closed
    }

    pub fn selected_location(&self) -> Option<&Location> {
        self.selected.as_ref()
    }

    pub fn map_center(&self) -> Option<Coordinates> {
        self.map_center
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn options(&self) -> &PickerOptions {
        &self.options
    }

    /// Apply labels and move the map to its initial position
    ///
    /// A preselected location wins, then an initial request (coordinate, or
    /// address looked up through the search provider), then the current
    /// position when configured.
    pub fn start(&mut self) {
        if self.is_closed() {
            return;
        }

        let chrome = PickerChrome::from(&self.options);
        self.display.apply_chrome(&chrome);

        if self.options.use_current_location_as_hint {
            self.request_current_location(LocationIntent::Hint);
        }

        if let Some(location) = self.options.initial_location.clone() {
            self.center_on(location.coordinates, false);
            self.set_selected(location);
            self.display.set_confirm_enabled(false);
        } else if let Some(request) = self.options.initial_request.clone() {
            if let Some(coordinates) = request.coordinates {
                self.center_on(coordinates, false);
            } else if let Some(address) = request.address {
                self.lookup_initial_address(address);
            }
            self.display.set_confirm_enabled(false);
        } else if self.options.show_current_location_initially
            || self.options.select_current_location_initially
        {
            if self.options.select_current_location_initially {
                self.request_current_location(LocationIntent::SelectIfUnset);
            }
            self.request_current_location(LocationIntent::Center { animated: false });
        }
    }

    /// The search field changed
    ///
    /// Emptying the field also drops the current selection.
    pub fn search_text_changed(&mut self, text: &str) {
        if self.is_closed() {
            return;
        }

        if text.is_empty() {
            self.clear_selection();
        }

        if self.options.use_current_location_as_hint {
            let hint = self.broker.last_known().map(|c| {
                Region::with_span(c, SEARCH_HINT_SPAN_DEGREES, SEARCH_HINT_SPAN_DEGREES)
            });
            self.search.set_hint(hint);
        }

        let history = self.history.history();
        let results = self.search.submit(text, &history);
        self.display.display(&results);
    }

    /// The user chose a row from the search results or history
    ///
    /// Search results are already resolved, so no reverse geocode is needed.
    pub fn pick_result(&mut self, location: Location) {
        if self.is_closed() {
            return;
        }

        self.search.cancel();
        self.cancel_geocode();
        self.center_on(location.coordinates, true);

        if let Err(e) = self.history.add_to_history(location.clone()) {
            warn!("failed to save search history: {}", e);
        }
        self.set_selected(location);
    }

    /// The user dropped or dragged the pin to `coordinates`
    pub fn select_coordinates(&mut self, coordinates: Coordinates) {
        if self.is_closed() {
            return;
        }
        if let Err(e) = coordinates.validate() {
            warn!("ignoring selection: {}", e);
            return;
        }

        self.selected = None;
        self.state = PickerState::Resolving;
        self.resolving = Some(coordinates);
        self.show_annotation(Some(&Location::new(coordinates)));
        self.start_geocode(coordinates);
    }

    /// The user long-pressed the map at `coordinates`
    ///
    /// Dropping a pin needs visible pins; without annotations the press is
    /// ignored. Map drags go through `map_region_changed` instead.
    pub fn pin_dropped(&mut self, coordinates: Coordinates) {
        if !self.options.show_annotations {
            debug!("pin drop ignored, annotations are hidden");
            return;
        }
        self.select_coordinates(coordinates);
    }

    /// The visible map region moved
    ///
    /// A move the user made by dragging selects the new center.
    pub fn map_region_changed(&mut self, center: Coordinates, user_initiated: bool) {
        if self.is_closed() {
            return;
        }

        self.map_center = Some(center);
        if user_initiated {
            self.select_coordinates(center);
        }
    }

    /// The "current location" button was tapped
    pub fn current_location_pressed(&mut self) {
        if self.is_closed() || !self.options.show_current_location_button {
            return;
        }
        self.request_current_location(LocationIntent::Center { animated: true });
    }

    /// A position update arrived from the location source
    pub fn location_updated(&mut self, coordinates: Coordinates) {
        if self.is_closed() {
            return;
        }
        self.broker.handle_update(coordinates);
    }

    /// Finish with the current selection
    ///
    /// Without a selection, the pending pin or the fallback coordinate is
    /// reverse geocoded first and the completion receives that result.
    pub async fn confirm(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }

        if self.state == PickerState::Selected {
            let location = self.selected.clone();
            self.finish(location);
            return Ok(());
        }

        let fallback = match self.options.confirm_fallback {
            ConfirmFallback::MapCenter => {
                self.map_center.or_else(|| self.options.initial_coordinates())
            }
            ConfirmFallback::InitialLocation => {
                self.options.initial_coordinates().or(self.map_center)
            }
        };

        let Some(coordinates) = self.resolving.or(fallback) else {
            warn!("confirm without selection or map position");
            self.finish(None);
            return Ok(());
        };

        self.cancel_geocode();
        self.state = PickerState::Resolving;
        self.resolving = Some(coordinates);
        let generation = self.geocode_generation;

        let outcome = self.geocoder.reverse_geocode(coordinates).await;
        self.apply_geocode(generation, coordinates, outcome);

        let location = self.selected.clone();
        self.finish(location);
        Ok(())
    }

    /// Dismiss without a selection
    pub fn cancel(&mut self) {
        if self.is_closed() {
            return;
        }
        self.finish(None);
    }

    /// Wait for the next asynchronous result and apply it
    pub async fn process_next(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }

        tokio::select! {
            Some(event) = self.search.next_event() => {
                if let Some(results) = self.search.handle_event(event) {
                    self.display.display(&results);
                }
            }
            Some(event) = self.events_rx.recv() => self.apply_event(event),
            else => return Err(Error::SessionClosed),
        }

        Ok(())
    }

    fn apply_event(&mut self, event: SessionEvent) {
        if self.is_closed() {
            return;
        }

        match event {
            SessionEvent::Geocoded {
                generation,
                coordinates,
                outcome,
            } => self.apply_geocode(generation, coordinates, outcome),
            SessionEvent::CurrentLocation {
                intent,
                coordinates,
            } => match intent {
                LocationIntent::Center { animated } => self.center_on(coordinates, animated),
                LocationIntent::SelectIfUnset => {
                    if self.state == PickerState::NoSelection {
                        self.select_coordinates(coordinates);
                    }
                }
                LocationIntent::Hint => {}
            },
            SessionEvent::InitialAddress(outcome) => {
                self.initial_lookup = None;
                match outcome {
                    Ok(locations) => match locations.first() {
                        Some(first) if self.state == PickerState::NoSelection => {
                            self.center_on(first.coordinates, false);
                        }
                        Some(_) => debug!("selection made before initial address resolved"),
                        None => warn!("initial address not found"),
                    },
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!("initial address lookup failed: {}", e),
                }
            }
        }
    }

    fn apply_geocode(
        &mut self,
        generation: u64,
        coordinates: Coordinates,
        outcome: Result<Option<Location>>,
    ) {
        if generation != self.geocode_generation {
            debug!(generation, current = self.geocode_generation, "dropping stale geocode");
            return;
        }
        self.geocode = None;
        self.resolving = None;

        match outcome {
            Ok(resolved) => {
                let location = resolved
                    .map(|l| l.at(coordinates))
                    .unwrap_or_else(|| Location::new(coordinates));
                self.set_selected(location);
            }
            Err(e) if e.is_cancelled() => {
                debug!("geocode cancelled");
                self.state = PickerState::NoSelection;
                self.show_annotation(None);
            }
            Err(e) => {
                warn!("reverse geocode failed: {}", e);
                self.state = PickerState::NoSelection;
                self.display.show_notice(&e.to_string());
                self.show_annotation(None);
            }
        }
    }

    fn clear_selection(&mut self) {
        self.cancel_geocode();
        self.selected = None;
        self.resolving = None;
        self.state = PickerState::NoSelection;
        self.show_annotation(None);
        self.display.set_confirm_enabled(false);
    }

    fn set_selected(&mut self, location: Location) {
        info!(location = %location.title(), "location selected");
        self.display.set_search_text(&location.title());
        self.show_annotation(Some(&location));
        self.display.set_confirm_enabled(true);
        self.selected = Some(location);
        self.resolving = None;
        self.state = PickerState::Selected;
    }

    fn show_annotation(&mut self, location: Option<&Location>) {
        if self.options.show_annotations {
            self.display.show_annotation(location);
        }
    }

    fn center_on(&mut self, coordinates: Coordinates, animated: bool) {
        self.map_center = Some(coordinates);
        let region = Region::with_distance(coordinates, self.options.result_region_distance);
        self.display.center_map(region, animated);
    }

    fn request_current_location(&mut self, intent: LocationIntent) {
        let tx = self.events_tx.clone();
        self.broker.request(true, move |coordinates| {
            let _ = tx.send(SessionEvent::CurrentLocation {
                intent,
                coordinates,
            });
        });
    }

    fn start_geocode(&mut self, coordinates: Coordinates) {
        self.cancel_geocode();
        let generation = self.geocode_generation;
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.events_tx.clone();

        self.geocode = Some(tokio::spawn(async move {
            let outcome = geocoder.reverse_geocode(coordinates).await;
            let _ = tx.send(SessionEvent::Geocoded {
                generation,
                coordinates,
                outcome,
            });
        }));
    }

    fn cancel_geocode(&mut self) {
        if let Some(task) = self.geocode.take() {
            task.abort();
        }
        self.geocode_generation += 1;
    }

    fn lookup_initial_address(&mut self, address: String) {
        let provider = Arc::clone(&self.search_provider);
        let tx = self.events_tx.clone();

        self.initial_lookup = Some(tokio::spawn(async move {
            let outcome = provider.lookup(&address, None).await;
            let _ = tx.send(SessionEvent::InitialAddress(outcome));
        }));
    }

    fn finish(&mut self, location: Option<Location>) {
        self.search.cancel();
        self.cancel_geocode();
        if let Some(task) = self.initial_lookup.take() {
            task.abort();
        }
        self.broker.stop();
        self.state = PickerState::Closed;

        if let Some(completion) = self.completion.take() {
            match &location {
                Some(l) => info!(location = %l.title(), "picker confirmed"),
                None => info!("picker dismissed"),
            }
            completion(location);
        }
    }
}

impl<P: SearchProvider, G: Geocoder> Drop for LocationPickerSession<P, G> {
    fn drop(&mut self) {
        if self.completion.is_some() {
            self.finish(None);
        }
    }
}
