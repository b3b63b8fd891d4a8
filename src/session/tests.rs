use super::*;
use crate::config::LocationRequest;
use crate::search::SearchResultSet;
use crate::store::MemoryStore;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Mutex;

#[derive(Default)]
struct FakeProvider {
    calls: Mutex<Vec<(String, Option<Region>)>>,
}

impl FakeProvider {
    fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(q, _)| q.clone()).collect()
    }
}

impl SearchProvider for FakeProvider {
    async fn lookup(&self, query: &str, hint: Option<Region>) -> Result<Vec<Location>> {
        self.calls.lock().unwrap().push((query.to_string(), hint));
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(vec![
            Location::new(Coordinates::new(48.8566, 2.3522)).with_name(query),
            Location::new(Coordinates::new(33.66, -95.55)).with_name(format!("{query} (TX)")),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Outcome {
    Found,
    Empty,
    Fail,
    Cancelled,
}

/// Geocoder with per-coordinate delays and outcomes
#[derive(Default)]
struct FakeGeocoder {
    calls: Mutex<Vec<Coordinates>>,
    delays: Mutex<Vec<(Coordinates, Duration)>>,
    outcomes: Mutex<Vec<(Coordinates, Outcome)>>,
}

impl FakeGeocoder {
    fn calls(&self) -> Vec<Coordinates> {
        self.calls.lock().unwrap().clone()
    }

    fn delay(&self, at: Coordinates, delay: Duration) {
        self.delays.lock().unwrap().push((at, delay));
    }

    fn outcome(&self, at: Coordinates, outcome: Outcome) {
        self.outcomes.lock().unwrap().push((at, outcome));
    }
}

fn place_name(coordinates: Coordinates) -> String {
    format!("Place {:.1}", coordinates.lat)
}

impl Geocoder for FakeGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<Location>> {
        self.calls.lock().unwrap().push(coordinates);
        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| *c == coordinates)
            .map(|(_, d)| *d)
            .unwrap_or(Duration::from_millis(10));
        tokio::time::sleep(delay).await;

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| *c == coordinates)
            .map(|(_, o)| *o)
            .unwrap_or(Outcome::Found);

        match outcome {
            // snapped to a nearby building, like a real geocoder would
            Outcome::Found => Ok(Some(
                Location::new(Coordinates::new(coordinates.lat + 0.001, coordinates.lng))
                    .with_name(place_name(coordinates)),
            )),
            Outcome::Empty => Ok(None),
            Outcome::Fail => Err(Error::GeocodeFailed("network unreachable".to_string())),
            Outcome::Cancelled => Err(Error::GeocodeCancelled),
        }
    }
}

#[derive(Default)]
struct DisplayLog {
    results: Vec<SearchResultSet>,
    annotations: Vec<Option<Location>>,
    centers: Vec<(Region, bool)>,
    confirm_enabled: Vec<bool>,
    notices: Vec<String>,
    search_text: Vec<String>,
    chrome: Option<PickerChrome>,
}

struct RecordingDisplay(Rc<RefCell<DisplayLog>>);

impl PickerDisplay for RecordingDisplay {
    fn display(&mut self, results: &SearchResultSet) {
        self.0.borrow_mut().results.push(results.clone());
    }
    fn show_annotation(&mut self, location: Option<&Location>) {
        self.0.borrow_mut().annotations.push(location.cloned());
    }
    fn center_map(&mut self, region: Region, animated: bool) {
        self.0.borrow_mut().centers.push((region, animated));
    }
    fn set_confirm_enabled(&mut self, enabled: bool) {
        self.0.borrow_mut().confirm_enabled.push(enabled);
    }
    fn show_notice(&mut self, message: &str) {
        self.0.borrow_mut().notices.push(message.to_string());
    }
    fn set_search_text(&mut self, text: &str) {
        self.0.borrow_mut().search_text.push(text.to_string());
    }
    fn apply_chrome(&mut self, chrome: &PickerChrome) {
        self.0.borrow_mut().chrome = Some(chrome.clone());
    }
}

#[derive(Default)]
struct SourceLog {
    starts: usize,
    stops: usize,
}

struct FakeSource(Rc<RefCell<SourceLog>>);

impl LocationSource for FakeSource {
    fn start(&mut self) {
        self.0.borrow_mut().starts += 1;
    }
    fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
    }
}

struct Harness {
    session: LocationPickerSession<FakeProvider, FakeGeocoder>,
    provider: Arc<FakeProvider>,
    geocoder: Arc<FakeGeocoder>,
    display: Rc<RefCell<DisplayLog>>,
    source: Rc<RefCell<SourceLog>>,
    completions: Rc<RefCell<Vec<Option<Location>>>>,
}

fn harness(options: PickerOptions) -> Harness {
    let provider = Arc::new(FakeProvider::default());
    let geocoder = Arc::new(FakeGeocoder::default());
    let display = Rc::new(RefCell::new(DisplayLog::default()));
    let source = Rc::new(RefCell::new(SourceLog::default()));
    let completions = Rc::new(RefCell::new(Vec::new()));

    let history = HistoryStore::load(Box::new(MemoryStore::new()), options.history_capacity)
        .unwrap();
    let collaborators = Collaborators {
        search_provider: Arc::clone(&provider),
        geocoder: Arc::clone(&geocoder),
        location_source: Box::new(FakeSource(Rc::clone(&source))),
        history,
        display: Box::new(RecordingDisplay(Rc::clone(&display))),
    };

    let sink = Rc::clone(&completions);
    let session = LocationPickerSession::new(options, collaborators, move |location| {
        sink.borrow_mut().push(location)
    });

    Harness {
        session,
        provider,
        geocoder,
        display,
        source,
        completions,
    }
}

fn annotated_options() -> PickerOptions {
    PickerOptions {
        show_annotations: true,
        show_current_location_initially: false,
        ..PickerOptions::default()
    }
}

/// Pump events until the session leaves `Resolving`
async fn settle(session: &mut LocationPickerSession<FakeProvider, FakeGeocoder>) {
    while session.state() == PickerState::Resolving {
        session.process_next().await.unwrap();
    }
}

const PARIS: Coordinates = Coordinates {
    lat: 48.8566,
    lng: 2.3522,
};
const DNIPRO: Coordinates = Coordinates {
    lat: 48.4647,
    lng: 35.0462,
};

#[tokio::test(start_paused = true)]
async fn test_cancel_completes_with_none_once() {
    let mut h = harness(annotated_options());
    h.session.start();

    h.session.cancel();
    h.session.cancel();
    assert_eq!(h.session.state(), PickerState::Closed);
    drop(h.session);

    assert_eq!(*h.completions.borrow(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn test_drop_without_confirm_completes_with_none() {
    let h = harness(annotated_options());
    drop(h.session);
    assert_eq!(*h.completions.borrow(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn test_select_coordinates_resolves_place() {
    let mut h = harness(annotated_options());
    h.session.select_coordinates(PARIS);

    assert_eq!(h.session.state(), PickerState::Resolving);
    // speculative pin while the geocoder works
    let first_pin = h.display.borrow().annotations[0].clone().unwrap();
    assert_eq!(first_pin.coordinates, PARIS);
    assert!(first_pin.name.is_none());

    settle(&mut h.session).await;

    assert_eq!(h.session.state(), PickerState::Selected);
    let selected = h.session.selected_location().unwrap();
    assert_eq!(selected.name.as_deref(), Some("Place 48.9"));
    // the chosen coordinate wins over the geocoder's snapped one
    assert_eq!(selected.coordinates, PARIS);

    let log = h.display.borrow();
    assert_eq!(log.confirm_enabled.last(), Some(&true));
    assert_eq!(log.search_text.last().map(String::as_str), Some("Place 48.9"));
    assert_eq!(log.annotations.last().unwrap().as_ref(), Some(selected));
}

#[tokio::test(start_paused = true)]
async fn test_empty_geocode_selects_bare_coordinate() {
    let mut h = harness(annotated_options());
    h.geocoder.outcome(PARIS, Outcome::Empty);

    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;

    let selected = h.session.selected_location().unwrap();
    assert_eq!(selected, &Location::new(PARIS));
    assert_eq!(selected.title(), PARIS.to_string());
}

#[tokio::test(start_paused = true)]
async fn test_newer_drag_wins_over_slow_geocode() {
    let mut h = harness(annotated_options());
    h.geocoder.delay(PARIS, Duration::from_secs(1));

    h.session.select_coordinates(PARIS);
    tokio::task::yield_now().await;
    h.session.select_coordinates(DNIPRO);
    settle(&mut h.session).await;

    assert_eq!(h.session.selected_location().unwrap().coordinates, DNIPRO);

    // a result for the superseded drag arriving late changes nothing
    h.session.apply_event(SessionEvent::Geocoded {
        generation: 1,
        coordinates: PARIS,
        outcome: Ok(Some(Location::new(PARIS).with_name("Late"))),
    });
    h.session.apply_event(SessionEvent::Geocoded {
        generation: 1,
        coordinates: PARIS,
        outcome: Err(Error::GeocodeFailed("late failure".to_string())),
    });
    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(h.session.state(), PickerState::Selected);
    assert_eq!(h.session.selected_location().unwrap().coordinates, DNIPRO);
    assert!(h.display.borrow().notices.is_empty());
    assert_eq!(h.geocoder.calls(), vec![PARIS, DNIPRO]);
}

#[tokio::test(start_paused = true)]
async fn test_geocode_failure_shows_notice_and_clears_pin() {
    let mut h = harness(annotated_options());
    h.geocoder.outcome(PARIS, Outcome::Fail);

    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;

    assert_eq!(h.session.state(), PickerState::NoSelection);
    assert!(h.session.selected_location().is_none());
    let log = h.display.borrow();
    assert_eq!(log.notices.len(), 1);
    assert!(log.notices[0].contains("network unreachable"));
    assert_eq!(log.annotations.last(), Some(&None));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_geocode_is_quiet() {
    let mut h = harness(annotated_options());
    h.geocoder.outcome(PARIS, Outcome::Cancelled);

    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;

    assert_eq!(h.session.state(), PickerState::NoSelection);
    assert!(h.display.borrow().notices.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_confirm_without_selection_geocodes_map_center_once() {
    let mut h = harness(annotated_options());
    h.session.map_region_changed(PARIS, false);
    assert_eq!(h.session.state(), PickerState::NoSelection);

    h.session.confirm().await.unwrap();

    assert_eq!(h.geocoder.calls(), vec![PARIS]);
    let completions = h.completions.borrow();
    assert_eq!(completions.len(), 1);
    let picked = completions[0].as_ref().unwrap();
    assert_eq!(picked.coordinates, PARIS);
    assert_eq!(picked.name.as_deref(), Some("Place 48.9"));
    assert_eq!(h.session.state(), PickerState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_confirm_after_selection_skips_geocoding() {
    let mut h = harness(annotated_options());
    h.session.select_coordinates(DNIPRO);
    settle(&mut h.session).await;

    h.session.confirm().await.unwrap();

    assert_eq!(h.geocoder.calls().len(), 1);
    let completions = h.completions.borrow();
    assert_eq!(completions[0].as_ref().unwrap().coordinates, DNIPRO);
}

#[tokio::test(start_paused = true)]
async fn test_confirm_while_resolving_uses_pending_pin() {
    let mut h = harness(annotated_options());
    h.geocoder.delay(DNIPRO, Duration::from_secs(5));
    h.session.map_region_changed(PARIS, false);
    h.session.select_coordinates(DNIPRO);

    h.session.confirm().await.unwrap();

    let completions = h.completions.borrow();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].as_ref().unwrap().coordinates, DNIPRO);
}

#[tokio::test(start_paused = true)]
async fn test_confirm_fallback_to_initial_location() {
    let options = PickerOptions {
        confirm_fallback: ConfirmFallback::InitialLocation,
        initial_request: Some(LocationRequest::coordinates(DNIPRO)),
        ..annotated_options()
    };
    let mut h = harness(options);
    h.session.start();
    h.session.map_region_changed(PARIS, false);

    h.session.confirm().await.unwrap();

    assert_eq!(h.geocoder.calls(), vec![DNIPRO]);
    assert_eq!(
        h.completions.borrow()[0].as_ref().unwrap().coordinates,
        DNIPRO
    );
}

#[tokio::test(start_paused = true)]
async fn test_confirm_with_nothing_completes_with_none() {
    let mut h = harness(annotated_options());
    h.session.confirm().await.unwrap();

    assert!(h.geocoder.calls().is_empty());
    assert_eq!(*h.completions.borrow(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn test_confirm_failure_completes_with_none() {
    let mut h = harness(annotated_options());
    h.geocoder.outcome(PARIS, Outcome::Fail);
    h.session.map_region_changed(PARIS, false);

    h.session.confirm().await.unwrap();

    assert_eq!(*h.completions.borrow(), vec![None]);
    assert_eq!(h.display.borrow().notices.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closed_session_ignores_events() {
    let mut h = harness(annotated_options());
    h.session.cancel();

    h.session.select_coordinates(PARIS);
    h.session.search_text_changed("paris");
    h.session.current_location_pressed();

    assert_eq!(h.session.state(), PickerState::Closed);
    assert!(matches!(
        h.session.process_next().await,
        Err(Error::SessionClosed)
    ));
    assert!(matches!(h.session.confirm().await, Err(Error::SessionClosed)));
    assert!(h.geocoder.calls().is_empty());
    assert_eq!(h.completions.borrow().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_coordinates_ignored() {
    let mut h = harness(annotated_options());
    h.session.select_coordinates(Coordinates::new(123.0, 0.0));

    assert_eq!(h.session.state(), PickerState::NoSelection);
    assert!(h.geocoder.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_search_then_pick_adds_history() {
    let mut h = harness(annotated_options());

    h.session.search_text_changed("par");
    tokio::time::advance(Duration::from_millis(50)).await;
    h.session.search_text_changed("paris");

    while h
        .display
        .borrow()
        .results
        .last()
        .map_or(true, |r| r.locations.is_empty())
    {
        h.session.process_next().await.unwrap();
    }
    assert_eq!(h.provider.queries(), vec!["paris"]);

    let picked = h.display.borrow().results.last().unwrap().locations[1].clone();
    h.session.pick_result(picked.clone());

    assert_eq!(h.session.state(), PickerState::Selected);
    assert_eq!(h.session.selected_location(), Some(&picked));
    assert_eq!(h.session.history().history(), vec![picked.clone()]);
    // search results are already resolved
    assert!(h.geocoder.calls().is_empty());

    let (region, animated) = h.display.borrow().centers.last().copied().unwrap();
    assert!(animated);
    assert_eq!(region.center, picked.coordinates);

    // clearing the field shows history
    h.session.search_text_changed("");
    let log = h.display.borrow();
    let shown = log.results.last().unwrap();
    assert!(shown.is_history);
    assert_eq!(shown.locations, vec![picked]);
}

#[tokio::test(start_paused = true)]
async fn test_pin_selection_not_added_to_history() {
    let mut h = harness(annotated_options());
    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;

    assert!(h.session.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_current_location_button_centers_and_stops() {
    let mut h = harness(annotated_options());
    h.session.current_location_pressed();
    assert_eq!(h.source.borrow().starts, 1);

    h.session.location_updated(DNIPRO);
    h.session.process_next().await.unwrap();

    let (region, animated) = h.display.borrow().centers.last().copied().unwrap();
    assert_eq!(region.center, DNIPRO);
    assert!(animated);
    assert_eq!(h.session.map_center(), Some(DNIPRO));
    assert_eq!(h.source.borrow().stops, 1);
    // centering alone does not select
    assert_eq!(h.session.state(), PickerState::NoSelection);
}

#[tokio::test(start_paused = true)]
async fn test_current_location_button_hidden() {
    let options = PickerOptions {
        show_current_location_button: false,
        ..annotated_options()
    };
    let mut h = harness(options);
    h.session.current_location_pressed();
    assert_eq!(h.source.borrow().starts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_selects_current_location() {
    let options = PickerOptions {
        select_current_location_initially: true,
        ..annotated_options()
    };
    let mut h = harness(options);
    h.session.start();
    assert_eq!(h.source.borrow().starts, 1);

    h.session.location_updated(DNIPRO);
    // select listener first, then the centering one
    h.session.process_next().await.unwrap();
    h.session.process_next().await.unwrap();
    settle(&mut h.session).await;

    assert_eq!(h.session.state(), PickerState::Selected);
    assert_eq!(h.session.selected_location().unwrap().coordinates, DNIPRO);
    let (_, animated) = h.display.borrow().centers.last().copied().unwrap();
    assert!(!animated);
}

#[tokio::test(start_paused = true)]
async fn test_start_with_initial_location() {
    let initial = Location::new(PARIS).with_name("Office");
    let options = PickerOptions {
        initial_location: Some(initial.clone()),
        show_current_location_initially: true,
        ..annotated_options()
    };
    let mut h = harness(options);
    h.session.start();

    assert_eq!(h.session.state(), PickerState::Selected);
    assert_eq!(h.session.selected_location(), Some(&initial));
    // a preselected location skips the position lookup
    assert_eq!(h.source.borrow().starts, 0);

    let log = h.display.borrow();
    assert_eq!(log.centers, vec![(Region::with_distance(PARIS, 600.0), false)]);
    assert_eq!(log.confirm_enabled.last(), Some(&false));
    let chrome = log.chrome.as_ref().unwrap();
    assert_eq!(chrome.history_label, "Search History");
    assert_eq!(chrome.confirm_button_title, "Confirm map pin");
}

#[tokio::test(start_paused = true)]
async fn test_start_with_initial_address() {
    let options = PickerOptions {
        initial_request: Some(LocationRequest::address("Paris")),
        ..annotated_options()
    };
    let mut h = harness(options);
    h.session.start();
    h.session.process_next().await.unwrap();

    assert_eq!(h.provider.queries(), vec!["Paris"]);
    assert_eq!(h.session.map_center(), Some(PARIS));
    assert_eq!(h.session.state(), PickerState::NoSelection);
}

#[tokio::test(start_paused = true)]
async fn test_current_location_hints_search() {
    let options = PickerOptions {
        use_current_location_as_hint: true,
        ..annotated_options()
    };
    let mut h = harness(options);
    h.session.start();
    h.session.location_updated(DNIPRO);
    h.session.process_next().await.unwrap();

    h.session.search_text_changed("cafe");
    while h.provider.queries().is_empty() {
        h.session.process_next().await.unwrap();
    }

    let (_, hint) = h.provider.calls.lock().unwrap()[0].clone();
    let hint = hint.unwrap();
    assert_eq!(hint.center, DNIPRO);
    assert_eq!(hint.lat_delta, 2.0);
}

#[tokio::test(start_paused = true)]
async fn test_annotations_hidden_by_default() {
    let options = PickerOptions {
        show_current_location_initially: false,
        ..PickerOptions::default()
    };
    let mut h = harness(options);
    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;

    assert!(h.display.borrow().annotations.is_empty());
    assert_eq!(h.session.state(), PickerState::Selected);
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_location_updates() {
    let mut h = harness(annotated_options());
    h.session.current_location_pressed();
    h.session.cancel();

    assert_eq!(h.source.borrow().stops, 1);
}

#[tokio::test(start_paused = true)]
async fn test_clearing_search_text_drops_selection() {
    let mut h = harness(annotated_options());
    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;
    assert_eq!(h.session.state(), PickerState::Selected);

    h.session.search_text_changed("");

    assert_eq!(h.session.state(), PickerState::NoSelection);
    assert!(h.session.selected_location().is_none());
    {
        let log = h.display.borrow();
        assert_eq!(log.annotations.last(), Some(&None));
        assert_eq!(log.confirm_enabled.last(), Some(&false));
        assert!(log.results.last().unwrap().is_history);
    }

    // confirm now falls back to the map center instead of the erased place
    h.session.map_region_changed(DNIPRO, false);
    h.session.confirm().await.unwrap();
    assert_eq!(
        h.completions.borrow()[0].as_ref().unwrap().coordinates,
        DNIPRO
    );
}

#[tokio::test(start_paused = true)]
async fn test_clearing_search_text_cancels_pending_geocode() {
    let mut h = harness(annotated_options());
    h.geocoder.delay(PARIS, Duration::from_secs(1));
    h.session.select_coordinates(PARIS);

    h.session.search_text_changed("");
    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(h.session.state(), PickerState::NoSelection);
    assert!(h.session.selected_location().is_none());
    assert!(h.display.borrow().notices.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_text_keeps_selection() {
    let mut h = harness(annotated_options());
    h.session.select_coordinates(PARIS);
    settle(&mut h.session).await;

    h.session.search_text_changed("  ");

    assert_eq!(h.session.state(), PickerState::Selected);
    assert!(h.display.borrow().results.last().unwrap().is_history);
}

#[tokio::test(start_paused = true)]
async fn test_pin_drop_needs_annotations() {
    let options = PickerOptions {
        show_current_location_initially: false,
        ..PickerOptions::default()
    };
    let mut h = harness(options);

    h.session.pin_dropped(PARIS);
    assert_eq!(h.session.state(), PickerState::NoSelection);
    assert!(h.geocoder.calls().is_empty());

    // a map drag still selects without pins
    h.session.map_region_changed(DNIPRO, true);
    settle(&mut h.session).await;
    assert_eq!(h.session.selected_location().unwrap().coordinates, DNIPRO);
}

#[tokio::test(start_paused = true)]
async fn test_pin_drop_with_annotations() {
    let mut h = harness(annotated_options());
    h.session.pin_dropped(PARIS);
    settle(&mut h.session).await;

    assert_eq!(h.session.selected_location().unwrap().coordinates, PARIS);
    assert_eq!(h.geocoder.calls(), vec![PARIS]);
}
