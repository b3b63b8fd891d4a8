//! Current-location fan-out
//!
//! Callers register listeners that want the device position, either once or
//! continuously. The underlying `LocationSource` runs only while someone is
//! waiting: it is started by the first request and stopped as soon as an
//! update leaves no continuous listener behind.

use crate::coord::Coordinates;
use crate::geo::LocationSource;
use tracing::debug;

/// A registered interest in the current position
pub struct CurrentLocationRequest {
    /// Remove the listener after its first update
    pub once: bool,
    on_location: Box<dyn FnMut(Coordinates)>,
}

impl std::fmt::Debug for CurrentLocationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentLocationRequest")
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// Dispatches position updates to waiting listeners
pub struct CurrentLocationBroker {
    source: Box<dyn LocationSource>,
    listeners: Vec<CurrentLocationRequest>,
    running: bool,
    last_known: Option<Coordinates>,
}

impl CurrentLocationBroker {
    pub fn new(source: Box<dyn LocationSource>) -> Self {
        Self {
            source,
            listeners: Vec::new(),
            running: false,
            last_known: None,
        }
    }

    /// Register a listener and make sure updates are flowing
    pub fn request(&mut self, once: bool, on_location: impl FnMut(Coordinates) + 'static) {
        self.listeners.push(CurrentLocationRequest {
            once,
            on_location: Box::new(on_location),
        });

        if !self.running {
            debug!("starting location updates");
            self.source.start();
            self.running = true;
        }
    }

    /// Deliver a position to every listener, in registration order
    pub fn handle_update(&mut self, coordinates: Coordinates) {
        self.last_known = Some(coordinates);

        for listener in self.listeners.iter_mut() {
            (listener.on_location)(coordinates);
        }
        self.listeners.retain(|l| !l.once);

        if self.listeners.is_empty() && self.running {
            debug!("no continuous listeners left, stopping location updates");
            self.source.stop();
            self.running = false;
        }
    }

    /// Drop every listener and stop the source
    pub fn stop(&mut self) {
        self.listeners.clear();
        if self.running {
            self.source.stop();
            self.running = false;
        }
    }

    /// Most recent position seen, if any
    pub fn last_known(&self) -> Option<Coordinates> {
        self.last_known
    }

    /// Number of listeners still waiting
    pub fn pending(&self) -> usize {
        self.listeners.len()
    }

    /// Whether the source is currently producing updates
    pub fn is_running(&self) -> bool {
        self.running
    }
}
