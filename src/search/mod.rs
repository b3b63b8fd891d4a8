//! Debounced search-as-you-type
//!
//! Every keystroke restarts a debounce timer; only when input has been quiet
//! for the debounce interval does a lookup reach the `SearchProvider`. Each
//! submission gets a new sequence id, and any timer or lookup result carrying
//! an older id is dropped, so a slow response can never overwrite the results
//! of a newer query.
//!
//! The timer and the lookup run as tokio tasks that report back through a
//! channel. The owner pulls events with `next_event` and feeds them to
//! `handle_event` from its own control flow; all state changes happen there.

use crate::coord::Region;
use crate::error::Result;
use crate::geo::SearchProvider;
use crate::location::Location;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A trimmed, non-empty query tagged with its submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub sequence_id: u64,
}

/// Rows to show under the search field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResultSet {
    pub sequence_id: u64,
    pub locations: Vec<Location>,
    /// True when showing search history rather than live results
    pub is_history: bool,
}

impl SearchResultSet {
    pub fn history(sequence_id: u64, locations: Vec<Location>) -> Self {
        Self {
            sequence_id,
            locations,
            is_history: true,
        }
    }

    pub fn live(sequence_id: u64, locations: Vec<Location>) -> Self {
        Self {
            sequence_id,
            locations,
            is_history: false,
        }
    }
}

/// Asynchronous progress reported by the coordinator's tasks
#[derive(Debug)]
pub enum SearchEvent {
    /// The debounce interval for `query` elapsed
    TimerFired(SearchQuery),
    /// The provider finished the lookup for `sequence_id`
    Completed {
        sequence_id: u64,
        outcome: Result<Vec<Location>>,
    },
}

/// Debounces queries and filters stale lookup results
pub struct SearchCoordinator<P: SearchProvider> {
    provider: Arc<P>,
    debounce: Duration,
    hint: Option<Region>,
    sequence_id: u64,
    timer: Option<JoinHandle<()>>,
    lookup: Option<JoinHandle<()>>,
    tx: UnboundedSender<SearchEvent>,
    rx: UnboundedReceiver<SearchEvent>,
}

impl<P: SearchProvider> SearchCoordinator<P> {
    pub fn new(provider: Arc<P>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            debounce,
            hint: None,
            sequence_id: 0,
            timer: None,
            lookup: None,
            tx,
            rx,
        }
    }

    /// Region subsequent lookups are biased towards
    pub fn set_hint(&mut self, hint: Option<Region>) {
        self.hint = hint;
    }

    /// Sequence id of the most recent submission
    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    /// Whether a debounce timer or a lookup is outstanding
    #[cfg(test)]
    fn is_busy(&self) -> bool {
        let running = |h: &Option<JoinHandle<()>>| h.as_ref().is_some_and(|h| !h.is_finished());
        running(&self.timer) || running(&self.lookup)
    }

    /// Accept new search text and return what to show right away
    ///
    /// Blank text shows `history` immediately and drops any pending work.
    /// Otherwise the debounce timer restarts and an empty live set is
    /// returned so stale rows are cleared while waiting.
    pub fn submit(&mut self, text: &str, history: &[Location]) -> SearchResultSet {
        let term = text.trim();

        if term.is_empty() {
            self.cancel();
            return SearchResultSet::history(self.sequence_id, history.to_vec());
        }

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        self.sequence_id += 1;
        let query = SearchQuery {
            text: term.to_string(),
            sequence_id: self.sequence_id,
        };
        debug!(sequence_id = query.sequence_id, text = %query.text, "search debounce started");

        let tx = self.tx.clone();
        let debounce = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let _ = tx.send(SearchEvent::TimerFired(query));
        }));

        SearchResultSet::live(self.sequence_id, Vec::new())
    }

    /// Drop any pending timer and in-flight lookup without emitting
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(lookup) = self.lookup.take() {
            lookup.abort();
        }
        // invalidates anything already queued in the channel
        self.sequence_id += 1;
    }

    /// Wait for the next timer or lookup event
    pub async fn next_event(&mut self) -> Option<SearchEvent> {
        self.rx.recv().await
    }

    /// Apply an event; returns a result set when there is something to show
    pub fn handle_event(&mut self, event: SearchEvent) -> Option<SearchResultSet> {
        match event {
            SearchEvent::TimerFired(query) => {
                if query.sequence_id != self.sequence_id {
                    debug!(sequence_id = query.sequence_id, "dropping superseded timer");
                    return None;
                }
                self.timer = None;
                self.start_lookup(query);
                None
            }
            SearchEvent::Completed {
                sequence_id,
                outcome,
            } => {
                if sequence_id != self.sequence_id {
                    debug!(sequence_id, current = self.sequence_id, "dropping stale results");
                    return None;
                }
                self.lookup = None;

                match outcome {
                    Ok(locations) => {
                        debug!(sequence_id, count = locations.len(), "search results");
                        Some(SearchResultSet::live(sequence_id, locations))
                    }
                    Err(e) if e.is_cancelled() => None,
                    Err(e) => {
                        warn!("search failed: {}", e);
                        Some(SearchResultSet::live(sequence_id, Vec::new()))
                    }
                }
            }
        }
    }

    fn start_lookup(&mut self, query: SearchQuery) {
        if let Some(previous) = self.lookup.take() {
            previous.abort();
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let hint = self.hint;
        self.lookup = Some(tokio::spawn(async move {
            let outcome = provider.lookup(&query.text, hint).await;
            let _ = tx.send(SearchEvent::Completed {
                sequence_id: query.sequence_id,
                outcome,
            });
        }));
    }
}

impl<P: SearchProvider> Drop for SearchCoordinator<P> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(lookup) = self.lookup.take() {
            lookup.abort();
        }
    }
}
