//! Search history storage
//!
//! Keeps the locations the user picked from search results, most recent
//! first, bounded to a fixed capacity. Picking a place that is already in the
//! list moves it to the front instead of duplicating it.

use crate::constants::storage::HISTORY_KEY;
use crate::error::{Error, Result};
use crate::location::Location;
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A history entry with the time it was (last) added
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub location: Location,

    pub added_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create a new history entry stamped with the current time
    pub fn new(location: Location) -> Self {
        Self {
            location,
            added_at: Utc::now(),
        }
    }
}

/// Bounded, recency-ordered history of picked locations
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
    capacity: usize,
    entries: Vec<HistoryEntry>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("capacity", &self.capacity)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl HistoryStore {
    /// Load history from `store`, keeping at most `capacity` entries
    pub fn load(store: Box<dyn KeyValueStore>, capacity: usize) -> Result<Self> {
        let mut entries: Vec<HistoryEntry> = match store.get(HISTORY_KEY)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                Error::Storage(format!("Failed to parse history: {}", e))
            })?,
            None => Vec::new(),
        };
        entries.truncate(capacity);

        debug!(count = entries.len(), capacity, "loaded search history");
        Ok(Self {
            store,
            capacity,
            entries,
        })
    }

    /// Persist the current entries
    fn save(&mut self) -> Result<()> {
        let content = serde_json::to_vec_pretty(&self.entries).map_err(|e| {
            Error::Storage(format!("Failed to serialize history: {}", e))
        })?;
        self.store.set(HISTORY_KEY, &content)
    }

    /// Locations, most recent first
    pub fn history(&self) -> Vec<Location> {
        self.entries.iter().map(|e| e.location.clone()).collect()
    }

    /// Add a location to the front of the history
    ///
    /// An entry for the same place is moved rather than duplicated; the
    /// oldest entries are evicted once capacity is exceeded.
    pub fn add_to_history(&mut self, location: Location) -> Result<()> {
        self.entries.retain(|e| !e.location.same_place(&location));
        self.entries.insert(0, HistoryEntry::new(location));
        self.entries.truncate(self.capacity);
        self.save()
    }

    /// Get all entries
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Maximum number of entries kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all history
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save()
    }
}
