//! Error types for location-picker

use thiserror::Error;

/// Main error type for location-picker operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Search cancelled")]
    SearchCancelled,

    #[error("Geocoding failed: {0}")]
    GeocodeFailed(String),

    #[error("Geocoding cancelled")]
    GeocodeCancelled,

    #[error("Current location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Picker session is closed")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors produced by a superseded or aborted operation.
    ///
    /// These are swallowed by the picker and never shown to the user.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::SearchCancelled | Self::GeocodeCancelled)
    }
}

/// Result type alias for location-picker operations
pub type Result<T> = std::result::Result<T, Error>;
