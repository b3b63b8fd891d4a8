//! The picked location value
//!
//! A `Location` is what search results, reverse geocoding and the final
//! confirmation all produce. The `placemark` is whatever raw payload the
//! backend returned; the picker carries it along without looking inside.

use crate::coord::Coordinates;
use serde::{Deserialize, Serialize};

/// A named place at a coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Point-of-interest name, if the backend knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Formatted postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub coordinates: Coordinates,

    /// Raw backend payload, opaque to the picker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placemark: Option<serde_json::Value>,
}

impl Location {
    /// Create an unnamed location at the given coordinates
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            name: None,
            address: None,
            coordinates,
            placemark: None,
        }
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the formatted address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Attach the raw backend payload
    pub fn with_placemark(mut self, placemark: serde_json::Value) -> Self {
        self.placemark = Some(placemark);
        self
    }

    /// Same place, moved to `coordinates`
    ///
    /// Reverse geocoding snaps to the nearest known feature; the picker keeps
    /// the coordinate the user actually chose.
    pub fn at(self, coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            ..self
        }
    }

    /// Text shown for this location: name, then address, then the raw coordinate
    pub fn title(&self) -> String {
        self.name
            .as_deref()
            .or(self.address.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| self.coordinates.to_string())
    }

    /// History equality: same name and coordinates equal to ~1e-5 degrees
    pub fn same_place(&self, other: &Location) -> bool {
        self.name == other.name && self.coordinates.grid_key() == other.coordinates.grid_key()
    }
}
