//! Coordinates and map regions
//!
//! Plain geographic value types shared by the search, geocoding and session
//! layers. The host UI translates a `Region` into whatever its map view uses.

use crate::constants::geo::{HISTORY_COORDINATE_SCALE, METERS_PER_DEGREE_LAT};
use serde::{Deserialize, Serialize};

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(crate::error::Error::InvalidCoordinates(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Coordinates snapped to a ~1 meter grid, used for history equality
    pub(crate) fn grid_key(&self) -> (i64, i64) {
        (
            (self.lat * HISTORY_COORDINATE_SCALE).round() as i64,
            (self.lng * HISTORY_COORDINATE_SCALE).round() as i64,
        )
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// A rectangular map window around a center point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinates,
    /// Total north-south extent in degrees
    pub lat_delta: f64,
    /// Total east-west extent in degrees
    pub lng_delta: f64,
}

impl Region {
    /// Region with an explicit span in degrees
    pub fn with_span(center: Coordinates, lat_delta: f64, lng_delta: f64) -> Self {
        Self {
            center,
            lat_delta,
            lng_delta,
        }
    }

    /// Region spanning `meters` in both directions around `center`
    ///
    /// Longitude degrees per meter shrink with latitude, so the east-west
    /// span is widened by 1/cos(lat).
    pub fn with_distance(center: Coordinates, meters: f64) -> Self {
        let lat_delta = meters / METERS_PER_DEGREE_LAT;
        let meters_per_deg_lng = METERS_PER_DEGREE_LAT * center.lat.to_radians().cos();
        let lng_delta = if meters_per_deg_lng.abs() < f64::EPSILON {
            360.0
        } else {
            (meters / meters_per_deg_lng).min(360.0)
        };

        Self {
            center,
            lat_delta,
            lng_delta,
        }
    }

    /// Bounds as (south, west, north, east)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let half_lat = self.lat_delta / 2.0;
        let half_lng = self.lng_delta / 2.0;
        (
            (self.center.lat - half_lat).max(-90.0),
            self.center.lng - half_lng,
            (self.center.lat + half_lat).min(90.0),
            self.center.lng + half_lng,
        )
    }

    /// Whether a coordinate falls inside this region
    pub fn contains(&self, coords: Coordinates) -> bool {
        let (south, west, north, east) = self.bounds();
        coords.lat >= south && coords.lat <= north && coords.lng >= west && coords.lng <= east
    }
}
