//! Centralized constants for the location-picker crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Meters per degree of latitude (approximate, varies slightly with latitude)
    pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

    /// Span in degrees of the region used to bias searches around the user
    pub const SEARCH_HINT_SPAN_DEGREES: f64 = 2.0;

    /// Decimal places kept when comparing coordinates for history de-duplication
    /// (1e-5 degrees is roughly one meter)
    pub const HISTORY_COORDINATE_SCALE: f64 = 100_000.0;
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// IP geolocation API (free, no key required)
    pub const IP_API_URL: &str = "http://ip-api.com/json";

    /// How long the CLI waits for a current-location fix before searching without one
    pub const LOCATION_TIMEOUT_SECS: u64 = 10;
}

/// Storage keys and cache settings
pub mod storage {
    /// Key under which the search history is persisted
    pub const HISTORY_KEY: &str = "recent_locations";

    /// IP location cache duration in seconds (1 hour)
    pub const IP_LOCATION_TTL_SECS: u64 = 3600;

    /// IP location cache file name
    pub const IP_LOCATION_CACHE_FILE: &str = "ip_location_cache.json";
}
