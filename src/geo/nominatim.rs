//! Nominatim geocoding backend (OpenStreetMap)
//!
//! Uses the free Nominatim API for place search and reverse geocoding.
//! Rate limit: 1 request per second (enforced by User-Agent requirement)

use crate::config::defaults::{DEFAULT_RESULT_LIMIT, DEFAULT_USER_AGENT};
use crate::constants::api::NOMINATIM_URL;
use crate::coord::{Coordinates, Region};
use crate::error::{Error, Result};
use crate::geo::{Geocoder, SearchProvider};
use crate::location::Location;
use serde::Deserialize;
use tracing::debug;

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimBackend {
    client: reqwest::Client,
    base_url: String,
    limit: usize,
}

/// Fields of a Nominatim `jsonv2` place the picker reads
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    name: Option<String>,
}

impl NominatimBackend {
    /// Create a new Nominatim backend against the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_options(NOMINATIM_URL, DEFAULT_USER_AGENT, DEFAULT_RESULT_LIMIT)
    }

    /// Create a backend for a specific endpoint (self-hosted instances, tests)
    pub fn with_options(base_url: &str, user_agent: &str, limit: usize) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit: limit.max(1),
        })
    }

    /// Parse lat/lng strings to coordinates
    fn parse_coords(lat: &str, lng: &str) -> Result<Coordinates> {
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::InvalidCoordinates(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::InvalidCoordinates(format!("Invalid longitude: {}", lng)))?;
        Ok(Coordinates::new(lat, lng))
    }

    /// Convert one raw Nominatim place into a `Location`, keeping the raw JSON
    fn to_location(raw: serde_json::Value) -> Result<Location> {
        let place: NominatimPlace = serde_json::from_value(raw.clone())?;
        let coordinates = Self::parse_coords(&place.lat, &place.lon)?;

        let mut location = Location::new(coordinates)
            .with_address(place.display_name)
            .with_placemark(raw);
        if let Some(name) = place.name.filter(|n| !n.trim().is_empty()) {
            location = location.with_name(name);
        }
        Ok(location)
    }

    /// Convert a search response, skipping places that fail to parse
    fn to_locations(results: Vec<serde_json::Value>) -> Vec<Location> {
        results
            .into_iter()
            .filter_map(|raw| match Self::to_location(raw) {
                Ok(location) => Some(location),
                Err(e) => {
                    debug!("skipping search result: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Build the search URL, adding a preferred viewbox for the hint region
    fn search_url(&self, query: &str, hint: Option<Region>) -> String {
        let mut url = format!(
            "{}/search?q={}&format=jsonv2&limit={}",
            self.base_url,
            urlencoding::encode(query),
            self.limit
        );

        if let Some(region) = hint {
            let (south, west, north, east) = region.bounds();
            url.push_str(&format!("&viewbox={},{},{},{}", west, north, east, south));
        }

        url
    }
}

impl SearchProvider for NominatimBackend {
    async fn lookup(&self, query: &str, hint: Option<Region>) -> Result<Vec<Location>> {
        let url = self.search_url(query, hint);
        debug!(%url, "nominatim search");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::SearchFailed(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SearchFailed(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let results: Vec<serde_json::Value> = response.json().await.map_err(|e| {
            Error::SearchFailed(format!("Failed to parse Nominatim response: {}", e))
        })?;

        Ok(Self::to_locations(results))
    }
}

impl Geocoder for NominatimBackend {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<Location>> {
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=jsonv2",
            self.base_url, coordinates.lat, coordinates.lng
        );
        debug!(%url, "nominatim reverse");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::GeocodeFailed(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(None);
            }
            return Err(Error::GeocodeFailed(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            Error::GeocodeFailed(format!("Failed to parse Nominatim response: {}", e))
        })?;

        // Nominatim answers 200 with {"error": "Unable to geocode"} for empty areas
        if raw.get("error").is_some() {
            return Ok(None);
        }

        Self::to_location(raw).map(Some)
    }
}
