//! IP-based geolocation
//!
//! Uses ip-api.com for coarse current position with file-based caching.
//! `IpLocationSource` wraps the lookup as a `LocationSource` for hosts that
//! have no device GPS.

use crate::config::defaults::APP_DIR_NAME;
use crate::constants::api::IP_API_URL;
use crate::constants::storage::{IP_LOCATION_CACHE_FILE, IP_LOCATION_TTL_SECS};
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::LocationSource;
use crate::location::Location;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// IP location service with caching
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: reqwest::Client,
    cache_path: Option<PathBuf>,
}

/// ip-api.com response
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
}

/// Cached location data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedLocation {
    location: Location,
    timestamp: u64,
}

impl IpLocator {
    /// Create a new IP locator with default cache path
    pub fn new() -> Self {
        let cache_path =
            dirs::cache_dir().map(|p| p.join(APP_DIR_NAME).join(IP_LOCATION_CACHE_FILE));

        Self {
            client: reqwest::Client::new(),
            cache_path,
        }
    }

    /// Create an IP locator with a specific cache path
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache_path: Some(cache_path),
        }
    }

    /// Create an IP locator without caching
    pub fn without_cache() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache_path: None,
        }
    }

    /// Get current location based on IP address
    pub async fn locate(&self) -> Result<Location> {
        if let Some(cached) = self.load_cache() {
            return Ok(cached);
        }

        let location = self.fetch_location().await?;
        self.save_cache(&location);

        Ok(location)
    }

    /// Fetch location from ip-api.com
    async fn fetch_location(&self) -> Result<Location> {
        let response = self.client.get(IP_API_URL).send().await.map_err(|e| {
            Error::LocationUnavailable(format!("IP location request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(Error::LocationUnavailable(format!(
                "IP location API returned status: {}",
                response.status()
            )));
        }

        let data: IpApiResponse = response.json().await.map_err(|e| {
            Error::LocationUnavailable(format!("Failed to parse IP location response: {}", e))
        })?;

        Self::to_location(data)
    }

    fn to_location(data: IpApiResponse) -> Result<Location> {
        if data.status != "success" {
            return Err(Error::LocationUnavailable(
                "IP location lookup failed".to_string(),
            ));
        }

        let lat = data
            .lat
            .ok_or_else(|| Error::LocationUnavailable("No latitude in response".to_string()))?;
        let lng = data
            .lon
            .ok_or_else(|| Error::LocationUnavailable("No longitude in response".to_string()))?;

        let address = [data.city, data.region_name, data.country]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");

        let location = Location::new(Coordinates::new(lat, lng));
        Ok(if address.is_empty() {
            location
        } else {
            location.with_address(address)
        })
    }

    /// Load cached location if valid
    fn load_cache(&self) -> Option<Location> {
        let cache_path = self.cache_path.as_ref()?;

        if !cache_path.exists() {
            return None;
        }

        let content = fs::read_to_string(cache_path).ok()?;
        let cached: CachedLocation = serde_json::from_str(&content).ok()?;

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .ok()?
            .as_secs();

        if now.saturating_sub(cached.timestamp) < IP_LOCATION_TTL_SECS {
            Some(cached.location)
        } else {
            None
        }
    }

    /// Save location to cache
    fn save_cache(&self, location: &Location) {
        let Some(cache_path) = &self.cache_path else {
            return;
        };

        if let Some(parent) = cache_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let cached = CachedLocation {
            location: location.clone(),
            timestamp,
        };

        if let Ok(content) = serde_json::to_string_pretty(&cached) {
            let _ = fs::write(cache_path, content);
        }
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        if let Some(cache_path) = &self.cache_path {
            let _ = fs::remove_file(cache_path);
        }
    }

    /// Get cache duration
    pub fn cache_duration() -> Duration {
        Duration::from_secs(IP_LOCATION_TTL_SECS)
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// One-fix-per-start position source backed by IP geolocation
///
/// Each `start` performs a single lookup and pushes the result into `updates`.
/// A failed lookup produces no update; the picker treats that as the
/// position being unavailable.
pub struct IpLocationSource {
    locator: Arc<IpLocator>,
    updates: UnboundedSender<Coordinates>,
    task: Option<JoinHandle<()>>,
}

impl IpLocationSource {
    pub fn new(locator: IpLocator, updates: UnboundedSender<Coordinates>) -> Self {
        Self {
            locator: Arc::new(locator),
            updates,
            task: None,
        }
    }
}

impl LocationSource for IpLocationSource {
    fn start(&mut self) {
        if self.task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let locator = Arc::clone(&self.locator);
        let updates = self.updates.clone();
        self.task = Some(tokio::spawn(async move {
            match locator.locate().await {
                Ok(location) => {
                    debug!(coordinates = %location.coordinates, "ip location fix");
                    let _ = updates.send(location.coordinates);
                }
                Err(e) => warn!("current location unavailable: {}", e),
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for IpLocationSource {
    fn drop(&mut self) {
        self.stop();
    }
}
