//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/location-picker/config.toml
//!
//! The `[picker]` section is the set of options a `LocationPickerSession`
//! is constructed with; `[search]` and `[geocoder]` tune the backends.

pub mod defaults;

use crate::constants::api::NOMINATIM_URL;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::location::Location;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Picker behavior and labels
    #[serde(default)]
    pub picker: PickerOptions,

    /// Search-as-you-type settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Geocoding service settings
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

/// Where the map should open when no location is preselected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Address to look up and center on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Coordinate to center on; wins over `address` when both are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl LocationRequest {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            coordinates: None,
        }
    }

    pub fn coordinates(coordinates: Coordinates) -> Self {
        Self {
            address: None,
            coordinates: Some(coordinates),
        }
    }
}

/// Which coordinate a confirm without any manual selection resolves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmFallback {
    /// Whatever the map is currently centered on
    #[default]
    MapCenter,
    /// The configured initial location or initial request coordinate
    InitialLocation,
}

impl std::str::FromStr for ConfirmFallback {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "map_center" | "map-center" => Ok(Self::MapCenter),
            "initial_location" | "initial-location" => Ok(Self::InitialLocation),
            _ => Err(format!("Unknown confirm fallback: {}", s)),
        }
    }
}

impl std::fmt::Display for ConfirmFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MapCenter => write!(f, "map_center"),
            Self::InitialLocation => write!(f, "initial_location"),
        }
    }
}

/// Options a picker session is constructed with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerOptions {
    /// Preselected location; shown and selected on start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_location: Option<Location>,

    /// Where to open the map when nothing is preselected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_request: Option<LocationRequest>,

    /// Region size in meters shown around a picked location
    #[serde(default = "default_result_region_distance")]
    pub result_region_distance: f64,

    /// Bias searches towards the current position
    #[serde(default)]
    pub use_current_location_as_hint: bool,

    /// Header shown above the history list
    #[serde(default = "default_history_label")]
    pub history_label: String,

    /// Placeholder of the search field
    #[serde(default = "default_search_placeholder")]
    pub search_placeholder: String,

    /// Title of the confirm button
    #[serde(default = "default_confirm_button_title")]
    pub confirm_button_title: String,

    /// Title of the select button in a pin callout
    #[serde(default = "default_select_button_title")]
    pub select_button_title: String,

    /// Show the "current location" button
    #[serde(default = "default_true")]
    pub show_current_location_button: bool,

    /// Center on the current position when nothing else is requested
    #[serde(default = "default_true")]
    pub show_current_location_initially: bool,

    /// Select the current position when nothing else is requested
    #[serde(default)]
    pub select_current_location_initially: bool,

    /// Draw a pin for the selection
    #[serde(default)]
    pub show_annotations: bool,

    /// Number of picked locations remembered
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Coordinate resolved by a confirm without selection
    #[serde(default)]
    pub confirm_fallback: ConfirmFallback,
}

/// Search-as-you-type settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before a query is sent, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of results requested
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Nominatim base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Default value functions for serde
fn default_true() -> bool {
    true
}
fn default_result_region_distance() -> f64 {
    DEFAULT_RESULT_REGION_DISTANCE
}
fn default_history_label() -> String {
    DEFAULT_HISTORY_LABEL.to_string()
}
fn default_search_placeholder() -> String {
    DEFAULT_SEARCH_PLACEHOLDER.to_string()
}
fn default_confirm_button_title() -> String {
    DEFAULT_CONFIRM_BUTTON_TITLE.to_string()
}
fn default_select_button_title() -> String {
    DEFAULT_SELECT_BUTTON_TITLE.to_string()
}
fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}
fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}
fn default_result_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}
fn default_base_url() -> String {
    NOMINATIM_URL.to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            initial_location: None,
            initial_request: None,
            result_region_distance: default_result_region_distance(),
            use_current_location_as_hint: false,
            history_label: default_history_label(),
            search_placeholder: default_search_placeholder(),
            confirm_button_title: default_confirm_button_title(),
            select_button_title: default_select_button_title(),
            show_current_location_button: true,
            show_current_location_initially: true,
            select_current_location_initially: false,
            show_annotations: false,
            history_capacity: default_history_capacity(),
            confirm_fallback: ConfirmFallback::default(),
        }
    }
}

impl PickerOptions {
    /// Coordinate the picker was asked to open at, if any
    pub fn initial_coordinates(&self) -> Option<Coordinates> {
        self.initial_location
            .as_ref()
            .map(|l| l.coordinates)
            .or_else(|| self.initial_request.as_ref().and_then(|r| r.coordinates))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            result_limit: default_result_limit(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        let picker = &self.picker;

        match parts.as_slice() {
            ["picker", "result_region_distance"] => Some(picker.result_region_distance.to_string()),
            ["picker", "use_current_location_as_hint"] => {
                Some(picker.use_current_location_as_hint.to_string())
            }
            ["picker", "history_label"] => Some(picker.history_label.clone()),
            ["picker", "search_placeholder"] => Some(picker.search_placeholder.clone()),
            ["picker", "confirm_button_title"] => Some(picker.confirm_button_title.clone()),
            ["picker", "select_button_title"] => Some(picker.select_button_title.clone()),
            ["picker", "show_current_location_button"] => {
                Some(picker.show_current_location_button.to_string())
            }
            ["picker", "show_current_location_initially"] => {
                Some(picker.show_current_location_initially.to_string())
            }
            ["picker", "select_current_location_initially"] => {
                Some(picker.select_current_location_initially.to_string())
            }
            ["picker", "show_annotations"] => Some(picker.show_annotations.to_string()),
            ["picker", "history_capacity"] => Some(picker.history_capacity.to_string()),
            ["picker", "confirm_fallback"] => Some(picker.confirm_fallback.to_string()),

            ["search", "debounce_ms"] => Some(self.search.debounce_ms.to_string()),
            ["search", "result_limit"] => Some(self.search.result_limit.to_string()),

            ["geocoder", "base_url"] => Some(self.geocoder.base_url.clone()),
            ["geocoder", "user_agent"] => Some(self.geocoder.user_agent.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();
        let picker = &mut self.picker;

        match parts.as_slice() {
            ["picker", "result_region_distance"] => {
                let distance: f64 = parse_value(key, value)?;
                if !(distance.is_finite() && distance > 0.0) {
                    return Err(Error::Config(format!(
                        "Region distance must be positive: {}",
                        value
                    )));
                }
                picker.result_region_distance = distance;
            }
            ["picker", "use_current_location_as_hint"] => {
                picker.use_current_location_as_hint = parse_value(key, value)?;
            }
            ["picker", "history_label"] => picker.history_label = value.to_string(),
            ["picker", "search_placeholder"] => picker.search_placeholder = value.to_string(),
            ["picker", "confirm_button_title"] => picker.confirm_button_title = value.to_string(),
            ["picker", "select_button_title"] => picker.select_button_title = value.to_string(),
            ["picker", "show_current_location_button"] => {
                picker.show_current_location_button = parse_value(key, value)?;
            }
            ["picker", "show_current_location_initially"] => {
                picker.show_current_location_initially = parse_value(key, value)?;
            }
            ["picker", "select_current_location_initially"] => {
                picker.select_current_location_initially = parse_value(key, value)?;
            }
            ["picker", "show_annotations"] => {
                picker.show_annotations = parse_value(key, value)?;
            }
            ["picker", "history_capacity"] => {
                picker.history_capacity = parse_value(key, value)?;
            }
            ["picker", "confirm_fallback"] => {
                picker.confirm_fallback = value.parse().map_err(Error::Config)?;
            }

            ["search", "debounce_ms"] => self.search.debounce_ms = parse_value(key, value)?,
            ["search", "result_limit"] => self.search.result_limit = parse_value(key, value)?,

            ["geocoder", "base_url"] => self.geocoder.base_url = value.to_string(),
            ["geocoder", "user_agent"] => self.geocoder.user_agent = value.to_string(),

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "picker.result_region_distance",
            "picker.use_current_location_as_hint",
            "picker.history_label",
            "picker.search_placeholder",
            "picker.confirm_button_title",
            "picker.select_button_title",
            "picker.show_current_location_button",
            "picker.show_current_location_initially",
            "picker.select_current_location_initially",
            "picker.show_annotations",
            "picker.history_capacity",
            "picker.confirm_fallback",
            "search.debounce_ms",
            "search.result_limit",
            "geocoder.base_url",
            "geocoder.user_agent",
        ]
    }
}
