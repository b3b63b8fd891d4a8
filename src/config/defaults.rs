//! Default configuration values
//!
//! Named constants for all tunable parameters

/// Debounce interval for search-as-you-type, in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Maximum number of results requested from the search backend
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// Region size in meters shown around a picked search result
pub const DEFAULT_RESULT_REGION_DISTANCE: f64 = 600.0;

/// Number of picked locations remembered
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Section header shown above the history list
pub const DEFAULT_HISTORY_LABEL: &str = "Search History";

/// Placeholder text of the search field
pub const DEFAULT_SEARCH_PLACEHOLDER: &str = "Search or enter an address";

/// Title of the confirm button
pub const DEFAULT_CONFIRM_BUTTON_TITLE: &str = "Confirm map pin";

/// Title of the select button in a pin callout
pub const DEFAULT_SELECT_BUTTON_TITLE: &str = "Select";

/// User-Agent sent to geocoding services
pub const DEFAULT_USER_AGENT: &str = "location-picker/0.1.0";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "location-picker";
