//! The rendering side of a picker session
//!
//! The session never touches UI state itself; everything it wants shown goes
//! through `PickerDisplay`.

use crate::config::PickerOptions;
use crate::coord::Region;
use crate::location::Location;
use crate::search::SearchResultSet;

/// Static labels and switches the UI applies once on start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerChrome {
    pub search_placeholder: String,
    pub history_label: String,
    pub confirm_button_title: String,
    pub select_button_title: String,
    pub show_current_location_button: bool,
}

impl From<&PickerOptions> for PickerChrome {
    fn from(options: &PickerOptions) -> Self {
        Self {
            search_placeholder: options.search_placeholder.clone(),
            history_label: options.history_label.clone(),
            confirm_button_title: options.confirm_button_title.clone(),
            select_button_title: options.select_button_title.clone(),
            show_current_location_button: options.show_current_location_button,
        }
    }
}

/// UI sink driven by `LocationPickerSession`
pub trait PickerDisplay {
    /// Replace the rows under the search field
    fn display(&mut self, results: &SearchResultSet);

    /// Show a pin for `location`, or remove the pin
    fn show_annotation(&mut self, location: Option<&Location>);

    /// Move the map to `region`
    fn center_map(&mut self, region: Region, animated: bool);

    fn set_confirm_enabled(&mut self, enabled: bool);

    /// Show a dismissible error message
    fn show_notice(&mut self, message: &str);

    /// Put the selected location's title in the search field
    fn set_search_text(&mut self, _text: &str) {}

    fn apply_chrome(&mut self, _chrome: &PickerChrome) {}
}
