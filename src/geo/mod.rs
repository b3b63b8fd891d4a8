//! Geocoding and position backends
//!
//! The picker talks to the outside world through three seams:
//! forward search (`SearchProvider`), reverse geocoding (`Geocoder`) and a
//! stream of current positions (`LocationSource`). Nominatim implements the
//! first two; IP geolocation provides a coarse position source.

pub mod ip_location;
pub mod nominatim;

use crate::coord::{Coordinates, Region};
use crate::error::Result;
use crate::location::Location;
use std::future::Future;

/// Free-text place search
pub trait SearchProvider: Send + Sync + 'static {
    /// Look up places matching `query`, optionally biased towards `hint`
    ///
    /// The picker aborts the returned future when the query is superseded.
    /// Implementations that observe their own cancellation should report it
    /// as `Error::SearchCancelled`.
    fn lookup(
        &self,
        query: &str,
        hint: Option<Region>,
    ) -> impl Future<Output = Result<Vec<Location>>> + Send;
}

/// Coordinate to place resolution
pub trait Geocoder: Send + Sync + 'static {
    /// Reverse geocode a coordinate
    ///
    /// Returns `Ok(None)` when nothing is known there. A cancelled lookup must
    /// report `Error::GeocodeCancelled` so it can be told apart from failures.
    fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> impl Future<Output = Result<Option<Location>>> + Send;
}

/// A device position feed that can be switched on and off
///
/// Positions are pushed into the session by the host
/// (`LocationPickerSession::location_updated`).
pub trait LocationSource {
    fn start(&mut self);
    fn stop(&mut self);
}

/// Source for hosts without any position support
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocationSource;

impl LocationSource for NoLocationSource {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

/// Get the default geocoding backend
pub fn get_geocoder() -> Result<nominatim::NominatimBackend> {
    nominatim::NominatimBackend::new()
}

/// Get the IP location service
pub fn get_ip_locator() -> ip_location::IpLocator {
    ip_location::IpLocator::new()
}
