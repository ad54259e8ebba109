//! Geographic type definitions

use serde::Serialize;
use thiserror::Error;

/// Valid latitude range in degrees
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range in degrees
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// A geographic position, optionally carrying the address it was resolved from.
///
/// Immutable value type; passed by value everywhere and never owned by a
/// single component. Latitude must be within [-90, 90] and longitude within
/// [-180, 180]; [`Location::validate`] enforces the invariant before any
/// resolution tier is attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    /// Latitude in decimal degrees, positive north
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east
    pub longitude: f64,
    /// Free-text address this position was resolved from, if known
    pub address: Option<String>,
}

impl Location {
    /// Creates a location from latitude/longitude in decimal degrees.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            address: None,
        }
    }

    /// Attaches an address string to this location.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Checks the coordinate range invariant.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidLatitude`] or [`GeoError::InvalidLongitude`]
    /// if either component is outside its valid range or not finite.
    pub fn validate(&self) -> Result<(), GeoError> {
        if !self.latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(GeoError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(GeoError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

/// Invalid-input errors, rejected before any resolution tier is attempted.
///
/// These are signaled distinctly from provider failures so callers can show
/// a validation message rather than "service unavailable".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude is outside the valid range (-90 to 90)
    #[error("invalid latitude {0} (must be between {MIN_LAT} and {MAX_LAT})")]
    InvalidLatitude(f64),

    /// Longitude is outside the valid range (-180 to 180)
    #[error("invalid longitude {0} (must be between {MIN_LON} and {MAX_LON})")]
    InvalidLongitude(f64),

    /// Geocode query text is empty or whitespace-only
    #[error("geocode query is empty")]
    EmptyQuery,

    /// Route optimization was requested with no stops
    #[error("stop list is empty")]
    EmptyStops,

    /// Distance matrix was requested with an empty origin or destination axis
    #[error("distance matrix requires at least one origin and one destination")]
    EmptyMatrix,
}
