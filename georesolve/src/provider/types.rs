//! Provider types and traits

use std::future::Future;

use thiserror::Error;

use crate::geo::Location;
use crate::model::{
    GeocodeResult, IsochroneBand, OptimizedItinerary, RouteInfo, RouteMatrix, TravelProfile,
};

/// Failure of a single provider tier.
///
/// Failure is a value, not an exception: every variant sends the resolver to
/// the next tier cheaply and uniformly, and none of them is ever surfaced
/// raw to callers of the resolution layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Provider has no credential configured; short-circuited without I/O
    #[error("provider is disabled (no credential configured)")]
    Disabled,

    /// Network failure or non-2xx response
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be parsed into the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider answered but found nothing for the query
    #[error("no result for query")]
    NoResult,

    /// This provider does not offer the capability at all
    #[error("operation not supported by this provider: {0}")]
    Unsupported(&'static str),
}

/// Trait for external geospatial capability providers.
///
/// Each implementor adapts one third-party API (OpenRouteService, Google
/// Maps, ...) into the shared capability set. Implementations use async
/// HTTP clients injected at construction, enabling mock clients in tests.
///
/// Every operation returns `Err` on any failure so the tiered resolver can
/// advance to the next tier; providers never panic on provider-side
/// problems. Batch operations put all coordinates into one request where
/// the API supports it, to conserve quota on rate-limited tiers.
pub trait GeoProvider: Send + Sync {
    /// Returns the provider's name for logging and tier identification.
    fn name(&self) -> &str;

    /// Reports whether the required credential was present at construction.
    ///
    /// Disabled providers short-circuit every operation to
    /// [`ProviderError::Disabled`] without attempting I/O. Enablement is
    /// fixed at process start; there is no credential hot-reload.
    fn is_enabled(&self) -> bool;

    /// Geocodes free-text into a position with confidence and place type.
    fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> impl Future<Output = Result<GeocodeResult, ProviderError>> + Send;

    /// Resolves a position into a formatted address string.
    fn reverse_geocode(
        &self,
        location: &Location,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Computes a point-to-point route for the given travel profile.
    fn route(
        &self,
        origin: &Location,
        destination: &Location,
        profile: TravelProfile,
    ) -> impl Future<Output = Result<RouteInfo, ProviderError>> + Send;

    /// Computes a distance/duration matrix in a single batched request.
    fn distance_matrix(
        &self,
        origins: &[Location],
        destinations: &[Location],
        profile: TravelProfile,
    ) -> impl Future<Output = Result<RouteMatrix, ProviderError>> + Send;

    /// Orders stops into a low-total-distance itinerary using the
    /// provider's native vehicle-routing optimization.
    fn optimize_route(
        &self,
        start: &Location,
        stops: &[Location],
        end: Option<&Location>,
        profile: TravelProfile,
    ) -> impl Future<Output = Result<OptimizedItinerary, ProviderError>> + Send;

    /// Computes reachability polygons for the given travel-time budgets.
    fn isochrone(
        &self,
        center: &Location,
        ranges_seconds: &[u32],
        profile: TravelProfile,
    ) -> impl Future<Output = Result<Vec<IsochroneBand>, ProviderError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_disabled() {
        let err = ProviderError::Disabled;
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_error_display_http() {
        let err = ProviderError::Http("HTTP 503 from host".to_string());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_error_display_unsupported() {
        let err = ProviderError::Unsupported("isochrones");
        assert!(err.to_string().contains("isochrones"));
    }
}
