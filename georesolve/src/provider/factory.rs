//! Provider factory and tier assembly.
//!
//! Centralizes provider creation so the resolver and CLI build the tier
//! list the same way. Provider enablement is decided here, once, at process
//! start: a credential present in the environment enables its tier, an
//! absent credential disables it, and nothing changes at runtime.

use tracing::info;

use super::google::GoogleMapsProvider;
use super::http::{AsyncHttpClient, AsyncReqwestClient};
use super::ors::OrsProvider;
use super::types::{GeoProvider, ProviderError};
use crate::geo::Location;
use crate::model::{
    GeocodeResult, IsochroneBand, OptimizedItinerary, RouteInfo, RouteMatrix, TravelProfile,
};

/// Environment variable holding the OpenRouteService API key.
pub const ORS_API_KEY_ENV: &str = "ORS_API_KEY";

/// Environment variable holding the Google Maps Platform API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Configuration for creating a provider tier.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// OpenRouteService (free tier, quota-limited).
    Ors {
        /// OpenRouteService API key
        api_key: String,
    },

    /// Google Maps Platform (paid tier).
    Google {
        /// Google Maps Platform API key
        api_key: String,
    },
}

impl ProviderConfig {
    /// Create an OpenRouteService configuration with the given API key.
    pub fn ors(api_key: impl Into<String>) -> Self {
        Self::Ors {
            api_key: api_key.into(),
        }
    }

    /// Create a Google Maps configuration with the given API key.
    pub fn google(api_key: impl Into<String>) -> Self {
        Self::Google {
            api_key: api_key.into(),
        }
    }

    /// Returns the provider name for this configuration.
    pub fn name(&self) -> &str {
        match self {
            Self::Ors { .. } => "OpenRouteService",
            Self::Google { .. } => "Google Maps",
        }
    }
}

/// Factory for creating provider instances.
pub struct ProviderFactory {
    http_client: AsyncReqwestClient,
}

impl ProviderFactory {
    /// Create a new provider factory with the given HTTP client.
    pub fn new(http_client: AsyncReqwestClient) -> Self {
        Self { http_client }
    }

    /// Create a provider from the given configuration.
    ///
    /// The HTTP client is shared (cloned) across providers so they reuse
    /// one connection pool.
    pub fn create(&self, config: &ProviderConfig) -> ProviderKind {
        match config {
            ProviderConfig::Ors { api_key } => {
                ProviderKind::Ors(OrsProvider::new(self.http_client.clone(), api_key.clone()))
            }
            ProviderConfig::Google { api_key } => ProviderKind::Google(GoogleMapsProvider::new(
                self.http_client.clone(),
                api_key.clone(),
            )),
        }
    }
}

/// Enum holding the concrete provider types.
///
/// This allows the resolver to keep a homogeneous tier list while each
/// provider stays a distinct concrete type.
pub enum ProviderKind {
    Ors(OrsProvider<AsyncReqwestClient>),
    Google(GoogleMapsProvider<AsyncReqwestClient>),
}

impl GeoProvider for ProviderKind {
    fn name(&self) -> &str {
        match self {
            Self::Ors(p) => p.name(),
            Self::Google(p) => p.name(),
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            Self::Ors(p) => p.is_enabled(),
            Self::Google(p) => p.is_enabled(),
        }
    }

    async fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<GeocodeResult, ProviderError> {
        match self {
            Self::Ors(p) => p.geocode(query, country_hint).await,
            Self::Google(p) => p.geocode(query, country_hint).await,
        }
    }

    async fn reverse_geocode(&self, location: &Location) -> Result<String, ProviderError> {
        match self {
            Self::Ors(p) => p.reverse_geocode(location).await,
            Self::Google(p) => p.reverse_geocode(location).await,
        }
    }

    async fn route(
        &self,
        origin: &Location,
        destination: &Location,
        profile: TravelProfile,
    ) -> Result<RouteInfo, ProviderError> {
        match self {
            Self::Ors(p) => p.route(origin, destination, profile).await,
            Self::Google(p) => p.route(origin, destination, profile).await,
        }
    }

    async fn distance_matrix(
        &self,
        origins: &[Location],
        destinations: &[Location],
        profile: TravelProfile,
    ) -> Result<RouteMatrix, ProviderError> {
        match self {
            Self::Ors(p) => p.distance_matrix(origins, destinations, profile).await,
            Self::Google(p) => p.distance_matrix(origins, destinations, profile).await,
        }
    }

    async fn optimize_route(
        &self,
        start: &Location,
        stops: &[Location],
        end: Option<&Location>,
        profile: TravelProfile,
    ) -> Result<OptimizedItinerary, ProviderError> {
        match self {
            Self::Ors(p) => p.optimize_route(start, stops, end, profile).await,
            Self::Google(p) => p.optimize_route(start, stops, end, profile).await,
        }
    }

    async fn isochrone(
        &self,
        center: &Location,
        ranges_seconds: &[u32],
        profile: TravelProfile,
    ) -> Result<Vec<IsochroneBand>, ProviderError> {
        match self {
            Self::Ors(p) => p.isochrone(center, ranges_seconds, profile).await,
            Self::Google(p) => p.isochrone(center, ranges_seconds, profile).await,
        }
    }
}

/// Assembles the provider tier list from the environment.
///
/// Tiers are ordered by cost: the free quota-limited tier first, the paid
/// tier second. A missing or empty credential simply omits that tier; it is
/// never an error, and the resolver still works with an empty list via its
/// local fallbacks.
pub fn providers_from_env(http_client: AsyncReqwestClient) -> Vec<ProviderKind> {
    let factory = ProviderFactory::new(http_client);
    let mut providers = Vec::new();

    if let Some(key) = non_empty_env(ORS_API_KEY_ENV) {
        providers.push(factory.create(&ProviderConfig::ors(key)));
        info!(provider = "OpenRouteService", "provider tier enabled");
    }
    if let Some(key) = non_empty_env(GOOGLE_API_KEY_ENV) {
        providers.push(factory.create(&ProviderConfig::google(key)));
        info!(provider = "Google Maps", "provider tier enabled");
    }

    if providers.is_empty() {
        info!("no provider credentials configured; running fully offline");
    }
    providers
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
