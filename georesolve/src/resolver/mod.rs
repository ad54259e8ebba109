//! Tiered resolution orchestrator.
//!
//! Single entry point exposed to the rest of the application; hides
//! provider selection entirely. Every operation walks the configured
//! provider list in fixed priority order (free quota-limited tier first,
//! paid tier second), returns the first successful result, and reports
//! which tier answered through an injectable observer. When every provider
//! tier fails, a fully local computation answers: great-circle math for
//! routes and matrices, the static gazetteer for geocoding.
//!
//! Each call resolves via exactly one tier; results are never blended
//! across tiers for a single logical call. Every provider attempt is
//! bounded by the configured per-call timeout, and a timed-out call is
//! treated exactly like a failed one. Dropping the returned future abandons
//! any in-flight provider call; no background work outlives the request.

mod gazetteer;

pub use gazetteer::region_centroid;

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::geo::{self, GeoError, Location};
use crate::model::{
    GeocodeResult, IsochroneBand, MatrixEntry, OptimizedItinerary, RouteInfo, RouteMatrix,
    TravelProfile,
};
use crate::provider::{GeoProvider, ProviderError};

/// Tier name reported when local great-circle math answered.
pub const FALLBACK_TIER: &str = "great-circle";

/// Number of vertices in a synthesized isochrone ring.
const ISOCHRONE_RING_POINTS: u32 = 32;

/// Observer of tier-selection decisions.
///
/// Injectable so tier-selection frequency is testable and monitorable
/// without parsing log text. The default implementation emits `tracing`
/// events.
pub trait TierObserver: Send + Sync {
    /// Called once per resolved operation with the tier that answered.
    fn tier_selected(&self, operation: &str, tier: &str);
}

/// Default observer: structured log events via `tracing`.
pub struct TracingTierObserver;

impl TierObserver for TracingTierObserver {
    fn tier_selected(&self, operation: &str, tier: &str) {
        debug!(operation, tier, "operation resolved");
    }
}

/// The tiered resolver.
///
/// Holds the ordered provider list (read-only after construction; there is
/// no credential hot-reload) and is safe to share across concurrent
/// request handlers without locking.
pub struct TieredResolver<P: GeoProvider> {
    providers: Vec<P>,
    config: ResolverConfig,
    observer: Arc<dyn TierObserver>,
}

impl<P: GeoProvider> TieredResolver<P> {
    /// Creates a resolver over the given provider tiers.
    ///
    /// Providers are consulted in the order given; construct the list via
    /// [`crate::provider::providers_from_env`] for the standard cost-ordered
    /// tiers.
    pub fn new(providers: Vec<P>, config: ResolverConfig) -> Self {
        Self {
            providers,
            config,
            observer: Arc::new(TracingTierObserver),
        }
    }

    /// Replaces the tier-selection observer.
    pub fn with_observer(mut self, observer: Arc<dyn TierObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Walks the provider tiers for one operation, returning the first
    /// successful result.
    ///
    /// Disabled providers are skipped without I/O; failures and timeouts
    /// advance to the next tier.
    async fn walk<'s, T, F, Fut>(&'s self, operation: &'static str, call: F) -> Option<T>
    where
        F: Fn(&'s P) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        for provider in &self.providers {
            if !provider.is_enabled() {
                debug!(provider = provider.name(), operation, "tier disabled, skipping");
                continue;
            }
            match tokio::time::timeout(self.config.provider_timeout, call(provider)).await {
                Ok(Ok(value)) => {
                    self.observer.tier_selected(operation, provider.name());
                    return Some(value);
                }
                Ok(Err(err)) => {
                    debug!(
                        provider = provider.name(),
                        operation,
                        error = %err,
                        "tier failed, trying next"
                    );
                }
                Err(_) => {
                    warn!(
                        provider = provider.name(),
                        operation,
                        timeout_ms = self.config.provider_timeout.as_millis() as u64,
                        "tier timed out, trying next"
                    );
                }
            }
        }
        None
    }

    /// Geocodes free-text into a position.
    ///
    /// Falls back to the static service-region gazetteer when no provider
    /// answers. `Ok(None)` is the explicit could-not-resolve outcome so the
    /// caller can prompt for manual input; it is never an error.
    pub async fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<Option<GeocodeResult>, GeoError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeoError::EmptyQuery);
        }

        if let Some(result) = self.walk("geocode", |p| p.geocode(query, country_hint)).await {
            return Ok(Some(result));
        }

        if let Some(result) = gazetteer::lookup(query) {
            self.observer.tier_selected("geocode", gazetteer::TIER_NAME);
            return Ok(Some(result));
        }
        Ok(None)
    }

    /// Geocodes free-text, defaulting to the service-region centroid when
    /// even the gazetteer cannot resolve the query.
    ///
    /// The centroid result carries zero confidence so callers can tell a
    /// real match from the last-resort default.
    pub async fn geocode_or_centroid(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<GeocodeResult, GeoError> {
        Ok(self.geocode(query, country_hint).await?.unwrap_or_else(|| {
            self.observer.tier_selected("geocode", "region-centroid");
            GeocodeResult {
                location: gazetteer::region_centroid(),
                confidence: 0.0,
                place_type: "region".to_string(),
            }
        }))
    }

    /// Resolves a position into a formatted address.
    ///
    /// Falls back to the nearest gazetteer locality within the service
    /// region; `Ok(None)` when the point is far from every known place.
    pub async fn reverse_geocode(&self, location: &Location) -> Result<Option<String>, GeoError> {
        location.validate()?;

        if let Some(address) = self
            .walk("reverse_geocode", |p| p.reverse_geocode(location))
            .await
        {
            return Ok(Some(address));
        }

        if let Some(address) = gazetteer::nearest(location) {
            self.observer
                .tier_selected("reverse_geocode", gazetteer::TIER_NAME);
            return Ok(Some(address));
        }
        Ok(None)
    }

    /// Computes a point-to-point route.
    ///
    /// Never fails for valid coordinates: when every provider tier is
    /// exhausted, great-circle distance and a linear duration estimate
    /// answer deterministically (with no path geometry or steps).
    pub async fn route(
        &self,
        origin: &Location,
        destination: &Location,
        profile: TravelProfile,
    ) -> Result<RouteInfo, GeoError> {
        origin.validate()?;
        destination.validate()?;

        if let Some(route) = self
            .walk("route", |p| p.route(origin, destination, profile))
            .await
        {
            return Ok(route);
        }

        let meters = geo::distance_meters(origin, destination);
        let seconds = geo::estimate_duration_secs(meters, self.config.average_speed_kmh);
        self.observer.tier_selected("route", FALLBACK_TIER);
        Ok(RouteInfo {
            distance_meters: meters.round() as u32,
            duration_seconds: seconds.round() as u32,
            encoded_path: None,
            steps: None,
        })
    }

    /// Computes a distance/duration matrix.
    ///
    /// Tries the providers' batched matrix endpoints first. When no
    /// provider answers the batch, the request is decomposed into
    /// independent `route()` calls — each itself tier-resolved — fanned
    /// out concurrently, so every cell always gets some answer.
    pub async fn distance_matrix(
        &self,
        origins: &[Location],
        destinations: &[Location],
        profile: TravelProfile,
    ) -> Result<RouteMatrix, GeoError> {
        if origins.is_empty() || destinations.is_empty() {
            return Err(GeoError::EmptyMatrix);
        }
        for location in origins.iter().chain(destinations) {
            location.validate()?;
        }

        if let Some(matrix) = self
            .walk("distance_matrix", |p| {
                p.distance_matrix(origins, destinations, profile)
            })
            .await
        {
            return Ok(matrix);
        }

        debug!(
            origins = origins.len(),
            destinations = destinations.len(),
            "no provider answered the batched matrix; decomposing into routes"
        );
        let mut rows = Vec::with_capacity(origins.len());
        for origin in origins {
            let legs = futures::future::join_all(
                destinations
                    .iter()
                    .map(|destination| self.route(origin, destination, profile)),
            )
            .await;
            let mut row = Vec::with_capacity(destinations.len());
            for leg in legs {
                let info = leg?;
                row.push(MatrixEntry {
                    distance_meters: info.distance_meters,
                    duration_seconds: info.duration_seconds,
                });
            }
            rows.push(row);
        }
        Ok(RouteMatrix { rows })
    }

    /// Computes reachability bands around a center.
    ///
    /// When no provider answers, each band degrades to a great-circle ring
    /// at the distance reachable in the band's time budget at the
    /// configured average speed.
    pub async fn isochrone(
        &self,
        center: &Location,
        ranges_seconds: &[u32],
        profile: TravelProfile,
    ) -> Result<Vec<IsochroneBand>, GeoError> {
        center.validate()?;
        if ranges_seconds.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(bands) = self
            .walk("isochrone", |p| p.isochrone(center, ranges_seconds, profile))
            .await
        {
            return Ok(bands);
        }

        self.observer.tier_selected("isochrone", FALLBACK_TIER);
        let meters_per_second = self.config.average_speed_kmh / 3.6;
        let bands = ranges_seconds
            .iter()
            .map(|&range| {
                let radius = meters_per_second * range as f64;
                let mut polygon: Vec<Location> = (0..ISOCHRONE_RING_POINTS)
                    .map(|i| {
                        let bearing = 360.0 * i as f64 / ISOCHRONE_RING_POINTS as f64;
                        geo::destination(center, bearing, radius)
                    })
                    .collect();
                // Close the ring
                if let Some(first) = polygon.first().cloned() {
                    polygon.push(first);
                }
                IsochroneBand {
                    range_seconds: range,
                    polygon,
                }
            })
            .collect();
        Ok(bands)
    }

    /// Walks the provider tiers for native route optimization.
    ///
    /// Returns `None` when no provider can answer; the optimizer then runs
    /// its local nearest-neighbor heuristic.
    pub(crate) async fn optimize_via_providers(
        &self,
        start: &Location,
        stops: &[Location],
        end: Option<&Location>,
        profile: TravelProfile,
    ) -> Option<OptimizedItinerary> {
        self.walk("optimize_route", |p| {
            p.optimize_route(start, stops, end, profile)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted provider double with per-operation canned outcomes.
    struct StubProvider {
        name: &'static str,
        enabled: bool,
        delay: Option<Duration>,
        geocode: Result<GeocodeResult, ProviderError>,
        reverse: Result<String, ProviderError>,
        route: Result<RouteInfo, ProviderError>,
        matrix: Result<RouteMatrix, ProviderError>,
        optimize: Result<OptimizedItinerary, ProviderError>,
        isochrone: Result<Vec<IsochroneBand>, ProviderError>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn failing(name: &'static str) -> Self {
            Self {
                name,
                enabled: true,
                delay: None,
                geocode: Err(ProviderError::NoResult),
                reverse: Err(ProviderError::NoResult),
                route: Err(ProviderError::Http("unreachable".to_string())),
                matrix: Err(ProviderError::Http("unreachable".to_string())),
                optimize: Err(ProviderError::Unsupported("optimization")),
                isochrone: Err(ProviderError::Unsupported("isochrones")),
                calls: AtomicUsize::new(0),
            }
        }

        fn disabled(name: &'static str) -> Self {
            Self {
                enabled: false,
                ..Self::failing(name)
            }
        }

        fn with_route(mut self, route: RouteInfo) -> Self {
            self.route = Ok(route);
            self
        }

        fn with_geocode(mut self, result: GeocodeResult) -> Self {
            self.geocode = Ok(result);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn record<T: Clone>(
            &self,
            outcome: &Result<T, ProviderError>,
        ) -> Result<T, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            outcome.clone()
        }
    }

    impl GeoProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        async fn geocode(
            &self,
            _query: &str,
            _country_hint: Option<&str>,
        ) -> Result<GeocodeResult, ProviderError> {
            self.record(&self.geocode).await
        }

        async fn reverse_geocode(&self, _location: &Location) -> Result<String, ProviderError> {
            self.record(&self.reverse).await
        }

        async fn route(
            &self,
            _origin: &Location,
            _destination: &Location,
            _profile: TravelProfile,
        ) -> Result<RouteInfo, ProviderError> {
            self.record(&self.route).await
        }

        async fn distance_matrix(
            &self,
            _origins: &[Location],
            _destinations: &[Location],
            _profile: TravelProfile,
        ) -> Result<RouteMatrix, ProviderError> {
            self.record(&self.matrix).await
        }

        async fn optimize_route(
            &self,
            _start: &Location,
            _stops: &[Location],
            _end: Option<&Location>,
            _profile: TravelProfile,
        ) -> Result<OptimizedItinerary, ProviderError> {
            self.record(&self.optimize).await
        }

        async fn isochrone(
            &self,
            _center: &Location,
            _ranges_seconds: &[u32],
            _profile: TravelProfile,
        ) -> Result<Vec<IsochroneBand>, ProviderError> {
            self.record(&self.isochrone).await
        }
    }

    /// Observer double recording every tier selection.
    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<(String, String)>>,
    }

    impl TierObserver for RecordingObserver {
        fn tier_selected(&self, operation: &str, tier: &str) {
            self.events
                .lock()
                .unwrap()
                .push((operation.to_string(), tier.to_string()));
        }
    }

    fn lipa() -> Location {
        Location::new(13.9411, 121.1625)
    }

    fn batangas() -> Location {
        Location::new(13.7565, 121.0583)
    }

    fn sample_route() -> RouteInfo {
        RouteInfo {
            distance_meters: 24731,
            duration_seconds: 2213,
            encoded_path: Some("encoded".to_string()),
            steps: None,
        }
    }

    fn resolver(providers: Vec<StubProvider>) -> TieredResolver<StubProvider> {
        TieredResolver::new(providers, ResolverConfig::default())
    }

    #[tokio::test]
    async fn test_first_successful_tier_wins() {
        let first = StubProvider::failing("first").with_route(sample_route());
        let second = StubProvider::failing("second").with_route(RouteInfo {
            distance_meters: 1,
            duration_seconds: 1,
            encoded_path: None,
            steps: None,
        });
        let resolver = resolver(vec![first, second]);

        let route = resolver
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(route, sample_route());
        // The second tier must not have been consulted
        assert_eq!(resolver.providers[1].call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_tier_advances_to_next() {
        let first = StubProvider::failing("first");
        let second = StubProvider::failing("second").with_route(sample_route());
        let resolver = resolver(vec![first, second]);

        let route = resolver
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(route, sample_route());
        assert_eq!(resolver.providers[0].call_count(), 1);
        assert_eq!(resolver.providers[1].call_count(), 1);
    }

    #[tokio::test]
    async fn test_disabled_tier_skipped_without_io() {
        let disabled = StubProvider::disabled("disabled");
        let enabled = StubProvider::failing("enabled").with_route(sample_route());
        let resolver = resolver(vec![disabled, enabled]);

        resolver
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(resolver.providers[0].call_count(), 0);
    }

    #[tokio::test]
    async fn test_route_falls_back_to_great_circle() {
        let resolver = resolver(vec![StubProvider::failing("down")]);

        let route = resolver
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        assert!(route.distance_meters > 0);
        assert!(route.duration_seconds > 0);
        assert!(route.encoded_path.is_none());
        assert!(route.steps.is_none());
    }

    #[tokio::test]
    async fn test_route_identical_points_is_zero() {
        let resolver = resolver(vec![]);
        let route = resolver
            .route(&lipa(), &lipa(), TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(route.distance_meters, 0);
        assert_eq!(route.duration_seconds, 0);
    }

    #[tokio::test]
    async fn test_route_rejects_invalid_coordinates_before_any_tier() {
        let provider = StubProvider::failing("untouched").with_route(sample_route());
        let resolver = resolver(vec![provider]);

        let bad = Location::new(91.0, 0.0);
        let result = resolver.route(&bad, &lipa(), TravelProfile::Driving).await;
        assert_eq!(result, Err(GeoError::InvalidLatitude(91.0)));
        assert_eq!(resolver.providers[0].call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_tier_times_out_and_falls_back() {
        let slow = StubProvider::failing("slow")
            .with_route(sample_route())
            .with_delay(Duration::from_secs(60));
        let config = ResolverConfig::default().with_provider_timeout(Duration::from_millis(100));
        let resolver = TieredResolver::new(vec![slow], config);

        let route = resolver
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        // Timeout is treated like a failure; the great-circle tier answers
        assert!(route.encoded_path.is_none());
        assert!(route.distance_meters > 0);
    }

    #[tokio::test]
    async fn test_geocode_empty_query_rejected() {
        let resolver = resolver(vec![]);
        assert_eq!(
            resolver.geocode("   ", None).await,
            Err(GeoError::EmptyQuery)
        );
    }

    #[tokio::test]
    async fn test_geocode_gazetteer_fallback() {
        let resolver = resolver(vec![StubProvider::failing("down")]);
        let result = resolver.geocode("Lipa City", Some("PH")).await.unwrap().unwrap();
        assert_eq!(result.location.latitude, 13.9411);
        assert_eq!(result.location.longitude, 121.1625);
    }

    #[tokio::test]
    async fn test_geocode_unknown_place_is_none() {
        let resolver = resolver(vec![]);
        let result = resolver.geocode("Reykjavik", None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_geocode_or_centroid_default() {
        let resolver = resolver(vec![]);
        let result = resolver.geocode_or_centroid("Reykjavik", None).await.unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.location.latitude, 13.9411);
        assert_eq!(result.place_type, "region");
    }

    #[tokio::test]
    async fn test_geocode_provider_preferred_over_gazetteer() {
        let provider_result = GeocodeResult {
            location: Location::new(13.95, 121.17).with_address("SM City Lipa"),
            confidence: 0.95,
            place_type: "venue".to_string(),
        };
        let provider = StubProvider::failing("up").with_geocode(provider_result.clone());
        let resolver = resolver(vec![provider]);

        let result = resolver.geocode("Lipa City", None).await.unwrap().unwrap();
        assert_eq!(result, provider_result);
    }

    #[tokio::test]
    async fn test_reverse_geocode_gazetteer_fallback() {
        let resolver = resolver(vec![]);
        let address = resolver.reverse_geocode(&lipa()).await.unwrap().unwrap();
        assert!(address.contains("Lipa City"));
    }

    #[tokio::test]
    async fn test_reverse_geocode_far_from_region_is_none() {
        let resolver = resolver(vec![]);
        let far = Location::new(51.5074, -0.1278);
        assert_eq!(resolver.reverse_geocode(&far).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_matrix_decomposes_into_routes() {
        // Matrix endpoint fails but per-pair routes succeed
        let provider = StubProvider::failing("partial").with_route(sample_route());
        let resolver = resolver(vec![provider]);

        let origins = [lipa(), batangas()];
        let destinations = [lipa(), batangas()];
        let matrix = resolver
            .distance_matrix(&origins, &destinations, TravelProfile::Driving)
            .await
            .unwrap();

        assert_eq!(matrix.rows.len(), 2);
        for row in &matrix.rows {
            assert_eq!(row.len(), 2);
            for entry in row {
                assert_eq!(entry.distance_meters, sample_route().distance_meters);
            }
        }
    }

    #[tokio::test]
    async fn test_matrix_fully_local() {
        let resolver = resolver(vec![]);
        let origins = [lipa()];
        let destinations = [lipa(), batangas()];
        let matrix = resolver
            .distance_matrix(&origins, &destinations, TravelProfile::Driving)
            .await
            .unwrap();

        assert_eq!(matrix.get(0, 0).unwrap().distance_meters, 0);
        assert!(matrix.get(0, 1).unwrap().distance_meters > 0);
    }

    #[tokio::test]
    async fn test_matrix_empty_axis_rejected() {
        let resolver = resolver(vec![]);
        let result = resolver
            .distance_matrix(&[], &[lipa()], TravelProfile::Driving)
            .await;
        assert_eq!(result, Err(GeoError::EmptyMatrix));
    }

    #[tokio::test]
    async fn test_isochrone_fallback_rings() {
        let config = ResolverConfig::default();
        let resolver = TieredResolver::new(Vec::<StubProvider>::new(), config);

        let bands = resolver
            .isochrone(&lipa(), &[600, 1200], TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].range_seconds, 600);
        // Closed ring: first and last vertex coincide
        assert_eq!(bands[0].polygon.len() as u32, ISOCHRONE_RING_POINTS + 1);
        assert_eq!(bands[0].polygon.first(), bands[0].polygon.last());

        // 600 s at 30 km/h is 5 km; ring vertices sit at that radius
        let radius = geo::distance_meters(&lipa(), &bands[0].polygon[0]);
        assert!((radius - 5_000.0).abs() < 5.0, "radius {}", radius);
    }

    #[tokio::test]
    async fn test_isochrone_empty_ranges() {
        let resolver = resolver(vec![]);
        let bands = resolver
            .isochrone(&lipa(), &[], TravelProfile::Driving)
            .await
            .unwrap();
        assert!(bands.is_empty());
    }

    #[tokio::test]
    async fn test_observer_records_answering_tier() {
        let observer = Arc::new(RecordingObserver::default());
        let provider = StubProvider::failing("ors-stub").with_route(sample_route());
        let resolver = TieredResolver::new(vec![provider], ResolverConfig::default())
            .with_observer(observer.clone());

        resolver
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        resolver.geocode("Lipa City", None).await.unwrap();

        let events = observer.events.lock().unwrap();
        assert!(events.contains(&("route".to_string(), "ors-stub".to_string())));
        assert!(events.contains(&("geocode".to_string(), gazetteer::TIER_NAME.to_string())));
    }
}
