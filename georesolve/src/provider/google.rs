//! Google Maps Platform provider.
//!
//! Adapts the Google Maps web service APIs (Geocoding, Directions, Distance
//! Matrix) into the shared capability set. This is the paid tier: it sits
//! after the free tier in the resolver's priority order and is only
//! consulted when cheaper tiers could not answer.
//!
//! Native multi-stop optimization uses the Directions API's
//! `waypoints=optimize:true` mode. Google offers no isochrone endpoint, so
//! that capability reports [`ProviderError::Unsupported`] and the resolver
//! moves on.

use serde::Deserialize;

use crate::geo::Location;
use crate::model::{
    GeocodeResult, IsochroneBand, MatrixEntry, OptimizedItinerary, RouteInfo, RouteMatrix,
    RouteStep, TravelProfile,
};
use crate::provider::{AsyncHttpClient, GeoProvider, ProviderError};

/// Base URL for the Google Maps web service APIs.
const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Google Maps provider.
///
/// Requires a Google Maps Platform API key with the Geocoding, Directions
/// and Distance Matrix APIs enabled. An empty key yields a disabled
/// provider.
pub struct GoogleMapsProvider<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
}

impl<C: AsyncHttpClient> GoogleMapsProvider<C> {
    /// Creates a new Google Maps provider with the given API key.
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
        }
    }

    /// Maps the shared travel profile onto Directions API modes.
    fn google_mode(profile: TravelProfile) -> &'static str {
        match profile {
            TravelProfile::Driving => "driving",
            TravelProfile::Cycling => "bicycling",
            TravelProfile::Walking => "walking",
        }
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<String, ProviderError> {
        reqwest::Url::parse_with_params(&format!("{}{}", GOOGLE_BASE_URL, path), params)
            .map(String::from)
            .map_err(|e| ProviderError::Http(format!("invalid request URL: {}", e)))
    }

    fn guard_enabled(&self) -> Result<(), ProviderError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(ProviderError::Disabled)
        }
    }

    async fn directions(
        &self,
        params: Vec<(&str, String)>,
    ) -> Result<GoogleRoute, ProviderError> {
        let url = self.build_url("/directions/json", &params)?;
        let body = self.http_client.get(&url).await?;
        let response: GoogleDirectionsResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_status(&response.status)?;
        response.routes.into_iter().next().ok_or(ProviderError::NoResult)
    }
}

/// `lat,lng` formatting used across the Google web service APIs.
fn lat_lng(location: &Location) -> String {
    format!("{},{}", location.latitude, location.longitude)
}

/// Maps Google geocoding precision onto a [0, 1] confidence value.
///
/// The Geocoding API reports a qualitative `location_type` rather than a
/// numeric confidence.
fn confidence_for(location_type: Option<&str>) -> f64 {
    match location_type {
        Some("ROOFTOP") => 1.0,
        Some("RANGE_INTERPOLATED") => 0.8,
        Some("GEOMETRIC_CENTER") => 0.6,
        Some("APPROXIMATE") => 0.4,
        _ => 0.5,
    }
}

/// Strips HTML tags from Directions API instructions.
fn strip_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => output.push(ch),
            _ => {}
        }
    }
    output
}

fn check_status(status: &str) -> Result<(), ProviderError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(ProviderError::NoResult),
        other => Err(ProviderError::InvalidResponse(format!(
            "API status {}",
            other
        ))),
    }
}

fn leg_steps(leg: &GoogleLeg) -> Vec<RouteStep> {
    leg.steps
        .iter()
        .map(|step| RouteStep {
            instruction: strip_html(&step.html_instructions),
            distance_meters: step.distance.value as u32,
            duration_seconds: step.duration.value as u32,
            road_name: None,
        })
        .collect()
}

impl<C: AsyncHttpClient> GeoProvider for GoogleMapsProvider<C> {
    fn name(&self) -> &str {
        "Google Maps"
    }

    fn is_enabled(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn geocode(
        &self,
        query: &str,
        country_hint: Option<&str>,
    ) -> Result<GeocodeResult, ProviderError> {
        self.guard_enabled()?;

        let mut params = vec![
            ("address", query.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(country) = country_hint {
            params.push(("components", format!("country:{}", country)));
        }
        let url = self.build_url("/geocode/json", &params)?;

        let body = self.http_client.get(&url).await?;
        let response: GoogleGeocodeResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_status(&response.status)?;
        let result = response.results.into_iter().next().ok_or(ProviderError::NoResult)?;

        let mut location = Location::new(
            result.geometry.location.lat,
            result.geometry.location.lng,
        );
        if let Some(address) = &result.formatted_address {
            location = location.with_address(address.clone());
        }

        Ok(GeocodeResult {
            location,
            confidence: confidence_for(result.geometry.location_type.as_deref()),
            place_type: result
                .types
                .into_iter()
                .next()
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn reverse_geocode(&self, location: &Location) -> Result<String, ProviderError> {
        self.guard_enabled()?;

        let params = [
            ("latlng", lat_lng(location)),
            ("key", self.api_key.clone()),
        ];
        let url = self.build_url("/geocode/json", &params)?;

        let body = self.http_client.get(&url).await?;
        let response: GoogleGeocodeResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_status(&response.status)?;
        response
            .results
            .into_iter()
            .next()
            .and_then(|r| r.formatted_address)
            .ok_or(ProviderError::NoResult)
    }

    async fn route(
        &self,
        origin: &Location,
        destination: &Location,
        profile: TravelProfile,
    ) -> Result<RouteInfo, ProviderError> {
        self.guard_enabled()?;

        let route = self
            .directions(vec![
                ("origin", lat_lng(origin)),
                ("destination", lat_lng(destination)),
                ("mode", Self::google_mode(profile).to_string()),
                ("key", self.api_key.clone()),
            ])
            .await?;

        let leg = route.legs.first().ok_or_else(|| {
            ProviderError::InvalidResponse("route without legs".to_string())
        })?;
        let steps = leg_steps(leg);

        Ok(RouteInfo {
            distance_meters: leg.distance.value as u32,
            duration_seconds: leg.duration.value as u32,
            encoded_path: route.overview_polyline.map(|p| p.points),
            steps: if steps.is_empty() { None } else { Some(steps) },
        })
    }

    async fn distance_matrix(
        &self,
        origins: &[Location],
        destinations: &[Location],
        profile: TravelProfile,
    ) -> Result<RouteMatrix, ProviderError> {
        self.guard_enabled()?;

        let join = |locations: &[Location]| {
            locations
                .iter()
                .map(lat_lng)
                .collect::<Vec<_>>()
                .join("|")
        };
        let params = [
            ("origins", join(origins)),
            ("destinations", join(destinations)),
            ("mode", Self::google_mode(profile).to_string()),
            ("key", self.api_key.clone()),
        ];
        let url = self.build_url("/distancematrix/json", &params)?;

        let body = self.http_client.get(&url).await?;
        let response: GoogleMatrixResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        check_status(&response.status)?;
        if response.rows.len() != origins.len() {
            return Err(ProviderError::InvalidResponse(
                "matrix dimensions do not match request".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(origins.len());
        for row in response.rows {
            if row.elements.len() != destinations.len() {
                return Err(ProviderError::InvalidResponse(
                    "matrix dimensions do not match request".to_string(),
                ));
            }
            let mut entries = Vec::with_capacity(destinations.len());
            for element in row.elements {
                if element.status != "OK" {
                    // Fail the batch so the resolver decomposes it per-pair
                    return Err(ProviderError::InvalidResponse(format!(
                        "matrix element status {}",
                        element.status
                    )));
                }
                let (Some(distance), Some(duration)) = (element.distance, element.duration)
                else {
                    return Err(ProviderError::InvalidResponse(
                        "matrix element missing distance or duration".to_string(),
                    ));
                };
                entries.push(MatrixEntry {
                    distance_meters: distance.value as u32,
                    duration_seconds: duration.value as u32,
                });
            }
            rows.push(entries);
        }

        Ok(RouteMatrix { rows })
    }

    async fn optimize_route(
        &self,
        start: &Location,
        stops: &[Location],
        end: Option<&Location>,
        profile: TravelProfile,
    ) -> Result<OptimizedItinerary, ProviderError> {
        self.guard_enabled()?;

        let waypoints = format!(
            "optimize:true|{}",
            stops.iter().map(lat_lng).collect::<Vec<_>>().join("|")
        );
        let route = self
            .directions(vec![
                ("origin", lat_lng(start)),
                ("destination", lat_lng(end.unwrap_or(start))),
                ("waypoints", waypoints),
                ("mode", Self::google_mode(profile).to_string()),
                ("key", self.api_key.clone()),
            ])
            .await?;

        if route.waypoint_order.len() != stops.len() {
            return Err(ProviderError::InvalidResponse(
                "waypoint order does not cover every stop".to_string(),
            ));
        }
        let mut ordered_stops = Vec::with_capacity(stops.len());
        for &index in &route.waypoint_order {
            let stop = stops.get(index).ok_or_else(|| {
                ProviderError::InvalidResponse(format!("waypoint index {} out of range", index))
            })?;
            ordered_stops.push(stop.clone());
        }

        // Legs run start -> stops in optimized order -> end; totals are the
        // realized sums over those legs.
        let total_distance: u64 = route.legs.iter().map(|l| l.distance.value).sum();
        let total_duration: u64 = route.legs.iter().map(|l| l.duration.value).sum();

        Ok(OptimizedItinerary {
            ordered_stops,
            total_distance_meters: u32::try_from(total_distance).unwrap_or(u32::MAX),
            total_duration_seconds: u32::try_from(total_duration).unwrap_or(u32::MAX),
        })
    }

    async fn isochrone(
        &self,
        _center: &Location,
        _ranges_seconds: &[u32],
        _profile: TravelProfile,
    ) -> Result<Vec<IsochroneBand>, ProviderError> {
        self.guard_enabled()?;
        Err(ProviderError::Unsupported("isochrones"))
    }
}

// =============================================================================
// Wire payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleGeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResult {
    geometry: GoogleGeometry,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLatLng,
    #[serde(default)]
    location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GoogleDirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<GoogleRoute>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    #[serde(default)]
    legs: Vec<GoogleLeg>,
    #[serde(default)]
    overview_polyline: Option<GooglePolyline>,
    #[serde(default)]
    waypoint_order: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct GoogleLeg {
    distance: GoogleValue,
    duration: GoogleValue,
    #[serde(default)]
    steps: Vec<GoogleStep>,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct GoogleStep {
    #[serde(default)]
    html_instructions: String,
    distance: GoogleValue,
    duration: GoogleValue,
}

#[derive(Debug, Deserialize)]
struct GooglePolyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct GoogleMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<GoogleMatrixRow>,
}

#[derive(Debug, Deserialize)]
struct GoogleMatrixRow {
    #[serde(default)]
    elements: Vec<GoogleMatrixElement>,
}

#[derive(Debug, Deserialize)]
struct GoogleMatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<GoogleValue>,
    #[serde(default)]
    duration: Option<GoogleValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    fn lipa() -> Location {
        Location::new(13.9411, 121.1625)
    }

    fn batangas() -> Location {
        Location::new(13.7565, 121.0583)
    }

    #[test]
    fn test_provider_name() {
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json("{}"), "key");
        assert_eq!(provider.name(), "Google Maps");
    }

    #[test]
    fn test_disabled_without_key() {
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json("{}"), "");
        assert!(!provider.is_enabled());
    }

    #[test]
    fn test_mode_mapping() {
        assert_eq!(
            GoogleMapsProvider::<MockAsyncHttpClient>::google_mode(TravelProfile::Driving),
            "driving"
        );
        assert_eq!(
            GoogleMapsProvider::<MockAsyncHttpClient>::google_mode(TravelProfile::Cycling),
            "bicycling"
        );
        assert_eq!(
            GoogleMapsProvider::<MockAsyncHttpClient>::google_mode(TravelProfile::Walking),
            "walking"
        );
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("Turn <b>left</b> onto <div style=\"x\">JP Laurel Hwy</div>"),
            "Turn left onto JP Laurel Hwy"
        );
        assert_eq!(strip_html("no markup"), "no markup");
    }

    #[test]
    fn test_confidence_mapping() {
        assert_eq!(confidence_for(Some("ROOFTOP")), 1.0);
        assert_eq!(confidence_for(Some("RANGE_INTERPOLATED")), 0.8);
        assert_eq!(confidence_for(Some("GEOMETRIC_CENTER")), 0.6);
        assert_eq!(confidence_for(Some("APPROXIMATE")), 0.4);
        assert_eq!(confidence_for(None), 0.5);
    }

    #[tokio::test]
    async fn test_disabled_short_circuits_without_io() {
        let provider = GoogleMapsProvider::new(
            MockAsyncHttpClient::failing(ProviderError::Http("must not be called".to_string())),
            "",
        );
        let result = provider.geocode("Lipa City", None).await;
        assert_eq!(result, Err(ProviderError::Disabled));
    }

    #[tokio::test]
    async fn test_geocode_parses_response() {
        let body = r#"{
            "status": "OK",
            "results": [{
                "geometry": {
                    "location": { "lat": 13.9411, "lng": 121.1625 },
                    "location_type": "ROOFTOP"
                },
                "formatted_address": "Lipa, Batangas, Philippines",
                "types": ["locality", "political"]
            }]
        }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");

        let result = provider.geocode("Lipa City", Some("PH")).await.unwrap();
        assert!((result.location.latitude - 13.9411).abs() < 1e-9);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.place_type, "locality");
    }

    #[tokio::test]
    async fn test_geocode_zero_results() {
        let body = r#"{ "status": "ZERO_RESULTS", "results": [] }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");
        let result = provider.geocode("asdfghjkl", None).await;
        assert_eq!(result, Err(ProviderError::NoResult));
    }

    #[tokio::test]
    async fn test_geocode_quota_status_is_invalid() {
        let body = r#"{ "status": "OVER_QUERY_LIMIT", "results": [] }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");
        let result = provider.geocode("Lipa City", None).await;
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_route_parses_legs_and_polyline() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "legs": [{
                    "distance": { "value": 24731 },
                    "duration": { "value": 2213 },
                    "steps": [{
                        "html_instructions": "Head <b>north</b>",
                        "distance": { "value": 120 },
                        "duration": { "value": 15 }
                    }]
                }],
                "overview_polyline": { "points": "abc123" }
            }]
        }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");

        let route = provider
            .route(&lipa(), &batangas(), TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(route.distance_meters, 24731);
        assert_eq!(route.duration_seconds, 2213);
        assert_eq!(route.encoded_path.as_deref(), Some("abc123"));
        assert_eq!(route.steps.unwrap()[0].instruction, "Head north");
    }

    #[tokio::test]
    async fn test_matrix_element_failure_fails_batch() {
        let body = r#"{
            "status": "OK",
            "rows": [{
                "elements": [{ "status": "ZERO_RESULTS" }]
            }]
        }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");

        let result = provider
            .distance_matrix(&[lipa()], &[batangas()], TravelProfile::Driving)
            .await;
        assert!(matches!(result, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_matrix_parses_elements() {
        let body = r#"{
            "status": "OK",
            "rows": [{
                "elements": [{
                    "status": "OK",
                    "distance": { "value": 24731 },
                    "duration": { "value": 2213 }
                }]
            }]
        }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");

        let matrix = provider
            .distance_matrix(&[lipa()], &[batangas()], TravelProfile::Driving)
            .await
            .unwrap();
        assert_eq!(matrix.get(0, 0).unwrap().distance_meters, 24731);
    }

    #[tokio::test]
    async fn test_optimize_applies_waypoint_order() {
        let body = r#"{
            "status": "OK",
            "routes": [{
                "waypoint_order": [1, 0],
                "legs": [
                    { "distance": { "value": 10000 }, "duration": { "value": 900 } },
                    { "distance": { "value": 12000 }, "duration": { "value": 1100 } },
                    { "distance": { "value": 9000 }, "duration": { "value": 800 } }
                ]
            }]
        }"#;
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json(body), "key");

        let stops = [batangas(), Location::new(14.0863, 121.1497)];
        let itinerary = provider
            .optimize_route(&lipa(), &stops, None, TravelProfile::Driving)
            .await
            .unwrap();

        assert_eq!(itinerary.ordered_stops[0], stops[1]);
        assert_eq!(itinerary.ordered_stops[1], stops[0]);
        assert_eq!(itinerary.total_distance_meters, 31000);
        assert_eq!(itinerary.total_duration_seconds, 2800);
    }

    #[tokio::test]
    async fn test_isochrone_unsupported() {
        let provider = GoogleMapsProvider::new(MockAsyncHttpClient::with_json("{}"), "key");
        let result = provider.isochrone(&lipa(), &[600], TravelProfile::Driving).await;
        assert_eq!(result, Err(ProviderError::Unsupported("isochrones")));
    }
}
