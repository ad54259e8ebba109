//! OpenRouteService provider.
//!
//! Adapts the OpenRouteService API (<https://openrouteservice.org/>) into the
//! shared capability set. This is the free, quota-limited tier and therefore
//! sits first in the resolver's priority order.
//!
//! # Endpoints
//!
//! - Geocoding (Pelias): `GET /geocode/search`, `GET /geocode/reverse`
//! - Directions: `POST /v2/directions/{profile}`
//! - Matrix: `POST /v2/matrix/{profile}`
//! - Optimization (VROOM): `POST /optimization`
//! - Isochrones: `POST /v2/isochrones/{profile}`
//!
//! # Getting an API key
//!
//! Create a free account at <https://openrouteservice.org/dev/> and export
//! the key as `ORS_API_KEY`. The free tier allows 2,000 directions requests
//! per day, which is why batch operations send all coordinates in a single
//! request.

use serde::Deserialize;
use serde_json::json;

use crate::geo::Location;
use crate::model::{
    GeocodeResult, IsochroneBand, MatrixEntry, OptimizedItinerary, RouteInfo, RouteMatrix,
    RouteStep, TravelProfile,
};
use crate::provider::{AsyncHttpClient, GeoProvider, ProviderError};

/// Base URL for the OpenRouteService API.
const ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// OpenRouteService provider.
///
/// Enabled only when constructed with a non-empty API key; a disabled
/// instance short-circuits every operation without network I/O.
pub struct OrsProvider<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
}

impl<C: AsyncHttpClient> OrsProvider<C> {
    /// Creates a new OpenRouteService provider.
    ///
    /// An empty `api_key` yields a disabled provider rather than an error,
    /// so a missing credential degrades the tier instead of failing startup.
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
        }
    }

    /// Maps the shared travel profile onto ORS profile identifiers.
    fn ors_profile(profile: TravelProfile) -> &'static str {
        match profile {
            TravelProfile::Driving => "driving-car",
            TravelProfile::Cycling => "cycling-regular",
            TravelProfile::Walking => "foot-walking",
        }
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<String, ProviderError> {
        reqwest::Url::parse_with_params(&format!("{}{}", ORS_BASE_URL, path), params)
            .map(String::from)
            .map_err(|e| ProviderError::Http(format!("invalid request URL: {}", e)))
    }

    fn auth_headers(&self) -> [(&str, &str); 1] {
        [("Authorization", self.api_key.as_str())]
    }

    fn guard_enabled(&self) -> Result<(), ProviderError> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(ProviderError::Disabled)
        }
    }
}

/// Converts `[lon, lat]` pairs as used on the ORS wire.
fn lon_lat(location: &Location) -> [f64; 2] {
    [location.longitude, location.latitude]
}

impl<C: AsyncHttpClient> GeoProvider for OrsProvider<C> {
    fn name(&self) -> &str {
        "OpenRouteService"
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
            ("api_key", self.api_key.clone()),
            ("text", query.to_string()),
            ("size", "1".to_string()),
        ];
        if let Some(country) = country_hint {
            params.push(("boundary.country", country.to_string()));
        }
        let url = self.build_url("/geocode/search", &params)?;

        let body = self.http_client.get(&url).await?;
        let response: PeliasResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let feature = response.features.into_iter().next().ok_or(ProviderError::NoResult)?;
        let [lon, lat] = feature.geometry.coordinates;

        let mut location = Location::new(lat, lon);
        if let Some(label) = &feature.properties.label {
            location = location.with_address(label.clone());
        }

        Ok(GeocodeResult {
            location,
            confidence: feature.properties.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
            place_type: feature
                .properties
                .layer
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn reverse_geocode(&self, location: &Location) -> Result<String, ProviderError> {
        self.guard_enabled()?;

        let params = [
            ("api_key", self.api_key.clone()),
            ("point.lon", location.longitude.to_string()),
            ("point.lat", location.latitude.to_string()),
            ("size", "1".to_string()),
        ];
        let url = self.build_url("/geocode/reverse", &params)?;

        let body = self.http_client.get(&url).await?;
        let response: PeliasResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        response
            .features
            .into_iter()
            .next()
            .and_then(|f| f.properties.label)
            .ok_or(ProviderError::NoResult)
    }

    async fn route(
        &self,
        origin: &Location,
        destination: &Location,
        profile: TravelProfile,
    ) -> Result<RouteInfo, ProviderError> {
        self.guard_enabled()?;

        let url = format!(
            "{}/v2/directions/{}",
            ORS_BASE_URL,
            Self::ors_profile(profile)
        );
        let request = json!({
            "coordinates": [lon_lat(origin), lon_lat(destination)],
            "instructions": true,
        });

        let body = self
            .http_client
            .post_json(&url, &self.auth_headers(), &request.to_string())
            .await?;
        let response: OrsDirectionsResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let route = response.routes.into_iter().next().ok_or(ProviderError::NoResult)?;

        let steps: Vec<RouteStep> = route
            .segments
            .into_iter()
            .flat_map(|segment| segment.steps)
            .map(|step| RouteStep {
                instruction: step.instruction,
                distance_meters: step.distance.round() as u32,
                duration_seconds: step.duration.round() as u32,
                road_name: step.name.filter(|n| !n.is_empty() && n != "-"),
            })
            .collect();

        Ok(RouteInfo {
            distance_meters: route.summary.distance.round() as u32,
            duration_seconds: route.summary.duration.round() as u32,
            encoded_path: route.geometry,
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

        // All coordinates go into one request: sources index the first
        // `origins.len()` entries, destinations the rest.
        let locations: Vec<[f64; 2]> = origins
            .iter()
            .chain(destinations.iter())
            .map(lon_lat)
            .collect();
        let sources: Vec<usize> = (0..origins.len()).collect();
        let dest_indices: Vec<usize> =
            (origins.len()..origins.len() + destinations.len()).collect();

        let url = format!("{}/v2/matrix/{}", ORS_BASE_URL, Self::ors_profile(profile));
        let request = json!({
            "locations": locations,
            "sources": sources,
            "destinations": dest_indices,
            "metrics": ["distance", "duration"],
        });

        let body = self
            .http_client
            .post_json(&url, &self.auth_headers(), &request.to_string())
            .await?;
        let response: OrsMatrixResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if response.distances.len() != origins.len() || response.durations.len() != origins.len() {
            return Err(ProviderError::InvalidResponse(
                "matrix dimensions do not match request".to_string(),
            ));
        }

        let mut rows = Vec::with_capacity(origins.len());
        for (distance_row, duration_row) in response.distances.iter().zip(&response.durations) {
            if distance_row.len() != destinations.len() {
                return Err(ProviderError::InvalidResponse(
                    "matrix dimensions do not match request".to_string(),
                ));
            }
            let mut row = Vec::with_capacity(destinations.len());
            for (distance, duration) in distance_row.iter().zip(duration_row) {
                // Unreachable pairs come back as null; fail the batch so the
                // resolver can decompose it into per-pair routes.
                let (Some(distance), Some(duration)) = (distance, duration) else {
                    return Err(ProviderError::InvalidResponse(
                        "matrix contains unreachable pairs".to_string(),
                    ));
                };
                row.push(MatrixEntry {
                    distance_meters: distance.round() as u32,
                    duration_seconds: duration.round() as u32,
                });
            }
            rows.push(row);
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

        let jobs: Vec<serde_json::Value> = stops
            .iter()
            .enumerate()
            .map(|(index, stop)| json!({ "id": index + 1, "location": lon_lat(stop) }))
            .collect();
        let request = json!({
            "jobs": jobs,
            "vehicles": [{
                "id": 1,
                "profile": Self::ors_profile(profile),
                "start": lon_lat(start),
                "end": lon_lat(end.unwrap_or(start)),
            }],
            // Request geometry so per-route distance is reported
            "options": { "g": true },
        });

        let url = format!("{}/optimization", ORS_BASE_URL);
        let body = self
            .http_client
            .post_json(&url, &self.auth_headers(), &request.to_string())
            .await?;
        let response: VroomResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if response.code != 0 {
            return Err(ProviderError::InvalidResponse(format!(
                "optimization failed with code {}",
                response.code
            )));
        }
        let route = response.routes.into_iter().next().ok_or(ProviderError::NoResult)?;

        let mut ordered_stops = Vec::with_capacity(stops.len());
        for step in &route.steps {
            if step.step_type != "job" {
                continue;
            }
            let job_id = step.job.ok_or_else(|| {
                ProviderError::InvalidResponse("job step without id".to_string())
            })?;
            let stop = stops.get(job_id as usize - 1).ok_or_else(|| {
                ProviderError::InvalidResponse(format!("unknown job id {}", job_id))
            })?;
            ordered_stops.push(stop.clone());
        }
        if ordered_stops.len() != stops.len() {
            return Err(ProviderError::InvalidResponse(
                "optimization did not visit every stop".to_string(),
            ));
        }

        let distance = route.distance.ok_or_else(|| {
            ProviderError::InvalidResponse("optimization response missing distance".to_string())
        })?;

        Ok(OptimizedItinerary {
            ordered_stops,
            total_distance_meters: distance.round() as u32,
            total_duration_seconds: route.duration.round() as u32,
        })
    }

    async fn isochrone(
        &self,
        center: &Location,
        ranges_seconds: &[u32],
        profile: TravelProfile,
    ) -> Result<Vec<IsochroneBand>, ProviderError> {
        self.guard_enabled()?;

        let url = format!(
            "{}/v2/isochrones/{}",
            ORS_BASE_URL,
            Self::ors_profile(profile)
        );
        let request = json!({
            "locations": [lon_lat(center)],
            "range": ranges_seconds,
            "range_type": "time",
        });

        let body = self
            .http_client
            .post_json(&url, &self.auth_headers(), &request.to_string())
            .await?;
        let response: OrsIsochroneResponse = serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let mut bands = Vec::with_capacity(response.features.len());
        for feature in response.features {
            let ring = feature
                .geometry
                .coordinates
                .into_iter()
                .next()
                .ok_or_else(|| {
                    ProviderError::InvalidResponse("isochrone polygon without ring".to_string())
                })?;
            bands.push(IsochroneBand {
                range_seconds: feature.properties.value.round() as u32,
                polygon: ring
                    .into_iter()
                    .map(|[lon, lat]| Location::new(lat, lon))
                    .collect(),
            });
        }
        Ok(bands)
    }
}

// =============================================================================
// Wire payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct PeliasResponse {
    #[serde(default)]
    features: Vec<PeliasFeature>,
}

#[derive(Debug, Deserialize)]
struct PeliasFeature {
    geometry: PeliasGeometry,
    properties: PeliasProperties,
}

#[derive(Debug, Deserialize)]
struct PeliasGeometry {
    /// `[longitude, latitude]`
    coordinates: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct PeliasProperties {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    layer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrsDirectionsResponse {
    #[serde(default)]
    routes: Vec<OrsRoute>,
}

#[derive(Debug, Deserialize)]
struct OrsRoute {
    summary: OrsSummary,
    #[serde(default)]
    geometry: Option<String>,
    #[serde(default)]
    segments: Vec<OrsSegment>,
}

#[derive(Debug, Deserialize)]
struct OrsSummary {
    /// Meters
    distance: f64,
    /// Seconds
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OrsSegment {
    #[serde(default)]
    steps: Vec<OrsStep>,
}

#[derive(Debug, Deserialize)]
struct OrsStep {
    instruction: String,
    distance: f64,
    duration: f64,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrsMatrixResponse {
    #[serde(default)]
    distances: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    durations: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct VroomResponse {
    code: i32,
    #[serde(default)]
    routes: Vec<VroomRoute>,
}

#[derive(Debug, Deserialize)]
struct VroomRoute {
    #[serde(default)]
    distance: Option<f64>,
    duration: f64,
    #[serde(default)]
    steps: Vec<VroomStep>,
}

#[derive(Debug, Deserialize)]
struct VroomStep {
    #[serde(rename = "type")]
    step_type: String,
    #[serde(default)]
    job: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneResponse {
    #[serde(default)]
    features: Vec<OrsIsochroneFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneFeature {
    properties: OrsIsochroneProperties,
    geometry: OrsIsochroneGeometry,
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneProperties {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct OrsIsochroneGeometry {
    /// Polygon rings of `[longitude, latitude]` pairs
    coordinates: Vec<Vec<[f64; 2]>>,
}
