//! Shared value types produced by the resolution layer.
//!
//! Every type here is an immutable value: produced fresh per request, never
//! cached or mutated after construction, and uniformly shaped regardless of
//! which tier (external provider or local computation) produced it.

use std::str::FromStr;

use serde::Serialize;

use crate::geo::Location;

/// Travel mode for routing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelProfile {
    /// Motor vehicle (the platform default)
    #[default]
    Driving,
    /// Bicycle
    Cycling,
    /// On foot
    Walking,
}

impl FromStr for TravelProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" => Ok(Self::Driving),
            "cycling" => Ok(Self::Cycling),
            "walking" => Ok(Self::Walking),
            other => Err(format!(
                "unknown travel profile '{}' (expected driving, cycling or walking)",
                other
            )),
        }
    }
}

/// One maneuver within a resolved route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    /// Human-readable instruction ("Turn left onto J.P. Laurel Hwy")
    pub instruction: String,
    /// Length of this step in meters
    pub distance_meters: u32,
    /// Expected duration of this step in seconds
    pub duration_seconds: u32,
    /// Name of the road this step follows, if the provider reported one
    pub road_name: Option<String>,
}

/// A resolved point-to-point route.
///
/// Produced fresh per request. `encoded_path` and `steps` are present only
/// when a road-network provider answered; the local great-circle fallback
/// leaves them empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteInfo {
    /// Total route length in meters
    pub distance_meters: u32,
    /// Total expected travel time in seconds
    pub duration_seconds: u32,
    /// Opaque encoded polyline of the route geometry, if available
    pub encoded_path: Option<String>,
    /// Ordered turn-by-turn steps, if available
    pub steps: Option<Vec<RouteStep>>,
}

/// Result of geocoding a free-text address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    /// Resolved position, with the matched address attached
    pub location: Location,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    /// Kind of place matched ("address", "street", "locality", ...)
    pub place_type: String,
}

/// One cell of a distance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixEntry {
    /// Travel distance in meters
    pub distance_meters: u32,
    /// Travel duration in seconds
    pub duration_seconds: u32,
}

/// A distance/duration matrix over origin and destination sets.
///
/// `rows[i][j]` holds the entry from origin `i` to destination `j`. Every
/// cell is always populated: when a provider cannot answer the batched
/// request, the resolver fills cells from independent tier-resolved routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatrix {
    /// Matrix cells in origin-major order
    pub rows: Vec<Vec<MatrixEntry>>,
}

impl RouteMatrix {
    /// Returns the entry from origin `i` to destination `j`, if in range.
    pub fn get(&self, i: usize, j: usize) -> Option<&MatrixEntry> {
        self.rows.get(i).and_then(|row| row.get(j))
    }
}

/// A multi-stop itinerary produced by route optimization.
///
/// Constructed once per optimization request and not persisted. Totals are
/// the realized sums of the chosen consecutive legs, not an estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizedItinerary {
    /// Stops in visiting order (excludes the start and end anchors)
    pub ordered_stops: Vec<Location>,
    /// Sum of the chosen leg distances in meters
    pub total_distance_meters: u32,
    /// Sum of the chosen leg durations in seconds
    pub total_duration_seconds: u32,
}

/// One reachability band of an isochrone query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsochroneBand {
    /// Travel-time budget this band represents, in seconds
    pub range_seconds: u32,
    /// Closed polygon ring outlining the reachable area
    pub polygon: Vec<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_profile_default_is_driving() {
        assert_eq!(TravelProfile::default(), TravelProfile::Driving);
    }

    #[test]
    fn test_travel_profile_from_str() {
        assert_eq!("driving".parse(), Ok(TravelProfile::Driving));
        assert_eq!("Cycling".parse(), Ok(TravelProfile::Cycling));
        assert_eq!(" walking ".parse(), Ok(TravelProfile::Walking));
        assert!("teleport".parse::<TravelProfile>().is_err());
    }

    #[test]
    fn test_matrix_get_in_range() {
        let matrix = RouteMatrix {
            rows: vec![vec![MatrixEntry {
                distance_meters: 100,
                duration_seconds: 12,
            }]],
        };
        assert_eq!(matrix.get(0, 0).unwrap().distance_meters, 100);
        assert!(matrix.get(0, 1).is_none());
        assert!(matrix.get(1, 0).is_none());
    }
}
