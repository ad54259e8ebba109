//! Great-circle math module
//!
//! Pure functions computing great-circle distance and derived travel-time
//! estimates between coordinate pairs on a spherical Earth model. This is the
//! tier of last resort for the resolver: it never performs I/O and always
//! succeeds for valid coordinates, so routing can degrade to it when every
//! external provider is unreachable.

mod types;

pub use types::{GeoError, Location, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Mean Earth radius in meters for the spherical model.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Default average travel speed used for duration estimates, in km/h.
///
/// Calibrated for urban delivery riders in the service region.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

/// Computes the great-circle (haversine) distance between two points, in meters.
///
/// Symmetric in its arguments; returns exactly 0.0 for identical points.
/// Callers are responsible for validating coordinate ranges first.
#[inline]
pub fn distance_meters(a: &Location, b: &Location) -> f64 {
    let lat_a = a.latitude * PI / 180.0;
    let lat_b = b.latitude * PI / 180.0;
    let d_lat = (b.latitude - a.latitude) * PI / 180.0;
    let d_lon = (b.longitude - a.longitude) * PI / 180.0;

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_METERS * c
}

/// Estimates travel time in seconds for a distance at an average speed.
///
/// A linear estimate: `(meters / 1000 / speed_kmh) * 3600`. Used when no
/// provider supplied a road-network duration.
#[inline]
pub fn estimate_duration_secs(distance_meters: f64, average_speed_kmh: f64) -> f64 {
    (distance_meters / 1000.0 / average_speed_kmh) * 3600.0
}

/// Computes the point reached by traveling `distance_meters` from `origin`
/// along the given initial bearing (degrees clockwise from north).
///
/// Used to synthesize isochrone rings when no provider can answer.
pub fn destination(origin: &Location, bearing_deg: f64, distance_meters: f64) -> Location {
    let lat1 = origin.latitude * PI / 180.0;
    let lon1 = origin.longitude * PI / 180.0;
    let bearing = bearing_deg * PI / 180.0;
    let angular = distance_meters / EARTH_RADIUS_METERS;

    let lat2 =
        (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    // Normalize longitude to [-180, 180]
    let lon_deg = (lon2 * 180.0 / PI + 540.0).rem_euclid(360.0) - 180.0;

    Location::new(lat2 * 180.0 / PI, lon_deg)
}
