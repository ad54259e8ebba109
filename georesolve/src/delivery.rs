//! Delivery-facing derivations.
//!
//! Business quantities derived from resolved distances: the delivery fee,
//! the customer-facing ETA, and service-zone containment. These are pure
//! functions of a distance the tiered resolver already produced; nothing
//! here performs I/O.

use crate::geo::{self, Location, DEFAULT_AVERAGE_SPEED_KMH};

/// Distance covered by the base fee, in meters.
pub const BASE_DISTANCE_METERS: u32 = 2_000;

/// Delivery fee schedule.
///
/// Amounts are in the platform's display currency (pesos); the schedule is
/// a flat base covering the first two kilometers plus a per-kilometer rate
/// beyond, with the extra distance rounded up to whole kilometers.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    /// Flat fee covering the base distance.
    pub base_fee: f64,

    /// Rate per started kilometer beyond the base distance.
    pub per_km_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_fee: 49.0,
            per_km_rate: 10.0,
        }
    }
}

impl FeeSchedule {
    /// Computes the delivery fee for a travel distance in meters.
    ///
    /// Exactly the base distance still costs only the base fee; one meter
    /// beyond starts the first billable extra kilometer.
    pub fn delivery_fee(&self, distance_meters: u32) -> f64 {
        if distance_meters <= BASE_DISTANCE_METERS {
            return self.base_fee;
        }
        let extra_meters = distance_meters - BASE_DISTANCE_METERS;
        let extra_km = (f64::from(extra_meters) / 1_000.0).ceil();
        self.base_fee + extra_km * self.per_km_rate
    }
}

/// Computes the delivery fee under the default schedule.
pub fn delivery_fee(distance_meters: u32) -> f64 {
    FeeSchedule::default().delivery_fee(distance_meters)
}

/// Estimates the customer-facing delivery time in whole minutes.
///
/// Preparation time plus travel time at the platform's average courier
/// speed, rounded up so the estimate never undersells.
pub fn estimated_delivery_minutes(distance_meters: u32, preparation_minutes: u32) -> u32 {
    let travel_minutes =
        f64::from(distance_meters) / 1_000.0 / DEFAULT_AVERAGE_SPEED_KMH * 60.0;
    (f64::from(preparation_minutes) + travel_minutes).ceil() as u32
}

/// Whether a point lies within a circular service zone.
///
/// The boundary is inclusive: a point exactly at the radius is in the zone.
pub fn is_within_zone(point: &Location, center: &Location, max_radius_km: f64) -> bool {
    geo::distance_meters(point, center) / 1_000.0 <= max_radius_km
}
