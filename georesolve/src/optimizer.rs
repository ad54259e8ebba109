//! Multi-stop route optimization.
//!
//! Orders a set of delivery stops into a short visiting sequence. Provider
//! tiers with native optimization (the OpenRouteService VROOM endpoint,
//! Google Directions waypoint reordering) are consulted first through the
//! resolver; when none can answer, a local nearest-neighbor heuristic runs
//! over tier-resolved legs.
//!
//! Nearest-neighbor is greedy and can miss the true optimum; that is an
//! accepted trade-off for a dependency-free fallback that always produces a
//! usable itinerary.

use tracing::debug;

use crate::geo::{GeoError, Location};
use crate::model::{OptimizedItinerary, RouteInfo, TravelProfile};
use crate::provider::GeoProvider;
use crate::resolver::TieredResolver;

/// Multi-stop optimizer over a tiered resolver.
pub struct RouteOptimizer<'a, P: GeoProvider> {
    resolver: &'a TieredResolver<P>,
}

impl<'a, P: GeoProvider> RouteOptimizer<'a, P> {
    /// Creates an optimizer that resolves legs through the given resolver.
    pub fn new(resolver: &'a TieredResolver<P>) -> Self {
        Self { resolver }
    }

    /// Orders `stops` into a visiting sequence from `start`, optionally
    /// returning to `end`.
    ///
    /// The itinerary's totals are realized from the legs of the final
    /// ordering, resolved through the same tiers as any other route, so
    /// they are consistent with what `route()` would report leg by leg.
    /// Stops are visited exactly once each; when `end` is `None` the
    /// vehicle returns to `start`.
    pub async fn optimize(
        &self,
        start: &Location,
        stops: &[Location],
        end: Option<&Location>,
        profile: TravelProfile,
    ) -> Result<OptimizedItinerary, GeoError> {
        if stops.is_empty() {
            return Err(GeoError::EmptyStops);
        }
        start.validate()?;
        for stop in stops {
            stop.validate()?;
        }
        if let Some(end) = end {
            end.validate()?;
        }

        if let Some(itinerary) = self
            .resolver
            .optimize_via_providers(start, stops, end, profile)
            .await
        {
            return Ok(itinerary);
        }

        debug!(
            stops = stops.len(),
            "no provider answered optimization; running nearest-neighbor"
        );
        self.nearest_neighbor(start, stops, end, profile).await
    }

    /// Greedy nearest-neighbor over tier-resolved legs.
    ///
    /// Each iteration resolves the legs from the current position to every
    /// remaining stop concurrently and commits to the shortest. O(n²) legs
    /// total, which is fine at delivery batch sizes.
    async fn nearest_neighbor(
        &self,
        start: &Location,
        stops: &[Location],
        end: Option<&Location>,
        profile: TravelProfile,
    ) -> Result<OptimizedItinerary, GeoError> {
        let mut remaining: Vec<Location> = stops.to_vec();
        let mut ordered = Vec::with_capacity(stops.len());
        let mut current = start.clone();
        let mut total_distance: u64 = 0;
        let mut total_duration: u64 = 0;

        while !remaining.is_empty() {
            let legs = futures::future::join_all(
                remaining.iter().map(|stop| self.resolver.route(&current, stop, profile)),
            )
            .await;

            let mut best: Option<(usize, RouteInfo)> = None;
            for (idx, leg) in legs.into_iter().enumerate() {
                let info = leg?;
                match &best {
                    Some((_, b)) if b.distance_meters <= info.distance_meters => {}
                    _ => best = Some((idx, info)),
                }
            }
            let Some((idx, leg)) = best else { break };

            total_distance += u64::from(leg.distance_meters);
            total_duration += u64::from(leg.duration_seconds);
            let next = remaining.swap_remove(idx);
            current = next.clone();
            ordered.push(next);
        }

        // Closing leg back to the depot, or on to the explicit end point
        let terminus = end.unwrap_or(start);
        let closing = self.resolver.route(&current, terminus, profile).await?;
        total_distance += u64::from(closing.distance_meters);
        total_duration += u64::from(closing.duration_seconds);

        Ok(OptimizedItinerary {
            ordered_stops: ordered,
            total_distance_meters: u32::try_from(total_distance).unwrap_or(u32::MAX),
            total_duration_seconds: u32::try_from(total_duration).unwrap_or(u32::MAX),
        })
    }
}
