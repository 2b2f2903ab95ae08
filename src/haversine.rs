//! Haversine fallback routes (used when OSRM is unavailable).
//!
//! Synthesizes straight-line corridors between the endpoints with a
//! great-circle distance estimate and an assumed speed. Far less accurate
//! than the routing service but always available, so a request still gets a
//! full result set when the provider is down.

use rand::Rng;

use crate::geo::SpatialPoint;
use crate::polyline::Polyline;
use crate::route::{Provenance, RouteCandidate};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Number of synthesized routes.
pub const FALLBACK_VARIATIONS: usize = 5;

/// Points per synthesized geometry.
const POINTS_PER_ROUTE: usize = 20;

/// Maximum lateral jitter, in degrees, applied to variations after the first.
const MAX_JITTER_DEG: f64 = 0.01;

/// Each variation is this much longer than the previous one.
const DISTANCE_STEP: f64 = 0.1;

/// Straight-line fallback route synthesizer.
#[derive(Debug, Clone)]
pub struct HaversineFallback {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineFallback {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineFallback {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Synthesizes [`FALLBACK_VARIATIONS`] routes using the thread-local RNG.
    pub fn synthesize(&self, start: SpatialPoint, end: SpatialPoint) -> Vec<RouteCandidate> {
        self.synthesize_with_rng(start, end, &mut rand::rng())
    }

    /// Synthesizes routes with a caller-supplied RNG.
    ///
    /// Variation `i` has distance `(1 + 0.1 i) ×` the great-circle distance and
    /// the matching duration at [`Self::speed_kmh`]. The first variation is
    /// the exact straight line; the others jitter interior points sideways.
    pub fn synthesize_with_rng(
        &self,
        start: SpatialPoint,
        end: SpatialPoint,
        rng: &mut impl Rng,
    ) -> Vec<RouteCandidate> {
        let straight_km = start.haversine_km(&end);
        let base_distance = straight_km * 1000.0;
        let base_duration = self.km_to_seconds(straight_km);

        (0..FALLBACK_VARIATIONS)
            .filter_map(|variation| {
                let multiplier = 1.0 + variation as f64 * DISTANCE_STEP;
                let geometry = if variation == 0 {
                    interpolate(start, end, |_| 0.0)
                } else {
                    interpolate(start, end, |_| rng.random_range(-MAX_JITTER_DEG..=MAX_JITTER_DEG))
                };
                RouteCandidate::new(
                    geometry,
                    base_distance * multiplier,
                    base_duration * multiplier,
                    Provenance::Fallback,
                )
            })
            .collect()
    }

    /// Convert distance in km to travel time in seconds.
    fn km_to_seconds(&self, km: f64) -> f64 {
        let hours = km / self.speed_kmh;
        hours * 3600.0
    }
}

/// Evenly spaced points from `start` to `end`; interior points are pushed
/// perpendicular to the corridor by `jitter(i)` degrees.
fn interpolate(
    start: SpatialPoint,
    end: SpatialPoint,
    mut jitter: impl FnMut(usize) -> f64,
) -> Polyline {
    let dx = end.lon - start.lon;
    let dy = end.lat - start.lat;
    let length = dx.hypot(dy);
    let (perp_lat, perp_lon) = if length > 0.0 {
        (dx / length, -dy / length)
    } else {
        (0.0, 0.0)
    };

    let last = POINTS_PER_ROUTE - 1;
    let points = (0..POINTS_PER_ROUTE)
        .map(|i| {
            if i == 0 {
                return start;
            }
            if i == last {
                return end;
            }
            let t = i as f64 / last as f64;
            let offset = jitter(i);
            SpatialPoint::new(
                start.lat + t * dy + offset * perp_lat,
                start.lon + t * dx + offset * perp_lon,
            )
            .clamped()
        })
        .collect();
    Polyline::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const START: SpatialPoint = SpatialPoint::new(12.9716, 77.5946);
    const END: SpatialPoint = SpatialPoint::new(12.9352, 77.6245);

    #[test]
    fn test_five_routes_with_increasing_distance() {
        let routes = HaversineFallback::default().synthesize(START, END);
        assert_eq!(routes.len(), FALLBACK_VARIATIONS);

        let base = routes[0].distance;
        for (i, route) in routes.iter().enumerate() {
            let expected = 1.0 + i as f64 * 0.1;
            assert!((route.distance / base - expected).abs() < 1e-9);
            assert_eq!(route.provenance, Provenance::Fallback);
            assert!(route.steps.is_empty());
        }
    }

    #[test]
    fn test_duration_assumes_forty_kmh() {
        let routes = HaversineFallback::default().synthesize(START, END);
        for route in &routes {
            let speed_kmh = (route.distance / 1000.0) / (route.duration / 3600.0);
            assert!((speed_kmh - 40.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineFallback::new(40.0); // 40 km/h
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert!((provider.km_to_seconds(10.0) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_variation_is_straight_and_endpoints_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        let routes = HaversineFallback::default().synthesize_with_rng(START, END, &mut rng);

        for route in &routes {
            assert_eq!(route.geometry.len(), POINTS_PER_ROUTE);
            assert_eq!(route.geometry.first(), Some(START));
            assert_eq!(route.geometry.last(), Some(END));
        }

        let straight = &routes[0].geometry;
        let (dx, dy) = (END.lon - START.lon, END.lat - START.lat);
        for p in straight.points() {
            // Cross product with the corridor is zero on the line
            let cross = (p.lon - START.lon) * dy - (p.lat - START.lat) * dx;
            assert!(cross.abs() < 1e-12);
        }
    }

    #[test]
    fn test_jitter_stays_within_bound() {
        let mut rng = StdRng::seed_from_u64(42);
        let routes = HaversineFallback::default().synthesize_with_rng(START, END, &mut rng);
        let straight = &routes[0].geometry;
        for route in &routes[1..] {
            for (p, q) in route.geometry.points().iter().zip(straight.points()) {
                assert!(p.planar_distance_deg(q) <= MAX_JITTER_DEG + 1e-12);
            }
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let fallback = HaversineFallback::default();
        let a = fallback.synthesize_with_rng(START, END, &mut StdRng::seed_from_u64(3));
        let b = fallback.synthesize_with_rng(START, END, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_point_yields_zero_length_routes() {
        let routes = HaversineFallback::default().synthesize(START, START);
        assert_eq!(routes.len(), FALLBACK_VARIATIONS);
        assert!(routes.iter().all(|r| r.distance == 0.0 && r.duration == 0.0));
    }
}
