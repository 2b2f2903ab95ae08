//! Scripted route providers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use safe_route_planner::error::ProviderError;
use safe_route_planner::geo::SpatialPoint;
use safe_route_planner::polyline::Polyline;
use safe_route_planner::route::{Provenance, RouteCandidate};
use safe_route_planner::traits::{RouteProvider, RouteQuery};

/// Provider backed by a closure, counting every call.
pub struct FnProvider<F> {
    respond: F,
    calls: AtomicUsize,
}

impl<F> FnProvider<F>
where
    F: Fn(&RouteQuery) -> Result<Vec<RouteCandidate>, ProviderError> + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> RouteProvider for FnProvider<F>
where
    F: Fn(&RouteQuery) -> Result<Vec<RouteCandidate>, ProviderError> + Sync,
{
    fn fetch_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(query)
    }
}

/// Provider that is always down.
pub fn failing_provider()
-> FnProvider<impl Fn(&RouteQuery) -> Result<Vec<RouteCandidate>, ProviderError> + Sync> {
    FnProvider::new(|_: &RouteQuery| Err(ProviderError::Malformed("service unavailable".to_string())))
}

/// Evenly spaced polyline through `stops`, `per_leg` points per leg.
pub fn path_through(stops: &[SpatialPoint], per_leg: usize) -> Polyline {
    let mut points = vec![stops[0]];
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for i in 1..=per_leg {
            let t = i as f64 / per_leg as f64;
            points.push(SpatialPoint::new(
                a.lat + t * (b.lat - a.lat),
                a.lon + t * (b.lon - a.lon),
            ));
        }
    }
    Polyline::new(points)
}

/// Route through `stops` with an explicit distance and a 10 m/s duration.
pub fn route_through(stops: &[SpatialPoint], distance: f64, provenance: Provenance) -> RouteCandidate {
    RouteCandidate::new(path_through(stops, 10), distance, distance / 10.0, provenance)
        .expect("valid test route")
}
