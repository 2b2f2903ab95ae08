//! Seams between the engine and its collaborators.
//!
//! The routing service and the reference layers are supplied from outside;
//! these traits are what the engine needs from them.

use crate::error::ProviderError;
use crate::geo::SpatialPoint;
use crate::route::RouteCandidate;

/// A request for route geometry between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteQuery {
    pub start: SpatialPoint,
    pub end: SpatialPoint,
    /// Forces the route through this point when set.
    pub via: Option<SpatialPoint>,
    /// Number of alternatives to ask for. Ignored when `via` is set.
    pub alternatives: usize,
}

impl RouteQuery {
    pub fn direct(start: SpatialPoint, end: SpatialPoint, alternatives: usize) -> Self {
        Self {
            start,
            end,
            via: None,
            alternatives,
        }
    }

    pub fn via(start: SpatialPoint, end: SpatialPoint, waypoint: SpatialPoint) -> Self {
        Self {
            start,
            end,
            via: Some(waypoint),
            alternatives: 0,
        }
    }
}

/// Produces route geometries for a query.
///
/// `Ok(vec![])` means the provider has no route; `Err` is a hard failure
/// (unreachable, timeout, malformed response). Unbiased queries yield
/// [`Provenance::Direct`](crate::route::Provenance::Direct) candidates and
/// biased ones [`Provenance::Strategic`](crate::route::Provenance::Strategic).
///
/// Implementations must be shareable across threads: waypoint queries are
/// issued in parallel.
pub trait RouteProvider: Sync {
    fn fetch_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>, ProviderError>;
}

/// A geo-tagged row of a reference layer.
pub trait GeoRecord {
    fn point(&self) -> SpatialPoint;
}
