//! Real Bangalore locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. These are routable with OSRM
//! southern-zone India data.

#![allow(dead_code)]

use safe_route_planner::geo::SpatialPoint;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn point(&self) -> SpatialPoint {
        SpatialPoint::new(self.lat, self.lng)
    }
}

pub const MG_ROAD: Location = Location::new("MG Road", 12.9716, 77.5946);
pub const KORAMANGALA: Location = Location::new("Koramangala", 12.9352, 77.6245);

// ============================================================================
// Landmarks
// ============================================================================

pub const LANDMARKS: &[Location] = &[
    Location::new("Cubbon Park", 12.9763, 77.5929),
    Location::new("Lalbagh Botanical Garden", 12.9507, 77.5848),
    Location::new("Bangalore Palace", 12.9987, 77.5920),
    Location::new("Vidhana Soudha", 12.9796, 77.5907),
    Location::new("Forum Mall", 12.9346, 77.6112),
];

// ============================================================================
// Transit
// ============================================================================

pub const METRO_STATIONS: &[Location] = &[
    Location::new("MG Road Metro", 12.9755, 77.6066),
    Location::new("Trinity Metro", 12.9730, 77.6170),
    Location::new("Indiranagar Metro", 12.9784, 77.6408),
    Location::new("Majestic Metro", 12.9757, 77.5728),
];
