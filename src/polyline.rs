//! Polyline representation for route geometries.
//!
//! Route geometries arrive from the provider as GeoJSON `[lon, lat]` pairs
//! and are held as decoded [`SpatialPoint`]s inside the engine. GeoJSON
//! ordering is restored only when a route is formatted for output.

use serde::{Deserialize, Serialize};

use crate::geo::SpatialPoint;

/// Maximum number of points examined along one route.
pub const MAX_SAMPLES: usize = 20;

/// A route geometry as an ordered list of coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<SpatialPoint>,
}

impl Polyline {
    pub fn new(points: Vec<SpatialPoint>) -> Self {
        Self { points }
    }

    /// Builds a polyline from GeoJSON-ordered `[lon, lat]` coordinates.
    pub fn from_lon_lat(coordinates: &[[f64; 2]]) -> Self {
        Self {
            points: coordinates.iter().copied().map(SpatialPoint::from_lon_lat).collect(),
        }
    }

    pub fn points(&self) -> &[SpatialPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<SpatialPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<SpatialPoint> {
        self.points.last().copied()
    }

    /// Indices of up to [`MAX_SAMPLES`] evenly spaced points, first and last
    /// inclusive. Fractional positions truncate towards the start.
    pub fn sample_indices(&self) -> Vec<usize> {
        let len = self.points.len();
        let sample_size = len.min(MAX_SAMPLES);
        match sample_size {
            0 => Vec::new(),
            1 => vec![0],
            _ => (0..sample_size)
                .map(|i| i * (len - 1) / (sample_size - 1))
                .collect(),
        }
    }

    /// The sampled points, in route order.
    pub fn sample_points(&self) -> Vec<SpatialPoint> {
        self.sample_indices()
            .into_iter()
            .map(|idx| self.points[idx])
            .collect()
    }

    /// Sum of great-circle segment lengths in kilometers.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|pair| pair[0].haversine_km(&pair[1]))
            .sum()
    }

    pub fn to_geojson(&self) -> LineString {
        LineString {
            kind: "LineString".to_string(),
            coordinates: self.points.iter().map(SpatialPoint::lon_lat).collect(),
        }
    }
}

/// GeoJSON LineString geometry, as exchanged with the provider and callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<[f64; 2]>,
}
