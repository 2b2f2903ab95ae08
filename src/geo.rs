//! Coordinate primitives and the distance approximations used by the engine.
//!
//! Spatial lookups use planar degree radii; only corridor lengths and
//! flagged-zone proximity use great-circle distance.

use serde::{Deserialize, Serialize};

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Rough degrees-per-kilometer conversion used for lateral offsets.
pub const DEG_PER_KM: f64 = 0.009;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint {
    pub lat: f64,
    pub lon: f64,
}

impl SpatialPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a point from a GeoJSON-ordered `[lon, lat]` pair.
    pub const fn from_lon_lat(lon_lat: [f64; 2]) -> Self {
        Self {
            lat: lon_lat[1],
            lon: lon_lat[0],
        }
    }

    /// GeoJSON ordering.
    pub const fn lon_lat(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// True when both components are finite and inside WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Clamps into WGS84 bounds. Used after synthetic offsets.
    pub fn clamped(self) -> Self {
        Self {
            lat: self.lat.clamp(-90.0, 90.0),
            lon: self.lon.clamp(-180.0, 180.0),
        }
    }

    /// Euclidean distance in degree space.
    pub fn planar_distance_deg(&self, other: &SpatialPoint) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }

    /// Great-circle distance in kilometers.
    pub fn haversine_km(&self, other: &SpatialPoint) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Initial bearing towards `other`, degrees clockwise from north in `[0, 360)`.
    pub fn bearing_deg(&self, other: &SpatialPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Eight-point compass name for a bearing.
pub fn compass_direction(bearing_deg: f64) -> &'static str {
    const NAMES: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let normalized = bearing_deg.rem_euclid(360.0);
    let sector = ((normalized + 22.5) / 45.0).floor() as usize % 8;
    NAMES[sector]
}
