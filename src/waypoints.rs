//! Detour waypoints around the direct corridor.
//!
//! Points are placed perpendicular to the start→end vector at fixed fractions
//! of the corridor, on both sides, at several lateral distances. Feeding them
//! to the routing provider one at a time yields routes that leave the
//! obvious path and may avoid risky areas.

use crate::geo::{DEG_PER_KM, SpatialPoint};

/// Fractions of the corridor at which detours are placed.
pub const CORRIDOR_POSITIONS: [f64; 3] = [0.25, 0.50, 0.75];

/// Lateral detour distances in kilometers.
pub const LATERAL_OFFSETS_KM: [f64; 3] = [0.5, 1.2, 2.5];

/// Generates the detour waypoints for a corridor, ordered by position, then
/// offset, then side (left before right).
///
/// Returns an empty list when `start == end`.
pub fn generate_waypoints(start: SpatialPoint, end: SpatialPoint) -> Vec<SpatialPoint> {
    let dx = end.lon - start.lon;
    let dy = end.lat - start.lat;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return Vec::new();
    }

    // Unit perpendicular, in (lon, lat) components
    let perp_lon = -dy / length;
    let perp_lat = dx / length;

    let mut waypoints =
        Vec::with_capacity(CORRIDOR_POSITIONS.len() * LATERAL_OFFSETS_KM.len() * 2);
    for fraction in CORRIDOR_POSITIONS {
        let anchor = SpatialPoint::new(start.lat + fraction * dy, start.lon + fraction * dx);

        for offset_km in LATERAL_OFFSETS_KM {
            let offset_deg = offset_km * DEG_PER_KM;
            waypoints.push(
                SpatialPoint::new(
                    anchor.lat + offset_deg * perp_lat,
                    anchor.lon + offset_deg * perp_lon,
                )
                .clamped(),
            );
            waypoints.push(
                SpatialPoint::new(
                    anchor.lat - offset_deg * perp_lat,
                    anchor.lon - offset_deg * perp_lon,
                )
                .clamped(),
            );
        }
    }
    waypoints
}
