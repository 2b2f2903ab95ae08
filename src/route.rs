//! Strongly typed route geometries and navigation steps.
//!
//! Provider payloads are mapped onto these types at the adapter boundary so
//! scoring and selection never touch raw JSON.

use serde::{Deserialize, Serialize};

use crate::geo::SpatialPoint;
use crate::polyline::Polyline;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Unbiased provider alternative.
    Direct,
    /// Provider route forced through a detour waypoint.
    Strategic,
    /// Synthesized locally because the provider returned nothing.
    Fallback,
}

/// Maneuver category of a navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManeuverKind {
    Depart,
    Arrive,
    Turn,
    Continue,
    NewName,
    Merge,
    OnRamp,
    OffRamp,
    Fork,
    EndOfRoad,
    Roundabout,
    Rotary,
    RoundaboutTurn,
    Notification,
    Other(String),
}

impl ManeuverKind {
    /// Parses an OSRM maneuver type string.
    pub fn parse(value: &str) -> Self {
        match value {
            "depart" => Self::Depart,
            "arrive" => Self::Arrive,
            "turn" => Self::Turn,
            "continue" => Self::Continue,
            "new name" => Self::NewName,
            "merge" => Self::Merge,
            "on ramp" => Self::OnRamp,
            "off ramp" => Self::OffRamp,
            "fork" => Self::Fork,
            "end of road" => Self::EndOfRoad,
            "roundabout" | "exit roundabout" => Self::Roundabout,
            "rotary" | "exit rotary" => Self::Rotary,
            "roundabout turn" => Self::RoundaboutTurn,
            "notification" => Self::Notification,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Maneuver {
    pub kind: ManeuverKind,
    /// Direction qualifier such as `left`, `slight right`, `uturn`.
    pub modifier: Option<String>,
    pub location: SpatialPoint,
    /// Roundabout exit number, when the provider reports one.
    pub exit: Option<u32>,
}

/// One leg of turn-by-turn navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    pub maneuver: Maneuver,
    /// Street name; empty for unnamed roads.
    pub road_name: String,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

/// A route geometry under consideration.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCandidate {
    pub geometry: Polyline,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub steps: Vec<RouteStep>,
    pub provenance: Provenance,
}

impl RouteCandidate {
    /// Returns `None` when the geometry has fewer than two points or the
    /// distance/duration are negative or non-finite.
    pub fn new(
        geometry: Polyline,
        distance: f64,
        duration: f64,
        provenance: Provenance,
    ) -> Option<Self> {
        let usable = geometry.len() >= 2
            && geometry.points().iter().all(SpatialPoint::is_valid)
            && distance.is_finite()
            && distance >= 0.0
            && duration.is_finite()
            && duration >= 0.0;

        usable.then(|| Self {
            geometry,
            distance,
            duration,
            steps: Vec::new(),
            provenance,
        })
    }

    pub fn with_steps(mut self, steps: Vec<RouteStep>) -> Self {
        self.steps = steps;
        self
    }
}
