//! Natural-language turn-by-turn instructions.
//!
//! Provider steps carry only a maneuver type, a modifier and a street name.
//! This module phrases them for people, adds the segment distance, and
//! mentions a nearby landmark when the infrastructure layer knows one.

use serde::Serialize;

use crate::geo::{SpatialPoint, compass_direction};
use crate::layers::SpatialContext;
use crate::route::{Maneuver, ManeuverKind, RouteCandidate, RouteStep};

/// One rendered navigation instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    #[serde(rename = "instruction")]
    pub text: String,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    /// `[lon, lat]`.
    pub location: [f64; 2],
}

/// Renders instructions for a route.
///
/// Routes without provider steps get a synthesized depart/arrive pair.
/// Arrivals at intermediate waypoints are dropped; only the final one is kept.
pub fn build_instructions(route: &RouteCandidate, ctx: &SpatialContext) -> Vec<Instruction> {
    let steps = if route.steps.is_empty() {
        synthesized_steps(route)
    } else {
        route.steps.clone()
    };
    let heading = initial_heading(route);
    let last = steps.len().saturating_sub(1);

    steps
        .iter()
        .enumerate()
        .filter(|(idx, step)| step.maneuver.kind != ManeuverKind::Arrive || *idx == last)
        .map(|(idx, step)| {
            let mut text = phrase(step, idx == 0, heading);
            if step.distance > 0.0 && step.maneuver.kind != ManeuverKind::Arrive {
                text.push_str(" for ");
                text.push_str(&format_distance(step.distance));
            }
            if let Some(landmark) = ctx.nearest_landmark(step.maneuver.location) {
                text.push_str(&format!(" (near {landmark})"));
            }
            Instruction {
                text,
                distance: step.distance,
                duration: step.duration,
                location: step.maneuver.location.lon_lat(),
            }
        })
        .collect()
}

fn synthesized_steps(route: &RouteCandidate) -> Vec<RouteStep> {
    let (Some(start), Some(end)) = (route.geometry.first(), route.geometry.last()) else {
        return Vec::new();
    };
    let step = |kind, location: SpatialPoint, distance, duration| RouteStep {
        maneuver: Maneuver {
            kind,
            modifier: None,
            location,
            exit: None,
        },
        road_name: String::new(),
        distance,
        duration,
    };
    vec![
        step(ManeuverKind::Depart, start, route.distance, route.duration),
        step(ManeuverKind::Arrive, end, 0.0, 0.0),
    ]
}

/// Bearing of the first non-degenerate segment.
fn initial_heading(route: &RouteCandidate) -> Option<f64> {
    let points = route.geometry.points();
    let origin = *points.first()?;
    points
        .iter()
        .find(|p| **p != origin)
        .map(|next| origin.bearing_deg(next))
}

fn phrase(step: &RouteStep, first: bool, heading: Option<f64>) -> String {
    let road = road_name(step);
    let modifier = step.maneuver.modifier.as_deref();

    match &step.maneuver.kind {
        ManeuverKind::Depart if first => match (heading, step.road_name.is_empty()) {
            (Some(bearing), true) => {
                format!("Head {} towards your destination", compass_direction(bearing))
            }
            (Some(bearing), false) => format!("Head {} on {}", compass_direction(bearing), road),
            (None, _) => format!("Start on {}", road),
        },
        ManeuverKind::Depart => format!("Continue on {}", road),
        ManeuverKind::Arrive => "Arrive at your destination".to_string(),
        ManeuverKind::Turn => match modifier {
            Some("uturn") => format!("Make a U-turn onto {}", road),
            Some("straight") => format!("Continue straight onto {}", road),
            Some(m) => format!("Turn {} onto {}", m, road),
            None => format!("Turn onto {}", road),
        },
        ManeuverKind::Continue => match modifier {
            None | Some("straight") => format!("Continue straight on {}", road),
            Some("uturn") => format!("Make a U-turn on {}", road),
            Some(m) => format!("Continue {} on {}", m, road),
        },
        ManeuverKind::NewName => format!("Continue onto {}", road),
        ManeuverKind::Merge => match modifier {
            Some(m) => format!("Merge {} onto {}", m, road),
            None => format!("Merge onto {}", road),
        },
        ManeuverKind::OnRamp => match modifier {
            Some(m) => format!("Take the ramp on the {} onto {}", m, road),
            None => format!("Take the ramp onto {}", road),
        },
        ManeuverKind::OffRamp => format!("Take the exit onto {}", road),
        ManeuverKind::Fork => match modifier {
            Some(m) => format!("Keep {} at the fork onto {}", m, road),
            None => format!("Keep at the fork onto {}", road),
        },
        ManeuverKind::EndOfRoad => match modifier {
            Some(m) => format!("At the end of the road, turn {} onto {}", m, road),
            None => format!("At the end of the road, continue onto {}", road),
        },
        ManeuverKind::Roundabout | ManeuverKind::Rotary | ManeuverKind::RoundaboutTurn => {
            match step.maneuver.exit {
                Some(exit) => format!(
                    "At the roundabout, take the {} exit onto {}",
                    ordinal(exit),
                    road
                ),
                None => format!("Enter the roundabout and exit onto {}", road),
            }
        }
        ManeuverKind::Notification | ManeuverKind::Other(_) => format!("Continue on {}", road),
    }
}

fn road_name(step: &RouteStep) -> &str {
    if step.road_name.trim().is_empty() {
        "the road"
    } else {
        step.road_name.as_str()
    }
}

/// Human-readable distance: meters below 1 km (rounded to 10 m), else km.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        let rounded = ((meters / 10.0).round() * 10.0).max(10.0);
        format!("{:.0} m", rounded)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
