//! Output payloads: formatted routes, the categorical route set, and the
//! success/failure envelope.

use serde::Serialize;

use crate::error::PlanError;
use crate::instructions::{Instruction, build_instructions};
use crate::layers::{DEFAULT_POPULATION, SpatialContext};
use crate::polyline::LineString;
use crate::route::Provenance;
use crate::solver::{Category, ScoredCandidate, Selection};

/// Scores above this earn the "Low crime density" reason.
const LOW_CRIME_SCORE: f64 = 80.0;
/// Exposure above this earns a warning.
const MODERATE_EXPOSURE: f64 = 0.5;

/// One route as presented to callers.
#[derive(Debug, Clone, Serialize)]
pub struct FormattedRoute {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub badge: String,
    pub geometry: LineString,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    pub safety_score: f64,
    pub crime_incidents: u32,
    pub lighting_score: f64,
    pub infrastructure_score: f64,
    pub network_score: f64,
    pub population_density: f64,
    pub population_score: f64,
    pub crime_score: f64,
    pub on_main_road: bool,
    pub source: Provenance,
    pub flagged_zone_exposure: f64,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub steps: Vec<Instruction>,
}

impl FormattedRoute {
    pub fn new(
        kind: &str,
        label: &str,
        scored: &ScoredCandidate,
        ctx: &SpatialContext,
    ) -> Self {
        let metrics = scored.metrics();
        let safety_score = round1(metrics.safety_score);

        let mut reasons = vec![format!("{label} option")];
        reasons.push(if metrics.safety_score > LOW_CRIME_SCORE {
            "Low crime density".to_string()
        } else {
            "Optimized path".to_string()
        });

        let mut warnings = Vec::new();
        if metrics.max_exposure > MODERATE_EXPOSURE {
            warnings.push("Moderate crime exposure".to_string());
        }
        if scored.flagged_zone_exposure > 0.0 {
            warnings.push("Passes near flagged risk zone".to_string());
        }
        if warnings.is_empty() {
            warnings.push("None".to_string());
        }

        let crime_incidents =
            (metrics.hotspot_count as f64 * 2.0 + metrics.max_exposure * 5.0).floor() as u32;

        Self {
            kind: kind.to_string(),
            label: label.to_string(),
            badge: format!("{} ({:.1}/100)", label.to_uppercase(), safety_score),
            geometry: scored.route.geometry.to_geojson(),
            distance: scored.route.distance,
            duration: scored.route.duration,
            safety_score,
            crime_incidents,
            lighting_score: round1(metrics.avg_lighting * 10.0),
            infrastructure_score: round1(metrics.avg_infrastructure * 10.0),
            network_score: round1(metrics.avg_network * 10.0),
            population_density: scored.avg_population.round(),
            population_score: DEFAULT_POPULATION,
            crime_score: (100.0 - metrics.safety_score) / 100.0,
            on_main_road: scored.on_main_road,
            source: scored.route.provenance,
            flagged_zone_exposure: round2(scored.flagged_zone_exposure),
            reasons,
            warnings,
            steps: build_instructions(&scored.route, ctx),
        }
    }
}

/// Successful planning result.
///
/// `routes` holds one entry per [`Category`] in output order. The five
/// aliases repeat picks under their legacy names.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSet {
    pub success: bool,
    pub routes: Vec<FormattedRoute>,
    pub best_match: FormattedRoute,
    pub safest: FormattedRoute,
    pub shortest: FormattedRoute,
    pub most_populated: FormattedRoute,
    pub low_crime: FormattedRoute,
    pub candidates_evaluated: usize,
}

impl RouteSet {
    /// Formats the selected candidates. `selection` must index into `scored`.
    pub fn build(scored: &[ScoredCandidate], selection: &Selection, ctx: &SpatialContext) -> Self {
        let routes = Category::ALL
            .iter()
            .map(|category| {
                FormattedRoute::new(
                    category.key(),
                    category.label(),
                    &scored[selection.index(*category)],
                    ctx,
                )
            })
            .collect();

        let alias = |kind: &str, label: &str, category: Category| {
            FormattedRoute::new(kind, label, &scored[selection.index(category)], ctx)
        };

        Self {
            success: true,
            routes,
            best_match: alias("best_match", "Route 1", Category::Best),
            safest: alias("safest", "Route 2", Category::Safest),
            shortest: alias("shortest", "Route 3", Category::Fastest),
            most_populated: alias("populated", "Route 4", Category::HighPopulation),
            low_crime: alias("low_crime", "Route 5", Category::Safest),
            candidates_evaluated: scored.len(),
        }
    }

    pub fn route(&self, category: Category) -> Option<&FormattedRoute> {
        self.routes.iter().find(|route| route.kind == category.key())
    }
}

/// Structured failure payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub success: bool,
    pub error: String,
    /// Whether the caller supplied bad input.
    #[serde(skip)]
    pub client_error: bool,
}

/// Outcome of one planning request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RouteResponse {
    Success(Box<RouteSet>),
    Failure(Failure),
}

impl RouteResponse {
    pub fn failure(err: &PlanError) -> Self {
        RouteResponse::Failure(Failure {
            success: false,
            error: err.to_string(),
            client_error: err.is_client_error(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RouteResponse::Success(_))
    }

    pub fn route_set(&self) -> Option<&RouteSet> {
        match self {
            RouteResponse::Success(set) => Some(set),
            RouteResponse::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Failure> {
        match self {
            RouteResponse::Success(_) => None,
            RouteResponse::Failure(failure) => Some(failure),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
