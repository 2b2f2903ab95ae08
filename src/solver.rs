//! Safe-route solver: candidate generation, scoring and category selection.
//!
//! A request runs in two phases. Phase one asks the provider for direct
//! alternatives (falling back to synthesized corridors when it has none).
//! Phase two forces the provider through each detour waypoint and keeps the
//! routes that are not much longer than the shortest direct one. Every
//! candidate is then scored and the named categories are picked.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use crate::error::PlanError;
use crate::haversine::HaversineFallback;
use crate::layers::SpatialContext;
use crate::request::{Endpoints, FlaggedZone, RouteRequest};
use crate::response::{RouteResponse, RouteSet};
use crate::route::RouteCandidate;
use crate::safety::{SafetyMetrics, SafetyProfile, flagged_zone_exposure, score_route};
use crate::traits::{RouteProvider, RouteQuery};
use crate::waypoints::generate_waypoints;

/// Weight of the safety score in the composite score.
const SAFETY_WEIGHT: f64 = 0.7;
/// Points awarded to a route with no detour.
const EFFICIENCY_POINTS: f64 = 30.0;
/// Detour ratio excess at which the distance penalty saturates.
const DISTANCE_PENALTY_SPAN: f64 = 0.8;
/// Share of sampled points that must be near a main road.
const MAIN_ROAD_SHARE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Alternatives requested from the provider in the direct call.
    pub direct_alternatives: usize,
    /// Waypoint-biased routes longer than this multiple of the shortest
    /// direct route are discarded.
    pub max_detour_ratio: f64,
    /// Rank (0-based, by composite score) of the "balanced" pick. Clamped to
    /// the last candidate when fewer exist.
    pub balanced_rank: usize,
    /// Synthesizer used when the provider returns no direct routes.
    pub fallback: HaversineFallback,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            direct_alternatives: 3,
            max_detour_ratio: 1.8,
            balanced_rank: 2,
            fallback: HaversineFallback::default(),
        }
    }
}

/// Raw candidates for one request.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    pub candidates: Vec<RouteCandidate>,
    /// Shortest direct (or fallback) distance in meters.
    pub shortest_direct: f64,
}

/// A candidate with its safety profile and ranking inputs.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub route: RouteCandidate,
    pub profile: SafetyProfile,
    pub composite_score: f64,
    pub on_main_road: bool,
    /// Mean sampled population density.
    pub avg_population: f64,
    /// Capped flagged-zone proximity exposure. Reported, not ranked.
    pub flagged_zone_exposure: f64,
}

impl ScoredCandidate {
    pub fn metrics(&self) -> &SafetyMetrics {
        &self.profile.metrics
    }
}

/// The named route categories, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Best,
    Safest,
    Fastest,
    MainRoads,
    Balanced,
    WellLit,
    HighPopulation,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Best,
        Category::Safest,
        Category::Fastest,
        Category::MainRoads,
        Category::Balanced,
        Category::WellLit,
        Category::HighPopulation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Best => "best",
            Category::Safest => "safest",
            Category::Fastest => "fastest",
            Category::MainRoads => "main_roads",
            Category::Balanced => "balanced",
            Category::WellLit => "well_lit",
            Category::HighPopulation => "high_population",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Best => "⭐ Best",
            Category::Safest => "🛡️ Safest",
            Category::Fastest => "⚡ Fastest",
            Category::MainRoads => "🛣️ Main Roads",
            Category::Balanced => "⚖️ Balanced",
            Category::WellLit => "🌙 Well-lit",
            Category::HighPopulation => "🏙️ High Population",
        }
    }
}

/// Index of the winning candidate for each category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub best: usize,
    pub safest: usize,
    pub fastest: usize,
    pub main_roads: usize,
    pub balanced: usize,
    pub well_lit: usize,
    pub high_population: usize,
}

impl Selection {
    pub fn index(&self, category: Category) -> usize {
        match category {
            Category::Best => self.best,
            Category::Safest => self.safest,
            Category::Fastest => self.fastest,
            Category::MainRoads => self.main_roads,
            Category::Balanced => self.balanced,
            Category::WellLit => self.well_lit,
            Category::HighPopulation => self.high_population,
        }
    }
}

/// Plans a request and always answers with either a complete route set or a
/// structured failure. Panics raised while planning are caught here.
pub fn solve<P>(
    request: &RouteRequest,
    ctx: &SpatialContext,
    provider: &P,
    options: &SolveOptions,
) -> RouteResponse
where
    P: RouteProvider,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| plan(request, ctx, provider, options)))
        .unwrap_or_else(|payload| Err(PlanError::Internal(panic_message(payload.as_ref()))));

    match outcome {
        Ok(route_set) => RouteResponse::Success(Box::new(route_set)),
        Err(err) => {
            if err.is_client_error() {
                tracing::info!(error = %err, "rejected route request");
            } else {
                tracing::error!(error = %err, "route planning failed");
            }
            RouteResponse::failure(&err)
        }
    }
}

/// Plans a request, returning the formatted route set.
pub fn plan<P>(
    request: &RouteRequest,
    ctx: &SpatialContext,
    provider: &P,
    options: &SolveOptions,
) -> Result<RouteSet, PlanError>
where
    P: RouteProvider,
{
    let endpoints = request.validate()?;
    tracing::info!(
        start_lat = endpoints.start.lat,
        start_lon = endpoints.start.lon,
        end_lat = endpoints.end.lat,
        end_lon = endpoints.end.lon,
        flagged_zones = request.flagged_zones.len(),
        "calculating safe routes"
    );
    if let Some(priority) = request.safety_priority {
        tracing::debug!(priority, "safety_priority accepted but not used in scoring");
    }

    let pool = gather_candidates(endpoints, provider, options)?;
    let scored = evaluate(pool, ctx, &request.flagged_zones);
    let selection = select(&scored, options).ok_or(PlanError::NoCandidates)?;

    tracing::info!(candidates = scored.len(), "selected categorical routes");
    Ok(RouteSet::build(&scored, &selection, ctx))
}

/// Collects direct, fallback and waypoint-biased candidates.
pub fn gather_candidates<P>(
    endpoints: Endpoints,
    provider: &P,
    options: &SolveOptions,
) -> Result<CandidatePool, PlanError>
where
    P: RouteProvider,
{
    let Endpoints { start, end } = endpoints;

    let mut direct = fetch_or_empty(
        provider,
        &RouteQuery::direct(start, end, options.direct_alternatives),
    );
    if direct.is_empty() {
        tracing::warn!("no direct routes from provider; synthesizing fallback routes");
        direct = options.fallback.synthesize(start, end);
    }
    if direct.is_empty() {
        return Err(PlanError::NoCandidates);
    }

    let shortest_direct = direct
        .iter()
        .map(|route| route.distance)
        .fold(f64::INFINITY, f64::min);
    let max_distance = shortest_direct * options.max_detour_ratio;

    let waypoints = generate_waypoints(start, end);
    tracing::debug!(waypoints = waypoints.len(), "exploring detour waypoints");

    let strategic: Vec<RouteCandidate> = waypoints
        .par_iter()
        .map(|waypoint| fetch_or_empty(provider, &RouteQuery::via(start, end, *waypoint)))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .filter(|route| route.distance <= max_distance)
        .collect();

    tracing::debug!(
        direct = direct.len(),
        strategic = strategic.len(),
        "gathered route candidates"
    );

    let mut candidates = direct;
    candidates.extend(strategic);
    Ok(CandidatePool {
        candidates,
        shortest_direct,
    })
}

fn fetch_or_empty<P>(provider: &P, query: &RouteQuery) -> Vec<RouteCandidate>
where
    P: RouteProvider,
{
    match provider.fetch_routes(query) {
        Ok(routes) => routes,
        Err(err) => {
            tracing::warn!(error = %err, via = query.via.is_some(), "route provider call failed");
            Vec::new()
        }
    }
}

/// Scores every candidate. Output order matches input order.
pub fn evaluate(
    pool: CandidatePool,
    ctx: &SpatialContext,
    flagged_zones: &[FlaggedZone],
) -> Vec<ScoredCandidate> {
    let shortest = pool.shortest_direct;
    pool.candidates
        .into_par_iter()
        .map(|route| {
            let profile = score_route(ctx, &route.geometry);
            let distance_penalty =
                ((detour_ratio(route.distance, shortest) - 1.0) / DISTANCE_PENALTY_SPAN).clamp(0.0, 1.0);
            let composite_score = profile.metrics.safety_score * SAFETY_WEIGHT
                + (1.0 - distance_penalty) * EFFICIENCY_POINTS;
            let on_main_road = profile.main_road_share() > MAIN_ROAD_SHARE;
            let avg_population = profile.avg_population();
            let flagged_zone_exposure = flagged_zone_exposure(&route.geometry, flagged_zones);

            ScoredCandidate {
                route,
                profile,
                composite_score,
                on_main_road,
                avg_population,
                flagged_zone_exposure,
            }
        })
        .collect()
}

/// Candidate distance relative to the shortest direct route. A zero-length
/// shortest route makes every ratio 1.
pub fn detour_ratio(distance: f64, shortest: f64) -> f64 {
    if shortest > 0.0 {
        distance / shortest
    } else {
        1.0
    }
}

/// Picks the category winners. Ties go to the earliest candidate.
pub fn select(scored: &[ScoredCandidate], options: &SolveOptions) -> Option<Selection> {
    if scored.is_empty() {
        return None;
    }

    let best = first_max_by(scored, |c| c.composite_score);

    let mut ranked: Vec<usize> = (0..scored.len()).collect();
    ranked.sort_by(|&a, &b| scored[b].composite_score.total_cmp(&scored[a].composite_score));

    let main_roads = ranked
        .iter()
        .copied()
        .find(|&idx| scored[idx].on_main_road)
        .unwrap_or(best);
    let balanced = ranked[options.balanced_rank.min(ranked.len() - 1)];

    Some(Selection {
        best,
        safest: first_max_by(scored, |c| c.metrics().safety_score),
        fastest: first_max_by(scored, |c| -c.route.distance),
        main_roads,
        balanced,
        well_lit: first_max_by(scored, |c| c.metrics().avg_lighting),
        high_population: first_max_by(scored, |c| c.avg_population),
    })
}

fn first_max_by(scored: &[ScoredCandidate], key: impl Fn(&ScoredCandidate) -> f64) -> usize {
    let mut best = 0;
    let mut best_key = key(&scored[0]);
    for (idx, candidate) in scored.iter().enumerate().skip(1) {
        let value = key(candidate);
        if value > best_key {
            best = idx;
            best_key = value;
        }
    }
    best
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected internal fault".to_string()
    }
}
