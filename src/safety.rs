//! Route safety scoring against the reference layers.
//!
//! A route is sampled at up to twenty evenly spaced points. Each point gets a
//! 0-10 score (higher is safer) dominated by nearby crime, with lighting,
//! population, infrastructure and network coverage as secondary factors.
//! The route score is the mean point score on a 0-100 scale, minus penalties
//! for crime hotspots and for the single worst exposure along the way.
//!
//! Scoring only reads the geometry and the immutable [`SpatialContext`], so
//! it is deterministic and safe to run for many candidates in parallel.

use serde::Serialize;

use crate::geo::SpatialPoint;
use crate::layers::{
    DEFAULT_INFRASTRUCTURE, DEFAULT_LIGHTING, DEFAULT_NETWORK, DEFAULT_POPULATION, PopulationSample,
    SpatialContext,
};
use crate::polyline::Polyline;
use crate::request::FlaggedZone;

/// Crime count at which a point is considered fully exposed.
const CRIME_SATURATION: f64 = 5.0;
/// A point with more incidents than this is a hotspot.
const HOTSPOT_THRESHOLD: usize = 3;
/// Population density treated as "well populated".
const POPULATION_SATURATION: f64 = 15000.0;

const CRIME_WEIGHT: f64 = 6.0;
const LIGHTING_WEIGHT: f64 = 2.0;
const POPULATION_WEIGHT: f64 = 1.0;
const INFRASTRUCTURE_WEIGHT: f64 = 0.5;
const NETWORK_WEIGHT: f64 = 0.5;

const HOTSPOT_PENALTY: f64 = 2.0;
const EXPOSURE_PENALTY: f64 = 1.5;

/// Average point score used when a route has no samples.
const NEUTRAL_POINT_SCORE: f64 = 5.0;

/// Flagged zones closer than this contribute to exposure.
const FLAGGED_ZONE_RADIUS_KM: f64 = 0.2;

/// Route-level safety summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SafetyMetrics {
    /// 0-100, higher is safer. Rounded to one decimal.
    pub safety_score: f64,
    pub hotspot_count: usize,
    /// Worst per-point crime risk, 0-1.
    pub max_exposure: f64,
    pub avg_lighting: f64,
    pub avg_infrastructure: f64,
    pub avg_network: f64,
}

/// Everything observed at one sampled point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSample {
    pub point: SpatialPoint,
    pub crime_count: usize,
    /// `min(crime_count / 5, 1)`.
    pub crime_risk: f64,
    pub hotspot: bool,
    pub lighting: f64,
    pub population: PopulationSample,
    pub infrastructure: f64,
    pub network: f64,
    /// 0-10, higher is safer.
    pub score: f64,
}

/// Metrics plus the per-point samples they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyProfile {
    pub metrics: SafetyMetrics,
    pub samples: Vec<PointSample>,
}

impl SafetyProfile {
    /// Mean sampled population density.
    pub fn avg_population(&self) -> f64 {
        average(self.samples.iter().map(|s| s.population.density)).unwrap_or(DEFAULT_POPULATION)
    }

    /// Fraction of sampled points near a main road.
    pub fn main_road_share(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let on_main = self.samples.iter().filter(|s| s.population.is_main_road).count();
        on_main as f64 / self.samples.len() as f64
    }
}

/// Samples one point against every layer.
pub fn sample_point(ctx: &SpatialContext, point: SpatialPoint) -> PointSample {
    let crime_count = ctx.crime_count(point);
    let crime_risk = (crime_count as f64 / CRIME_SATURATION).min(1.0);
    let lighting = ctx.lighting_at(point);
    let population = ctx.population_at(point);
    let infrastructure = ctx.infrastructure_score(point);
    let network = ctx.network_score(point);

    let score = (1.0 - crime_risk) * CRIME_WEIGHT
        + (lighting / 10.0) * LIGHTING_WEIGHT
        + (population.density / POPULATION_SATURATION).min(1.0) * POPULATION_WEIGHT
        + (infrastructure / 10.0) * INFRASTRUCTURE_WEIGHT
        + (network / 10.0) * NETWORK_WEIGHT;

    PointSample {
        point,
        crime_count,
        crime_risk,
        hotspot: crime_count > HOTSPOT_THRESHOLD,
        lighting,
        population,
        infrastructure,
        network,
        score,
    }
}

/// Scores a route geometry.
pub fn score_route(ctx: &SpatialContext, geometry: &Polyline) -> SafetyProfile {
    let samples: Vec<PointSample> = geometry
        .sample_points()
        .into_iter()
        .map(|point| sample_point(ctx, point))
        .collect();

    let avg_score = average(samples.iter().map(|s| s.score)).unwrap_or(NEUTRAL_POINT_SCORE);
    let hotspot_count = samples.iter().filter(|s| s.hotspot).count();
    let hotspot_ratio = if samples.is_empty() {
        0.0
    } else {
        hotspot_count as f64 / samples.len() as f64
    };
    let max_exposure = samples.iter().map(|s| s.crime_risk).fold(0.0, f64::max);

    let penalty = hotspot_ratio * HOTSPOT_PENALTY + max_exposure * EXPOSURE_PENALTY;
    // One decimal, so ranking ties match the displayed score
    let safety_score = ((avg_score * 10.0 - penalty * 10.0).clamp(0.0, 100.0) * 10.0).round() / 10.0;

    let metrics = SafetyMetrics {
        safety_score,
        hotspot_count,
        max_exposure,
        avg_lighting: average(samples.iter().map(|s| s.lighting)).unwrap_or(DEFAULT_LIGHTING),
        avg_infrastructure: average(samples.iter().map(|s| s.infrastructure))
            .unwrap_or(DEFAULT_INFRASTRUCTURE),
        avg_network: average(samples.iter().map(|s| s.network)).unwrap_or(DEFAULT_NETWORK),
    };

    SafetyProfile { metrics, samples }
}

/// Flagged-zone penalty contributed by each sampled point, before capping.
///
/// Every active zone within 200 m of a sample adds its risk weight.
pub fn flagged_zone_penalties(geometry: &Polyline, zones: &[FlaggedZone]) -> Vec<f64> {
    geometry
        .sample_points()
        .into_iter()
        .map(|point| {
            zones
                .iter()
                .filter(|zone| zone.active)
                .filter(|zone| point.haversine_km(&zone.point()) < FLAGGED_ZONE_RADIUS_KM)
                .map(|zone| zone.risk_level.weight())
                .sum()
        })
        .collect()
}

/// Proximity exposure to flagged zones, capped at 1.0.
///
/// Reported alongside the safety metrics but not part of `safety_score`.
pub fn flagged_zone_exposure(geometry: &Polyline, zones: &[FlaggedZone]) -> f64 {
    if zones.is_empty() {
        return 0.0;
    }
    flagged_zone_penalties(geometry, zones)
        .into_iter()
        .sum::<f64>()
        .min(1.0)
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
