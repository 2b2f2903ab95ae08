//! Planning scenarios against scripted providers and in-memory layers.

mod fixtures;

use safe_route_planner::error::ProviderError;
use safe_route_planner::geo::SpatialPoint;
use safe_route_planner::layers::{CrimeRecord, PopulationRecord, SpatialContext};
use safe_route_planner::polyline::Polyline;
use safe_route_planner::request::{FlaggedZone, RiskLevel, RouteRequest};
use safe_route_planner::response::RouteResponse;
use safe_route_planner::route::{Provenance, RouteCandidate};
use safe_route_planner::solver::{Category, SolveOptions, solve};
use safe_route_planner::traits::RouteQuery;

use fixtures::{FnProvider, KORAMANGALA, MG_ROAD, failing_provider, path_through, route_through};

fn request() -> RouteRequest {
    RouteRequest::new(MG_ROAD.point(), KORAMANGALA.point())
}

fn expect_success(response: &RouteResponse) -> &safe_route_planner::response::RouteSet {
    match response {
        RouteResponse::Success(set) => set,
        RouteResponse::Failure(failure) => panic!("planning failed: {}", failure.error),
    }
}

#[test]
fn test_provider_outage_falls_back_to_synthesized_routes() {
    let provider = failing_provider();
    let response = solve(&request(), &SpatialContext::empty(), &provider, &SolveOptions::default());
    let set = expect_success(&response);

    // 1 direct call + 18 waypoint calls, all failing
    assert_eq!(provider.calls(), 19);
    assert_eq!(set.candidates_evaluated, 5);
    assert_eq!(set.routes.len(), 7);

    let base = set.best_match.distance;
    for route in &set.routes {
        assert_eq!(route.source, Provenance::Fallback);
        assert_eq!(route.safety_score, 85.0);
        assert_eq!(route.warnings, vec!["None"]);
    }

    // Equal safety everywhere: the straight-line variation wins on distance
    assert_eq!(set.route(Category::Best).unwrap().distance, base);
    assert_eq!(set.route(Category::Fastest).unwrap().distance, base);
    assert_eq!(set.route(Category::Safest).unwrap().distance, base);
    assert_eq!(set.route(Category::MainRoads).unwrap().distance, base);
    // Third by composite score is the 1.2x variation
    let balanced = set.route(Category::Balanced).unwrap().distance;
    assert!((balanced / base - 1.2).abs() < 1e-9);
}

#[test]
fn test_categories_in_output_order() {
    let provider = failing_provider();
    let response = solve(&request(), &SpatialContext::empty(), &provider, &SolveOptions::default());
    let set = expect_success(&response);
    let kinds: Vec<&str> = set.routes.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["best", "safest", "fastest", "main_roads", "balanced", "well_lit", "high_population"]
    );
    assert_eq!(set.best_match.kind, "best_match");
    assert_eq!(set.best_match.label, "Route 1");
    assert_eq!(set.most_populated.kind, "populated");
    assert_eq!(set.low_crime.label, "Route 5");
}

#[test]
fn test_long_detours_are_discarded() {
    let start = MG_ROAD.point();
    let end = KORAMANGALA.point();
    let provider = FnProvider::new(move |query: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        Ok(match query.via {
            None => vec![route_through(&[start, end], 5000.0, Provenance::Direct)],
            Some(wp) => vec![
                route_through(&[start, wp, end], 8999.0, Provenance::Strategic),
                route_through(&[start, wp, end], 9001.0, Provenance::Strategic),
            ],
        })
    });

    let response = solve(&request(), &SpatialContext::empty(), &provider, &SolveOptions::default());
    let set = expect_success(&response);

    // 1 direct + one kept route per waypoint
    assert_eq!(set.candidates_evaluated, 19);
    assert!(set.routes.iter().all(|r| r.distance <= 9000.0));
}

#[test]
fn test_direct_request_asks_for_alternatives() {
    let start = MG_ROAD.point();
    let end = KORAMANGALA.point();
    let provider = FnProvider::new(move |query: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        if query.via.is_none() {
            assert_eq!(query.alternatives, 3);
            assert_eq!(query.start, start);
            assert_eq!(query.end, end);
            Ok(vec![route_through(&[start, end], 5000.0, Provenance::Direct)])
        } else {
            Ok(Vec::new())
        }
    });
    let response = solve(&request(), &SpatialContext::empty(), &provider, &SolveOptions::default());
    assert!(response.is_success());
}

#[test]
fn test_safest_route_avoids_crime_cluster() {
    let start = MG_ROAD.point();
    let end = KORAMANGALA.point();
    let direct_path = path_through(&[start, end], 10);

    // Six incidents at each interior point of the straight corridor
    let crimes = direct_path.points()[3..=7]
        .iter()
        .flat_map(|p| {
            (0..6).map(move |_| CrimeRecord {
                point: *p,
                crime_type: Some("Robbery".to_string()),
            })
        })
        .collect();
    let ctx = SpatialContext::empty().with_crime(crimes);

    let provider = FnProvider::new(move |query: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        Ok(match query.via {
            None => vec![route_through(&[start, end], 5000.0, Provenance::Direct)],
            Some(wp) => vec![route_through(&[start, wp, end], 6000.0, Provenance::Strategic)],
        })
    });

    let request = request().with_flagged_zones(vec![FlaggedZone::new(
        direct_path.points()[5],
        RiskLevel::Critical,
    )]);
    let response = solve(&request, &ctx, &provider, &SolveOptions::default());
    let set = expect_success(&response);

    let fastest = set.route(Category::Fastest).unwrap();
    let safest = set.route(Category::Safest).unwrap();
    let best = set.route(Category::Best).unwrap();

    assert_eq!(fastest.source, Provenance::Direct);
    assert!(fastest.safety_score < 50.0);
    assert!(fastest.crime_incidents >= 10);
    assert!(fastest.warnings.contains(&"Moderate crime exposure".to_string()));
    assert!(fastest.warnings.contains(&"Passes near flagged risk zone".to_string()));
    assert!(fastest.flagged_zone_exposure > 0.0);

    assert_eq!(safest.source, Provenance::Strategic);
    assert_eq!(safest.safety_score, 85.0);
    assert_eq!(best.source, Provenance::Strategic);
    assert_eq!(set.shortest.distance, 5000.0);
}

#[test]
fn test_flagged_zone_exposure_is_reported_not_ranked() {
    // 21 points, 0.005 deg apart; the zone sits on sample 10 only
    let start = SpatialPoint::new(12.90, 77.60);
    let end = SpatialPoint::new(13.00, 77.60);
    let provider = FnProvider::new(move |query: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        Ok(match query.via {
            None => vec![
                RouteCandidate::new(path_through(&[start, end], 20), 11000.0, 1100.0, Provenance::Direct)
                    .expect("valid route"),
            ],
            Some(_) => Vec::new(),
        })
    });

    let request = RouteRequest::new(start, end)
        .with_flagged_zones(vec![FlaggedZone::new(SpatialPoint::new(12.95, 77.60), RiskLevel::Critical)]);
    let response = solve(&request, &SpatialContext::empty(), &provider, &SolveOptions::default());
    let set = expect_success(&response);

    assert_eq!(set.candidates_evaluated, 1);
    assert_eq!(set.best_match.flagged_zone_exposure, 0.4);
    assert_eq!(set.best_match.safety_score, 85.0);
    assert!(set.best_match.warnings.contains(&"Passes near flagged risk zone".to_string()));
}

#[test]
fn test_balanced_with_two_candidates_uses_last_ranked() {
    let start = MG_ROAD.point();
    let end = KORAMANGALA.point();
    let provider = FnProvider::new(move |query: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        Ok(match query.via {
            None => vec![
                route_through(&[start, end], 5000.0, Provenance::Direct),
                route_through(&[start, end], 6000.0, Provenance::Direct),
            ],
            Some(_) => Vec::new(),
        })
    });

    let response = solve(&request(), &SpatialContext::empty(), &provider, &SolveOptions::default());
    let set = expect_success(&response);
    assert_eq!(set.candidates_evaluated, 2);
    assert_eq!(set.route(Category::Best).unwrap().distance, 5000.0);
    assert_eq!(set.route(Category::Balanced).unwrap().distance, 6000.0);
}

#[test]
fn test_invalid_request_never_reaches_provider() {
    let provider = failing_provider();
    let mut request = request();
    request.end_lon = None;

    let response = solve(&request, &SpatialContext::empty(), &provider, &SolveOptions::default());
    let failure = response.error().expect("validation failure");
    assert!(failure.client_error);
    assert!(failure.error.contains("end_lon"));
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_out_of_range_coordinates_rejected() {
    let provider = failing_provider();
    let request = RouteRequest::new(SpatialPoint::new(95.0, 77.59), KORAMANGALA.point());
    let response = solve(&request, &SpatialContext::empty(), &provider, &SolveOptions::default());
    assert!(!response.is_success());
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_identical_endpoints_still_answer() {
    let provider = failing_provider();
    let request = RouteRequest::new(MG_ROAD.point(), MG_ROAD.point());
    let response = solve(&request, &SpatialContext::empty(), &provider, &SolveOptions::default());
    let set = expect_success(&response);

    // No waypoints for a degenerate corridor
    assert_eq!(provider.calls(), 1);
    assert_eq!(set.candidates_evaluated, 5);
    assert!(set.routes.iter().all(|r| r.distance == 0.0));
}

#[test]
fn test_provider_panic_becomes_internal_failure() {
    let provider = FnProvider::new(|_: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        panic!("corrupt provider state")
    });
    let response = solve(&request(), &SpatialContext::empty(), &provider, &SolveOptions::default());
    let failure = response.error().expect("internal failure");
    assert!(!failure.client_error);
    assert!(failure.error.contains("corrupt provider state"));
}

/// Twenty points 0.006 deg apart, so every point is sampled and a population
/// record on one point is out of range of its neighbours.
fn twenty_point_line(lon: f64) -> Polyline {
    Polyline::new(
        (0..20)
            .map(|i| SpatialPoint::new(12.90 + i as f64 * 0.006, lon))
            .collect(),
    )
}

/// Short route on side streets plus a longer route whose first `covered`
/// samples sit on a main road. Population density stays neutral, so both
/// routes score 85 and only distance separates their composite scores.
fn main_road_plan(covered: usize) -> RouteResponse {
    let side_streets = twenty_point_line(77.60);
    let arterial = twenty_point_line(77.70);
    let ctx = SpatialContext::empty().with_population(
        arterial.points()[..covered]
            .iter()
            .map(|p| PopulationRecord {
                point: *p,
                density: 15000.0,
                is_main_road: true,
            })
            .collect(),
    );

    let provider = FnProvider::new(move |query: &RouteQuery| -> Result<Vec<RouteCandidate>, ProviderError> {
        Ok(match query.via {
            None => vec![
                RouteCandidate::new(side_streets.clone(), 5000.0, 500.0, Provenance::Direct)
                    .expect("valid route"),
                RouteCandidate::new(arterial.clone(), 6000.0, 600.0, Provenance::Direct)
                    .expect("valid route"),
            ],
            Some(_) => Vec::new(),
        })
    });

    solve(&request(), &ctx, &provider, &SolveOptions::default())
}

#[test]
fn test_half_main_road_coverage_is_not_a_main_road_route() {
    let response = main_road_plan(10);
    let set = expect_success(&response);

    assert!(set.routes.iter().all(|r| !r.on_main_road));
    // No main-road candidate: falls back to best
    assert_eq!(set.route(Category::MainRoads).unwrap().distance, 5000.0);
    assert_eq!(set.route(Category::Best).unwrap().distance, 5000.0);
}

#[test]
fn test_main_roads_prefers_covered_route_over_best() {
    let response = main_road_plan(11);
    let set = expect_success(&response);

    let best = set.route(Category::Best).unwrap();
    let main_roads = set.route(Category::MainRoads).unwrap();
    assert_eq!(best.distance, 5000.0);
    assert!(!best.on_main_road);
    assert_eq!(main_roads.distance, 6000.0);
    assert!(main_roads.on_main_road);
    assert_eq!(main_roads.safety_score, best.safety_score);
}
