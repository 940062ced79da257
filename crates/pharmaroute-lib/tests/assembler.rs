mod common;

use pharmaroute_lib::{
    Error, FailureReason, GraphQueryAdapter, InMemoryGraphStore, Maneuver, RouteAlgorithm,
    RouteAssembler, RoutingChain, StrategyResult,
};

use common::{scenario_network, PHARMACY, USER};

fn weighted_result() -> StrategyResult {
    let store = InMemoryGraphStore::new(&scenario_network());
    RoutingChain::standard(GraphQueryAdapter::default())
        .resolve(&store, USER, PHARMACY)
        .expect("valid coordinates")
        .result
}

#[test]
fn street_grid_route_produces_turns() {
    let route = RouteAssembler::default()
        .assemble(&weighted_result())
        .expect("weighted result assembles");

    let maneuvers: Vec<Maneuver> = route.steps.iter().map(|step| step.maneuver).collect();
    assert_eq!(
        maneuvers,
        vec![
            Maneuver::Depart,
            Maneuver::Continue,
            Maneuver::TurnLeft,
            Maneuver::TurnRight,
            Maneuver::TurnLeft,
            Maneuver::Arrive,
        ]
    );
    assert_eq!(route.steps[0].instruction, "Head north");
    assert!(route.steps[2].instruction.starts_with("Turn left"));
    assert_eq!(route.steps.last().unwrap().start_waypoint, 4);
}

#[test]
fn step_distances_cover_the_route() {
    let route = RouteAssembler::default()
        .assemble(&weighted_result())
        .unwrap();

    let steps_total: f64 = route.steps.iter().map(|step| step.distance_m).sum();
    let segments_total: f64 = route.segment_distances_m.iter().sum();
    assert!((steps_total - route.total_distance_m).abs() < 1e-6);
    assert!((segments_total - route.total_distance_m).abs() < 1e-6);
    assert_eq!(route.segment_distances_m.len(), route.waypoints.len() - 1);
}

#[test]
fn duration_follows_configured_speed() {
    let result = weighted_result();
    let walking = RouteAssembler::default().assemble(&result).unwrap();
    let cycling = RouteAssembler::new(30.0, 15.0).assemble(&result).unwrap();

    let expected = walking.total_distance_m / (5.0 / 3.6);
    assert!((walking.estimated_duration_s - expected).abs() < 1e-6);
    assert!((walking.estimated_duration_s - 3.0 * cycling.estimated_duration_s).abs() < 1e-6);
}

#[test]
fn wide_threshold_merges_turns_into_one_step() {
    let route = RouteAssembler::new(179.0, 5.0)
        .assemble(&weighted_result())
        .unwrap();
    let maneuvers: Vec<Maneuver> = route.steps.iter().map(|step| step.maneuver).collect();
    assert_eq!(
        maneuvers,
        vec![Maneuver::Depart, Maneuver::Continue, Maneuver::Arrive]
    );
}

#[test]
fn failures_cannot_be_assembled() {
    let error = RouteAssembler::default()
        .assemble(&StrategyResult::failure(FailureReason::NoPathExists))
        .expect_err("failure result");
    assert!(matches!(error, Error::UnresolvedRoute));
}

#[test]
fn inconsistent_distance_is_rejected() {
    let result = StrategyResult::Success {
        path: vec![USER, PHARMACY],
        distance_m: 1.0,
        algorithm: RouteAlgorithm::Euclidean,
        hops: 0,
    };
    let error = RouteAssembler::default()
        .assemble(&result)
        .expect_err("distance mismatch");
    assert!(matches!(error, Error::RouteDistanceMismatch { .. }));
}

#[test]
fn euclidean_routes_are_flagged_non_navigable() {
    let distance_m = pharmaroute_lib::estimate_distance(USER, PHARMACY).unwrap();
    let route = RouteAssembler::default()
        .assemble(&StrategyResult::Success {
            path: vec![USER, PHARMACY],
            distance_m,
            algorithm: RouteAlgorithm::Euclidean,
            hops: 0,
        })
        .unwrap();
    assert!(!route.navigable);
    assert_eq!(route.steps.len(), 3);
}
