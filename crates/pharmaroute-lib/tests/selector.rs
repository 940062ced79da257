mod common;

use pharmaroute_lib::{
    list_routed_candidates, rank_by_route, rank_candidates, walking_minutes, CandidateSelector,
    Coordinate, Error, GraphQueryAdapter, InMemoryGraphStore, RouteAlgorithm, RouteAssembler,
    RoutingChain,
};

use common::{
    coord, pharmacy, scenario_network, CountingStore, ISLAND, ISOLATED, PHARMACY, USER,
};

fn chain() -> RoutingChain {
    RoutingChain::standard(GraphQueryAdapter::default())
}

#[test]
fn empty_candidate_list_is_not_routable() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let error = CandidateSelector::default()
        .select_best(&chain(), &store, USER, &[])
        .expect_err("no candidates");
    assert!(matches!(error, Error::NoCandidateRoutable));
}

#[test]
fn all_invalid_candidates_are_not_routable() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let broken = pharmacy("x", "Broken", coord(f64::NAN, -5.0));
    let error = CandidateSelector::default()
        .select_best(&chain(), &store, USER, &[broken])
        .expect_err("only invalid candidates");
    assert!(matches!(error, Error::NoCandidateRoutable));
}

#[test]
fn equidistant_candidates_rank_by_identifier() {
    // Same latitude offset north and south of the user, exact in binary.
    let b = pharmacy("B", "South", coord(33.9921875, -5.0));
    let a = pharmacy("A", "North", coord(34.0078125, -5.0));

    let ranked = rank_candidates(USER, &[b.clone(), a.clone()]).unwrap();
    let ids: Vec<&str> = ranked.iter().map(|c| c.poi.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    let reversed = rank_candidates(USER, &[a, b]).unwrap();
    assert_eq!(ranked, reversed);
}

#[test]
fn nearest_navigable_candidate_wins() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let candidates = [
        pharmacy("island", "Pharmacie de l'Ile", ISLAND),
        pharmacy("central", "Pharmacie Centrale", PHARMACY),
        pharmacy("lonely", "Pharmacie Isolee", ISOLATED),
    ];

    let selection = CandidateSelector::default()
        .select_best(&chain(), &store, USER, &candidates)
        .unwrap();

    assert_eq!(selection.poi.id, "central");
    assert_eq!(selection.rank, 1);
    assert_eq!(selection.probed, 2);
    assert_eq!(selection.route.algorithm, RouteAlgorithm::WeightedShortestPath);
    assert!(selection.route.navigable);
    assert!(selection.route.total_distance_m > 0.0);
}

#[test]
fn straight_line_estimate_is_accepted_when_nothing_is_navigable() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let candidates = [
        pharmacy("island", "Pharmacie de l'Ile", ISLAND),
        pharmacy("lonely", "Pharmacie Isolee", ISOLATED),
    ];

    let selection = CandidateSelector::default()
        .select_best(&chain(), &store, USER, &candidates)
        .unwrap();

    assert_eq!(selection.poi.id, "lonely");
    assert_eq!(selection.route.algorithm, RouteAlgorithm::Euclidean);
    assert!(!selection.route.navigable);
    assert_eq!(selection.probed, 2);
}

#[test]
fn probe_budget_limits_the_search() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let candidates = [
        pharmacy("central", "Pharmacie Centrale", PHARMACY),
        pharmacy("lonely", "Pharmacie Isolee", ISOLATED),
    ];

    let selection = CandidateSelector::new(1, RouteAssembler::default())
        .select_best(&chain(), &store, USER, &candidates)
        .unwrap();

    assert_eq!(selection.probed, 1);
    assert_eq!(selection.poi.id, "lonely");
    assert_eq!(selection.route.algorithm, RouteAlgorithm::Euclidean);
}

#[test]
fn selection_is_deterministic() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let candidates = [
        pharmacy("central", "Pharmacie Centrale", PHARMACY),
        pharmacy("island", "Pharmacie de l'Ile", ISLAND),
    ];
    let selector = CandidateSelector::default();

    let first = selector
        .select_best(&chain(), &store, USER, &candidates)
        .unwrap();
    let second = selector
        .select_best(&chain(), &store, USER, &candidates)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn route_to_targets_a_specific_candidate() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let island = pharmacy("island", "Pharmacie de l'Ile", ISLAND);

    let selection = CandidateSelector::default()
        .route_to(&chain(), &store, USER, &island)
        .unwrap();
    assert_eq!(selection.poi.id, "island");
    assert_eq!(selection.rank, 0);
    assert_eq!(selection.route.algorithm, RouteAlgorithm::Euclidean);
}

#[test]
fn invalid_user_location_is_rejected() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let user = Coordinate {
        lat: 0.0,
        lon: 181.0,
    };
    let error = CandidateSelector::default()
        .select_best(
            &chain(),
            &store,
            user,
            &[pharmacy("central", "Pharmacie Centrale", PHARMACY)],
        )
        .expect_err("invalid user");
    assert!(matches!(error, Error::InvalidCoordinate { .. }));
}

#[test]
fn route_ranking_puts_road_routes_first() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let candidates = [
        pharmacy("island", "Pharmacie de l'Ile", ISLAND),
        pharmacy("central", "Pharmacie Centrale", PHARMACY),
        pharmacy("lonely", "Pharmacie Isolee", ISOLATED),
    ];
    let ranked = rank_candidates(USER, &candidates).unwrap();
    assert_eq!(ranked[0].poi.id, "lonely");

    let routed = rank_by_route(&chain(), &store, USER, &ranked, 3).unwrap();
    let ids: Vec<&str> = routed.iter().map(|r| r.candidate.poi.id.as_str()).collect();
    assert_eq!(ids, ["central", "lonely", "island"]);
    assert_eq!(routed[0].resolution.result.hops(), Some(4));
    assert_eq!(
        routed[1].resolution.algorithm(),
        RouteAlgorithm::Euclidean
    );

    let listing = list_routed_candidates(USER, &routed, 2);
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].rank, 1);
    assert_eq!(listing[0].hops, Some(4));
    assert_eq!(
        listing[0].algorithm,
        Some(RouteAlgorithm::WeightedShortestPath)
    );
    let road_m = routed[0].route_distance_m();
    assert!(road_m > ranked[1].estimated_distance_m);
    assert_eq!(listing[0].road_distance_km, Some(road_m / 1_000.0));
    assert_eq!(listing[0].walking_minutes, walking_minutes(road_m));
    assert_eq!(listing[1].hops, Some(0));
}

#[test]
fn route_ranking_stops_once_remaining_candidates_are_too_far() {
    let candidates = [
        pharmacy("lonely", "Pharmacie Isolee", ISOLATED),
        pharmacy("atlas", "Pharmacie Atlas", coord(34.01, -5.0)),
        pharmacy("central", "Pharmacie Centrale", PHARMACY),
        pharmacy("island", "Pharmacie de l'Ile", ISLAND),
    ];
    let ranked = rank_candidates(USER, &candidates).unwrap();

    let limited = CountingStore::new(InMemoryGraphStore::new(&scenario_network()));
    let routed = rank_by_route(&chain(), &limited, USER, &ranked, 1).unwrap();
    assert_eq!(routed.len(), 1);
    assert_eq!(routed[0].candidate.poi.id, "atlas");
    assert_eq!(routed[0].resolution.result.hops(), Some(1));

    let full = CountingStore::new(InMemoryGraphStore::new(&scenario_network()));
    let all = rank_by_route(&chain(), &full, USER, &ranked, 4).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].candidate.poi.id, "atlas");
    assert!(limited.calls() < full.calls());
}

#[test]
fn route_ranking_with_zero_limit_is_empty() {
    let store = InMemoryGraphStore::new(&scenario_network());
    let ranked = rank_candidates(USER, &[pharmacy("central", "Pharmacie Centrale", PHARMACY)])
        .unwrap();
    assert!(rank_by_route(&chain(), &store, USER, &ranked, 0)
        .unwrap()
        .is_empty());
}
