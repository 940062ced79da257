mod common;

use std::time::Instant;

use pharmaroute_lib::path::{
    find_route_a_star, find_route_bfs, find_route_dijkstra, path_weight, SearchLimits,
    SearchOutcome,
};
use pharmaroute_lib::{build_graph, find_route, Directionality, RoadNetwork};

use common::{coord, grid_network, scenario_network};

#[test]
fn undirected_roads_are_traversable_both_ways() {
    let graph = build_graph(&scenario_network());
    assert!(graph.edge_between(1, 2).is_some());
    assert!(graph.edge_between(2, 1).is_some());
    assert!(graph.neighbours(20).is_empty());
    assert_eq!(graph.node_count(), 8);
}

#[test]
fn directed_roads_are_one_way() {
    let mut network = RoadNetwork::new(Directionality::Directed);
    network.add_node(1, coord(34.0, -5.0));
    network.add_node(2, coord(34.001, -5.0));
    network.add_edge(1, 2, 111.0);

    let graph = build_graph(&network);
    assert_eq!(find_route(&graph, 1, 2), Some(vec![1, 2]));
    assert_eq!(find_route(&graph, 2, 1), None);
}

#[test]
fn dangling_roads_are_dropped() {
    let mut network = RoadNetwork::new(Directionality::Undirected);
    network.add_node(1, coord(34.0, -5.0));
    network.add_edge(1, 99, 10.0);
    network.add_edge(1, 1, 10.0);

    let graph = build_graph(&network);
    assert!(graph.neighbours(1).is_empty());
}

#[test]
fn bfs_prefers_fewer_edges_and_dijkstra_shorter_roads() {
    let graph = build_graph(&scenario_network());
    let limits = SearchLimits::default();

    assert_eq!(
        find_route_bfs(&graph, 1, 5, &limits),
        SearchOutcome::Found(vec![1, 5])
    );
    assert_eq!(
        find_route_dijkstra(&graph, 1, 5, &limits),
        SearchOutcome::Found(vec![1, 2, 3, 4, 5])
    );
}

#[test]
fn a_star_matches_dijkstra_weight_on_grid() {
    let graph = build_graph(&grid_network(12));
    let limits = SearchLimits::default();
    let goal = 12 * 12 - 1;

    let dijkstra = find_route_dijkstra(&graph, 0, goal, &limits)
        .into_path()
        .expect("grid is connected");
    let a_star = find_route_a_star(&graph, 0, goal, &limits)
        .into_path()
        .expect("grid is connected");

    let dijkstra_weight = path_weight(&graph, &dijkstra);
    let a_star_weight = path_weight(&graph, &a_star);
    assert!((dijkstra_weight - a_star_weight).abs() < 1e-6);
    // Manhattan moves only: 11 steps in each direction.
    assert_eq!(dijkstra.len(), 23);
}

#[test]
fn disconnected_components_have_no_path() {
    let graph = build_graph(&scenario_network());
    let limits = SearchLimits::default();
    assert_eq!(find_route_bfs(&graph, 1, 10, &limits), SearchOutcome::NoPath);
    assert_eq!(
        find_route_dijkstra(&graph, 1, 10, &limits),
        SearchOutcome::NoPath
    );
    assert_eq!(
        find_route_a_star(&graph, 1, 20, &limits),
        SearchOutcome::NoPath
    );
}

#[test]
fn hop_limit_bounds_breadth_first_search() {
    let graph = build_graph(&grid_network(6));
    let limits = SearchLimits {
        max_hops: Some(4),
        deadline: None,
    };
    // Opposite corners are 10 edges apart.
    assert_eq!(find_route_bfs(&graph, 0, 35, &limits), SearchOutcome::NoPath);
    assert!(matches!(
        find_route_bfs(&graph, 0, 2, &limits),
        SearchOutcome::Found(_)
    ));
}

#[test]
fn expired_deadline_times_out() {
    let graph = build_graph(&grid_network(4));
    let limits = SearchLimits {
        max_hops: None,
        deadline: Some(Instant::now()),
    };
    assert_eq!(
        find_route_dijkstra(&graph, 0, 15, &limits),
        SearchOutcome::TimedOut
    );
}
