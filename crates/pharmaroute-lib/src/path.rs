use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::Instant;

use crate::geo::haversine_m;
use crate::graph::Graph;
use crate::network::NodeId;

/// Limits applied during a single search.
#[derive(Debug, Default, Clone, Copy)]
pub struct SearchLimits {
    /// Maximum number of edges in the resulting path (breadth-first search only).
    pub max_hops: Option<usize>,
    /// Abort the search once this instant has passed.
    pub deadline: Option<Instant>,
}

impl SearchLimits {
    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Result of a single search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Node sequence from start to goal, both inclusive.
    Found(Vec<NodeId>),
    /// The goal is not reachable from the start.
    NoPath,
    /// The deadline passed before the search finished.
    TimedOut,
}

impl SearchOutcome {
    pub fn into_path(self) -> Option<Vec<NodeId>> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::NoPath | SearchOutcome::TimedOut => None,
        }
    }
}

/// Find a route with breadth-first search and no limits.
pub fn find_route(graph: &Graph, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
    find_route_bfs(graph, start, goal, &SearchLimits::default()).into_path()
}

/// Run breadth-first search: fewest edges, lengths ignored.
pub fn find_route_bfs(
    graph: &Graph,
    start: NodeId,
    goal: NodeId,
    limits: &SearchLimits,
) -> SearchOutcome {
    if start == goal {
        return SearchOutcome::Found(vec![start]);
    }

    let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut queue = VecDeque::new();

    parents.insert(start, None);
    queue.push_back((start, 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if limits.expired() {
            return SearchOutcome::TimedOut;
        }
        if limits.max_hops.is_some_and(|max| depth >= max) {
            continue;
        }

        for edge in graph.neighbours(current) {
            let next = edge.target;
            if parents.contains_key(&next) {
                continue;
            }

            parents.insert(next, Some(current));
            if next == goal {
                return SearchOutcome::Found(reconstruct_path(&parents, start, goal));
            }
            queue.push_back((next, depth + 1));
        }
    }

    SearchOutcome::NoPath
}

/// Run Dijkstra's algorithm using road length as the edge weight.
pub fn find_route_dijkstra(
    graph: &Graph,
    start: NodeId,
    goal: NodeId,
    limits: &SearchLimits,
) -> SearchOutcome {
    if start == goal {
        return SearchOutcome::Found(vec![start]);
    }

    let mut distances: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut queue = BinaryHeap::new();

    distances.insert(start, 0.0);
    parents.insert(start, None);
    queue.push(QueueEntry::new(start, 0.0));

    while let Some(entry) = queue.pop() {
        if limits.expired() {
            return SearchOutcome::TimedOut;
        }

        let current_distance = match distances.get(&entry.node) {
            Some(distance) if (*distance - entry.cost.0).abs() < f64::EPSILON => *distance,
            Some(distance) if *distance < entry.cost.0 => continue,
            Some(distance) => *distance,
            None => continue,
        };

        if entry.node == goal {
            return SearchOutcome::Found(reconstruct_path(&parents, start, goal));
        }

        for edge in graph.neighbours(entry.node) {
            let next = edge.target;
            let next_cost = current_distance + edge.distance;
            if next_cost < *distances.get(&next).unwrap_or(&f64::INFINITY) {
                distances.insert(next, next_cost);
                parents.insert(next, Some(entry.node));
                queue.push(QueueEntry::new(next, next_cost));
            }
        }
    }

    SearchOutcome::NoPath
}

/// Run A* search guided by the great-circle distance to the goal.
///
/// The heuristic is admissible as long as no road is shorter than the
/// straight-line distance between its endpoints.
pub fn find_route_a_star(
    graph: &Graph,
    start: NodeId,
    goal: NodeId,
    limits: &SearchLimits,
) -> SearchOutcome {
    if start == goal {
        return SearchOutcome::Found(vec![start]);
    }

    let mut g_score: HashMap<NodeId, f64> = HashMap::new();
    let mut parents: HashMap<NodeId, Option<NodeId>> = HashMap::new();
    let mut queue = BinaryHeap::new();

    g_score.insert(start, 0.0);
    parents.insert(start, None);
    let start_estimate = heuristic_distance(graph, start, goal);
    queue.push(AStarEntry::new(start, 0.0, start_estimate));

    while let Some(entry) = queue.pop() {
        if limits.expired() {
            return SearchOutcome::TimedOut;
        }

        let current_score = match g_score.get(&entry.node) {
            Some(score) if (*score - entry.cost.0).abs() < f64::EPSILON => *score,
            Some(score) if *score < entry.cost.0 => continue,
            Some(score) => *score,
            None => continue,
        };

        if entry.node == goal {
            return SearchOutcome::Found(reconstruct_path(&parents, start, goal));
        }

        for edge in graph.neighbours(entry.node) {
            let next = edge.target;
            let tentative_g = current_score + edge.distance;
            if tentative_g < *g_score.get(&next).unwrap_or(&f64::INFINITY) {
                g_score.insert(next, tentative_g);
                parents.insert(next, Some(entry.node));
                let heuristic = heuristic_distance(graph, next, goal);
                queue.push(AStarEntry::new(next, tentative_g, heuristic));
            }
        }
    }

    SearchOutcome::NoPath
}

/// Sum of edge lengths along a node path, using the shortest parallel edge.
pub fn path_weight(graph: &Graph, path: &[NodeId]) -> f64 {
    path.windows(2)
        .filter_map(|pair| graph.edge_between(pair[0], pair[1]))
        .map(|edge| edge.distance)
        .sum()
}

fn heuristic_distance(graph: &Graph, from: NodeId, to: NodeId) -> f64 {
    match (graph.coordinate(from), graph.coordinate(to)) {
        (Some(a), Some(b)) => haversine_m(a, b),
        _ => 0.0,
    }
}

fn reconstruct_path(
    parents: &HashMap<NodeId, Option<NodeId>>,
    start: NodeId,
    goal: NodeId,
) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents.get(&node).copied().flatten();
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: NodeId, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    node: NodeId,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl AStarEntry {
    fn new(node: NodeId, cost: f64, heuristic: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::graph::build_graph;
    use crate::network::{Directionality, RoadNetwork};

    /// Square 1-2-3-4 with a long direct road 1-3 and a short detour 1-2-3.
    fn square() -> Graph {
        let mut network = RoadNetwork::new(Directionality::Undirected);
        network.add_node(1, Coordinate { lat: 0.0, lon: 0.0 });
        network.add_node(2, Coordinate { lat: 0.0, lon: 0.001 });
        network.add_node(3, Coordinate { lat: 0.001, lon: 0.001 });
        network.add_node(4, Coordinate { lat: 0.001, lon: 0.0 });
        network.add_node(5, Coordinate { lat: 0.01, lon: 0.01 });
        network.add_edge(1, 2, 112.0);
        network.add_edge(2, 3, 112.0);
        network.add_edge(1, 3, 500.0);
        network.add_edge(3, 4, 112.0);
        build_graph(&network)
    }

    #[test]
    fn bfs_prefers_fewest_hops() {
        let graph = square();
        assert_eq!(find_route(&graph, 1, 3), Some(vec![1, 3]));
    }

    #[test]
    fn dijkstra_prefers_shortest_length() {
        let graph = square();
        let outcome = find_route_dijkstra(&graph, 1, 3, &SearchLimits::default());
        assert_eq!(outcome, SearchOutcome::Found(vec![1, 2, 3]));
    }

    #[test]
    fn a_star_matches_dijkstra() {
        let graph = square();
        let limits = SearchLimits::default();
        assert_eq!(
            find_route_a_star(&graph, 1, 4, &limits),
            find_route_dijkstra(&graph, 1, 4, &limits)
        );
    }

    #[test]
    fn disconnected_goal_reports_no_path() {
        let graph = square();
        let limits = SearchLimits::default();
        assert_eq!(find_route_bfs(&graph, 1, 5, &limits), SearchOutcome::NoPath);
        assert_eq!(find_route_dijkstra(&graph, 1, 5, &limits), SearchOutcome::NoPath);
        assert_eq!(find_route_a_star(&graph, 1, 5, &limits), SearchOutcome::NoPath);
    }

    #[test]
    fn bfs_respects_hop_ceiling() {
        let graph = square();
        let limits = SearchLimits {
            max_hops: Some(1),
            deadline: None,
        };
        assert_eq!(find_route_bfs(&graph, 1, 4, &limits), SearchOutcome::NoPath);
        assert!(matches!(
            find_route_bfs(&graph, 1, 3, &limits),
            SearchOutcome::Found(_)
        ));
    }

    #[test]
    fn expired_deadline_times_out() {
        let graph = square();
        let limits = SearchLimits {
            max_hops: None,
            deadline: Some(Instant::now()),
        };
        assert_eq!(
            find_route_dijkstra(&graph, 1, 4, &limits),
            SearchOutcome::TimedOut
        );
    }

    #[test]
    fn start_equals_goal() {
        let graph = square();
        assert_eq!(find_route(&graph, 2, 2), Some(vec![2]));
    }

    #[test]
    fn path_weight_sums_edges() {
        let graph = square();
        assert_eq!(path_weight(&graph, &[1, 2, 3]), 224.0);
    }
}
