use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::geo::Coordinate;
use crate::network::{Directionality, NodeId, RoadNetwork};

/// Outgoing edge within the routing graph.
#[derive(Debug, Clone)]
pub struct Edge {
    pub target: NodeId,
    /// Road length in metres.
    pub distance: f64,
    /// Shape points in traversal order, excluding both endpoints.
    pub geometry: Vec<Coordinate>,
}

/// Adjacency graph used by the path-finding functions in [`crate::path`].
#[derive(Debug, Clone)]
pub struct Graph {
    directionality: Directionality,
    adjacency: Arc<HashMap<NodeId, Vec<Edge>>>,
    coordinates: Arc<HashMap<NodeId, Coordinate>>,
}

impl Graph {
    /// Directionality inherited from the source network.
    pub fn directionality(&self) -> Directionality {
        self.directionality
    }

    /// Return the outgoing edges for a node.
    pub fn neighbours(&self, node: NodeId) -> &[Edge] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Coordinate of a node, if known.
    pub fn coordinate(&self, node: NodeId) -> Option<Coordinate> {
        self.coordinates.get(&node).copied()
    }

    /// Shortest direct edge from `from` to `to`, when several parallel roads exist.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.neighbours(from)
            .iter()
            .filter(|edge| edge.target == to)
            .min_by(|a, b| compare_distance(a.distance, b.distance))
    }

    pub fn node_count(&self) -> usize {
        self.coordinates.len()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            directionality: Directionality::Undirected,
            adjacency: Arc::new(HashMap::new()),
            coordinates: Arc::new(HashMap::new()),
        }
    }
}

/// Build the routing graph for a road network.
///
/// Undirected networks get a reverse edge (with reversed geometry) for every
/// road. Roads that reference unknown intersections and self-loops are
/// dropped. Each adjacency list is sorted by length, then target, so searches
/// expand neighbours in a deterministic order.
pub fn build_graph(network: &RoadNetwork) -> Graph {
    let mut adjacency: HashMap<NodeId, Vec<Edge>> = HashMap::new();
    let mut skipped_edges = 0usize;

    for road in &network.edges {
        if road.from == road.to
            || !network.nodes.contains_key(&road.from)
            || !network.nodes.contains_key(&road.to)
        {
            skipped_edges += 1;
            continue;
        }

        adjacency.entry(road.from).or_default().push(Edge {
            target: road.to,
            distance: road.length_m,
            geometry: road.geometry.clone(),
        });

        if network.directionality == Directionality::Undirected {
            adjacency.entry(road.to).or_default().push(Edge {
                target: road.from,
                distance: road.length_m,
                geometry: road.geometry.iter().rev().copied().collect(),
            });
        }
    }

    for &node_id in network.nodes.keys() {
        adjacency.entry(node_id).or_default();
    }

    for edges in adjacency.values_mut() {
        edges.sort_by(|a, b| {
            compare_distance(a.distance, b.distance).then_with(|| a.target.cmp(&b.target))
        });
    }

    if skipped_edges > 0 {
        warn!(
            skipped_edges,
            "ignored road segments referencing unknown intersections or looping on themselves",
        );
    }

    let coordinates = network
        .nodes
        .values()
        .map(|node| (node.id, node.coordinate))
        .collect();

    Graph {
        directionality: network.directionality,
        adjacency: Arc::new(adjacency),
        coordinates: Arc::new(coordinates),
    }
}

fn compare_distance(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Greater)
}
