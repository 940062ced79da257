//! KD-tree spatial index over road intersections.
//!
//! Intersections are indexed by their earth-centred Cartesian position, so the
//! tree's Euclidean (chord) ordering is the same as great-circle ordering.
//! Reported distances are always haversine metres.

use std::cmp::Ordering;

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::info;

use crate::geo::{haversine_m, Coordinate, EARTH_RADIUS_M};
use crate::network::{NodeId, RoadNetwork};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Extra neighbours fetched so equidistant nodes can be tie-broken by id.
const TIE_BREAK_FETCH: usize = 4;

/// Indexed intersection.
#[derive(Debug, Clone, Copy)]
pub struct IndexNode {
    pub node_id: NodeId,
    pub coordinate: Coordinate,
}

/// Spatial index used for snap-to-node lookups.
pub struct SpatialIndex {
    tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32>,
    nodes: Vec<IndexNode>,
}

impl SpatialIndex {
    /// Build an index over every intersection of a network.
    pub fn build(network: &RoadNetwork) -> Self {
        let mut nodes: Vec<IndexNode> = network
            .nodes
            .values()
            .map(|node| IndexNode {
                node_id: node.id,
                coordinate: node.coordinate,
            })
            .collect();
        nodes.sort_by_key(|node| node.node_id);

        let mut tree: KdTree<f64, usize, 3, BUCKET_SIZE, u32> = KdTree::new();
        for (index, node) in nodes.iter().enumerate() {
            tree.add(&node.coordinate.to_cartesian(), index);
        }

        info!(node_count = nodes.len(), "built spatial index");

        Self { tree, nodes }
    }

    /// Number of indexed intersections.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find the k nearest intersections.
    ///
    /// Returns (NodeId, metres) pairs sorted by distance, then id.
    pub fn nearest(&self, point: Coordinate, k: usize) -> Vec<(NodeId, f64)> {
        if k == 0 || self.nodes.is_empty() {
            return Vec::new();
        }

        let query_point = point.to_cartesian();
        let fetch = k.saturating_add(TIE_BREAK_FETCH);
        let mut results: Vec<(NodeId, f64)> = self
            .tree
            .nearest_n::<SquaredEuclidean>(&query_point, fetch)
            .into_iter()
            .map(|neighbour| {
                let node = &self.nodes[neighbour.item];
                (node.node_id, haversine_m(point, node.coordinate))
            })
            .collect();

        results.sort_by(compare_neighbours);
        results.truncate(k);
        results
    }

    /// Nearest intersection no further than `radius_m` metres away.
    pub fn nearest_within(&self, point: Coordinate, radius_m: f64) -> Option<(NodeId, f64)> {
        self.nearest(point, 1)
            .into_iter()
            .next()
            .filter(|(_, distance)| *distance <= radius_m)
    }

    /// All intersections within `radius_m` metres, sorted by distance.
    pub fn within_radius(&self, point: Coordinate, radius_m: f64) -> Vec<(NodeId, f64)> {
        if radius_m <= 0.0 || self.nodes.is_empty() {
            return Vec::new();
        }

        let query_point = point.to_cartesian();
        let chord = chord_for_arc(radius_m);
        let mut results: Vec<(NodeId, f64)> = self
            .tree
            .within::<SquaredEuclidean>(&query_point, chord * chord)
            .into_iter()
            .map(|neighbour| {
                let node = &self.nodes[neighbour.item];
                (node.node_id, haversine_m(point, node.coordinate))
            })
            .filter(|(_, distance)| *distance <= radius_m)
            .collect();

        results.sort_by(compare_neighbours);
        results
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("node_count", &self.nodes.len())
            .finish()
    }
}

/// Chord length subtending a great-circle arc of `arc_m` metres.
fn chord_for_arc(arc_m: f64) -> f64 {
    let angle = (arc_m / EARTH_RADIUS_M).min(std::f64::consts::PI);
    2.0 * EARTH_RADIUS_M * (angle / 2.0).sin()
}

fn compare_neighbours(a: &(NodeId, f64), b: &(NodeId, f64)) -> Ordering {
    a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Directionality;

    fn line_network() -> RoadNetwork {
        let mut network = RoadNetwork::new(Directionality::Undirected);
        network.add_node(1, Coordinate { lat: 34.0, lon: -5.0 });
        network.add_node(2, Coordinate { lat: 34.0, lon: -4.999 });
        network.add_node(3, Coordinate { lat: 34.0, lon: -4.99 });
        network
    }

    #[test]
    fn test_build_empty_network() {
        let index = SpatialIndex::build(&RoadNetwork::default());
        assert!(index.is_empty());
        assert!(index
            .nearest_within(Coordinate { lat: 0.0, lon: 0.0 }, 1_000.0)
            .is_none());
    }

    #[test]
    fn test_nearest_basic() {
        let index = SpatialIndex::build(&line_network());
        let results = index.nearest(Coordinate { lat: 34.0, lon: -5.0 }, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 2);
        assert_eq!(results[0].1, 0.0);
    }

    #[test]
    fn test_snap_radius() {
        let index = SpatialIndex::build(&line_network());
        let probe = Coordinate {
            lat: 34.0,
            lon: -4.995,
        };
        // Node 2 is ~370 m away, node 3 ~460 m.
        assert_eq!(index.nearest_within(probe, 400.0).map(|(id, _)| id), Some(2));
        assert!(index.nearest_within(probe, 100.0).is_none());
    }

    #[test]
    fn test_radius_filtering() {
        let index = SpatialIndex::build(&line_network());
        let results = index.within_radius(Coordinate { lat: 34.0, lon: -5.0 }, 200.0);
        let ids: Vec<_> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_equidistant_nodes_prefer_lower_id() {
        let mut network = RoadNetwork::new(Directionality::Undirected);
        network.add_node(20, Coordinate { lat: 0.0, lon: 0.001 });
        network.add_node(10, Coordinate { lat: 0.0, lon: -0.001 });
        let index = SpatialIndex::build(&network);
        let nearest = index.nearest(Coordinate { lat: 0.0, lon: 0.0 }, 1);
        assert_eq!(nearest[0].0, 10);
    }
}
