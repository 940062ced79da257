//! Common test utilities and fixture networks.
//!
//! The scenario network is a small street grid between (34.0, -5.0) and
//! (34.02, -5.03) with a long bypass road and a disconnected island, enough to
//! exercise every strategy of the routing chain.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use pharmaroute_lib::{
    estimate_distance, Coordinate, Directionality, GraphStore, InMemoryGraphStore, NodeId,
    PointOfInterest, QueryOptions, RoadNetwork, StoreCapabilities, StoreError, StorePath,
};

pub const USER: Coordinate = Coordinate {
    lat: 34.0,
    lon: -5.0,
};

pub const PHARMACY: Coordinate = Coordinate {
    lat: 34.02,
    lon: -5.03,
};

/// Intersection with no roads attached.
pub const ISOLATED: Coordinate = Coordinate {
    lat: 34.003,
    lon: -5.004,
};

pub const ISLAND: Coordinate = Coordinate {
    lat: 34.05,
    lon: -5.05,
};

pub fn coord(lat: f64, lon: f64) -> Coordinate {
    Coordinate { lat, lon }
}

fn connect(network: &mut RoadNetwork, from: NodeId, to: NodeId) {
    let a = network.coordinate(from).expect("node exists");
    let b = network.coordinate(to).expect("node exists");
    let length = estimate_distance(a, b).expect("valid coordinates");
    network.add_edge(from, to, length);
}

/// Street chain 1-2-3-4-5, a 50 km bypass 1-5, an island 10-11 and a lone
/// intersection 20.
pub fn scenario_network() -> RoadNetwork {
    let mut network = RoadNetwork::new(Directionality::Undirected);
    network.add_node(1, USER);
    network.add_node(2, coord(34.01, -5.0));
    network.add_node(3, coord(34.01, -5.015));
    network.add_node(4, coord(34.02, -5.015));
    network.add_node(5, PHARMACY);
    network.add_node(10, ISLAND);
    network.add_node(11, coord(34.051, -5.05));
    network.add_node(20, ISOLATED);

    for (from, to) in [(1, 2), (2, 3), (3, 4), (4, 5), (10, 11)] {
        connect(&mut network, from, to);
    }
    network.add_edge(1, 5, 50_000.0);
    network
}

/// Square grid of `size` x `size` intersections spaced roughly 100 m apart.
pub fn grid_network(size: i64) -> RoadNetwork {
    let mut network = RoadNetwork::new(Directionality::Undirected);
    let id = |row: i64, col: i64| row * size + col;
    for row in 0..size {
        for col in 0..size {
            network.add_node(
                id(row, col),
                coord(34.0 + row as f64 * 0.0009, -5.0 + col as f64 * 0.0011),
            );
        }
    }
    for row in 0..size {
        for col in 0..size {
            if col + 1 < size {
                connect(&mut network, id(row, col), id(row, col + 1));
            }
            if row + 1 < size {
                connect(&mut network, id(row, col), id(row + 1, col));
            }
        }
    }
    network
}

pub fn pharmacy(id: &str, name: &str, coordinate: Coordinate) -> PointOfInterest {
    PointOfInterest {
        id: id.to_string(),
        coordinate,
        name: name.to_string(),
        category: "pharmacy".to_string(),
    }
}

/// Store wrapper counting every call that reaches the backing store.
pub struct CountingStore {
    inner: InMemoryGraphStore,
    snaps: AtomicUsize,
    queries: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryGraphStore) -> Self {
        Self {
            inner,
            snaps: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn snaps(&self) -> usize {
        self.snaps.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.snaps() + self.queries()
    }
}

impl GraphStore for CountingStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.inner.capabilities()
    }

    fn nearest_node(
        &self,
        coordinate: Coordinate,
        radius_m: f64,
    ) -> Result<Option<NodeId>, StoreError> {
        self.snaps.fetch_add(1, Ordering::SeqCst);
        self.inner.nearest_node(coordinate, radius_m)
    }

    fn node_coordinate(&self, node: NodeId) -> Result<Option<Coordinate>, StoreError> {
        self.inner.node_coordinate(node)
    }

    fn shortest_path_by_weight(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.shortest_path_by_weight(from, to, options)
    }

    fn shortest_path_heuristic(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.shortest_path_heuristic(from, to, options)
    }

    fn shortest_path_unweighted(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.shortest_path_unweighted(from, to, options)
    }
}
