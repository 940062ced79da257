//! Graph store capability surface and the in-memory implementation.
//!
//! The routing core never runs a search itself: it asks a [`GraphStore`] to
//! snap coordinates and evaluate path queries. Weighted and heuristic queries
//! are optional capabilities; a store that lacks them answers
//! [`StoreError::Unavailable`] and the routing chain moves on.

use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::geo::Coordinate;
use crate::graph::{build_graph, Graph};
use crate::network::{NodeId, RoadNetwork};
use crate::path::{
    find_route_a_star, find_route_bfs, find_route_dijkstra, path_weight, SearchLimits,
    SearchOutcome,
};
use crate::spatial::SpatialIndex;

/// Default ceiling on unweighted path length, in edges.
pub const DEFAULT_MAX_UNWEIGHTED_HOPS: usize = 100;

/// Errors a graph store may report for a single query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The path-finding extension backing this query is not installed.
    #[error("path-finding capability unavailable")]
    Unavailable,
    /// The query did not finish within the caller's timeout.
    #[error("graph store query timed out")]
    Timeout,
    /// Any other backend failure.
    #[error("graph store failure: {0}")]
    Backend(String),
}

/// Optional path-finding extensions a store advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreCapabilities {
    /// Shortest path by edge length.
    pub weighted: bool,
    /// Best-first search with a straight-line heuristic.
    pub heuristic: bool,
}

impl StoreCapabilities {
    /// Every extension available.
    pub const ALL: StoreCapabilities = StoreCapabilities {
        weighted: true,
        heuristic: true,
    };

    /// Only the unweighted primitive is available.
    pub const UNWEIGHTED_ONLY: StoreCapabilities = StoreCapabilities {
        weighted: false,
        heuristic: false,
    };
}

impl Default for StoreCapabilities {
    fn default() -> Self {
        Self::ALL
    }
}

/// Per-query options passed down from the query adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    pub timeout: Option<Duration>,
}

/// Path returned by a store query.
#[derive(Debug, Clone, PartialEq)]
pub struct StorePath {
    /// Intersections visited, first and last being the snapped endpoints.
    pub nodes: Vec<NodeId>,
    /// Shape of the path including road geometry.
    pub coordinates: Vec<Coordinate>,
    /// Sum of edge weights (road lengths) in metres.
    pub weight_m: f64,
}

/// Capability surface the routing core depends on.
pub trait GraphStore: Send + Sync {
    /// Extensions this store can evaluate.
    fn capabilities(&self) -> StoreCapabilities;

    /// Nearest intersection within `radius_m` metres of `coordinate`.
    fn nearest_node(
        &self,
        coordinate: Coordinate,
        radius_m: f64,
    ) -> Result<Option<NodeId>, StoreError>;

    /// Coordinate of an intersection, if it exists.
    fn node_coordinate(&self, node: NodeId) -> Result<Option<Coordinate>, StoreError>;

    /// Shortest path by edge length.
    fn shortest_path_by_weight(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError>;

    /// Shortest path by edge length using heuristic best-first search.
    fn shortest_path_heuristic(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError>;

    /// Path with the fewest edges, ignoring lengths.
    fn shortest_path_unweighted(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError>;
}

/// Graph store holding a road network snapshot in memory.
///
/// Snapping uses a KD-tree; path queries run the searches in [`crate::path`].
#[derive(Debug)]
pub struct InMemoryGraphStore {
    graph: Graph,
    index: SpatialIndex,
    capabilities: StoreCapabilities,
    max_unweighted_hops: Option<usize>,
}

impl InMemoryGraphStore {
    /// Build a store with every capability enabled.
    pub fn new(network: &RoadNetwork) -> Self {
        Self {
            graph: build_graph(network),
            index: SpatialIndex::build(network),
            capabilities: StoreCapabilities::ALL,
            max_unweighted_hops: Some(DEFAULT_MAX_UNWEIGHTED_HOPS),
        }
    }

    /// Restrict the advertised path-finding extensions.
    pub fn with_capabilities(mut self, capabilities: StoreCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Override the unweighted hop ceiling (`None` removes it).
    pub fn with_max_unweighted_hops(mut self, max_hops: Option<usize>) -> Self {
        self.max_unweighted_hops = max_hops;
        self
    }

    /// Underlying routing graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn limits(&self, options: &QueryOptions, max_hops: Option<usize>) -> SearchLimits {
        SearchLimits {
            max_hops,
            deadline: options.timeout.map(|timeout| Instant::now() + timeout),
        }
    }

    fn finish(&self, outcome: SearchOutcome) -> Result<Option<StorePath>, StoreError> {
        match outcome {
            SearchOutcome::Found(nodes) => Ok(Some(self.expand(nodes))),
            SearchOutcome::NoPath => Ok(None),
            SearchOutcome::TimedOut => Err(StoreError::Timeout),
        }
    }

    /// Expand a node path into coordinates, inserting road geometry.
    fn expand(&self, nodes: Vec<NodeId>) -> StorePath {
        let mut coordinates = Vec::with_capacity(nodes.len());
        if let Some(first) = nodes.first().and_then(|id| self.graph.coordinate(*id)) {
            coordinates.push(first);
        }
        for pair in nodes.windows(2) {
            if let Some(edge) = self.graph.edge_between(pair[0], pair[1]) {
                coordinates.extend(edge.geometry.iter().copied());
            }
            if let Some(next) = self.graph.coordinate(pair[1]) {
                coordinates.push(next);
            }
        }

        let weight_m = path_weight(&self.graph, &nodes);
        StorePath {
            nodes,
            coordinates,
            weight_m,
        }
    }
}

impl GraphStore for InMemoryGraphStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    fn nearest_node(
        &self,
        coordinate: Coordinate,
        radius_m: f64,
    ) -> Result<Option<NodeId>, StoreError> {
        Ok(self
            .index
            .nearest_within(coordinate, radius_m)
            .map(|(id, _)| id))
    }

    fn node_coordinate(&self, node: NodeId) -> Result<Option<Coordinate>, StoreError> {
        Ok(self.graph.coordinate(node))
    }

    fn shortest_path_by_weight(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError> {
        if !self.capabilities.weighted {
            return Err(StoreError::Unavailable);
        }
        debug!(from, to, "running weighted shortest path");
        let limits = self.limits(options, None);
        self.finish(find_route_dijkstra(&self.graph, from, to, &limits))
    }

    fn shortest_path_heuristic(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError> {
        if !self.capabilities.heuristic {
            return Err(StoreError::Unavailable);
        }
        debug!(from, to, "running heuristic search");
        let limits = self.limits(options, None);
        self.finish(find_route_a_star(&self.graph, from, to, &limits))
    }

    fn shortest_path_unweighted(
        &self,
        from: NodeId,
        to: NodeId,
        options: &QueryOptions,
    ) -> Result<Option<StorePath>, StoreError> {
        debug!(from, to, "running unweighted shortest path");
        let limits = self.limits(options, self.max_unweighted_hops);
        self.finish(find_route_bfs(&self.graph, from, to, &limits))
    }
}
