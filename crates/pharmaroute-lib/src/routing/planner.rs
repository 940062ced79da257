//! Routing strategies implementing the Strategy pattern.
//!
//! Graph strategies delegate to the [`GraphQueryAdapter`]; the Euclidean
//! strategy needs no store and terminates every chain.

use crate::adapter::GraphQueryAdapter;
use crate::geo::{haversine_m, Coordinate};
use crate::store::{GraphStore, StoreCapabilities};

use super::{RouteAlgorithm, StrategyResult};

/// Trait for route resolution strategies.
///
/// Implementations must be deterministic for a given store snapshot, since
/// their outcomes are memoised by the result cache.
pub trait RoutingStrategy: Send + Sync {
    /// The algorithm identifier for this strategy, also used as cache key part.
    fn algorithm(&self) -> RouteAlgorithm;

    /// Whether the store advertises what this strategy needs.
    fn is_supported(&self, capabilities: StoreCapabilities) -> bool {
        let _ = capabilities;
        true
    }

    /// Attempt to resolve a path. Failures are data, never errors.
    fn resolve(
        &self,
        store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
    ) -> StrategyResult;
}

/// Shortest path by road length.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedStrategy {
    adapter: GraphQueryAdapter,
}

impl WeightedStrategy {
    pub fn new(adapter: GraphQueryAdapter) -> Self {
        Self { adapter }
    }
}

impl RoutingStrategy for WeightedStrategy {
    fn algorithm(&self) -> RouteAlgorithm {
        RouteAlgorithm::WeightedShortestPath
    }

    fn is_supported(&self, capabilities: StoreCapabilities) -> bool {
        capabilities.weighted
    }

    fn resolve(
        &self,
        store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
    ) -> StrategyResult {
        self.adapter
            .query(store, source, destination, self.algorithm())
    }
}

/// Best-first search guided by the great-circle distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicStrategy {
    adapter: GraphQueryAdapter,
}

impl HeuristicStrategy {
    pub fn new(adapter: GraphQueryAdapter) -> Self {
        Self { adapter }
    }
}

impl RoutingStrategy for HeuristicStrategy {
    fn algorithm(&self) -> RouteAlgorithm {
        RouteAlgorithm::HeuristicSearch
    }

    fn is_supported(&self, capabilities: StoreCapabilities) -> bool {
        capabilities.heuristic
    }

    fn resolve(
        &self,
        store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
    ) -> StrategyResult {
        self.adapter
            .query(store, source, destination, self.algorithm())
    }
}

/// Fewest road segments. Structurally correct but not shortest by distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnweightedStrategy {
    adapter: GraphQueryAdapter,
}

impl UnweightedStrategy {
    pub fn new(adapter: GraphQueryAdapter) -> Self {
        Self { adapter }
    }
}

impl RoutingStrategy for UnweightedStrategy {
    fn algorithm(&self) -> RouteAlgorithm {
        RouteAlgorithm::UnweightedShortestPath
    }

    fn resolve(
        &self,
        store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
    ) -> StrategyResult {
        self.adapter
            .query(store, source, destination, self.algorithm())
    }
}

/// Straight line between the endpoints. Never fails, never navigable.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanStrategy;

impl RoutingStrategy for EuclideanStrategy {
    fn algorithm(&self) -> RouteAlgorithm {
        RouteAlgorithm::Euclidean
    }

    fn resolve(
        &self,
        _store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
    ) -> StrategyResult {
        let mut path = vec![source, destination];
        path.dedup();
        StrategyResult::Success {
            path,
            distance_m: haversine_m(source, destination),
            algorithm: RouteAlgorithm::Euclidean,
            hops: 0,
        }
    }
}
