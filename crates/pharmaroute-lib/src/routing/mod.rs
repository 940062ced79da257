//! Multi-strategy route resolution.
//!
//! This module provides:
//! - [`RouteAlgorithm`] - Strategies the chain can attempt, in priority order
//! - [`StrategyResult`] - Tagged success/failure outcome of a single strategy
//! - [`RoutingChain`] - Ordered strategy chain with cache check and fallback
//! - [`Resolution`] - Accepted result plus the record of every attempt
//!
//! # Strategy Pattern
//!
//! Each algorithm is encapsulated in a type implementing [`RoutingStrategy`].
//! The chain walks its strategies in order, short-circuits on the first
//! success and always ends with the straight-line [`EuclideanStrategy`], so
//! every query with valid coordinates resolves to a success. New strategies are
//! appended with [`RoutingChain::with_strategy`].
//!
//! # Example
//!
//! ```ignore
//! use pharmaroute_lib::{Coordinate, GraphQueryAdapter, InMemoryGraphStore, RoutingChain};
//!
//! let store = InMemoryGraphStore::new(&network);
//! let chain = RoutingChain::standard(GraphQueryAdapter::default());
//! let resolution = chain.resolve(&store, source, destination)?;
//! println!("resolved with {}", resolution.algorithm());
//! ```

mod planner;

pub use planner::{
    EuclideanStrategy, HeuristicStrategy, RoutingStrategy, UnweightedStrategy, WeightedStrategy,
};

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::GraphQueryAdapter;
use crate::cache::ResultCache;
use crate::error::Result;
use crate::geo::Coordinate;
use crate::store::GraphStore;

/// Attempts made by the standard chain: three graph strategies plus the fallback.
pub const MAX_ATTEMPTS: usize = 4;

/// Routing strategies, listed in chain priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAlgorithm {
    /// Shortest path by road length.
    WeightedShortestPath,
    /// A* search guided by the great-circle distance.
    HeuristicSearch,
    /// Fewest road segments, lengths ignored.
    UnweightedShortestPath,
    /// Straight line between the endpoints.
    Euclidean,
}

impl RouteAlgorithm {
    /// Every algorithm in chain order.
    pub const ALL: [RouteAlgorithm; 4] = [
        RouteAlgorithm::WeightedShortestPath,
        RouteAlgorithm::HeuristicSearch,
        RouteAlgorithm::UnweightedShortestPath,
        RouteAlgorithm::Euclidean,
    ];

    /// Whether a result from this algorithm follows actual roads.
    pub fn is_navigable(self) -> bool {
        self != RouteAlgorithm::Euclidean
    }

    /// Whether a result from this algorithm is not a shortest path by distance.
    pub fn is_degraded(self) -> bool {
        matches!(
            self,
            RouteAlgorithm::UnweightedShortestPath | RouteAlgorithm::Euclidean
        )
    }
}

impl fmt::Display for RouteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RouteAlgorithm::WeightedShortestPath => "weighted-shortest-path",
            RouteAlgorithm::HeuristicSearch => "heuristic-search",
            RouteAlgorithm::UnweightedShortestPath => "unweighted-shortest-path",
            RouteAlgorithm::Euclidean => "euclidean",
        };
        f.write_str(value)
    }
}

/// Why a strategy did not produce a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// An endpoint has no intersection within the snap radius.
    NoNearbyNode,
    /// The snapped intersections are disconnected.
    NoPathExists,
    /// The store lacks the path-finding extension this strategy needs.
    CapabilityUnavailable,
    /// The store did not answer within the per-query timeout.
    Timeout,
    /// The store reported another backend error.
    StoreError,
}

impl FailureReason {
    /// Transient failures may succeed on retry and are never cached.
    pub fn is_transient(self) -> bool {
        matches!(self, FailureReason::Timeout | FailureReason::StoreError)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            FailureReason::NoNearbyNode => "no nearby node",
            FailureReason::NoPathExists => "no path exists",
            FailureReason::CapabilityUnavailable => "capability unavailable",
            FailureReason::Timeout => "timeout",
            FailureReason::StoreError => "store error",
        };
        f.write_str(value)
    }
}

/// Outcome of a single strategy: a path or a reason, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyResult {
    Success {
        path: Vec<Coordinate>,
        distance_m: f64,
        algorithm: RouteAlgorithm,
        /// Road segments traversed; zero for straight-line estimates.
        #[serde(default)]
        hops: usize,
    },
    Failure {
        reason: FailureReason,
    },
}

impl StrategyResult {
    pub fn failure(reason: FailureReason) -> Self {
        StrategyResult::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StrategyResult::Success { .. })
    }

    /// Algorithm that produced a success.
    pub fn algorithm(&self) -> Option<RouteAlgorithm> {
        match self {
            StrategyResult::Success { algorithm, .. } => Some(*algorithm),
            StrategyResult::Failure { .. } => None,
        }
    }

    pub fn path(&self) -> Option<&[Coordinate]> {
        match self {
            StrategyResult::Success { path, .. } => Some(path),
            StrategyResult::Failure { .. } => None,
        }
    }

    pub fn distance_m(&self) -> Option<f64> {
        match self {
            StrategyResult::Success { distance_m, .. } => Some(*distance_m),
            StrategyResult::Failure { .. } => None,
        }
    }

    /// Road segments traversed by a success.
    pub fn hops(&self) -> Option<usize> {
        match self {
            StrategyResult::Success { hops, .. } => Some(*hops),
            StrategyResult::Failure { .. } => None,
        }
    }

    /// Whether a success starts at `source` and ends at `destination`.
    ///
    /// Cache keys are rounded, so a stored path may belong to a nearby query.
    /// Failures carry no endpoints and always match.
    pub fn answers(&self, source: Coordinate, destination: Coordinate) -> bool {
        match self {
            StrategyResult::Success { path, .. } => {
                path.first() == Some(&source) && path.last() == Some(&destination)
            }
            StrategyResult::Failure { .. } => true,
        }
    }

    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            StrategyResult::Success { .. } => None,
            StrategyResult::Failure { reason } => Some(*reason),
        }
    }

    /// Success from a road-following strategy.
    pub fn is_navigable(&self) -> bool {
        self.algorithm().is_some_and(RouteAlgorithm::is_navigable)
    }

    /// Whether the outcome is deterministic for its inputs and may be cached.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, StrategyResult::Failure { reason } if reason.is_transient())
    }
}

/// States a query passes through while the chain resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    Init,
    CacheCheck,
    TryWeighted,
    TryHeuristic,
    TryUnweighted,
    TryEuclideanFallback,
    Resolved,
}

impl ChainState {
    /// State in which `algorithm` is attempted.
    pub fn attempting(algorithm: RouteAlgorithm) -> Self {
        match algorithm {
            RouteAlgorithm::WeightedShortestPath => ChainState::TryWeighted,
            RouteAlgorithm::HeuristicSearch => ChainState::TryHeuristic,
            RouteAlgorithm::UnweightedShortestPath => ChainState::TryUnweighted,
            RouteAlgorithm::Euclidean => ChainState::TryEuclideanFallback,
        }
    }
}

/// How one strategy ended during a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attempt {
    pub algorithm: RouteAlgorithm,
    /// `None` when the strategy succeeded.
    pub failure: Option<FailureReason>,
    /// The outcome was read from the cache instead of computed.
    pub cached: bool,
}

/// Accepted result of a chain run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub result: StrategyResult,
    pub attempts: Vec<Attempt>,
    /// The accepted result was served from the cache.
    pub from_cache: bool,
}

impl Resolution {
    /// Algorithm of the accepted result.
    pub fn algorithm(&self) -> RouteAlgorithm {
        self.result
            .algorithm()
            .unwrap_or(RouteAlgorithm::Euclidean)
    }

    /// Number of strategies whose outcome was considered.
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}

/// Ordered strategy chain terminated by the straight-line fallback.
pub struct RoutingChain {
    strategies: Vec<Box<dyn RoutingStrategy>>,
    fallback: EuclideanStrategy,
    cache: Option<Arc<ResultCache>>,
}

impl Default for RoutingChain {
    fn default() -> Self {
        Self::new()
    }
}

impl RoutingChain {
    /// Chain with only the straight-line fallback.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            fallback: EuclideanStrategy,
            cache: None,
        }
    }

    /// Weighted, heuristic and unweighted graph strategies, then the fallback.
    pub fn standard(adapter: GraphQueryAdapter) -> Self {
        Self::new()
            .with_strategy(Box::new(WeightedStrategy::new(adapter)))
            .with_strategy(Box::new(HeuristicStrategy::new(adapter)))
            .with_strategy(Box::new(UnweightedStrategy::new(adapter)))
    }

    /// Append a strategy, attempted after the existing ones and before the fallback.
    pub fn with_strategy(mut self, strategy: Box<dyn RoutingStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Memoise strategy outcomes in a (possibly shared) cache.
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&Arc<ResultCache>> {
        self.cache.as_ref()
    }

    /// Algorithms in the order they are attempted.
    pub fn algorithms(&self) -> Vec<RouteAlgorithm> {
        self.ordered().map(|strategy| strategy.algorithm()).collect()
    }

    fn ordered(&self) -> impl Iterator<Item = &dyn RoutingStrategy> {
        self.strategies
            .iter()
            .map(|strategy| strategy.as_ref())
            .chain(std::iter::once(&self.fallback as &dyn RoutingStrategy))
    }

    /// Resolve a route from `source` to `destination`.
    ///
    /// Fails only with [`crate::Error::InvalidCoordinate`]; every strategy
    /// failure is absorbed and moves the chain to the next strategy.
    pub fn resolve(
        &self,
        store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
    ) -> Result<Resolution> {
        source.validate()?;
        destination.validate()?;

        debug!(state = ?ChainState::Init, %source, %destination, "resolving route");
        let mut attempts = Vec::with_capacity(self.strategies.len() + 1);
        let mut last = StrategyResult::failure(FailureReason::NoPathExists);

        for strategy in self.ordered() {
            let algorithm = strategy.algorithm();

            if let Some(cached) = self.cached(source, destination, algorithm) {
                debug!(
                    state = ?ChainState::CacheCheck,
                    %algorithm,
                    success = cached.is_success(),
                    "cache hit"
                );
                attempts.push(Attempt {
                    algorithm,
                    failure: cached.failure_reason(),
                    cached: true,
                });
                if cached.is_success() {
                    return Ok(Resolution {
                        result: cached,
                        attempts,
                        from_cache: true,
                    });
                }
                last = cached;
                continue;
            }

            let result = if strategy.is_supported(store.capabilities()) {
                strategy.resolve(store, source, destination)
            } else {
                StrategyResult::failure(FailureReason::CapabilityUnavailable)
            };
            debug!(
                state = ?ChainState::attempting(algorithm),
                %algorithm,
                success = result.is_success(),
                "strategy finished"
            );
            let result = self.write_through(source, destination, algorithm, result);

            attempts.push(Attempt {
                algorithm,
                failure: result.failure_reason(),
                cached: false,
            });
            if result.is_success() {
                info!(
                    state = ?ChainState::Resolved,
                    %algorithm,
                    attempts = attempts.len(),
                    "route resolved"
                );
                return Ok(Resolution {
                    result,
                    attempts,
                    from_cache: false,
                });
            }
            last = result;
        }

        // Only reachable when the fallback itself failed.
        Ok(Resolution {
            result: last,
            attempts,
            from_cache: false,
        })
    }

    fn cached(
        &self,
        source: Coordinate,
        destination: Coordinate,
        algorithm: RouteAlgorithm,
    ) -> Option<StrategyResult> {
        let cache = self.cache.as_ref()?;
        cache
            .get(&cache.key(source, destination, algorithm))
            .filter(|cached| {
                let matches = cached.answers(source, destination);
                if !matches {
                    debug!(%algorithm, "cached path belongs to a nearby query; recomputing");
                }
                matches
            })
    }

    fn write_through(
        &self,
        source: Coordinate,
        destination: Coordinate,
        algorithm: RouteAlgorithm,
        result: StrategyResult,
    ) -> StrategyResult {
        match &self.cache {
            Some(cache) if result.is_cacheable() => {
                let key = cache.key(source, destination, algorithm);
                let stored = cache.insert(key, result.clone());
                if stored.answers(source, destination) {
                    stored
                } else {
                    result
                }
            }
            _ => result,
        }
    }
}

impl fmt::Debug for RoutingChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingChain")
            .field("algorithms", &self.algorithms())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
