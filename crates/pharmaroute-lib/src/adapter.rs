//! Translates coordinate pairs into graph store path queries.

use std::time::Duration;

use tracing::debug;

use crate::geo::{polyline_length, Coordinate};
use crate::routing::{FailureReason, RouteAlgorithm, StrategyResult};
use crate::store::{GraphStore, QueryOptions, StoreError, StorePath};

/// Default snap radius in metres.
pub const DEFAULT_SNAP_RADIUS_M: f64 = 1_000.0;

/// Snaps endpoints to the network and dispatches one graph-native query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphQueryAdapter {
    snap_radius_m: f64,
    timeout: Option<Duration>,
}

impl Default for GraphQueryAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_SNAP_RADIUS_M)
    }
}

impl GraphQueryAdapter {
    pub fn new(snap_radius_m: f64) -> Self {
        Self {
            snap_radius_m,
            timeout: None,
        }
    }

    /// Impose a per-query timeout on every path query.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn snap_radius_m(&self) -> f64 {
        self.snap_radius_m
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Run a single graph query for `algorithm`.
    ///
    /// Never fails: every problem is reported as a [`StrategyResult::Failure`].
    /// [`RouteAlgorithm::Euclidean`] is not a graph query and is reported as
    /// unavailable.
    pub fn query(
        &self,
        store: &dyn GraphStore,
        source: Coordinate,
        destination: Coordinate,
        algorithm: RouteAlgorithm,
    ) -> StrategyResult {
        let capabilities = store.capabilities();
        let supported = match algorithm {
            RouteAlgorithm::WeightedShortestPath => capabilities.weighted,
            RouteAlgorithm::HeuristicSearch => capabilities.heuristic,
            RouteAlgorithm::UnweightedShortestPath => true,
            RouteAlgorithm::Euclidean => false,
        };
        if !supported {
            debug!(%algorithm, "store does not advertise capability");
            return StrategyResult::failure(FailureReason::CapabilityUnavailable);
        }

        let (from, to) = match (self.snap(store, source), self.snap(store, destination)) {
            (Ok(Some(from)), Ok(Some(to))) => (from, to),
            (Err(error), _) | (_, Err(error)) => return StrategyResult::failure(error.into()),
            _ => {
                debug!(%algorithm, radius_m = self.snap_radius_m, "no intersection within snap radius");
                return StrategyResult::failure(FailureReason::NoNearbyNode);
            }
        };

        let options = QueryOptions {
            timeout: self.timeout,
        };
        let outcome = match algorithm {
            RouteAlgorithm::WeightedShortestPath => {
                store.shortest_path_by_weight(from, to, &options)
            }
            RouteAlgorithm::HeuristicSearch => store.shortest_path_heuristic(from, to, &options),
            RouteAlgorithm::UnweightedShortestPath => {
                store.shortest_path_unweighted(from, to, &options)
            }
            RouteAlgorithm::Euclidean => Err(StoreError::Unavailable),
        };

        match outcome {
            Ok(Some(path)) => success_from_path(source, destination, path, algorithm),
            Ok(None) => {
                debug!(%algorithm, from, to, "snapped intersections are disconnected");
                StrategyResult::failure(FailureReason::NoPathExists)
            }
            Err(error) => {
                debug!(%algorithm, %error, "graph store query failed");
                StrategyResult::failure(error.into())
            }
        }
    }

    fn snap(
        &self,
        store: &dyn GraphStore,
        coordinate: Coordinate,
    ) -> Result<Option<crate::network::NodeId>, StoreError> {
        store.nearest_node(coordinate, self.snap_radius_m)
    }
}

impl From<StoreError> for FailureReason {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable => FailureReason::CapabilityUnavailable,
            StoreError::Timeout => FailureReason::Timeout,
            StoreError::Backend(_) => FailureReason::StoreError,
        }
    }
}

/// Build the success result: source, store path, destination.
fn success_from_path(
    source: Coordinate,
    destination: Coordinate,
    path: StorePath,
    algorithm: RouteAlgorithm,
) -> StrategyResult {
    let hops = path.nodes.len().saturating_sub(1);
    let mut waypoints = Vec::with_capacity(path.coordinates.len() + 2);
    waypoints.push(source);
    waypoints.extend(path.coordinates);
    waypoints.push(destination);
    waypoints.dedup();

    let distance_m = polyline_length(&waypoints);
    StrategyResult::Success {
        path: waypoints,
        distance_m,
        algorithm,
        hops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Directionality, RoadNetwork};
    use crate::store::{InMemoryGraphStore, StoreCapabilities};

    fn two_islands() -> RoadNetwork {
        let mut network = RoadNetwork::new(Directionality::Undirected);
        network.add_node(1, Coordinate { lat: 34.0, lon: -5.0 });
        network.add_node(2, Coordinate { lat: 34.001, lon: -5.0 });
        network.add_node(3, Coordinate { lat: 34.01, lon: -5.0 });
        network.add_edge(1, 2, 111.0);
        network
    }

    #[test]
    fn success_path_starts_and_ends_at_query() {
        let store = InMemoryGraphStore::new(&two_islands());
        let source = Coordinate {
            lat: 33.9999,
            lon: -5.0,
        };
        let destination = Coordinate {
            lat: 34.0011,
            lon: -5.0,
        };
        let result = GraphQueryAdapter::default().query(
            &store,
            source,
            destination,
            RouteAlgorithm::WeightedShortestPath,
        );
        match result {
            StrategyResult::Success {
                path, distance_m, ..
            } => {
                assert_eq!(path.first(), Some(&source));
                assert_eq!(path.last(), Some(&destination));
                assert_eq!(path.len(), 4);
                assert!((distance_m - polyline_length(&path)).abs() < 1e-9);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn coincident_endpoints_are_deduplicated() {
        let store = InMemoryGraphStore::new(&two_islands());
        let source = Coordinate { lat: 34.0, lon: -5.0 };
        let destination = Coordinate {
            lat: 34.001,
            lon: -5.0,
        };
        let result = GraphQueryAdapter::default().query(
            &store,
            source,
            destination,
            RouteAlgorithm::UnweightedShortestPath,
        );
        assert_eq!(result.path().map(<[Coordinate]>::len), Some(2));
    }

    #[test]
    fn disconnected_nodes_report_no_path() {
        let store = InMemoryGraphStore::new(&two_islands());
        let result = GraphQueryAdapter::default().query(
            &store,
            Coordinate { lat: 34.0, lon: -5.0 },
            Coordinate { lat: 34.01, lon: -5.0 },
            RouteAlgorithm::HeuristicSearch,
        );
        assert_eq!(result.failure_reason(), Some(FailureReason::NoPathExists));
    }

    #[test]
    fn far_coordinates_report_no_nearby_node() {
        let store = InMemoryGraphStore::new(&two_islands());
        let result = GraphQueryAdapter::new(50.0).query(
            &store,
            Coordinate { lat: 34.0, lon: -5.0 },
            Coordinate { lat: 35.0, lon: -5.0 },
            RouteAlgorithm::UnweightedShortestPath,
        );
        assert_eq!(result.failure_reason(), Some(FailureReason::NoNearbyNode));
    }

    #[test]
    fn missing_capability_and_euclidean_are_unavailable() {
        let store = InMemoryGraphStore::new(&two_islands())
            .with_capabilities(StoreCapabilities::UNWEIGHTED_ONLY);
        let adapter = GraphQueryAdapter::default();
        let a = Coordinate { lat: 34.0, lon: -5.0 };
        let b = Coordinate {
            lat: 34.001,
            lon: -5.0,
        };
        for algorithm in [
            RouteAlgorithm::WeightedShortestPath,
            RouteAlgorithm::HeuristicSearch,
            RouteAlgorithm::Euclidean,
        ] {
            assert_eq!(
                adapter.query(&store, a, b, algorithm).failure_reason(),
                Some(FailureReason::CapabilityUnavailable)
            );
        }
    }

    #[test]
    fn store_errors_map_to_failure_reasons() {
        assert_eq!(
            FailureReason::from(StoreError::Timeout),
            FailureReason::Timeout
        );
        assert_eq!(
            FailureReason::from(StoreError::Backend("down".into())),
            FailureReason::StoreError
        );
    }
}
