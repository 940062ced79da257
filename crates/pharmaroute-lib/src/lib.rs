//! PharmaRoute library entry points.
//!
//! This crate exposes helpers to locate and import the map dataset, rank
//! nearby points of interest, resolve routes through an ordered chain of
//! graph strategies with a straight-line fallback, and turn the accepted
//! result into turn-by-turn directions. Higher-level consumers (the CLI)
//! should only depend on the functions exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod adapter;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod geo;
pub mod graph;
pub mod network;
pub mod output;
pub mod path;
pub mod provider;
pub mod routing;
pub mod selector;
pub mod spatial;
pub mod store;

pub use adapter::GraphQueryAdapter;
pub use assembler::{format_distance, Maneuver, Route, RouteAssembler, RouteStep};
pub use cache::{
    CacheKey, CacheStats, EvictionPolicy, LeastRecentlyUsed, ResultCache, TimeToLive, Unbounded,
};
pub use config::RoutingConfig;
pub use dataset::{default_dataset_path, ensure_dataset, resolve_dataset_path};
pub use db::{load_network, open_dataset, save_dataset, DatasetExport, ImportSummary};
pub use error::{Error, Result};
pub use geo::{estimate_distance, Coordinate};
pub use graph::{build_graph, Graph};
pub use network::{
    BoundingRegion, Directionality, NetworkEdge, NetworkNode, NodeId, PointOfInterest, RoadNetwork,
};
pub use output::{
    list_candidates, list_routed_candidates, walking_minutes, CandidateListing, GeoJsonRenderer,
    MapContext, MapRenderer, RenderMode, RouteSummary,
};
pub use path::find_route;
pub use provider::{fetch_candidates, MapDataProvider, SqliteMapProvider, StaticMapProvider};
pub use routing::{
    Attempt, EuclideanStrategy, FailureReason, HeuristicStrategy, Resolution, RouteAlgorithm,
    RoutingChain, RoutingStrategy, StrategyResult, UnweightedStrategy, WeightedStrategy,
};
pub use selector::{
    find_by_name, rank_by_route, rank_candidates, CandidateSelector, RankedCandidate,
    RoutedCandidate, Selection,
};
pub use spatial::SpatialIndex;
pub use store::{
    GraphStore, InMemoryGraphStore, QueryOptions, StoreCapabilities, StoreError, StorePath,
};
