//! Nearest command handler listing pharmacies by straight-line or route distance.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use pharmaroute_cli::output::{render_nearest, OutputFormat};
use pharmaroute_lib::{
    fetch_candidates, list_candidates, list_routed_candidates, rank_by_route, rank_candidates,
    InMemoryGraphStore, MapDataProvider, RoutingConfig, SqliteMapProvider,
};

use super::{locate_dataset, search_region, LocationArgs};

/// Handle the nearest subcommand.
///
/// With `network` set, candidates are routed through the chain and ordered by
/// walking route, reporting road distance and road segment counts.
pub fn handle_nearest_command(
    target: Option<&Path>,
    format: OutputFormat,
    config: &RoutingConfig,
    location: &LocationArgs,
    limit: Option<usize>,
    network: bool,
) -> Result<()> {
    let user = location.resolve(config)?;
    let provider = SqliteMapProvider::new(locate_dataset(target)?);
    let region = search_region(user, config);
    let limit = limit.unwrap_or(config.max_results);

    let candidates = fetch_candidates(&provider, &region, &config.category)?;
    let ranked = rank_candidates(user, &candidates)?;

    let listing = if network {
        let roads = provider
            .fetch_network(&region)
            .context("failed to load the road network")?;
        info!(
            intersections = roads.node_count(),
            roads = roads.edge_count(),
            candidates = ranked.len(),
            "ranking candidates by route"
        );
        let store = InMemoryGraphStore::new(&roads);
        let routed = rank_by_route(&config.chain(), &store, user, &ranked, limit)?;
        list_routed_candidates(user, &routed, limit)
    } else {
        list_candidates(user, &ranked, limit)
    };

    render_nearest(&listing, format)?;
    Ok(())
}
