//! Route command handler for walking directions to a pharmacy.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use pharmaroute_cli::output::{render_route, OutputFormat};
use pharmaroute_lib::{
    fetch_candidates, find_by_name, GeoJsonRenderer, InMemoryGraphStore, MapContext,
    MapDataProvider, MapRenderer, RouteSummary, RoutingConfig, SqliteMapProvider,
};

use super::{locate_dataset, search_region, LocationArgs};

/// Arguments for the route command.
#[derive(Debug, Clone, Default)]
pub struct RouteCommandArgs {
    pub location: LocationArgs,
    /// Route to the pharmacy with this name instead of the nearest one.
    pub to: Option<String>,
    /// Write the route as GeoJSON to this path.
    pub geojson: Option<PathBuf>,
}

/// Handle the route subcommand.
///
/// Loads map data around the user, then routes either to the named pharmacy
/// or to the nearest reachable one.
pub fn handle_route_command(
    target: Option<&Path>,
    format: OutputFormat,
    config: &RoutingConfig,
    args: &RouteCommandArgs,
) -> Result<()> {
    let user = args.location.resolve(config)?;
    let provider = SqliteMapProvider::new(locate_dataset(target)?);
    let region = search_region(user, config);

    let network = provider
        .fetch_network(&region)
        .context("failed to load the road network")?;
    let candidates = fetch_candidates(&provider, &region, &config.category)?;
    info!(
        intersections = network.node_count(),
        roads = network.edge_count(),
        candidates = candidates.len(),
        "loaded map data"
    );

    let store = InMemoryGraphStore::new(&network);
    let chain = config.chain();
    let selector = config.selector();

    let selection = match args.to.as_deref() {
        Some(name) => {
            let poi = find_by_name(&candidates, name)?;
            selector.route_to(&chain, &store, user, poi)?
        }
        None => selector.select_best(&chain, &store, user, &candidates)?,
    };

    let summary = RouteSummary::from_selection(&selection);
    render_route(&summary, format)?;

    if let Some(path) = &args.geojson {
        let context = MapContext {
            user: Some(user),
            destination: Some(selection.poi.clone()),
            candidates,
        };
        let text = GeoJsonRenderer { pretty: true }.render(&selection.route, &context)?;
        fs::write(path, text)
            .with_context(|| format!("failed to write map to {}", path.display()))?;
        if format != OutputFormat::Json {
            println!("Map written to {}", path.display());
        }
    }
    Ok(())
}
