//! Import command handler for loading a JSON export into the dataset.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use pharmaroute_cli::output::{render_json, OutputFormat};
use pharmaroute_lib::{resolve_dataset_path, save_dataset, DatasetExport};

/// Handle the import subcommand.
///
/// Replaces the dataset at the resolved location with the contents of `file`.
pub fn handle_import_command(
    target: Option<&Path>,
    format: OutputFormat,
    file: &Path,
) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read export from {}", file.display()))?;
    let export = DatasetExport::from_json(&text)
        .with_context(|| format!("failed to parse export {}", file.display()))?;
    let (network, pois) = export.into_parts();

    let dataset_path = resolve_dataset_path(target)?;
    let summary = save_dataset(&dataset_path, &network, &pois)
        .with_context(|| format!("failed to write dataset to {}", dataset_path.display()))?;

    if format == OutputFormat::Json {
        render_json(&summary)?;
    } else {
        println!(
            "Imported {} intersections, {} roads and {} points of interest into {}",
            summary.intersections,
            summary.roads,
            summary.pois,
            dataset_path.display()
        );
    }
    Ok(())
}
