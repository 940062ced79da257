//! Info command handler reporting dataset location and contents.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use pharmaroute_cli::output::{render_json, OutputFormat};
use pharmaroute_lib::db::table_counts;
use pharmaroute_lib::open_dataset;

use super::locate_dataset;

#[derive(Debug, Serialize)]
struct DatasetInfo {
    path: String,
    intersections: usize,
    roads: usize,
    pois: usize,
}

/// Handle the info subcommand.
pub fn handle_info_command(target: Option<&Path>, format: OutputFormat) -> Result<()> {
    let dataset_path = locate_dataset(target)?;
    let connection = open_dataset(&dataset_path)?;
    let counts = table_counts(&connection)?;
    let count = |table: &str| counts.get(table).copied().unwrap_or_default();

    let info = DatasetInfo {
        path: dataset_path.display().to_string(),
        intersections: count("intersections"),
        roads: count("roads"),
        pois: count("pois"),
    };

    if format == OutputFormat::Json {
        render_json(&info)?;
    } else {
        println!("Dataset: {}", info.path);
        println!("  intersections: {}", info.intersections);
        println!("  roads:         {}", info.roads);
        println!("  pois:          {}", info.pois);
    }
    Ok(())
}
