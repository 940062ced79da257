//! Handlers for CLI subcommands.
//!
//! Each module handles one subcommand; main.rs only parses arguments and
//! dispatches here.

pub mod import;
pub mod info;
pub mod nearest;
pub mod route;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use pharmaroute_lib::{ensure_dataset, BoundingRegion, Coordinate, RoutingConfig};

/// User location flags shared by `nearest` and `route`.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct LocationArgs {
    /// Latitude of the user, in decimal degrees.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
    /// Longitude of the user, in decimal degrees.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

impl LocationArgs {
    /// The requested location, or the configured default when none was given.
    pub fn resolve(&self, config: &RoutingConfig) -> Result<Coordinate> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => {
                Coordinate::new(lat, lon).context("invalid --lat/--lon location")
            }
            _ => {
                tracing::info!(location = %config.default_location, "using default location");
                Ok(config.default_location)
            }
        }
    }
}

/// Locate the imported dataset, failing with a hint when nothing was imported.
pub(crate) fn locate_dataset(target: Option<&Path>) -> Result<PathBuf> {
    ensure_dataset(target).context("no dataset available; run `pharmaroute import <file>` first")
}

/// Region of map data loaded around the user.
pub(crate) fn search_region(user: Coordinate, config: &RoutingConfig) -> BoundingRegion {
    BoundingRegion::around(user, config.search_radius_m)
}
