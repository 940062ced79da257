use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

use crate::error::{Error, Result};

/// Default filename for the dataset inside the data directory.
pub const DATASET_FILENAME: &str = "pharmaroute.db";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PHARMAROUTE_DATA_DIR";

/// Resolve the default dataset location using platform-specific project directories.
pub fn default_dataset_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "pharmaroute", "pharmaroute")
        .ok_or(Error::ProjectDirsUnavailable)?;
    Ok(dirs.data_dir().join(DATASET_FILENAME))
}

/// Resolve where the dataset lives without checking that it exists.
///
/// The resolution order is:
/// 1. Explicit `target` argument when provided.
/// 2. `PHARMAROUTE_DATA_DIR` environment variable.
/// 3. Platform-specific project data directory.
///
/// A target or override ending in `.db` names the file itself; anything else
/// is treated as a directory holding [`DATASET_FILENAME`].
pub fn resolve_dataset_path(target: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = target {
        debug!(path = %path.display(), "using explicit dataset location");
        return Ok(dataset_file(path));
    }

    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        let path = PathBuf::from(dir);
        debug!(path = %path.display(), env = DATA_DIR_ENV, "using data directory override");
        return Ok(dataset_file(&path));
    }

    default_dataset_path()
}

/// Resolve the dataset location and fail if nothing has been imported there.
pub fn ensure_dataset(target: Option<&Path>) -> Result<PathBuf> {
    let path = resolve_dataset_path(target)?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::DatasetNotFound { path })
    }
}

fn dataset_file(path: &Path) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == "db") {
        path.to_path_buf()
    } else {
        path.join(DATASET_FILENAME)
    }
}
