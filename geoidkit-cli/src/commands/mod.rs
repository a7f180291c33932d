pub mod batch;
pub mod convert;
pub mod info;
pub mod list;
#[cfg(feature = "proj")]
pub mod project;
pub mod query;

use anyhow::{Context, Result};
use geoidkit::{GeoidService, GeoidServiceBuilder};
use std::path::PathBuf;

const MISSING_DATA_DIR: &str =
    "GEOIDKIT_DATA_DIR environment variable not set. Use --data-dir or set GEOIDKIT_DATA_DIR";

/// Build the service from `--data-dir` or the environment.
pub fn build_service(data_dir: Option<PathBuf>, cache_size: u64) -> Result<GeoidService> {
    let builder = match data_dir {
        Some(dir) => GeoidServiceBuilder::new(dir),
        None => GeoidServiceBuilder::from_env().context(MISSING_DATA_DIR)?,
    };
    Ok(builder.cache_size(cache_size).build())
}

/// Resolve the data directory from `--data-dir` or the environment.
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir),
        None => {
            let dir = std::env::var("GEOIDKIT_DATA_DIR").context(MISSING_DATA_DIR)?;
            Ok(PathBuf::from(dir))
        }
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
