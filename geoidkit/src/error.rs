//! Error types for the geoidkit library.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::registry::TileId;

/// Errors that can occur when loading geoid grids or converting heights.
///
/// The type is `Clone` so that a failed tile load can be handed to every
/// caller that was waiting on the same cache entry.
#[derive(Error, Debug, Clone)]
pub enum GeoidError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// The grid file header or body could not be parsed.
    #[error("Malformed grid file {path}: {reason}")]
    MalformedGridFile { path: PathBuf, reason: String },

    /// No configured tile covers the coordinates.
    #[error("Location not covered: lat={lat}, lon={lon} is outside all geoid tiles")]
    UnsupportedLocation { lat: f64, lon: f64 },

    /// The coordinates are inside a tile but outside its grid support.
    #[error("Coordinates out of grid bounds: lat={lat}, lon={lon}")]
    OutOfGridBounds { lat: f64, lon: f64 },

    /// The grid file for a tile was not found in the data directory.
    #[error("Geoid grid file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The tile id is not part of the configured registry.
    #[error("Unknown geoid tile: {id}")]
    UnknownTile { id: TileId },

    /// A coordinate reference system could not be resolved by the projector.
    #[error("Unknown coordinate reference system: {crs}")]
    UnknownCrs { crs: String },

    /// The projector resolved the CRS but failed to transform the point.
    #[error("Projection failed: {0}")]
    Projection(String),
}

impl From<std::io::Error> for GeoidError {
    fn from(err: std::io::Error) -> Self {
        GeoidError::Io(Arc::new(err))
    }
}

impl GeoidError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GeoidError::MalformedGridFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`GeoidError`].
pub type Result<T> = std::result::Result<T, GeoidError>;
