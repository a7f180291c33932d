//! Loaded geoid tiles.
//!
//! A [`GeoidTile`] is the unit the service caches: a parsed grid together with
//! the spline built over it.

use std::path::Path;

use crate::error::Result;
use crate::grid::{GridDataset, GridHeader};
use crate::spline::BicubicSpline;

/// Meters to feet, as used throughout the conversion tools.
pub const METERS_TO_FEET: f64 = 3.28084;

/// An immutable geoid grid ready for undulation queries.
///
/// # Example
///
/// ```ignore
/// use geoidkit::GeoidTile;
///
/// let tile = GeoidTile::from_file("/data/geoid18/g2018u1.asc")?;
/// let n = tile.undulation(46.722092, -119.593764)?;
/// println!("Geoid undulation: {:.3}m", n);
/// ```
#[derive(Debug, Clone)]
pub struct GeoidTile {
    spline: BicubicSpline,
}

impl GeoidTile {
    /// Load a tile from a GEOID18 `.asc` file and build its spline.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or malformed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_grid(GridDataset::from_file(path)?))
    }

    /// Build a tile from an already parsed grid.
    pub fn from_grid(grid: GridDataset) -> Self {
        Self {
            spline: BicubicSpline::new(grid),
        }
    }

    /// Geoid undulation in meters at the given coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GeoidError::OutOfGridBounds`] if the point is outside
    /// the grid.
    pub fn undulation(&self, lat: f64, lon: f64) -> Result<f64> {
        self.spline.evaluate(lat, lon)
    }

    /// Geoid undulation in feet at the given coordinates.
    pub fn undulation_feet(&self, lat: f64, lon: f64) -> Result<f64> {
        Ok(self.undulation(lat, lon)? * METERS_TO_FEET)
    }

    /// Returns the underlying grid.
    pub fn grid(&self) -> &GridDataset {
        self.spline.grid()
    }

    /// Returns the grid header.
    pub fn header(&self) -> &GridHeader {
        self.spline.header()
    }
}
