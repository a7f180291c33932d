//! Shared helpers for unit tests that need synthetic geoid grids.

use std::fs;
use std::path::Path;

use crate::registry::TileSpec;

/// Geometry of a synthetic grid, with `lon0` in [-180, 180).
pub(crate) struct SyntheticGrid {
    pub lat0: f64,
    pub lon0: f64,
    pub dlat: f64,
    pub dlon: f64,
    pub rows: usize,
    pub cols: usize,
}

impl SyntheticGrid {
    pub fn new(lat0: f64, lon0: f64, dlat: f64, dlon: f64, rows: usize, cols: usize) -> Self {
        Self {
            lat0,
            lon0,
            dlat,
            dlon,
            rows,
            cols,
        }
    }

    /// One-degree grid spanning the bounds of a registry tile.
    pub fn covering(spec: &TileSpec) -> Self {
        let b = spec.bounds;
        Self::new(
            b.min_lat,
            b.min_lon,
            1.0,
            1.0,
            (b.max_lat - b.min_lat) as usize + 1,
            (b.max_lon - b.min_lon) as usize + 1,
        )
    }
}

/// Render a grid in the GEOID18 ASCII layout, sampling `f(lat, lon)` at each node.
pub(crate) fn grid_text(grid: &SyntheticGrid, f: impl Fn(f64, f64) -> f64) -> String {
    let mut text = format!(
        "{:12.6} {:12.6} {:10.6} {:10.6} {:6} {:6} {:3}\n",
        grid.lat0,
        grid.lon0 + 360.0,
        grid.dlat,
        grid.dlon,
        grid.rows,
        grid.cols,
        1
    );
    for i in 0..grid.rows {
        let lat = grid.lat0 + i as f64 * grid.dlat;
        let row: Vec<String> = (0..grid.cols)
            .map(|j| format!("{:.9}", f(lat, grid.lon0 + j as f64 * grid.dlon)))
            .collect();
        text.push_str(&row.join(" "));
        text.push('\n');
    }
    text
}

/// Write a synthetic grid for `spec` into `dir` under the tile's file name.
pub(crate) fn write_tile(dir: &Path, spec: &TileSpec, f: impl Fn(f64, f64) -> f64) {
    let text = grid_text(&SyntheticGrid::covering(spec), f);
    fs::write(dir.join(&spec.filename), text).unwrap();
}
