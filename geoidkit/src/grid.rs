//! Geoid grid file parsing.
//!
//! This module provides [`GridDataset`] for reading the ASCII grids published
//! for GEOID18 (`g2018u1.asc` … `g2018u8.asc`) into a regular latitude/longitude
//! grid of undulation samples.
//!
//! # File Format
//!
//! ```text
//!   40.000000  230.000000   0.016667   0.016667   1081   1141   1
//!  -21.1120  -21.1190  -21.1260 ...
//! ```
//!
//! The first line holds the southernmost latitude, the westernmost longitude
//! (degrees east, 0..360), the latitude and longitude spacing, the row and
//! column counts, and an optional sample kind (`1` = real*4). Every following
//! line carries whitespace-separated samples in row-major order, starting at
//! the southern row.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{GeoidError, Result};

/// Smallest row or column count a grid can have: a cubic spline needs
/// degree + 1 nodes per axis.
pub const MIN_AXIS_SAMPLES: usize = 4;

/// Encoding of the samples declared in the grid header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Single-precision real values (header code `1`).
    Real4,
}

impl SampleKind {
    /// Returns the header code for this encoding.
    pub fn code(&self) -> u32 {
        match self {
            SampleKind::Real4 => 1,
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        let code = code.parse::<u32>().ok()?;
        [SampleKind::Real4].into_iter().find(|k| k.code() == code)
    }
}

/// Georeferencing header of a geoid grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    /// Southernmost latitude in decimal degrees.
    pub lat0: f64,
    /// Westernmost longitude in decimal degrees, normalized to [-180, 180).
    pub lon0: f64,
    /// Latitude spacing in decimal degrees.
    pub dlat: f64,
    /// Longitude spacing in decimal degrees.
    pub dlon: f64,
    /// Number of rows (latitude nodes).
    pub n_rows: usize,
    /// Number of columns (longitude nodes).
    pub n_cols: usize,
    /// Declared sample encoding.
    pub kind: SampleKind,
}

impl GridHeader {
    /// Northernmost latitude covered by the grid nodes.
    pub fn lat_max(&self) -> f64 {
        self.lat0 + (self.n_rows - 1) as f64 * self.dlat
    }

    /// Easternmost longitude covered by the grid nodes.
    pub fn lon_max(&self) -> f64 {
        self.lon0 + (self.n_cols - 1) as f64 * self.dlon
    }

    /// Total number of samples the body must contain.
    pub fn sample_count(&self) -> usize {
        self.n_rows * self.n_cols
    }

    /// Check whether a point lies inside the grid support (edges included).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat0..=self.lat_max()).contains(&lat) && (self.lon0..=self.lon_max()).contains(&lon)
    }

    fn parse(line: &str, path: &Path) -> Result<Self> {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        if tokens.len() < 6 || tokens.len() > 7 {
            return Err(GeoidError::malformed(
                path,
                format!("expected 6 header fields, found {}", tokens.len()),
            ));
        }

        let real = |idx: usize, name: &str| -> Result<f64> {
            tokens[idx]
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    GeoidError::malformed(path, format!("invalid {}: {:?}", name, tokens[idx]))
                })
        };
        let count = |idx: usize, name: &str| -> Result<usize> {
            tokens[idx].parse::<usize>().map_err(|_| {
                GeoidError::malformed(path, format!("invalid {}: {:?}", name, tokens[idx]))
            })
        };

        let lat0 = real(0, "southern latitude")?;
        let lon0 = normalize_longitude(real(1, "western longitude")?);
        let dlat = real(2, "latitude spacing")?;
        let dlon = real(3, "longitude spacing")?;
        let n_rows = count(4, "row count")?;
        let n_cols = count(5, "column count")?;

        let kind = match tokens.get(6) {
            None => SampleKind::Real4,
            Some(code) => SampleKind::from_code(code).ok_or_else(|| {
                GeoidError::malformed(path, format!("unsupported sample kind {:?}", code))
            })?,
        };

        let header = Self {
            lat0,
            lon0,
            dlat,
            dlon,
            n_rows,
            n_cols,
            kind,
        };
        header.validate(path)?;
        Ok(header)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if !(self.lat0.is_finite() && self.lon0.is_finite()) {
            return Err(GeoidError::malformed(path, "grid origin is not finite"));
        }
        if !(self.dlat > 0.0 && self.dlon > 0.0 && self.dlat.is_finite() && self.dlon.is_finite())
        {
            return Err(GeoidError::malformed(
                path,
                format!(
                    "grid spacing must be positive (dlat={}, dlon={})",
                    self.dlat, self.dlon
                ),
            ));
        }
        if self.n_rows < MIN_AXIS_SAMPLES || self.n_cols < MIN_AXIS_SAMPLES {
            return Err(GeoidError::malformed(
                path,
                format!(
                    "grid must have at least {} rows and columns, found {}x{}",
                    MIN_AXIS_SAMPLES, self.n_rows, self.n_cols
                ),
            ));
        }
        Ok(())
    }
}

/// Convert a 0..360 east longitude to the [-180, 180) convention.
///
/// # Examples
///
/// ```
/// use geoidkit::grid::normalize_longitude;
///
/// assert_eq!(normalize_longitude(230.0), -130.0);
/// assert_eq!(normalize_longitude(10.0), 10.0);
/// assert_eq!(normalize_longitude(-130.0), -130.0);
/// ```
pub fn normalize_longitude(lon_east: f64) -> f64 {
    let lon = lon_east - 360.0;
    if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// A regular grid of geoid undulations with its header.
///
/// Samples are stored row-major: row `i` is latitude `lat0 + i*dlat`, column
/// `j` is longitude `lon0 + j*dlon`.
///
/// # Example
///
/// ```ignore
/// use geoidkit::GridDataset;
///
/// let grid = GridDataset::from_file("/data/geoid18/g2018u1.asc")?;
/// println!("{} x {} samples", grid.header().n_rows, grid.header().n_cols);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GridDataset {
    header: GridHeader,
    samples: Vec<f64>,
}

impl GridDataset {
    /// Load a grid from an ASCII `.asc` file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist ([`GeoidError::FileNotFound`])
    /// - The file cannot be opened or memory-mapped
    /// - The header or body cannot be parsed ([`GeoidError::MalformedGridFile`])
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GeoidError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => e.into(),
        })?;

        // Zero-length files cannot be mapped on every platform.
        if file.metadata()?.len() == 0 {
            return Err(GeoidError::malformed(path, "file is empty"));
        }

        // SAFETY: the file is opened read-only and the mapping does not
        // outlive this function; samples are copied out while parsing.
        let mmap = unsafe { Mmap::map(&file)? };

        let text = std::str::from_utf8(&mmap)
            .map_err(|e| GeoidError::malformed(path, format!("not a text file: {}", e)))?;

        Self::parse_at(text, path)
    }

    /// Parse a grid from its textual contents.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_at(text, Path::new("<memory>"))
    }

    fn parse_at(text: &str, path: &Path) -> Result<Self> {
        let mut lines = text.lines();
        let header_line = lines
            .by_ref()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| GeoidError::malformed(path, "missing header line"))?;
        let header = GridHeader::parse(header_line, path)?;

        let mut samples = Vec::with_capacity(header.sample_count());
        for line in lines {
            for token in line.split_ascii_whitespace() {
                let value = token.parse::<f64>().ok().filter(|v| v.is_finite());
                match value {
                    Some(v) => samples.push(v),
                    None => {
                        return Err(GeoidError::malformed(
                            path,
                            format!("invalid sample {:?} at index {}", token, samples.len()),
                        ))
                    }
                }
            }
        }

        Self::with_path(header, samples, path)
    }

    /// Build a grid from a header and row-major samples.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::MalformedGridFile`] if the header is invalid, or
    /// if the sample count does not match `n_rows * n_cols`, or if a sample is
    /// not finite.
    pub fn new(header: GridHeader, samples: Vec<f64>) -> Result<Self> {
        Self::with_path(header, samples, Path::new("<memory>"))
    }

    fn with_path(header: GridHeader, samples: Vec<f64>, path: &Path) -> Result<Self> {
        header.validate(path)?;
        if samples.len() != header.sample_count() {
            return Err(GeoidError::malformed(
                path,
                format!(
                    "expected {} samples ({}x{}), found {}",
                    header.sample_count(),
                    header.n_rows,
                    header.n_cols,
                    samples.len()
                ),
            ));
        }
        if let Some(idx) = samples.iter().position(|v| !v.is_finite()) {
            return Err(GeoidError::malformed(
                path,
                format!("non-finite sample at index {}", idx),
            ));
        }
        Ok(Self { header, samples })
    }

    /// Returns the grid header.
    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    /// Returns all samples in row-major order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the sample at `row` (latitude index) and `col` (longitude index).
    pub fn sample(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.header.n_rows || col >= self.header.n_cols {
            return None;
        }
        Some(self.samples[row * self.header.n_cols + col])
    }

    /// Latitude of row `i`.
    pub fn lat_at(&self, i: usize) -> f64 {
        self.header.lat0 + i as f64 * self.header.dlat
    }

    /// Longitude of column `j`.
    pub fn lon_at(&self, j: usize) -> f64 {
        self.header.lon0 + j as f64 * self.header.dlon
    }

    /// Northernmost latitude of the grid.
    pub fn lat_max(&self) -> f64 {
        self.header.lat_max()
    }

    /// Easternmost longitude of the grid.
    pub fn lon_max(&self) -> f64 {
        self.header.lon_max()
    }

    /// Check whether a point lies inside the grid support.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.header.contains(lat, lon)
    }

    /// Smallest and largest sample value.
    pub fn min_max(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}
