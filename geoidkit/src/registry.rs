//! Geoid tile registry and tile selection.
//!
//! GEOID18 for the conterminous US is published as eight regional grids,
//! two latitude bands by four longitude bands, with a two-degree overlap
//! between neighbours:
//!
//! | Tile | File          | Latitude | Longitude    |
//! |------|---------------|----------|--------------|
//! | 1    | `g2018u1.asc` | 40 – 58  | -130 – -111  |
//! | 2    | `g2018u2.asc` | 40 – 58  | -113 – -94   |
//! | 3    | `g2018u3.asc` | 40 – 58  | -96 – -77    |
//! | 4    | `g2018u4.asc` | 40 – 58  | -79 – -60    |
//! | 5    | `g2018u5.asc` | 24 – 42  | -130 – -111  |
//! | 6    | `g2018u6.asc` | 24 – 42  | -113 – -94   |
//! | 7    | `g2018u7.asc` | 24 – 42  | -96 – -77    |
//! | 8    | `g2018u8.asc` | 24 – 42  | -79 – -60    |
//!
//! # Boundary Convention
//!
//! Tile bounds are closed on every side and tiles are tried in table order.
//! A point on an edge shared by two tiles (or inside an overlap) resolves to
//! the first tile in the table, so every covered point maps to exactly one
//! tile.

use std::fmt;
use std::str::FromStr;

use crate::error::{GeoidError, Result};

/// GEOID18 CONUS tiles: (id, file, min_lat, min_lon, max_lat, max_lon).
const GEOID18_CONUS: [(u8, &str, f64, f64, f64, f64); 8] = [
    (1, "g2018u1.asc", 40.0, -130.0, 58.0, -111.0),
    (2, "g2018u2.asc", 40.0, -113.0, 58.0, -94.0),
    (3, "g2018u3.asc", 40.0, -96.0, 58.0, -77.0),
    (4, "g2018u4.asc", 40.0, -79.0, 58.0, -60.0),
    (5, "g2018u5.asc", 24.0, -130.0, 42.0, -111.0),
    (6, "g2018u6.asc", 24.0, -113.0, 42.0, -94.0),
    (7, "g2018u7.asc", 24.0, -96.0, 42.0, -77.0),
    (8, "g2018u8.asc", 24.0, -79.0, 42.0, -60.0),
];

/// Identifier of a regional geoid dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u8);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TileId {
    type Err = std::num::ParseIntError;

    /// Parse `"3"` or `"u3"`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix(['u', 'U']).unwrap_or(s);
        digits.parse().map(TileId)
    }
}

/// A rectangular latitude/longitude region in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl TileBounds {
    /// Create a new bounding rectangle.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern boundary latitude
    /// * `min_lon` - Western boundary longitude
    /// * `max_lat` - Northern boundary latitude
    /// * `max_lon` - Eastern boundary longitude
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Check whether a point lies inside the bounds, edges included.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    /// Check whether two rectangles share any area or edge.
    pub fn overlaps(&self, other: &TileBounds) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
    }
}

/// One entry of the registry: a tile id, its grid file and its coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSpec {
    /// Dataset identifier, also the cache key.
    pub id: TileId,
    /// Grid file name relative to the data directory.
    pub filename: String,
    /// Area in which this tile answers queries.
    pub bounds: TileBounds,
}

impl TileSpec {
    /// Create a new tile entry.
    pub fn new(id: TileId, filename: impl Into<String>, bounds: TileBounds) -> Self {
        Self {
            id,
            filename: filename.into(),
            bounds,
        }
    }
}

/// Ordered table of tiles consulted by the tile selector.
///
/// # Example
///
/// ```
/// use geoidkit::registry::{TileId, TileRegistry};
///
/// let registry = TileRegistry::geoid18_conus();
/// let tile = registry.select(46.722092, -119.593764).unwrap();
/// assert_eq!(tile.id, TileId(1));
/// assert_eq!(tile.filename, "g2018u1.asc");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TileRegistry {
    tiles: Vec<TileSpec>,
}

impl TileRegistry {
    /// Create a registry from an ordered list of tiles.
    ///
    /// Order matters: [`Self::select`] returns the first tile containing the point.
    pub fn new(tiles: Vec<TileSpec>) -> Self {
        Self { tiles }
    }

    /// The eight GEOID18 grids covering the conterminous United States.
    pub fn geoid18_conus() -> Self {
        let tiles = GEOID18_CONUS
            .iter()
            .map(|&(id, filename, min_lat, min_lon, max_lat, max_lon)| {
                TileSpec::new(
                    TileId(id),
                    filename,
                    TileBounds::new(min_lat, min_lon, max_lat, max_lon),
                )
            })
            .collect();
        Self { tiles }
    }

    /// Select the tile responsible for a point.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidError::UnsupportedLocation`] if no tile contains the
    /// point (including NaN or infinite coordinates).
    pub fn select(&self, lat: f64, lon: f64) -> Result<&TileSpec> {
        self.tiles
            .iter()
            .find(|t| t.bounds.contains(lat, lon))
            .ok_or(GeoidError::UnsupportedLocation { lat, lon })
    }

    /// Look up a tile by id.
    pub fn get(&self, id: TileId) -> Option<&TileSpec> {
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Look up a tile by its grid file name.
    ///
    /// Accepts a bare name or a path (either separator style).
    ///
    /// ```
    /// use geoidkit::registry::{TileId, TileRegistry};
    ///
    /// let registry = TileRegistry::geoid18_conus();
    /// assert_eq!(registry.by_filename("/data/g2018u7.asc").unwrap().id, TileId(7));
    /// assert!(registry.by_filename("g2012bu0.bin").is_none());
    /// ```
    pub fn by_filename(&self, filename: &str) -> Option<&TileSpec> {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(filename);
        self.tiles.iter().find(|t| t.filename == name)
    }

    /// Tiles whose coverage touches any of the given rectangles.
    pub fn tiles_overlapping<'a>(
        &'a self,
        bounds: &'a [TileBounds],
    ) -> impl Iterator<Item = &'a TileSpec> + 'a {
        self.tiles
            .iter()
            .filter(move |t| bounds.iter().any(|b| b.overlaps(&t.bounds)))
    }

    /// Iterate over tiles in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &TileSpec> {
        self.tiles.iter()
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the registry has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::geoid18_conus()
    }
}
