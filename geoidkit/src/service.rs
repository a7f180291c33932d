//! Geoid undulation service with LRU caching.
//!
//! This module provides [`GeoidService`], a high-level interface that selects
//! the regional grid for a point, loads and caches it, and converts heights.
//!
//! Tiles are loaded lazily. Concurrent first requests for the same tile share
//! a single load; failed loads are not cached.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache;

use crate::elevation::{self, HeightConversion, Units};
use crate::error::{GeoidError, Result};
use crate::projection::{self, CoordinateProjector, Crs};
use crate::registry::{TileBounds, TileId, TileRegistry, TileSpec};
use crate::tile::GeoidTile;

/// Default number of tiles kept in memory (one slot per GEOID18 CONUS tile).
pub const DEFAULT_CACHE_SIZE: u64 = 8;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in the cache.
    pub entry_count: u64,
    /// Number of cache hits (requests served from cache).
    pub hit_count: u64,
    /// Number of cache misses (tiles loaded from disk).
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of tiles successfully loaded into cache.
    pub tiles_loaded: u64,
    /// Number of tiles that were already in cache.
    pub tiles_already_cached: u64,
    /// Number of tiles that failed to load.
    pub tiles_failed: u64,
    /// Number of tiles present on disk that matched the bounds filter.
    pub tiles_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Undulation together with the tile it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Undulation {
    /// Tile that served the query.
    pub tile: TileId,
    /// Geoid undulation in meters.
    pub meters: f64,
}

/// High-level geoid service with automatic tile caching.
///
/// # Example
///
/// ```ignore
/// use geoidkit::{GeoidService, Units};
///
/// let service = GeoidService::new("/data/geoid18", 8);
///
/// let n = service.undulation(46.722092, -119.593764)?;
/// println!("N = {:.3} m", n);
///
/// let r = service.geoid_from_ellipsoid(46.722092, -119.593764, 250.0, Units::SurveyFeet)?;
/// println!("H = {:.3} ft", r.height);
/// ```
pub struct GeoidService {
    /// Directory containing the grid files.
    data_dir: PathBuf,
    /// Tile table used for point lookup.
    registry: TileRegistry,
    /// LRU cache of loaded tiles.
    tile_cache: Cache<TileId, Arc<GeoidTile>>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl GeoidService {
    /// Create a service over the GEOID18 CONUS tiles.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Directory containing `g2018u*.asc` files
    /// * `cache_size` - Maximum number of tiles to keep in memory
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Self {
        GeoidServiceBuilder::new(data_dir)
            .cache_size(cache_size)
            .build()
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> GeoidServiceBuilder {
        GeoidServiceBuilder::new(data_dir)
    }

    /// Geoid undulation in meters at the given coordinates.
    ///
    /// # Errors
    ///
    /// - [`GeoidError::UnsupportedLocation`] if no tile covers the point
    /// - [`GeoidError::FileNotFound`] if the tile's grid file is missing
    /// - [`GeoidError::MalformedGridFile`] if the grid file cannot be parsed
    pub fn undulation(&self, lat: f64, lon: f64) -> Result<f64> {
        self.undulation_with_tile(lat, lon).map(|u| u.meters)
    }

    /// Geoid undulation along with the id of the tile that produced it.
    pub fn undulation_with_tile(&self, lat: f64, lon: f64) -> Result<Undulation> {
        let spec = self.registry.select(lat, lon)?;
        let tile = self.load_tile(spec)?;
        Ok(Undulation {
            tile: spec.id,
            meters: tile.undulation(lat, lon)?,
        })
    }

    /// Convert an ellipsoid height (meters) to a geoid height.
    ///
    /// The result is in feet if `units` is a foot variant.
    pub fn geoid_from_ellipsoid(
        &self,
        lat: f64,
        lon: f64,
        ellipsoid_height: f64,
        units: Units,
    ) -> Result<HeightConversion> {
        let n = self.undulation(lat, lon)?;
        Ok(elevation::geoid_from_ellipsoid(n, ellipsoid_height, units))
    }

    /// Convert a geoid height to an ellipsoid height in meters.
    ///
    /// `geoid_height` is read as feet if `units` is a foot variant.
    pub fn ellipsoid_from_geoid(
        &self,
        lat: f64,
        lon: f64,
        geoid_height: f64,
        units: Units,
    ) -> Result<HeightConversion> {
        let n = self.undulation(lat, lon)?;
        Ok(elevation::ellipsoid_from_geoid(n, geoid_height, units))
    }

    /// Convert an ellipsoid height at a projected position to a geoid height.
    ///
    /// The position is converted to latitude/longitude by `projector`, then
    /// handled as in [`Self::geoid_from_ellipsoid`], including `units`.
    ///
    /// # Errors
    ///
    /// Projection errors from `projector`, plus the errors of [`Self::undulation`].
    pub fn geoid_from_ellipsoid_projected(
        &self,
        projector: &dyn CoordinateProjector,
        easting: f64,
        northing: f64,
        crs: Crs,
        ellipsoid_height: f64,
        units: Units,
    ) -> Result<HeightConversion> {
        let (lat, lon) = projection::to_geodetic(projector, easting, northing, crs)?;
        self.geoid_from_ellipsoid(lat, lon, ellipsoid_height, units)
    }

    /// Convert a geoid height at a projected position to an ellipsoid height.
    ///
    /// See [`Self::geoid_from_ellipsoid_projected`].
    pub fn ellipsoid_from_geoid_projected(
        &self,
        projector: &dyn CoordinateProjector,
        easting: f64,
        northing: f64,
        crs: Crs,
        geoid_height: f64,
        units: Units,
    ) -> Result<HeightConversion> {
        let (lat, lon) = projection::to_geodetic(projector, easting, northing, crs)?;
        self.ellipsoid_from_geoid(lat, lon, geoid_height, units)
    }

    /// Undulations for a batch of coordinates.
    ///
    /// Coordinates are grouped by tile so that each tile is looked up in the
    /// cache once. Results are returned in input order, one per coordinate.
    pub fn undulations_batch(&self, coords: &[(f64, f64)]) -> Vec<Result<f64>> {
        let mut results: Vec<Option<Result<f64>>> = vec![None; coords.len()];

        let mut groups: HashMap<TileId, (&TileSpec, Vec<usize>)> = HashMap::new();
        for (i, &(lat, lon)) in coords.iter().enumerate() {
            match self.registry.select(lat, lon) {
                Ok(spec) => groups.entry(spec.id).or_insert((spec, Vec::new())).1.push(i),
                Err(e) => results[i] = Some(Err(e)),
            }
        }

        // One cache lookup per tile, not per coordinate.
        for (spec, indices) in groups.values() {
            let loaded = self.load_tile(spec);

            for &i in indices {
                let (lat, lon) = coords[i];
                results[i] = Some(match &loaded {
                    Ok(tile) => tile.undulation(lat, lon),
                    Err(e) => Err(e.clone()),
                });
            }
        }

        results
            .into_iter()
            .zip(coords)
            .map(|(r, &(lat, lon))| {
                r.unwrap_or(Err(GeoidError::UnsupportedLocation { lat, lon }))
            })
            .collect()
    }

    /// Get the loaded tile for a registry entry, reading it from disk on first use.
    pub fn tile(&self, id: TileId) -> Result<Arc<GeoidTile>> {
        let spec = self
            .registry
            .get(id)
            .ok_or(GeoidError::UnknownTile { id })?;
        self.load_tile(spec)
    }

    /// Load a tile from cache or disk.
    ///
    /// Concurrent callers for the same tile wait on a single load.
    fn load_tile(&self, spec: &TileSpec) -> Result<Arc<GeoidTile>> {
        let mut loaded_here = false;
        let result = self.tile_cache.try_get_with(spec.id, || {
            loaded_here = true;
            self.read_tile(spec).map(Arc::new)
        });

        // A failed read still went to disk and counts as a miss.
        if loaded_here {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        } else if result.is_ok() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        }
        result.map_err(|e| (*e).clone())
    }

    /// Read and parse a tile, extracting it from `<file>.zip` if needed.
    fn read_tile(&self, spec: &TileSpec) -> Result<GeoidTile> {
        let path = self.data_dir.join(&spec.filename);

        if !path.exists() {
            let zip_path = self.data_dir.join(format!("{}.zip", spec.filename));
            if zip_path.exists() {
                self.extract_grid_from_zip(&zip_path, &spec.filename)?;
            } else {
                return Err(GeoidError::FileNotFound { path });
            }
        }

        GeoidTile::from_file(&path)
    }

    /// Extract a grid file from a local `.zip` archive into the data directory.
    ///
    /// A failed extraction leaves nothing behind, so the next load retries
    /// the archive.
    fn extract_grid_from_zip(&self, zip_path: &Path, filename: &str) -> Result<()> {
        let invalid = |e: zip::result::ZipError| {
            GeoidError::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        };

        let file = std::fs::File::open(zip_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(invalid)?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(invalid)?;
            let entry_name = entry.name().rsplit('/').next().unwrap_or("").to_string();
            if entry_name == filename || entry_name.ends_with(".asc") {
                // The grid only appears under its final name once fully written.
                let mut out_file = tempfile::NamedTempFile::new_in(&self.data_dir)?;
                std::io::copy(&mut entry, &mut out_file)?;
                out_file
                    .persist(self.data_dir.join(filename))
                    .map_err(|e| e.error)?;
                return Ok(());
            }
        }

        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No .asc grid found in {}", zip_path.display()),
        )
        .into())
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.tile_cache.run_pending_tasks();
        CacheStats {
            entry_count: self.tile_cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the tile registry.
    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.tile_cache.policy().max_capacity().unwrap_or(0)
    }

    /// Whether a tile is currently cached.
    pub fn is_cached(&self, id: TileId) -> bool {
        self.tile_cache.contains_key(&id)
    }

    /// Remove a tile from the cache, e.g. after its grid file was replaced.
    pub fn invalidate_tile(&self, id: TileId) {
        self.tile_cache.invalidate(&id);
    }

    /// Clear all tiles from the cache.
    pub fn clear_cache(&self) {
        self.tile_cache.invalidate_all();
    }

    /// Registry tiles with a grid file (or `.zip` archive) in the data directory.
    ///
    /// Returned in registry order.
    pub fn scan_tile_files(&self) -> Vec<TileId> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut present = HashSet::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let name = name.strip_suffix(".zip").unwrap_or(&name);
            if let Some(spec) = self.registry.by_filename(name) {
                present.insert(spec.id);
            }
        }

        self.registry
            .iter()
            .map(|spec| spec.id)
            .filter(|id| present.contains(id))
            .collect()
    }

    /// Preload tiles into the cache.
    ///
    /// Loads every registry tile found in the data directory, or only those
    /// overlapping one of `bounds` when given.
    ///
    /// ```ignore
    /// use geoidkit::{GeoidService, TileBounds};
    ///
    /// let service = GeoidService::new("/data/geoid18", 8);
    /// let pnw = TileBounds::new(44.0, -125.0, 49.0, -116.0);
    /// let stats = service.preload(Some(&[pnw]));
    /// println!("Loaded {} tiles in {}ms", stats.tiles_loaded, stats.elapsed_ms);
    /// ```
    pub fn preload(&self, bounds: Option<&[TileBounds]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        let wanted: Option<HashSet<TileId>> =
            bounds.map(|boxes| self.registry.tiles_overlapping(boxes).map(|t| t.id).collect());

        for id in self.scan_tile_files() {
            if wanted.as_ref().is_some_and(|ids| !ids.contains(&id)) {
                continue;
            }
            let Some(spec) = self.registry.get(id) else {
                continue;
            };

            stats.tiles_matched += 1;

            if self.tile_cache.contains_key(&id) {
                stats.tiles_already_cached += 1;
                continue;
            }

            match self.load_tile(spec) {
                Ok(_) => stats.tiles_loaded += 1,
                Err(_) => stats.tiles_failed += 1,
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        stats
    }
}

/// Builder for creating [`GeoidService`] with custom configuration.
///
/// ```ignore
/// use geoidkit::GeoidServiceBuilder;
///
/// let service = GeoidServiceBuilder::new("/data/geoid18")
///     .cache_size(4)
///     .build();
/// ```
pub struct GeoidServiceBuilder {
    data_dir: PathBuf,
    cache_size: u64,
    registry: TileRegistry,
}

impl GeoidServiceBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_size: DEFAULT_CACHE_SIZE,
            registry: TileRegistry::geoid18_conus(),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `GEOIDKIT_DATA_DIR` | Directory containing grid files | Required |
    /// | `GEOIDKIT_CACHE_SIZE` | Maximum tiles in cache | 8 |
    ///
    /// # Errors
    ///
    /// Returns an error if `GEOIDKIT_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("GEOIDKIT_DATA_DIR").map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "GEOIDKIT_DATA_DIR environment variable not set",
            )
        })?;

        let cache_size: u64 = std::env::var("GEOIDKIT_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_SIZE);

        Ok(Self::new(data_dir).cache_size(cache_size))
    }

    /// Set the data directory.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the maximum number of tiles to keep in cache.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Use a custom tile table instead of GEOID18 CONUS.
    pub fn registry(mut self, registry: TileRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the [`GeoidService`].
    pub fn build(self) -> GeoidService {
        GeoidService {
            data_dir: self.data_dir,
            registry: self.registry,
            tile_cache: Cache::builder().max_capacity(self.cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }
}
