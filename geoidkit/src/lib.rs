//! # geoidkit - Geoid Undulation Library
//!
//! Converts between ellipsoidal heights (as measured by GNSS) and
//! geoid-referenced (orthometric) heights using NOAA GEOID18 grids for the
//! conterminous United States.
//!
//! ## Features
//!
//! - **Tile selection**: picks the right regional grid for a point
//! - **Accurate**: bicubic interpolating spline over the grid nodes
//! - **Lazy loading**: tiles are parsed on first use and kept in an LRU cache
//! - **Projected input**: optional PROJ-backed conversion from State Plane or UTM
//!
//! ## Quick Start
//!
//! ```ignore
//! use geoidkit::{GeoidService, Units};
//!
//! let service = GeoidService::new("/data/geoid18", 8);
//!
//! // Undulation N in meters
//! let n = service.undulation(46.722092, -119.593764)?;
//! assert!((n - -21.320).abs() < 0.01);
//!
//! // Ellipsoid height in meters to geoid height in feet
//! let r = service.geoid_from_ellipsoid(46.722092, -119.593764, 250.0, Units::SurveyFeet)?;
//! println!("H = {:.3} ft", r.height);
//! ```
//!
//! ## Grid Data Format
//!
//! GEOID18 grids are ASCII files. The first line holds the south-west origin
//! latitude, the origin longitude in degrees east (0-360), the latitude and
//! longitude spacing, the row and column counts, and a sample kind code.
//! Undulations in meters follow in row-major order, south to north and west
//! to east.
//!
//! ## Data Sources
//!
//! - <https://geodesy.noaa.gov/GEOID/GEOID18/>

pub mod elevation;
pub mod error;
pub mod grid;
pub mod projection;
pub mod registry;
pub mod service;
pub mod spline;
pub mod tile;

#[cfg(test)]
mod test_utils;

// Re-export main types at crate root for convenience
pub use elevation::{HeightConversion, Units, FEET_TO_METERS, METERS_TO_FEET};
pub use error::{GeoidError, Result};
pub use grid::{GridDataset, GridHeader};
pub use projection::{CoordinateProjector, Crs};
pub use registry::{TileBounds, TileId, TileRegistry, TileSpec};
pub use service::{CacheStats, GeoidService, GeoidServiceBuilder, PreloadStats, Undulation};
pub use spline::BicubicSpline;
pub use tile::GeoidTile;

#[cfg(feature = "proj")]
pub use projection::ProjProjector;
