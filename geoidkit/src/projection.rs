//! Projected coordinate support.
//!
//! Geoid grids are indexed by geodetic latitude/longitude. Points expressed as
//! easting/northing in a projected CRS (State Plane, UTM, ...) are first
//! converted to geodetic coordinates by a [`CoordinateProjector`].
//!
//! The library does not implement map projections itself. With the `proj`
//! feature enabled, [`ProjProjector`] delegates to the PROJ library.

use std::fmt;
use std::str::FromStr;

use crate::error::{GeoidError, Result};

/// A coordinate reference system identified by its EPSG code.
///
/// ```
/// use geoidkit::projection::Crs;
///
/// let crs: Crs = "EPSG:2285".parse().unwrap();
/// assert_eq!(crs, Crs::epsg(2285));
/// assert_eq!(crs.to_string(), "EPSG:2285");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs(u32);

impl Crs {
    /// Geodetic WGS 84 (latitude/longitude in degrees).
    pub const WGS84: Crs = Crs(4326);

    /// CRS for the given EPSG code.
    pub const fn epsg(code: u32) -> Self {
        Crs(code)
    }

    /// The EPSG code.
    pub fn code(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Crs {
    type Err = GeoidError;

    /// Parse `"EPSG:2285"`, `"epsg:2285"` or a bare `"2285"`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let code = match trimmed.split_once(':') {
            Some((authority, code)) if authority.eq_ignore_ascii_case("epsg") => code,
            Some(_) => {
                return Err(GeoidError::UnknownCrs {
                    crs: trimmed.to_string(),
                })
            }
            None => trimmed,
        };
        code.trim()
            .parse()
            .map(Crs)
            .map_err(|_| GeoidError::UnknownCrs {
                crs: trimmed.to_string(),
            })
    }
}

/// Converts between a projected CRS and geodetic latitude/longitude.
///
/// Implementations must be shareable across threads; the service holds them
/// behind an `Arc` and calls them from request handlers.
pub trait CoordinateProjector: Send + Sync {
    /// Convert an easting/northing pair in `crs` to `(lat, lon)` in degrees.
    ///
    /// # Errors
    ///
    /// [`GeoidError::UnknownCrs`] if the CRS cannot be resolved and
    /// [`GeoidError::Projection`] if the point cannot be transformed.
    fn to_geodetic(&self, easting: f64, northing: f64, crs: Crs) -> Result<(f64, f64)>;

    /// Convert geodetic `(lat, lon)` in degrees to an easting/northing pair in `crs`.
    fn from_geodetic(&self, lat: f64, lon: f64, crs: Crs) -> Result<(f64, f64)>;
}

/// Convert geodetic `(lat, lon)` to an easting/northing pair in `crs`.
///
/// Rejects coordinates that are not finite or lie outside ±90° / ±180°, and
/// results the projector could not place (PROJ reports those as infinities).
///
/// ```
/// use geoidkit::projection::{to_projected, CoordinateProjector, Crs};
/// # struct Identity;
/// # impl CoordinateProjector for Identity {
/// #     fn to_geodetic(&self, e: f64, n: f64, _: Crs) -> geoidkit::Result<(f64, f64)> { Ok((n, e)) }
/// #     fn from_geodetic(&self, lat: f64, lon: f64, _: Crs) -> geoidkit::Result<(f64, f64)> { Ok((lon, lat)) }
/// # }
///
/// let (e, n) = to_projected(&Identity, 46.5, -120.5, Crs::epsg(4326))?;
/// assert_eq!((e, n), (-120.5, 46.5));
/// assert!(to_projected(&Identity, 91.0, -120.5, Crs::epsg(4326)).is_err());
/// # Ok::<(), geoidkit::GeoidError>(())
/// ```
pub fn to_projected(
    projector: &dyn CoordinateProjector,
    lat: f64,
    lon: f64,
    crs: Crs,
) -> Result<(f64, f64)> {
    if !((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)) {
        return Err(GeoidError::Projection(format!(
            "invalid geodetic position lat={}, lon={}",
            lat, lon
        )));
    }
    let (easting, northing) = projector.from_geodetic(lat, lon, crs)?;
    finite_pair(easting, northing, crs)
}

/// Convert an easting/northing pair in `crs` to geodetic `(lat, lon)`.
///
/// Non-finite input or output is a [`GeoidError::Projection`].
pub fn to_geodetic(
    projector: &dyn CoordinateProjector,
    easting: f64,
    northing: f64,
    crs: Crs,
) -> Result<(f64, f64)> {
    finite_pair(easting, northing, crs)?;
    let (lat, lon) = projector.to_geodetic(easting, northing, crs)?;
    finite_pair(lat, lon, crs)
}

fn finite_pair(a: f64, b: f64, crs: Crs) -> Result<(f64, f64)> {
    if a.is_finite() && b.is_finite() {
        Ok((a, b))
    } else {
        Err(GeoidError::Projection(format!(
            "non-finite coordinates ({}, {}) in {}",
            a, b, crs
        )))
    }
}

/// [`CoordinateProjector`] backed by PROJ.
///
/// A transformation object is created per call; PROJ contexts are not
/// thread-safe and creating them is cheap next to a tile load.
#[cfg(feature = "proj")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjProjector;

#[cfg(feature = "proj")]
impl ProjProjector {
    /// Create a new projector.
    pub fn new() -> Self {
        Self
    }

    fn transformer(from: Crs, to: Crs) -> Result<proj::Proj> {
        proj::Proj::new_known_crs(&from.to_string(), &to.to_string(), None).map_err(|e| {
            let unknown = if from == Crs::WGS84 { to } else { from };
            GeoidError::UnknownCrs {
                crs: format!("{} ({})", unknown, e),
            }
        })
    }
}

#[cfg(feature = "proj")]
impl CoordinateProjector for ProjProjector {
    fn to_geodetic(&self, easting: f64, northing: f64, crs: Crs) -> Result<(f64, f64)> {
        let proj = Self::transformer(crs, Crs::WGS84)?;
        // Output axis order is normalized to (lon, lat).
        let (lon, lat) = proj
            .convert((easting, northing))
            .map_err(|e| GeoidError::Projection(e.to_string()))?;
        Ok((lat, lon))
    }

    fn from_geodetic(&self, lat: f64, lon: f64, crs: Crs) -> Result<(f64, f64)> {
        let proj = Self::transformer(Crs::WGS84, crs)?;
        proj.convert((lon, lat))
            .map_err(|e| GeoidError::Projection(e.to_string()))
    }
}
