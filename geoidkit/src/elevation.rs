//! Ellipsoid ⇄ geoid height conversion.
//!
//! With `N` the geoid undulation at a point:
//!
//! - geoid (orthometric) height `H = h - N`
//! - ellipsoid height `h = H + N`
//!
//! Ellipsoid heights are always in meters, as delivered by GNSS receivers.
//! The [`Units`] argument only selects the unit of the geoid-referenced
//! height: it is the unit of the *output* of [`geoid_from_ellipsoid`] and of
//! the *input* of [`ellipsoid_from_geoid`].

use std::fmt;
use std::str::FromStr;

pub use crate::tile::METERS_TO_FEET;

/// Feet to meters.
pub const FEET_TO_METERS: f64 = 0.3048;

/// Linear units offered for heights and projected coordinates.
///
/// Both foot variants convert heights identically. The distinction matters
/// only when choosing a projected coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Units {
    /// Meters.
    #[default]
    Meters,
    /// International feet (0.3048 m).
    InternationalFeet,
    /// US survey feet.
    SurveyFeet,
}

impl Units {
    /// Whether the geoid-referenced height is expressed in feet.
    pub fn is_feet(&self) -> bool {
        !matches!(self, Units::Meters)
    }

    /// Short label used in output (`m`, `ft`, `us-ft`).
    pub fn label(&self) -> &'static str {
        match self {
            Units::Meters => "m",
            Units::InternationalFeet => "ft",
            Units::SurveyFeet => "us-ft",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unknown unit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseUnitsError(String);

impl fmt::Display for ParseUnitsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown units {:?} (expected m, ft, int-ft or us-ft)",
            self.0
        )
    }
}

impl std::error::Error for ParseUnitsError {}

impl FromStr for Units {
    type Err = ParseUnitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" | "metre" | "metres" => Ok(Units::Meters),
            "ft" | "feet" | "int-ft" | "intft" | "international-feet" => {
                Ok(Units::InternationalFeet)
            }
            "us-ft" | "usft" | "survey-ft" | "survey-feet" | "us-survey-feet" => {
                Ok(Units::SurveyFeet)
            }
            _ => Err(ParseUnitsError(s.to_string())),
        }
    }
}

/// Result of a height conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightConversion {
    /// Converted height (see the function docs for its unit).
    pub height: f64,
    /// Geoid undulation in meters.
    pub undulation_m: f64,
    /// Geoid undulation in feet.
    pub undulation_ft: f64,
}

/// Convert an ellipsoid height (meters) to a geoid height.
///
/// The result is in feet when `units` is a foot variant, meters otherwise.
///
/// ```
/// use geoidkit::elevation::{geoid_from_ellipsoid, Units};
///
/// let r = geoid_from_ellipsoid(-21.32, 100.0, Units::Meters);
/// assert!((r.height - 121.32).abs() < 1e-9);
/// ```
pub fn geoid_from_ellipsoid(
    undulation_m: f64,
    ellipsoid_height: f64,
    units: Units,
) -> HeightConversion {
    let mut height = ellipsoid_height - undulation_m;
    if units.is_feet() {
        height *= METERS_TO_FEET;
    }
    HeightConversion {
        height,
        undulation_m,
        undulation_ft: undulation_m * METERS_TO_FEET,
    }
}

/// Convert a geoid height to an ellipsoid height in meters.
///
/// When `units` is a foot variant the geoid height is read as feet and
/// converted to meters first; the ellipsoid height is always meters.
///
/// ```
/// use geoidkit::elevation::{ellipsoid_from_geoid, Units};
///
/// let r = ellipsoid_from_geoid(-21.32, 100.0, Units::InternationalFeet);
/// assert!((r.height - (100.0 * 0.3048 - 21.32)).abs() < 1e-9);
/// ```
pub fn ellipsoid_from_geoid(
    undulation_m: f64,
    geoid_height: f64,
    units: Units,
) -> HeightConversion {
    let geoid_m = if units.is_feet() {
        geoid_height * FEET_TO_METERS
    } else {
        geoid_height
    };
    HeightConversion {
        height: geoid_m + undulation_m,
        undulation_m,
        undulation_ft: undulation_m * METERS_TO_FEET,
    }
}
