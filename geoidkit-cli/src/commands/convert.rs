use anyhow::{Context, Result};
use geoidkit::{HeightConversion, Units};
use serde::Serialize;
use std::path::PathBuf;

use crate::Target;

#[derive(Serialize)]
struct ConversionResponse {
    lat: Option<f64>,
    lon: Option<f64>,
    input_height: f64,
    height: f64,
    height_units: &'static str,
    undulation_m: f64,
    undulation_ft: f64,
}

/// Unit of the converted height: the geoid side follows `units`, the
/// ellipsoid side is always meters.
pub(crate) fn output_units(target: Target, units: Units) -> Units {
    match target {
        Target::Geoid => units,
        Target::Ellipsoid => Units::Meters,
    }
}

fn print_result(
    position: (Option<f64>, Option<f64>),
    input_height: f64,
    result: &HeightConversion,
    units: Units,
    json: bool,
) -> Result<()> {
    if json {
        let response = ConversionResponse {
            lat: position.0,
            lon: position.1,
            input_height,
            height: result.height,
            height_units: units.label(),
            undulation_m: result.undulation_m,
            undulation_ft: result.undulation_ft,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{:.3} {}", result.height, units);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    data_dir: Option<PathBuf>,
    cache_size: u64,
    target: Target,
    lat: f64,
    lon: f64,
    height: f64,
    units: Units,
    json: bool,
) -> Result<()> {
    let service = super::build_service(data_dir, cache_size)?;

    let result = match target {
        Target::Geoid => service.geoid_from_ellipsoid(lat, lon, height, units),
        Target::Ellipsoid => service.ellipsoid_from_geoid(lat, lon, height, units),
    }
    .context("Failed to convert height")?;

    print_result(
        (Some(lat), Some(lon)),
        height,
        &result,
        output_units(target, units),
        json,
    )
}
