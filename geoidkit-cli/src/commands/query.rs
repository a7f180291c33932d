use anyhow::{Context, Result};
use geoidkit::METERS_TO_FEET;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct UndulationResponse {
    lat: f64,
    lon: f64,
    tile: u8,
    undulation_m: f64,
    undulation_ft: f64,
}

pub fn run(
    data_dir: Option<PathBuf>,
    cache_size: u64,
    lat: f64,
    lon: f64,
    json: bool,
) -> Result<()> {
    let service = super::build_service(data_dir, cache_size)?;

    let u = service
        .undulation_with_tile(lat, lon)
        .context("Failed to get geoid undulation")?;

    if json {
        let response = UndulationResponse {
            lat,
            lon,
            tile: u.tile.0,
            undulation_m: u.meters,
            undulation_ft: u.meters * METERS_TO_FEET,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{:.3}", u.meters);
    }

    Ok(())
}
