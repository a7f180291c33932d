use anyhow::{Context, Result};
use geoidkit::projection::{self, CoordinateProjector};
use geoidkit::{Crs, GeoidService, HeightConversion, ProjProjector, Units};
use serde::Serialize;
use std::path::PathBuf;

use crate::Target;

/// How the point was given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    Geodetic { lat: f64, lon: f64 },
    Projected { easting: f64, northing: f64 },
}

/// Height to convert at the point.
#[derive(Debug, Clone, Copy)]
pub struct HeightRequest {
    pub height: f64,
    pub target: Target,
    pub units: Units,
}

/// The point in both coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Located {
    lat: f64,
    lon: f64,
    easting: f64,
    northing: f64,
}

#[derive(Serialize)]
struct ProjectResponse {
    crs: String,
    lat: f64,
    lon: f64,
    easting: f64,
    northing: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height_units: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    undulation_m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    undulation_ft: Option<f64>,
}

fn locate(projector: &dyn CoordinateProjector, position: Position, crs: Crs) -> Result<Located> {
    match position {
        Position::Geodetic { lat, lon } => {
            let (easting, northing) = projection::to_projected(projector, lat, lon, crs)
                .with_context(|| format!("Failed to project ({lat}, {lon}) to {crs}"))?;
            Ok(Located {
                lat,
                lon,
                easting,
                northing,
            })
        }
        Position::Projected { easting, northing } => {
            let (lat, lon) = projection::to_geodetic(projector, easting, northing, crs)
                .with_context(|| {
                    format!("Failed to convert ({easting}, {northing}) in {crs} to lat/lon")
                })?;
            Ok(Located {
                lat,
                lon,
                easting,
                northing,
            })
        }
    }
}

fn convert_height(
    service: &GeoidService,
    projector: &dyn CoordinateProjector,
    position: Position,
    crs: Crs,
    request: &HeightRequest,
) -> Result<HeightConversion> {
    let HeightRequest {
        height,
        target,
        units,
    } = *request;

    let result = match (position, target) {
        (Position::Geodetic { lat, lon }, Target::Geoid) => {
            service.geoid_from_ellipsoid(lat, lon, height, units)
        }
        (Position::Geodetic { lat, lon }, Target::Ellipsoid) => {
            service.ellipsoid_from_geoid(lat, lon, height, units)
        }
        (Position::Projected { easting, northing }, Target::Geoid) => service
            .geoid_from_ellipsoid_projected(projector, easting, northing, crs, height, units),
        (Position::Projected { easting, northing }, Target::Ellipsoid) => service
            .ellipsoid_from_geoid_projected(projector, easting, northing, crs, height, units),
    };
    result.context("Failed to convert height")
}

pub fn run(
    data_dir: Option<PathBuf>,
    cache_size: u64,
    position: Position,
    crs: Crs,
    height: Option<HeightRequest>,
    json: bool,
) -> Result<()> {
    let projector = ProjProjector::new();
    let located = locate(&projector, position, crs)?;

    // Grids are only needed when a height is converted.
    let conversion = match &height {
        Some(request) => {
            let service = super::build_service(data_dir, cache_size)?;
            Some(convert_height(&service, &projector, position, crs, request)?)
        }
        None => None,
    };
    let units = height.map(|r| super::convert::output_units(r.target, r.units));

    if json {
        let response = ProjectResponse {
            crs: crs.to_string(),
            lat: located.lat,
            lon: located.lon,
            easting: located.easting,
            northing: located.northing,
            input_height: height.map(|r| r.height),
            height: conversion.map(|c| c.height),
            height_units: units.map(|u| u.label()),
            undulation_m: conversion.map(|c| c.undulation_m),
            undulation_ft: conversion.map(|c| c.undulation_ft),
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("Lat/Lon: {:.8}, {:.8}", located.lat, located.lon);
        println!(
            "{}: {:.3} E, {:.3} N",
            crs, located.easting, located.northing
        );
        if let (Some(c), Some(u)) = (conversion, units) {
            println!("Height: {:.3} {}", c.height, u);
        }
    }
    Ok(())
}
