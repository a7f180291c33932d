//! Convert a GNSS ellipsoid height to a geoid height and back.
//!
//! Run with: cargo run --example height_conversion -- /path/to/geoid18 [lat lon h]

use geoidkit::{GeoidError, GeoidService, Units};
use std::env;

fn main() -> Result<(), GeoidError> {
    let args: Vec<String> = env::args().collect();
    let Some(data_dir) = args.get(1) else {
        eprintln!("Usage: cargo run --example height_conversion -- /path/to/geoid18 [lat lon h]");
        std::process::exit(1);
    };

    let parse = |i: usize, default: f64| {
        args.get(i)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(default)
    };
    let lat = parse(2, 46.722092);
    let lon = parse(3, -119.593764);
    let ellipsoid_height = parse(4, 250.0);

    let service = GeoidService::new(data_dir, 8);

    println!(
        "Ellipsoid height {:.3} m at ({}, {}):",
        ellipsoid_height, lat, lon
    );
    println!("{:-<50}", "");

    for units in [Units::Meters, Units::SurveyFeet] {
        let r = service.geoid_from_ellipsoid(lat, lon, ellipsoid_height, units)?;
        println!("Geoid height:     {:10.3} {}", r.height, units);

        // Back again; the ellipsoid height always comes out in meters.
        let back = service.ellipsoid_from_geoid(lat, lon, r.height, units)?;
        println!("Round trip:       {:10.3} m", back.height);
    }

    let n = service.undulation(lat, lon)?;
    println!("Undulation:       {:10.3} m ({:.3} ft)", n, n * geoidkit::METERS_TO_FEET);

    Ok(())
}
