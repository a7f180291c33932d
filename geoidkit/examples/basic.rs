//! Basic example: undulation at one point in each GEOID18 CONUS tile.
//!
//! Run with: cargo run --example basic -- /path/to/geoid18

use geoidkit::{GeoidError, GeoidService};
use std::env;

fn main() -> Result<(), GeoidError> {
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/geoid18");
        std::process::exit(1);
    });

    let service = GeoidService::new(&data_dir, 8);

    let locations = [
        ("Central Washington", 46.722092, -119.593764),
        ("Western North Dakota", 47.774909, -103.038359),
        ("Northern Michigan", 44.932176, -85.050656),
        ("Northern Maine", 46.586622, -68.946552),
        ("Mojave Desert", 35.244635, -117.594686),
        ("Central Texas", 30.582375, -97.876989),
        ("Florida Panhandle", 30.535319, -84.822393),
        ("Outer Banks", 35.766048, -75.888771),
    ];

    println!("Geoid undulation (GEOID18):");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        match service.undulation_with_tile(*lat, *lon) {
            Ok(u) => {
                println!("{:<22} tile {}  N = {:8.3} m", name, u.tile, u.meters);
            }
            Err(GeoidError::FileNotFound { path }) => {
                println!("{:<22} grid not available ({})", name, path.display());
            }
            Err(e) => {
                println!("{:<22} error - {}", name, e);
            }
        }
    }

    let stats = service.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
