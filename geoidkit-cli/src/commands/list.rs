use anyhow::{bail, Result};
use geoidkit::TileRegistry;
use std::fs;

pub fn run(data_dir: Option<std::path::PathBuf>) -> Result<()> {
    let dir = super::resolve_data_dir(data_dir)?;

    if !dir.exists() {
        bail!("Data directory does not exist: {}", dir.display());
    }

    let registry = TileRegistry::geoid18_conus();

    let mut present = 0;
    let mut zipped = 0;
    let mut total_size: u64 = 0;

    println!(
        "{:<4} {:<14} {:>10} {:>26}",
        "ID", "FILE", "STATUS", "COVERAGE"
    );
    println!("{}", "-".repeat(57));

    for spec in registry.iter() {
        let path = dir.join(&spec.filename);
        let zip_path = dir.join(format!("{}.zip", spec.filename));

        let status = if let Ok(meta) = fs::metadata(&path) {
            present += 1;
            total_size += meta.len();
            super::format_size(meta.len())
        } else if let Ok(meta) = fs::metadata(&zip_path) {
            zipped += 1;
            total_size += meta.len();
            "zipped".to_string()
        } else {
            "missing".to_string()
        };

        let b = spec.bounds;
        let coverage = format!(
            "{:>2}..{:>2}N {:>4}..{:>4}E",
            b.min_lat, b.max_lat, b.min_lon, b.max_lon
        );

        println!(
            "{:<4} {:<14} {:>10} {:>26}",
            spec.id, spec.filename, status, coverage
        );
    }

    println!();
    println!("Summary:");
    println!("  Grids present: {} of {}", present, registry.len());
    if zipped > 0 {
        println!("  Zipped (extracted on first use): {}", zipped);
    }
    println!("  Total size: {}", super::format_size(total_size));
    println!("  Data directory: {}", dir.display());

    Ok(())
}
