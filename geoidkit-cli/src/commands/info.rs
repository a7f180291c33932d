use anyhow::{bail, Context, Result};
use geoidkit::{GeoidTile, TileId, TileRegistry};
use std::path::PathBuf;

pub fn run(
    data_dir: Option<PathBuf>,
    tile: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    let registry = TileRegistry::geoid18_conus();

    let tile_path = match (tile, lat, lon) {
        (_, Some(lat), Some(lon)) => {
            let spec = registry
                .select(lat, lon)
                .context("No GEOID18 tile covers this location")?;
            super::resolve_data_dir(data_dir)?.join(&spec.filename)
        }
        (Some(tile), _, _) if tile.ends_with(".asc") => PathBuf::from(tile),
        (Some(tile), _, _) => {
            let id: TileId = tile
                .parse()
                .with_context(|| format!("Invalid tile id: {}", tile))?;
            let spec = registry
                .get(id)
                .with_context(|| format!("Unknown tile id: {}", id))?;
            super::resolve_data_dir(data_dir)?.join(&spec.filename)
        }
        _ => bail!("Specify a tile id, a path to an .asc file, or --lat and --lon"),
    };

    if !tile_path.exists() {
        bail!("Grid file not found: {}", tile_path.display());
    }

    let filename = tile_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let tile = GeoidTile::from_file(&tile_path).context("Failed to load grid")?;
    let header = tile.header();
    let file_size = std::fs::metadata(&tile_path)?.len();
    let (min_n, max_n) = tile.grid().min_max();

    println!("Grid: {}", filename);
    println!("Path: {}", tile_path.display());
    if let Some(spec) = registry.by_filename(&filename) {
        let b = spec.bounds;
        println!(
            "Tile: {} (selects {}..{} N, {}..{} E)",
            spec.id, b.min_lat, b.max_lat, b.min_lon, b.max_lon
        );
    }
    println!();
    println!(
        "Samples: {}x{} ({} values, kind {})",
        header.n_rows,
        header.n_cols,
        header.sample_count(),
        header.kind.code()
    );
    println!(
        "Spacing: {:.6}° lat x {:.6}° lon ({:.1}' x {:.1}')",
        header.dlat,
        header.dlon,
        header.dlat * 60.0,
        header.dlon * 60.0
    );
    println!(
        "Extent: {:.4}..{:.4} N, {:.4}..{:.4} E",
        header.lat0,
        header.lat_max(),
        header.lon0,
        header.lon_max()
    );
    println!("File size: {}", super::format_size(file_size));
    println!();
    println!("Min undulation: {:.3}m", min_n);
    println!("Max undulation: {:.3}m", max_n);

    Ok(())
}
