use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use geoidkit::Units;
use std::path::PathBuf;

mod commands;

/// Geoid undulation and height conversion CLI tool
#[derive(Parser)]
#[command(name = "geoidkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing GEOID18 .asc files
    #[arg(short, long, env = "GEOIDKIT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Maximum tiles in cache
    #[arg(
        short,
        long,
        env = "GEOIDKIT_CACHE_SIZE",
        default_value = "8",
        global = true
    )]
    cache_size: u64,

    #[command(subcommand)]
    command: Commands,
}

/// Which height a conversion produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// Ellipsoid height in, geoid height out
    Geoid,
    /// Geoid height in, ellipsoid height out
    Ellipsoid,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the geoid undulation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees (negative west)
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Convert an ellipsoid height (meters) to a geoid height
    Geoid {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Ellipsoid height in meters
        #[arg(long, allow_hyphen_values = true)]
        height: f64,

        /// Units of the resulting geoid height (m, ft, us-ft)
        #[arg(short, long, default_value = "m")]
        units: Units,

        #[arg(short, long)]
        json: bool,
    },

    /// Convert a geoid height to an ellipsoid height (meters)
    Ellipsoid {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Geoid height, in `--units`
        #[arg(long, allow_hyphen_values = true)]
        height: f64,

        /// Units of the input geoid height (m, ft, us-ft)
        #[arg(short, long, default_value = "m")]
        units: Units,

        #[arg(short, long)]
        json: bool,
    },

    /// Convert between lat/lon and a projected CRS, optionally converting a height
    #[cfg(feature = "proj")]
    #[command(group(
        clap::ArgGroup::new("position")
            .required(true)
            .args(["easting", "lat"])
    ))]
    Project {
        /// Easting in CRS units (converts to lat/lon)
        #[arg(long, requires = "northing", allow_hyphen_values = true)]
        easting: Option<f64>,

        /// Northing in CRS units
        #[arg(long, requires = "easting", allow_hyphen_values = true)]
        northing: Option<f64>,

        /// Latitude in decimal degrees (converts to easting/northing)
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude in decimal degrees
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Projected CRS, e.g. EPSG:2285
        #[arg(long)]
        crs: geoidkit::Crs,

        /// Height to convert (ellipsoid for --to geoid, geoid for --to ellipsoid)
        #[arg(long, allow_hyphen_values = true)]
        height: Option<f64>,

        /// Height to produce
        #[arg(long, value_enum, default_value = "geoid")]
        to: Target,

        /// Units of the geoid-referenced height (m, ft, us-ft)
        #[arg(short, long, default_value = "m")]
        units: Units,

        #[arg(short, long)]
        json: bool,
    },

    /// Process multiple coordinates from a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Output file (defaults to <input>_geoid.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude
        #[arg(long, default_value = "lon")]
        lon_col: String,

        /// Column holding a height to convert; only undulations are added if omitted
        #[arg(long)]
        height_col: Option<String>,

        /// Height to produce from --height-col
        #[arg(long, value_enum, default_value = "geoid")]
        to: Target,

        /// Units of the geoid-referenced height
        #[arg(short, long, default_value = "m")]
        units: Units,
    },

    /// Display information about a geoid grid
    Info {
        /// Path to .asc file, or tile id (e.g., 3 or u3)
        tile: Option<String>,

        /// Select the tile covering this latitude
        #[arg(long, requires = "lon", conflicts_with = "tile", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Select the tile covering this longitude
        #[arg(long, requires = "lat", conflicts_with = "tile", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List the GEOID18 tiles and which are present locally
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { lat, lon, json } => {
            commands::query::run(cli.data_dir, cli.cache_size, lat, lon, json)
        }
        Commands::Geoid {
            lat,
            lon,
            height,
            units,
            json,
        } => commands::convert::run(
            cli.data_dir,
            cli.cache_size,
            Target::Geoid,
            lat,
            lon,
            height,
            units,
            json,
        ),
        Commands::Ellipsoid {
            lat,
            lon,
            height,
            units,
            json,
        } => commands::convert::run(
            cli.data_dir,
            cli.cache_size,
            Target::Ellipsoid,
            lat,
            lon,
            height,
            units,
            json,
        ),
        #[cfg(feature = "proj")]
        Commands::Project {
            easting,
            northing,
            lat,
            lon,
            crs,
            height,
            to,
            units,
            json,
        } => {
            use commands::project::{HeightRequest, Position};

            let position = match (easting, northing, lat, lon) {
                (Some(easting), Some(northing), _, _) => Position::Projected { easting, northing },
                (_, _, Some(lat), Some(lon)) => Position::Geodetic { lat, lon },
                _ => anyhow::bail!("Specify --easting/--northing or --lat/--lon"),
            };
            let height = height.map(|height| HeightRequest {
                height,
                target: to,
                units,
            });
            commands::project::run(cli.data_dir, cli.cache_size, position, crs, height, json)
        }
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
            height_col,
            to,
            units,
        } => commands::batch::run(
            cli.data_dir,
            cli.cache_size,
            input,
            output,
            commands::batch::Columns {
                lat: lat_col,
                lon: lon_col,
                height: height_col,
            },
            to,
            units,
        ),
        Commands::Info { tile, lat, lon } => commands::info::run(cli.data_dir, tile, lat, lon),
        Commands::List => commands::list::run(cli.data_dir),
    }
}
