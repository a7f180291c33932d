//! geoidkit Service - HTTP microservice for geoid undulation queries.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `GEOIDKIT_DATA_DIR` | Directory containing GEOID18 .asc files | Required |
//! | `GEOIDKIT_CACHE_SIZE` | Maximum tiles in cache | 8 |
//! | `GEOIDKIT_PORT` | HTTP server port | 8080 |
//! | `GEOIDKIT_PRELOAD` | `all`, or `min_lat,min_lon,max_lat,max_lon[;...]` | None |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /undulation?lat=X&lon=Y` - Geoid undulation at coordinates
//! - `POST /undulation` - Batch undulation query
//! - `GET /geoid-height?lat=X&lon=Y&ellipsoid_height=H&units=U` - Ellipsoid to geoid height
//! - `GET /ellipsoid-height?lat=X&lon=Y&geoid_height=H&units=U` - Geoid to ellipsoid height
//! - `GET /tiles` - Tile registry
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use geoidkit::GeoidServiceBuilder;
use geoidkit_service::{parse_preload_bounds, router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geoidkit_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("GEOIDKIT_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // GEOIDKIT_DATA_DIR and GEOIDKIT_CACHE_SIZE are read by the library
    let geoid_service = match GeoidServiceBuilder::from_env() {
        Ok(builder) => builder.build(),
        Err(_) => {
            tracing::warn!("GEOIDKIT_DATA_DIR not set, using current directory");
            GeoidServiceBuilder::new(".").build()
        }
    };

    let available = geoid_service.scan_tile_files();
    tracing::info!(
        data_dir = %geoid_service.data_dir().display(),
        cache_capacity = geoid_service.cache_capacity(),
        tiles_available = available.len(),
        tiles_configured = geoid_service.registry().len(),
        port = port,
        "Starting geoid service"
    );
    if available.is_empty() {
        tracing::warn!("No GEOID18 grid files found; every query will fail with 404");
    }

    if let Ok(preload_val) = std::env::var("GEOIDKIT_PRELOAD") {
        let bounds = parse_preload_bounds(&preload_val);
        let bounds_ref = bounds.as_deref();
        tracing::info!(
            bounds = ?bounds_ref.map(|b| b.len()),
            "Preloading tiles into cache"
        );
        let stats = geoid_service.preload(bounds_ref);
        tracing::info!(
            tiles_loaded = stats.tiles_loaded,
            tiles_already_cached = stats.tiles_already_cached,
            tiles_failed = stats.tiles_failed,
            tiles_matched = stats.tiles_matched,
            elapsed_ms = stats.elapsed_ms,
            "Preload complete"
        );
    }

    let app = router(Arc::new(AppState { geoid_service }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
