//! geoidkit Service Library
//!
//! HTTP handlers, router and configuration helpers for the geoid service.
//! This library is used by both the geoidkit-service binary and integration tests.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use geoidkit::{GeoidService, TileBounds};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers.
pub struct AppState {
    /// Geoid service for undulation queries and height conversion.
    pub geoid_service: GeoidService,
}

// Re-export commonly used types for convenience
pub use handlers::{
    ErrorResponse, HealthResponse, HeightResponse, StatsResponse, TilesResponse,
    UndulationQuery, UndulationResponse,
};

/// OpenAPI documentation for the geoid service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "geoidkit Geoid Service",
        version = "0.1.0",
        description = "REST API for GEOID18 undulations and ellipsoid/geoid height conversion.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::get_undulation,
        handlers::post_undulation,
        handlers::get_geoid_height,
        handlers::get_ellipsoid_height,
        handlers::list_tiles,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::UndulationQuery,
            handlers::UndulationResponse,
            handlers::BatchUndulationRequest,
            handlers::BatchUndulationItem,
            handlers::BatchUndulationResponse,
            handlers::GeoidHeightQuery,
            handlers::EllipsoidHeightQuery,
            handlers::HeightResponse,
            handlers::TileInfo,
            handlers::TilesResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "geoid", description = "Undulation and height conversion endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
pub struct ApiDoc;

/// Build the application router with tracing, CORS and Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/undulation",
            get(handlers::get_undulation).post(handlers::post_undulation),
        )
        .route("/geoid-height", get(handlers::get_geoid_height))
        .route("/ellipsoid-height", get(handlers::get_ellipsoid_height))
        .route("/tiles", get(handlers::list_tiles))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

/// Parse the `GEOIDKIT_PRELOAD` environment variable value into bounding boxes.
///
/// Supported formats:
/// - `true`, `all`, `1`: preload every tile present (returns `None`)
/// - `min_lat,min_lon,max_lat,max_lon`: single bounding box
/// - `min_lat,min_lon,max_lat,max_lon;min_lat,min_lon,max_lat,max_lon`: several boxes
///
/// Unparseable input falls back to preloading everything.
pub fn parse_preload_bounds(value: &str) -> Option<Vec<TileBounds>> {
    let trimmed = value.trim();

    if matches!(trimmed.to_lowercase().as_str(), "true" | "all" | "1") {
        return None;
    }

    let boxes: Vec<TileBounds> = trimmed
        .split(';')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|bbox_str| {
            let parts: Vec<f64> = bbox_str
                .split(',')
                .filter_map(|s| s.trim().parse::<f64>().ok())
                .collect();
            if parts.len() == 4 {
                Some(TileBounds::new(parts[0], parts[1], parts[2], parts[3]))
            } else {
                tracing::warn!(
                    bbox = bbox_str,
                    "Invalid bounding box format, expected min_lat,min_lon,max_lat,max_lon"
                );
                None
            }
        })
        .collect();

    if boxes.is_empty() {
        tracing::warn!(
            value = trimmed,
            "Could not parse GEOIDKIT_PRELOAD value, preloading all tiles"
        );
        None
    } else {
        Some(boxes)
    }
}
