//! HTTP request handlers for the geoid service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geoidkit::{GeoidError, HeightConversion, Units, METERS_TO_FEET};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the undulation endpoint.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UndulationQuery {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees (negative west).
    pub lon: f64,
}

/// Geoid undulation at a point.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UndulationResponse {
    /// Latitude queried.
    pub lat: f64,
    /// Longitude queried.
    pub lon: f64,
    /// GEOID18 tile that served the query.
    pub tile: u8,
    /// Undulation in meters.
    pub undulation_m: f64,
    /// Undulation in feet.
    pub undulation_ft: f64,
}

/// Batch undulation request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchUndulationRequest {
    /// Points to query.
    pub points: Vec<UndulationQuery>,
}

/// One result of a batch request.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchUndulationItem {
    pub lat: f64,
    pub lon: f64,
    /// Undulation in meters, absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undulation_m: Option<f64>,
    /// Error message, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch undulation response, in request order.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchUndulationResponse {
    pub results: Vec<BatchUndulationItem>,
}

/// Query parameters for ellipsoid to geoid conversion.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct GeoidHeightQuery {
    pub lat: f64,
    pub lon: f64,
    /// Ellipsoid height in meters.
    pub ellipsoid_height: f64,
    /// Units of the returned geoid height: `m` (default), `ft`, `us-ft`.
    pub units: Option<String>,
}

/// Query parameters for geoid to ellipsoid conversion.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EllipsoidHeightQuery {
    pub lat: f64,
    pub lon: f64,
    /// Geoid height, in `units`.
    pub geoid_height: f64,
    /// Units of `geoid_height`: `m` (default), `ft`, `us-ft`.
    pub units: Option<String>,
}

/// Result of a height conversion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HeightResponse {
    pub lat: f64,
    pub lon: f64,
    /// Height as given in the request.
    pub input_height: f64,
    /// Converted height.
    pub height: f64,
    /// Units of `height`.
    pub height_units: String,
    /// Undulation in meters.
    pub undulation_m: f64,
    /// Undulation in feet.
    pub undulation_ft: f64,
}

/// A registry tile.
#[derive(Debug, Serialize, ToSchema)]
pub struct TileInfo {
    pub id: u8,
    pub filename: String,
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
    /// Whether the tile is currently loaded.
    pub cached: bool,
}

/// Registry listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct TilesResponse {
    pub tiles: Vec<TileInfo>,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of tiles in cache.
    pub cached_tiles: u64,
    /// Maximum number of tiles in cache.
    pub cache_capacity: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Get the geoid undulation at a point.
#[utoipa::path(
    get,
    path = "/undulation",
    tag = "geoid",
    params(UndulationQuery),
    responses(
        (status = 200, description = "Undulation found", body = UndulationResponse),
        (status = 400, description = "Location not covered", body = ErrorResponse),
        (status = 404, description = "Grid file missing", body = ErrorResponse),
        (status = 500, description = "Unexpected error", body = ErrorResponse)
    )
)]
pub async fn get_undulation(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UndulationQuery>,
) -> Response {
    tracing::debug!(lat = query.lat, lon = query.lon, "Undulation query");

    match state.geoid_service.undulation_with_tile(query.lat, query.lon) {
        Ok(u) => {
            tracing::info!(
                lat = query.lat,
                lon = query.lon,
                tile = %u.tile,
                undulation = u.meters,
                "Undulation found"
            );
            (
                StatusCode::OK,
                Json(UndulationResponse {
                    lat: query.lat,
                    lon: query.lon,
                    tile: u.tile.0,
                    undulation_m: u.meters,
                    undulation_ft: u.meters * METERS_TO_FEET,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(query.lat, query.lon, e),
    }
}

/// Undulations for many points in one request.
#[utoipa::path(
    post,
    path = "/undulation",
    tag = "geoid",
    request_body = BatchUndulationRequest,
    responses(
        (status = 200, description = "Per-point results", body = BatchUndulationResponse)
    )
)]
pub async fn post_undulation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchUndulationRequest>,
) -> Json<BatchUndulationResponse> {
    let coords: Vec<(f64, f64)> = request.points.iter().map(|p| (p.lat, p.lon)).collect();
    let undulations = state.geoid_service.undulations_batch(&coords);

    let failed = undulations.iter().filter(|r| r.is_err()).count();
    tracing::info!(points = coords.len(), failed = failed, "Batch undulation query");

    let results = coords
        .into_iter()
        .zip(undulations)
        .map(|((lat, lon), r)| match r {
            Ok(n) => BatchUndulationItem {
                lat,
                lon,
                undulation_m: Some(n),
                error: None,
            },
            Err(e) => BatchUndulationItem {
                lat,
                lon,
                undulation_m: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    Json(BatchUndulationResponse { results })
}

/// Convert an ellipsoid height to a geoid height.
#[utoipa::path(
    get,
    path = "/geoid-height",
    tag = "geoid",
    params(GeoidHeightQuery),
    responses(
        (status = 200, description = "Geoid height", body = HeightResponse),
        (status = 400, description = "Invalid units or location not covered", body = ErrorResponse),
        (status = 404, description = "Grid file missing", body = ErrorResponse)
    )
)]
pub async fn get_geoid_height(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeoidHeightQuery>,
) -> Response {
    let units = match parse_units(query.units.as_deref()) {
        Ok(units) => units,
        Err(response) => return response,
    };

    match state.geoid_service.geoid_from_ellipsoid(
        query.lat,
        query.lon,
        query.ellipsoid_height,
        units,
    ) {
        Ok(r) => height_response(query.lat, query.lon, query.ellipsoid_height, &r, units),
        Err(e) => error_response(query.lat, query.lon, e),
    }
}

/// Convert a geoid height to an ellipsoid height (meters).
#[utoipa::path(
    get,
    path = "/ellipsoid-height",
    tag = "geoid",
    params(EllipsoidHeightQuery),
    responses(
        (status = 200, description = "Ellipsoid height in meters", body = HeightResponse),
        (status = 400, description = "Invalid units or location not covered", body = ErrorResponse),
        (status = 404, description = "Grid file missing", body = ErrorResponse)
    )
)]
pub async fn get_ellipsoid_height(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EllipsoidHeightQuery>,
) -> Response {
    let units = match parse_units(query.units.as_deref()) {
        Ok(units) => units,
        Err(response) => return response,
    };

    match state
        .geoid_service
        .ellipsoid_from_geoid(query.lat, query.lon, query.geoid_height, units)
    {
        Ok(r) => height_response(
            query.lat,
            query.lon,
            query.geoid_height,
            &r,
            Units::Meters,
        ),
        Err(e) => error_response(query.lat, query.lon, e),
    }
}

/// List the configured tiles.
#[utoipa::path(
    get,
    path = "/tiles",
    tag = "geoid",
    responses((status = 200, description = "Tile registry", body = TilesResponse))
)]
pub async fn list_tiles(State(state): State<Arc<AppState>>) -> Json<TilesResponse> {
    let service = &state.geoid_service;
    let tiles = service
        .registry()
        .iter()
        .map(|spec| TileInfo {
            id: spec.id.0,
            filename: spec.filename.clone(),
            min_lat: spec.bounds.min_lat,
            min_lon: spec.bounds.min_lon,
            max_lat: spec.bounds.max_lat,
            max_lon: spec.bounds.max_lon,
            cached: service.is_cached(spec.id),
        })
        .collect();

    Json(TilesResponse { tiles })
}

fn parse_units(units: Option<&str>) -> Result<Units, Response> {
    match units {
        None => Ok(Units::Meters),
        Some(s) => s.parse::<Units>().map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }),
    }
}

fn height_response(
    lat: f64,
    lon: f64,
    input_height: f64,
    r: &HeightConversion,
    units: Units,
) -> Response {
    tracing::info!(
        lat = lat,
        lon = lon,
        height = r.height,
        undulation = r.undulation_m,
        "Height converted"
    );
    (
        StatusCode::OK,
        Json(HeightResponse {
            lat,
            lon,
            input_height,
            height: r.height,
            height_units: units.label().to_string(),
            undulation_m: r.undulation_m,
            undulation_ft: r.undulation_ft,
        }),
    )
        .into_response()
}

/// Map a library error to a status code and JSON body.
fn error_response(lat: f64, lon: f64, e: GeoidError) -> Response {
    let status = match &e {
        GeoidError::UnsupportedLocation { .. } | GeoidError::OutOfGridBounds { .. } => {
            StatusCode::BAD_REQUEST
        }
        GeoidError::FileNotFound { .. } | GeoidError::UnknownTile { .. } => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!(lat = lat, lon = lon, error = %e, "Geoid query failed");

    (status, Json(ErrorResponse { error: e.to_string() })).into_response()
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Get cache statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Cache statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.geoid_service.cache_stats();

    Json(StatsResponse {
        cached_tiles: stats.entry_count,
        cache_capacity: state.geoid_service.cache_capacity(),
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}
