//! Integration tests for the HTTP API.

use axum::http::StatusCode;
use axum_test::TestServer;
use geoidkit::GeoidService;
use geoidkit_service::{router, AppState};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Write a one-degree grid in GEOID18 layout with undulation `f(lat, lon)`.
fn create_test_tile(
    dir: &Path,
    filename: &str,
    (lat0, lon0): (f64, f64),
    (rows, cols): (usize, usize),
    f: impl Fn(f64, f64) -> f64,
) {
    let mut text = format!("{} {} 1.0 1.0 {} {} 1\n", lat0, lon0 + 360.0, rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let n = f(lat0 + i as f64, lon0 + j as f64);
            write!(text, "{:.6} ", n).unwrap();
        }
        text.push('\n');
    }
    std::fs::write(dir.join(filename), text).unwrap();
}

/// Tile 1 (40..58 N, -130..-111 E) with a constant undulation.
fn create_tile_u1(dir: &Path, undulation: f64) {
    create_test_tile(dir, "g2018u1.asc", (40.0, -130.0), (19, 20), |_, _| {
        undulation
    });
}

fn create_test_server(temp_dir: &TempDir) -> TestServer {
    let geoid_service = GeoidService::new(temp_dir.path(), 8);
    let state = Arc::new(AppState { geoid_service });
    TestServer::new(router(state)).unwrap()
}

#[tokio::test]
async fn test_undulation_endpoint_success() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -21.32);

    let server = create_test_server(&temp_dir);

    let response = server
        .get("/undulation?lat=46.722092&lon=-119.593764")
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["tile"], 1);
    assert_eq!(json["lat"], 46.722092);
    assert_eq!(json["lon"], -119.593764);
    assert!((json["undulation_m"].as_f64().unwrap() - -21.32).abs() < 1e-6);
    assert!((json["undulation_ft"].as_f64().unwrap() - -69.94).abs() < 0.01);
}

#[tokio::test]
async fn test_undulation_endpoint_interpolates() {
    let temp_dir = TempDir::new().unwrap();
    create_test_tile(
        temp_dir.path(),
        "g2018u6.asc",
        (24.0, -113.0),
        (19, 20),
        |lat, lon| 0.25 * lat + 0.1 * lon - 20.0,
    );

    let server = create_test_server(&temp_dir);

    let response = server.get("/undulation?lat=30.582375&lon=-97.876989").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["tile"], 6);
    let expected = 0.25 * 30.582375 + 0.1 * -97.876989 - 20.0;
    assert!((json["undulation_m"].as_f64().unwrap() - expected).abs() < 1e-5);
}

#[tokio::test]
async fn test_undulation_endpoint_unsupported_location() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/undulation?lat=0&lon=0").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("not covered"));
}

#[tokio::test]
async fn test_undulation_endpoint_missing_tile() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/undulation?lat=46.7&lon=-119.6").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("g2018u1.asc"));
}

#[tokio::test]
async fn test_undulation_endpoint_malformed_tile() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("g2018u1.asc"), "40 230 1 1\n").unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/undulation?lat=46.7&lon=-119.6").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_undulation_endpoint_missing_params() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/undulation?lat=46.7").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/undulation?lon=-119.6").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server.get("/undulation?lat=abc&lon=-119.6").await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_undulation() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -21.0);

    let server = create_test_server(&temp_dir);

    let response = server
        .post("/undulation")
        .json(&json!({
            "points": [
                { "lat": 46.722092, "lon": -119.593764 },
                { "lat": 0.0, "lon": 0.0 },
                { "lat": 47.0, "lon": -120.0 }
            ]
        }))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!((results[0]["undulation_m"].as_f64().unwrap() - -21.0).abs() < 1e-6);
    assert!(results[0].get("error").is_none());
    assert!(results[1].get("undulation_m").is_none());
    assert!(results[1]["error"].as_str().is_some());
    assert!((results[2]["undulation_m"].as_f64().unwrap() - -21.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_geoid_height_meters() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -21.32);

    let server = create_test_server(&temp_dir);

    let response = server
        .get("/geoid-height?lat=46.722092&lon=-119.593764&ellipsoid_height=250")
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["height_units"], "m");
    assert_eq!(json["input_height"], 250.0);
    assert!((json["height"].as_f64().unwrap() - 271.32).abs() < 1e-6);
    assert!((json["undulation_m"].as_f64().unwrap() - -21.32).abs() < 1e-6);
}

#[tokio::test]
async fn test_geoid_height_feet() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -20.0);

    let server = create_test_server(&temp_dir);

    let response = server
        .get("/geoid-height?lat=46.5&lon=-120.5&ellipsoid_height=100&units=us-ft")
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["height_units"], "us-ft");
    assert!((json["height"].as_f64().unwrap() - 120.0 * 3.28084).abs() < 1e-6);
}

#[tokio::test]
async fn test_ellipsoid_height_feet_input_returns_meters() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -20.0);

    let server = create_test_server(&temp_dir);

    let response = server
        .get("/ellipsoid-height?lat=46.5&lon=-120.5&geoid_height=1000&units=ft")
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["height_units"], "m");
    assert!((json["height"].as_f64().unwrap() - (304.8 - 20.0)).abs() < 1e-6);
}

#[tokio::test]
async fn test_height_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    create_test_tile(
        temp_dir.path(),
        "g2018u1.asc",
        (40.0, -130.0),
        (19, 20),
        |lat, lon| -30.0 + 0.2 * lat + 0.05 * lon,
    );

    let server = create_test_server(&temp_dir);

    let geoid: Value = server
        .get("/geoid-height?lat=46.722092&lon=-119.593764&ellipsoid_height=512.25")
        .await
        .json();
    let h = geoid["height"].as_f64().unwrap();

    let ellipsoid: Value = server
        .get(&format!(
            "/ellipsoid-height?lat=46.722092&lon=-119.593764&geoid_height={}",
            h
        ))
        .await
        .json();
    assert!((ellipsoid["height"].as_f64().unwrap() - 512.25).abs() < 1e-6);
}

#[tokio::test]
async fn test_height_invalid_units() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -20.0);

    let server = create_test_server(&temp_dir);

    let response = server
        .get("/geoid-height?lat=46.5&lon=-120.5&ellipsoid_height=100&units=fathoms")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert!(json["error"].as_str().unwrap().contains("fathoms"));
}

#[tokio::test]
async fn test_tiles_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -21.0);

    let server = create_test_server(&temp_dir);
    server.get("/undulation?lat=46.7&lon=-119.6").await;

    let response = server.get("/tiles").await;

    response.assert_status_ok();
    let json: Value = response.json();
    let tiles = json["tiles"].as_array().unwrap();
    assert_eq!(tiles.len(), 8);
    assert_eq!(tiles[0]["filename"], "g2018u1.asc");
    assert_eq!(tiles[0]["cached"], true);
    assert_eq!(tiles[5]["id"], 6);
    assert_eq!(tiles[5]["min_lat"], 24.0);
    assert_eq!(tiles[5]["max_lon"], -94.0);
    assert_eq!(tiles[5]["cached"], false);
}

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn test_stats_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    create_tile_u1(temp_dir.path(), -21.0);

    let server = create_test_server(&temp_dir);

    let response = server.get("/stats").await;
    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["cache_hits"], 0);
    assert_eq!(json["cache_misses"], 0);
    assert_eq!(json["cache_capacity"], 8);

    server.get("/undulation?lat=46.7&lon=-119.6").await;
    let json: Value = server.get("/stats").await.json();
    assert_eq!(json["cache_misses"], 1);
    assert_eq!(json["cached_tiles"], 1);

    server.get("/undulation?lat=47.1&lon=-118.2").await;
    let json: Value = server.get("/stats").await.json();
    assert_eq!(json["cache_hits"], 1);
    assert_eq!(json["cache_misses"], 1);
}

#[tokio::test]
async fn test_openapi_document() {
    let temp_dir = TempDir::new().unwrap();
    let server = create_test_server(&temp_dir);

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status_ok();
    let json: Value = response.json();
    let paths = json["paths"].as_object().unwrap();
    for path in [
        "/undulation",
        "/geoid-height",
        "/ellipsoid-height",
        "/tiles",
        "/health",
        "/stats",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
