//! Integration tests for REST API endpoints
//!
//! These tests drive the in-process router against the bundled
//! `data/prices` histories.
//! Run with: `cargo test --test rest_api_test`

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use crypto_stats_gateway::api::routes::create_router;
use crypto_stats_gateway::api::state::AppState;
use crypto_stats_gateway::application::CryptoService;
use crypto_stats_gateway::domain::SupportedCurrencies;
use crypto_stats_gateway::infrastructure::LocalCsvRepository;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const CURRENCIES: &str = "BTC,DOGE,ETH,LTC,XRP";

fn data_dir() -> String {
    format!("{}/data/prices", env!("CARGO_MANIFEST_DIR"))
}

fn app_with(currencies: &str, directory: &str) -> Router {
    let source = Arc::new(LocalCsvRepository::new(directory, "_values.csv"));
    let state = AppState {
        crypto_service: Arc::new(CryptoService::new(
            SupportedCurrencies::parse(currencies),
            source,
        )),
        rate_limiter: None,
        metrics: None,
    };
    create_router(state, "*")
}

fn app() -> Router {
    app_with(CURRENCIES, &data_dir())
}

/// Helper function to make a GET request and decode the JSON body
async fn get_json(app: Router, path: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_statistics_btc() {
    let (status, body) = get_json(app(), "/api/statistics?currency=BTC").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["oldestPrice"].as_f64(), Some(46813.21));
    assert_eq!(body["newestPrice"].as_f64(), Some(38415.79));
    assert_eq!(body["minPrice"].as_f64(), Some(33276.59));
    assert_eq!(body["maxPrice"].as_f64(), Some(47722.66));
}

#[tokio::test]
async fn test_statistics_unsupported_currency() {
    let (status, body) = get_json(app(), "/api/statistics?currency=ABCD").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Currency not supported");
    assert_eq!(body["status"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_statistics_partial_symbol_is_not_supported() {
    let (status, body) = get_json(app(), "/api/statistics?currency=BT").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Currency not supported");
}

#[tokio::test]
async fn test_statistics_missing_parameter() {
    let (status, body) = get_json(app(), "/api/statistics").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("currency"));
}

#[tokio::test]
async fn test_max_normalized_range_missing_parameter() {
    let (status, body) = get_json(app(), "/api/max-normalized-range").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap().contains("date"));
}

#[tokio::test]
async fn test_statistics_missing_file() {
    let app = app_with("BTC,SOL", &data_dir());
    let (status, body) = get_json(app, "/api/statistics?currency=SOL").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("File missing = SOL_values.csv"));
}

#[tokio::test]
async fn test_max_normalized_range() {
    let (status, body) = get_json(app(), "/api/max-normalized-range?date=2022-01-03").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currency"], "ETH");
    assert_eq!(body["normalizedRange"].as_f64(), Some(1.0));
    // Two decimals survive on the wire
    assert_eq!(body["normalizedRange"].to_string(), "1.00");
}

#[tokio::test]
async fn test_max_normalized_range_invalid_date() {
    let (status, body) = get_json(app(), "/api/max-normalized-range?date=2022-21-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Date provided is invalid and must be in format YYYY-MM-dd = 2022-21-01"
    );
}

#[tokio::test]
async fn test_max_normalized_range_no_record() {
    let (status, body) = get_json(app(), "/api/max-normalized-range?date=2023-03-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("No record found in csv"));
    // First configured currency is evaluated first
    assert!(message.contains("BTC"));
}

#[tokio::test]
async fn test_normalized_list() {
    let (status, body) = get_json(app(), "/api/normalized-list").await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 5);

    let order: Vec<&str> = entries
        .iter()
        .map(|e| e["currency"].as_str().unwrap())
        .collect();
    assert_eq!(order, ["ETH", "BTC", "LTC", "XRP", "DOGE"]);

    let ranges: Vec<f64> = entries
        .iter()
        .map(|e| e["normalizedRange"].as_f64().unwrap())
        .collect();
    assert_eq!(ranges, [0.47, 0.43, 0.39, 0.38, 0.30]);
}

#[tokio::test]
async fn test_normalized_list_aborts_on_missing_file() {
    let app = app_with("BTC,SOL,ETH", &data_dir());
    let (status, body) = get_json(app, "/api/normalized-list").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("SOL_values.csv"));
}

#[tokio::test]
async fn test_currencies_endpoint() {
    let (status, body) = get_json(app(), "/api/currencies").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(
        body["currencies"],
        serde_json::json!(["BTC", "DOGE", "ETH", "LTC", "XRP"])
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get_json(app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["currencies"], 5);
    assert!(body.get("version").is_some());
}

#[tokio::test]
async fn test_health_degraded_without_data_directory() {
    let app = app_with(CURRENCIES, "/nonexistent/prices");
    let (status, body) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["dependencies"]["price_data"], "unavailable");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let response = app()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document() {
    let (status, body) = get_json(app(), "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/statistics").is_some());
    assert!(body["paths"].get("/api/normalized-list").is_some());
}

#[tokio::test]
async fn test_request_id_and_security_headers() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}
