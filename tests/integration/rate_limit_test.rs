//! Integration tests for the request quota on the price endpoints
//!
//! Run with: `cargo test --test rate_limit_test`

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use crypto_stats_gateway::api::rate_limit::QUOTA_EXHAUSTED_MESSAGE;
use crypto_stats_gateway::api::routes::create_router;
use crypto_stats_gateway::api::state::AppState;
use crypto_stats_gateway::application::CryptoService;
use crypto_stats_gateway::domain::SupportedCurrencies;
use crypto_stats_gateway::infrastructure::{LocalCsvRepository, RateLimiter};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const CAPACITY: u32 = 4;

fn limited_app() -> Router {
    let source = Arc::new(LocalCsvRepository::new(
        format!("{}/data/prices", env!("CARGO_MANIFEST_DIR")),
        "_values.csv",
    ));
    let state = AppState {
        crypto_service: Arc::new(CryptoService::new(
            SupportedCurrencies::parse("BTC,DOGE,ETH,LTC,XRP"),
            source,
        )),
        rate_limiter: Some(Arc::new(RateLimiter::new(
            CAPACITY,
            Duration::from_secs(60),
        ))),
        metrics: None,
    };
    create_router(state, "*")
}

fn request(path: &str, client: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-forwarded-for", client)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_quota_exhausted_after_capacity() {
    let app = limited_app();

    for i in 0..CAPACITY {
        let response = app
            .clone()
            .oneshot(request("/api/currencies", "198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["x-rate-limit-remaining"],
            (CAPACITY - i - 1).to_string().as_str()
        );
    }

    let response = app
        .clone()
        .oneshot(request("/api/statistics?currency=BTC", "198.51.100.7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response
        .headers()
        .contains_key("x-rate-limit-retry-after-seconds"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], QUOTA_EXHAUSTED_MESSAGE);
    assert_eq!(body["status"], "TOO_MANY_REQUESTS");
}

#[tokio::test]
async fn test_quota_is_per_client() {
    let app = limited_app();

    for _ in 0..CAPACITY {
        app.clone()
            .oneshot(request("/api/currencies", "198.51.100.7"))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(request("/api/currencies", "203.0.113.42"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_system_endpoints_are_not_counted() {
    let app = limited_app();

    for _ in 0..(CAPACITY * 2) {
        let response = app
            .clone()
            .oneshot(request("/health", "198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(request("/api/currencies", "198.51.100.7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_status_endpoint() {
    let app = limited_app();

    app.clone()
        .oneshot(request("/api/currencies", "198.51.100.7"))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("/rate-limit", "198.51.100.7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["limit"], CAPACITY);
    assert_eq!(body["used"], 1);
    assert_eq!(body["remaining"], CAPACITY - 1);
}
