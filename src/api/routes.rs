use crate::api::doc::ApiDoc;
use crate::api::handlers::{
    currencies_handler, health_handler, max_normalized_range_handler, metrics_handler,
    normalized_list_handler, rate_limit_handler, statistics_handler,
};
use crate::api::rate_limit::enforce_rate_limit;
use crate::api::state::AppState;
use axum::{middleware, routing::get, Router};

use axum::http::HeaderValue;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure CORS from a comma-separated origin list ("*" allows any origin).
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    // Parse comma-separated origins, filter out invalid ones
    let origin_values: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    match origin_values.len() {
        0 => {
            tracing::warn!("No valid CORS origins found, falling back to permissive CORS");
            CorsLayer::permissive()
        }
        1 => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin_values[0].clone()))
            .allow_methods(Any)
            .allow_headers(Any),
        _ => CorsLayer::new()
            .allow_origin(AllowOrigin::list(origin_values))
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

pub fn create_router(state: AppState, allowed_origins: &str) -> Router {
    // Create middleware stack with security headers and observability
    let middleware_stack = ServiceBuilder::new()
        // Request tracing and metrics
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();

                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %method,
                        path = %uri.path(),
                        uri = %uri
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: Duration,
                     _span: &tracing::Span| {
                        let status_code = response.status().as_u16();

                        metrics::counter!(
                            "http_requests_total",
                            "status" => status_code.to_string(),
                            "status_class" => format!("{}xx", status_code / 100)
                        )
                        .increment(1);
                        metrics::histogram!(
                            "http_request_duration_seconds",
                            "status" => status_code.to_string()
                        )
                        .record(latency.as_secs_f64());

                        // Log slow requests
                        if latency.as_millis() > 1000 {
                            tracing::warn!("Slow HTTP request: {}ms", latency.as_millis());
                        }
                    },
                )
                .on_failure(
                    |_error: tower_http::classify::ServerErrorsFailureClass,
                     _latency: Duration,
                     _span: &tracing::Span| {
                        metrics::counter!("http_requests_total", "status" => "error", "status_class" => "5xx")
                            .increment(1);
                    },
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(60),
        ))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(cors_layer(allowed_origins));

    // Price endpoints count against the caller's request quota
    let price_api = Router::new()
        .route("/api/statistics", get(statistics_handler))
        .route("/api/max-normalized-range", get(max_normalized_range_handler))
        .route("/api/normalized-list", get(normalized_list_handler))
        .route("/api/currencies", get(currencies_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // System endpoints
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/rate-limit", get(rate_limit_handler))
        .merge(price_api)
        .layer(middleware_stack)
        .with_state(state)
}
