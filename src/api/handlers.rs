use crate::api::error::{price_error_response, ErrorResponse};
use crate::api::rate_limit::ClientKey;
use crate::api::state::AppState;
use crate::domain::{NormalizedRange, Statistics};
use axum::{
    extract::{FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

const VERSION: &str = env!("CARGO_PKG_VERSION");

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

#[derive(Deserialize, IntoParams, Debug, Validate)]
pub struct StatisticsQuery {
    /// Currency symbol to compute statistics for
    #[param(example = "BTC")]
    #[validate(length(min = 1, max = 16))]
    pub currency: String,
}

#[derive(Deserialize, IntoParams, Debug, Validate)]
pub struct DateQuery {
    /// Calendar day in YYYY-MM-DD format
    #[param(example = "2022-01-03")]
    #[validate(length(min = 1, max = 64))]
    pub date: String,
}

/// `Query` extractor that validates its parameters and reports both
/// deserialization and validation failures as an [`ErrorResponse`].
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

fn bad_request(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(StatusCode::BAD_REQUEST, message)),
    )
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| bad_request(rejection.body_text()))?;
        query
            .validate()
            .map_err(|e| bad_request(format!("Invalid parameters: {}", e)))?;
        Ok(Self(query))
    }
}

/// Oldest/newest/min/max price for a currency.
#[utoipa::path(
    get,
    path = "/api/statistics",
    params(StatisticsQuery),
    tag = "prices",
    responses(
        (status = 200, description = "Statistics collected successfully", body = Statistics,
            example = json!({
                "oldestPrice": 46813.21,
                "newestPrice": 38415.79,
                "minPrice": 33276.59,
                "maxPrice": 47722.66
            })
        ),
        (status = 400, description = "Missing parameter, currency not supported, or its history is missing or unreadable", body = ErrorResponse,
            example = json!({"message": "Currency not supported", "status": "BAD_REQUEST"})
        ),
        (status = 422, description = "History holds no observations", body = ErrorResponse),
        (status = 429, description = "Request quota exhausted", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn statistics_handler(
    ValidatedQuery(query): ValidatedQuery<StatisticsQuery>,
    State(state): State<AppState>,
) -> ApiResult<Statistics> {
    metrics::counter!("price_api_requests_total", "endpoint" => "statistics").increment(1);

    state
        .crypto_service
        .fetch_statistics(&query.currency)
        .await
        .map(Json)
        .map_err(price_error_response)
}

/// Currency with the highest normalized price on a given day.
#[utoipa::path(
    get,
    path = "/api/max-normalized-range",
    params(DateQuery),
    tag = "prices",
    responses(
        (status = 200, description = "Crypto with highest normalized range returned successfully", body = NormalizedRange,
            example = json!({"normalizedRange": 1.0, "currency": "ETH"})
        ),
        (status = 400, description = "Invalid date, or a currency has no record for that day", body = ErrorResponse,
            example = json!({"message": "No record found in csv for BTC on date 2023-03-01", "status": "BAD_REQUEST"})
        ),
        (status = 422, description = "Normalized range undefined for a flat history", body = ErrorResponse),
        (status = 429, description = "Request quota exhausted", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn max_normalized_range_handler(
    ValidatedQuery(query): ValidatedQuery<DateQuery>,
    State(state): State<AppState>,
) -> ApiResult<NormalizedRange> {
    metrics::counter!("price_api_requests_total", "endpoint" => "max_normalized_range")
        .increment(1);

    state
        .crypto_service
        .find_highest_normalized_crypto(&query.date)
        .await
        .map(Json)
        .map_err(price_error_response)
}

/// Every currency ranked by normalized range, highest first.
#[utoipa::path(
    get,
    path = "/api/normalized-list",
    tag = "prices",
    responses(
        (status = 200, description = "Sorted list returned successfully", body = Vec<NormalizedRange>),
        (status = 400, description = "A currency history is missing or unreadable", body = ErrorResponse),
        (status = 422, description = "A currency history is empty or has a zero minimum", body = ErrorResponse),
        (status = 429, description = "Request quota exhausted", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn normalized_list_handler(State(state): State<AppState>) -> ApiResult<Vec<NormalizedRange>> {
    metrics::counter!("price_api_requests_total", "endpoint" => "normalized_list").increment(1);

    state
        .crypto_service
        .sorted_normalized_list()
        .await
        .map(Json)
        .map_err(price_error_response)
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CurrenciesResponse {
    /// Supported symbols in ranking order
    pub currencies: Vec<String>,
    pub count: usize,
}

/// Supported currencies in configured order.
#[utoipa::path(
    get,
    path = "/api/currencies",
    tag = "prices",
    responses(
        (status = 200, description = "Supported currencies", body = CurrenciesResponse,
            example = json!({"currencies": ["BTC", "DOGE", "ETH", "LTC", "XRP"], "count": 5})
        )
    )
)]
pub async fn currencies_handler(State(state): State<AppState>) -> Json<CurrenciesResponse> {
    let currencies = state.crypto_service.supported_currencies().await;
    Json(CurrenciesResponse {
        count: currencies.len(),
        currencies,
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub currencies: usize,
    pub dependencies: HealthDependencies,
}

#[derive(Serialize, ToSchema)]
pub struct HealthDependencies {
    pub price_data: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Health check passed", body = HealthResponse),
        (status = 503, description = "Price data directory unavailable", body = HealthResponse)
    )
)]
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let data_available = state.crypto_service.is_source_available().await;

    let response = HealthResponse {
        status: if data_available { "ok" } else { "degraded" }.to_string(),
        version: VERSION.to_string(),
        currencies: state.crypto_service.supported_currencies().await.len(),
        dependencies: HealthDependencies {
            price_data: if data_available { "available" } else { "unavailable" }.to_string(),
        },
    };

    if data_available {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain"),
        (status = 404, description = "Metrics recorder not installed")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
    pub used: u32,
}

/// Get the caller's rate limit status.
///
/// Returns the quota window for the requesting client. This endpoint is not
/// itself counted against the quota.
#[utoipa::path(
    get,
    path = "/rate-limit",
    tag = "system",
    responses(
        (status = 200, description = "Rate limit status retrieved successfully", body = RateLimitInfo,
            example = json!({
                "limit": 100,
                "remaining": 97,
                "reset": 1735678800,
                "used": 3
            })
        ),
        (status = 404, description = "Rate limiting disabled", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn rate_limit_handler(
    client: ClientKey,
    State(state): State<AppState>,
) -> ApiResult<RateLimitInfo> {
    let Some(limiter) = &state.rate_limiter else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                StatusCode::NOT_FOUND,
                "Rate limiting is disabled",
            )),
        ));
    };

    let stats = limiter.get_stats(&client.0).await;
    Ok(Json(RateLimitInfo {
        limit: stats.limit,
        remaining: stats.remaining,
        reset: stats.reset,
        used: stats.used,
    }))
}
