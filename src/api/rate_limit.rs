//! Request quota enforcement for the price endpoints.

use crate::api::error::ErrorResponse;
use crate::api::state::AppState;
use crate::infrastructure::RateLimitDecision;
use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{request::Parts, Extensions, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::warn;

pub const QUOTA_EXHAUSTED_MESSAGE: &str = "You have exhausted your API Request Quota";

static REMAINING_HEADER: HeaderName = HeaderName::from_static("x-rate-limit-remaining");
static RETRY_AFTER_HEADER: HeaderName = HeaderName::from_static("x-rate-limit-retry-after-seconds");

/// Identity a request is counted against: peer address, else the first
/// `X-Forwarded-For` hop, else a shared anonymous bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKey(pub String);

impl ClientKey {
    pub fn from_parts(headers: &HeaderMap, extensions: &Extensions) -> Self {
        if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
            return Self(addr.ip().to_string());
        }

        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        Self(forwarded.unwrap_or("anonymous").to_string())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ClientKey {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(&parts.headers, &parts.extensions))
    }
}

/// Middleware counting each request against the caller's quota.
pub async fn enforce_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(limiter) = state.rate_limiter.clone() else {
        return next.run(request).await;
    };

    let ClientKey(client) = ClientKey::from_parts(request.headers(), request.extensions());

    match limiter.check_and_record(&client).await {
        RateLimitDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            response
                .headers_mut()
                .insert(REMAINING_HEADER.clone(), HeaderValue::from(remaining));
            response
        }
        RateLimitDecision::Rejected { retry_after } => {
            warn!("Rate limit exceeded for client {}", client);
            metrics::counter!("rate_limit_rejections_total").increment(1);

            let retry_after_secs = (retry_after.as_secs_f64().ceil() as u64).max(1);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER_HEADER.clone(), HeaderValue::from(retry_after_secs))],
                Json(ErrorResponse::new(
                    StatusCode::TOO_MANY_REQUESTS,
                    QUOTA_EXHAUSTED_MESSAGE,
                )),
            )
                .into_response()
        }
    }
}
