use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Price handlers
        crate::api::handlers::statistics_handler,
        crate::api::handlers::max_normalized_range_handler,
        crate::api::handlers::normalized_list_handler,
        crate::api::handlers::currencies_handler,
        // System handlers
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler,
        crate::api::handlers::rate_limit_handler
    ),
    components(
        schemas(
            crate::domain::Statistics,
            crate::domain::NormalizedRange,
            crate::api::error::ErrorResponse,
            crate::api::handlers::CurrenciesResponse,
            crate::api::handlers::HealthResponse,
            crate::api::handlers::HealthDependencies,
            crate::api::handlers::RateLimitInfo
        )
    ),
    tags(
        (name = "prices", description = "Price statistics and normalized range rankings"),
        (name = "system", description = "System endpoints for health checks, metrics and quotas")
    ),
    info(
        title = "Crypto Price Statistics API",
        version = "0.1.0",
        description = "REST API exposing statistics and normalized price ranges computed from per-currency price history files."
    )
)]
pub struct ApiDoc;
