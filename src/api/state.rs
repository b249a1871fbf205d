use crate::application::CryptoService;
use crate::infrastructure::RateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub crypto_service: Arc<CryptoService>,
    /// `None` when rate limiting is disabled in configuration
    pub rate_limiter: Option<Arc<RateLimiter>>,
    /// `None` when no Prometheus recorder is installed (e.g. in tests)
    pub metrics: Option<PrometheusHandle>,
}
