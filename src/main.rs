//! Crypto Price Statistics Gateway
//!
//! A REST API computing price statistics and normalized price ranges for a
//! configured set of cryptocurrencies, read from per-currency history files.
//!
//! # Architecture
//!
//! The API follows clean/onion architecture with clear separation of concerns:
//! - **Domain**: Core entities, errors and the `PriceSource` trait
//! - **Application**: Statistics and ranking engines, validation, use cases
//! - **Infrastructure**: History file reader, rate limiter
//! - **API**: HTTP handlers, routing, and middleware
//!
//! # Configuration
//!
//! The API is configured via `config.yaml` and environment variables:
//! - `CONFIG_PATH`: Configuration file (default: config.yaml)
//! - `PORT`: Overrides `server.port`
//! - `PRICE_DATA_DIR`: Overrides `currency.directory`
//! - `RUST_LOG`: Logging level (default: info)
//! - `LOG_FORMAT`: `json` for structured output (default: text)
//!
//! Sending SIGHUP re-reads the configuration file without a restart.
//!
//! # Quick Start
//!
//! ```bash
//! cargo run --release
//!
//! curl http://localhost:8080/health
//! curl "http://localhost:8080/api/statistics?currency=BTC"
//! curl "http://localhost:8080/api/max-normalized-range?date=2022-01-03"
//! curl http://localhost:8080/api/normalized-list
//! ```

use anyhow::Context;
use crypto_stats_gateway::api::routes::create_router;
use crypto_stats_gateway::api::state::AppState;
use crypto_stats_gateway::application::CryptoService;
use crypto_stats_gateway::config::AppConfig;
use crypto_stats_gateway::domain::PriceSource;
use crypto_stats_gateway::infrastructure::{LocalCsvRepository, RateLimiter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn price_source(config: &AppConfig) -> Arc<dyn PriceSource> {
    let repo = LocalCsvRepository::new(&config.currency.directory, config.currency.file_suffix.clone());
    if repo.is_available() {
        tracing::info!("Price data directory available at: {}", config.currency.directory);
    } else {
        tracing::warn!(
            "Price data directory not available at: {}, requests will fail until it exists",
            config.currency.directory
        );
    }
    Arc::new(repo)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load Config
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = AppConfig::load(&config_path)?;

    // Application
    let supported = config.currency.supported_currencies();
    tracing::info!("Supported currencies: {:?}", supported.symbols());
    let crypto_service = Arc::new(CryptoService::new(supported, price_source(&config)));

    let rate_limiter = if config.rate_limit.enabled {
        tracing::info!(
            "Rate limiter initialized: {} requests per {}s",
            config.rate_limit.capacity,
            config.rate_limit.window_seconds
        );
        Some(Arc::new(RateLimiter::new(
            config.rate_limit.capacity,
            Duration::from_secs(config.rate_limit.window_seconds),
        )))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    #[cfg(unix)]
    tokio::spawn(reload_on_sighup(config_path, crypto_service.clone()));

    let state = AppState {
        crypto_service,
        rate_limiter,
        metrics,
    };

    let app = create_router(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("Crypto price API server running at http://{}", addr);

    // Graceful shutdown handling
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error during operation")?;

    Ok(())
}

/// Re-read the configuration on SIGHUP. A bad file keeps the running
/// configuration in place.
#[cfg(unix)]
async fn reload_on_sighup(config_path: String, service: Arc<CryptoService>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::warn!("Failed to install SIGHUP handler, config reload disabled: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        tracing::info!("Received SIGHUP, reloading {}", config_path);
        match AppConfig::load(&config_path) {
            Ok(config) => {
                service
                    .reload(config.currency.supported_currencies(), price_source(&config))
                    .await;
            }
            Err(e) => {
                tracing::warn!("Config reload failed, keeping previous configuration: {:#}", e);
            }
        }
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
