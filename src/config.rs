//! Application configuration loaded from `config.yaml`.

use crate::domain::CurrencySettings;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// Server configuration (host, port, CORS origins)
    pub server: ServerConfig,
    /// Supported currencies and where their histories live
    pub currency: CurrencySettings,
    /// Request quota for the price endpoints
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration settings.
///
/// Defines how the HTTP server should bind and what CORS origins to allow.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Requests allowed per client within one window
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            capacity: default_capacity(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_enabled() -> bool {
    true
}
fn default_capacity() -> u32 {
    100
}
fn default_window_seconds() -> u64 {
    60
}

impl AppConfig {
    /// Read and validate the configuration file, then apply the `PORT` and
    /// `PRICE_DATA_DIR` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read {} - ensure file exists in working directory",
                path.display()
            )
        })?;

        let mut config = Self::from_yaml(&content).with_context(|| {
            format!("Invalid configuration in {}", path.display())
        })?;
        config.apply_env_overrides(
            std::env::var("PORT").ok(),
            std::env::var("PRICE_DATA_DIR").ok(),
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .context("Failed to parse config - check YAML syntax and structure")?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, port: Option<String>, data_dir: Option<String>) {
        if let Some(port) = port.and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.currency.directory = dir;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.currency.supported_currencies().is_empty() {
            bail!("currency.supported must list at least one symbol");
        }
        if self.currency.file_suffix.trim().is_empty() {
            bail!("currency.file_suffix must not be empty");
        }
        if self.rate_limit.enabled && (self.rate_limit.capacity == 0 || self.rate_limit.window_seconds == 0) {
            bail!("rate_limit.capacity and rate_limit.window_seconds must be positive");
        }
        Ok(())
    }
}
