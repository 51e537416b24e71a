//! Configuration management

use anyhow::{Context, Result};

use crate::defaults::{DEFAULT_NOMINATIM_RATE_LIMIT_MS, DEFAULT_ORACLE_CONCURRENCY};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// "mock" or "nominatim"
    pub geocoder_backend: String,

    /// Nominatim API URL (for geocoding)
    pub nominatim_url: String,

    /// Minimum interval between Nominatim requests
    pub nominatim_rate_limit_ms: u64,

    /// Valhalla routing engine URL (optional, falls back to mock if unavailable)
    pub valhalla_url: Option<String>,

    /// Maximum concurrent travel oracle requests
    pub oracle_concurrency: usize,

    /// Directory for rotated log files
    pub logs_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoder_backend: "mock".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            nominatim_rate_limit_ms: DEFAULT_NOMINATIM_RATE_LIMIT_MS,
            valhalla_url: None,
            oracle_concurrency: DEFAULT_ORACLE_CONCURRENCY,
            logs_dir: "./logs".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let geocoder_backend = std::env::var("GEOCODER_BACKEND")
            .unwrap_or(defaults.geocoder_backend);

        let nominatim_url = std::env::var("NOMINATIM_URL")
            .unwrap_or(defaults.nominatim_url);

        let nominatim_rate_limit_ms = match std::env::var("NOMINATIM_RATE_LIMIT_MS") {
            Ok(value) => value
                .parse()
                .context("NOMINATIM_RATE_LIMIT_MS must be a whole number of milliseconds")?,
            Err(_) => defaults.nominatim_rate_limit_ms,
        };

        let valhalla_url = std::env::var("VALHALLA_URL").ok().filter(|url| !url.is_empty());

        let oracle_concurrency = match std::env::var("ORACLE_CONCURRENCY") {
            Ok(value) => value
                .parse()
                .context("ORACLE_CONCURRENCY must be a positive integer")?,
            Err(_) => defaults.oracle_concurrency,
        };

        if oracle_concurrency == 0 {
            anyhow::bail!("ORACLE_CONCURRENCY must be at least 1");
        }

        let logs_dir = std::env::var("LOGS_DIR").unwrap_or(defaults.logs_dir);

        Ok(Self {
            geocoder_backend,
            nominatim_url,
            nominatim_rate_limit_ms,
            valhalla_url,
            oracle_concurrency,
            logs_dir,
        })
    }
}
