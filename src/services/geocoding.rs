//! Geocoding abstraction layer
//!
//! - `MockGeocoder` for tests and offline runs (deterministic, no network)
//! - `NominatimGeocoder` for production (minimum interval between requests)
//!
//! Selected via `GEOCODER_BACKEND` ("mock" or "nominatim").

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::GeocodeError;
use crate::services::nominatim::NominatimClient;
use crate::types::Point;

/// Geocoder trait - abstraction for all geocoding implementations
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text address; `NotFound` when the upstream has zero results
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError>;

    /// Get the name of this geocoder implementation
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub location: Point,
    /// Canonical address as formatted by the geocoder
    pub formatted_address: String,
}

// ==========================================================================
// MockGeocoder
// ==========================================================================

/// Deterministic geocoder: coordinates derived from a hash of the address,
/// spread over a small box around a fixed centre.
pub struct MockGeocoder {
    center: Point,
    span_degrees: f64,
}

impl MockGeocoder {
    pub fn new() -> Self {
        // Central Prague, ~20 km box
        Self::around(Point::new(50.0755, 14.4378), 0.2)
    }

    pub fn around(center: Point, span_degrees: f64) -> Self {
        Self { center, span_degrees }
    }

    fn hash_to_point(&self, address: &str) -> Point {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        address.trim().to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        let lat_normalized = ((hash >> 32) as f64) / (u32::MAX as f64);
        let lng_normalized = ((hash & 0xFFFF_FFFF) as f64) / (u32::MAX as f64);

        Point::new(
            self.center.lat + (lat_normalized - 0.5) * self.span_degrees,
            self.center.lng + (lng_normalized - 0.5) * self.span_degrees,
        )
    }
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        if address.trim().is_empty() {
            return Err(GeocodeError::NotFound(address.to_string()));
        }

        Ok(GeocodedAddress {
            location: self.hash_to_point(address),
            formatted_address: address.trim().to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ==========================================================================
// RateLimiter
// ==========================================================================

/// Enforces a minimum interval between consecutive calls
pub struct RateLimiter {
    last_call: Arc<Mutex<Option<Instant>>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Arc::new(Mutex::new(None)),
            min_interval,
        }
    }

    /// Wait until it's safe to make another call
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

// ==========================================================================
// NominatimGeocoder
// ==========================================================================

/// Nominatim geocoder with a minimum interval between requests
pub struct NominatimGeocoder {
    client: NominatimClient,
    rate_limiter: RateLimiter,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, rate_limit_interval: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: NominatimClient::new(base_url)?,
            rate_limiter: RateLimiter::new(rate_limit_interval),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
        self.rate_limiter.wait().await;

        match self.client.search(address).await {
            Ok(Some(found)) => Ok(GeocodedAddress {
                location: found.location,
                formatted_address: found.display_name,
            }),
            Ok(None) => Err(GeocodeError::NotFound(address.to_string())),
            Err(e) => {
                tracing::error!("Geocoding failed for '{}': {:#}", address, e);
                Err(GeocodeError::Upstream {
                    address: address.to_string(),
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

// ==========================================================================
// Factory
// ==========================================================================

/// Create the geocoder selected by `config.geocoder_backend`
pub fn create_geocoder(config: &Config) -> anyhow::Result<Box<dyn Geocoder>> {
    match config.geocoder_backend.as_str() {
        "mock" => {
            tracing::info!("Using MockGeocoder");
            Ok(Box::new(MockGeocoder::new()))
        }
        "nominatim" => {
            tracing::info!("Using NominatimGeocoder at {}", config.nominatim_url);
            Ok(Box::new(NominatimGeocoder::new(
                &config.nominatim_url,
                Duration::from_millis(config.nominatim_rate_limit_ms),
            )?))
        }
        other => {
            tracing::warn!("Unknown GEOCODER_BACKEND '{}', using mock", other);
            Ok(Box::new(MockGeocoder::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_geocoder_returns_deterministic_coordinates() {
        let geocoder = MockGeocoder::new();

        let first = geocoder.geocode("12 Oak St").await.unwrap();
        let second = geocoder.geocode("12 Oak St").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn mock_geocoder_separates_different_addresses() {
        let geocoder = MockGeocoder::new();

        let oak = geocoder.geocode("12 Oak St").await.unwrap();
        let elm = geocoder.geocode("4 Elm Rd").await.unwrap();

        assert_ne!(oak.location, elm.location);
    }

    #[tokio::test]
    async fn mock_geocoder_stays_inside_box() {
        let center = Point::new(40.0, -75.0);
        let geocoder = MockGeocoder::around(center, 0.1);

        for address in ["1 Main St", "2 Main St", "3 Main St", "School Lane"] {
            let found = geocoder.geocode(address).await.unwrap();
            assert!((found.location.lat - center.lat).abs() <= 0.05);
            assert!((found.location.lng - center.lng).abs() <= 0.05);
        }
    }

    #[tokio::test]
    async fn mock_geocoder_rejects_blank_address() {
        let geocoder = MockGeocoder::new();
        let result = geocoder.geocode("   ").await;
        assert!(matches!(result, Err(GeocodeError::NotFound(_))));
    }

    #[test]
    fn mock_geocoder_name_is_mock() {
        assert_eq!(MockGeocoder::new().name(), "mock");
    }

    #[tokio::test]
    async fn rate_limiter_enforces_minimum_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(50), "First call should be immediate");

        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100),
            "Second call should wait at least 100ms, took {:?}", start.elapsed());
    }

    #[tokio::test]
    async fn rate_limiter_allows_call_after_interval() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        limiter.wait().await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(20));
    }

    #[test]
    fn nominatim_geocoder_has_correct_name() {
        let geocoder =
            NominatimGeocoder::new("https://nominatim.openstreetmap.org", Duration::from_millis(1500)).unwrap();
        assert_eq!(geocoder.name(), "nominatim");
    }

    #[tokio::test]
    async fn nominatim_geocoder_maps_transport_failure_to_upstream_error() {
        let geocoder = NominatimGeocoder::new("http://127.0.0.1:1", Duration::from_millis(1)).unwrap();
        let result = geocoder.geocode("12 Oak St").await;
        assert!(matches!(result, Err(GeocodeError::Upstream { .. })));
    }

    #[test]
    fn factory_falls_back_to_mock_for_unknown_backend() {
        let config = Config {
            geocoder_backend: "carrier-pigeon".to_string(),
            ..Config::default()
        };
        assert_eq!(create_geocoder(&config).unwrap().name(), "mock");
    }
}
