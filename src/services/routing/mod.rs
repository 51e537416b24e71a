//! Travel time/distance oracle
//!
//! Uses Valhalla for production, a haversine estimate for offline runs and tests.

mod valhalla;
#[cfg(test)]
pub mod testing;

pub use valhalla::{ValhallaClient, ValhallaConfig};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use futures::{stream, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::OracleError;
use crate::services::geo;
use crate::types::Point;

/// Expected travel between two points
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelEstimate {
    pub duration_minutes: f64,
    pub distance_km: f64,
}

/// Target instant of a query, for time-of-day traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeAnchor {
    DepartAt(NaiveDateTime),
    ArriveBy(NaiveDateTime),
}

impl TimeAnchor {
    pub fn instant(&self) -> NaiveDateTime {
        match self {
            TimeAnchor::DepartAt(at) | TimeAnchor::ArriveBy(at) => *at,
        }
    }
}

/// Instant `minutes` after midnight of `date`; negative values fall on the previous day
pub fn instant_at(date: NaiveDate, minutes: f64) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN) + chrono::Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

/// Travel oracle abstraction (Valhalla, mock, etc.)
#[async_trait]
pub trait TravelEstimator: Send + Sync {
    /// Expected travel from `origin` to `destination` around `anchor`
    async fn estimate(
        &self,
        origin: Point,
        destination: Point,
        anchor: TimeAnchor,
    ) -> Result<TravelEstimate, OracleError>;

    /// Estimates for every origin/destination combination, `[origin][destination]`
    async fn estimate_many(
        &self,
        origins: &[Point],
        destinations: &[Point],
        anchor: TimeAnchor,
    ) -> Result<Vec<Vec<TravelEstimate>>, OracleError> {
        let mut rows = Vec::with_capacity(origins.len());
        for origin in origins {
            let mut row = Vec::with_capacity(destinations.len());
            for destination in destinations {
                row.push(self.estimate(*origin, *destination, anchor).await?);
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Get service name for logging
    fn name(&self) -> &str;
}

/// Estimate independent point pairs with at most `concurrency` requests in flight.
///
/// Results come back in the order of `pairs` regardless of completion order.
pub async fn estimate_pairs(
    oracle: &dyn TravelEstimator,
    pairs: &[(Point, Point)],
    anchor: TimeAnchor,
    concurrency: usize,
) -> Result<Vec<TravelEstimate>, OracleError> {
    stream::iter(
        pairs
            .iter()
            .map(|(origin, destination)| oracle.estimate(*origin, *destination, anchor)),
    )
    .buffered(concurrency.max(1))
    .try_collect()
    .await
}

/// Offline oracle: haversine distance × road coefficient at a constant speed
pub struct MockTravelEstimator {
    road_coefficient: f64,
    average_speed_kmh: f64,
}

impl Default for MockTravelEstimator {
    fn default() -> Self {
        Self {
            road_coefficient: geo::ROAD_COEFFICIENT,
            average_speed_kmh: geo::AVERAGE_SPEED_KMH,
        }
    }
}

impl MockTravelEstimator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TravelEstimator for MockTravelEstimator {
    async fn estimate(
        &self,
        origin: Point,
        destination: Point,
        _anchor: TimeAnchor,
    ) -> Result<TravelEstimate, OracleError> {
        let distance_km = geo::road_distance(&origin, &destination, self.road_coefficient);
        Ok(TravelEstimate {
            duration_minutes: geo::travel_time_minutes(distance_km, self.average_speed_kmh),
            distance_km,
        })
    }

    fn name(&self) -> &str {
        "MockRouting"
    }
}

type CacheKey = (u64, u64, u64, u64, TimeAnchor);

/// Memoizes answers of an inner oracle for the lifetime of one run
pub struct CachingEstimator {
    inner: Arc<dyn TravelEstimator>,
    cache: Mutex<HashMap<CacheKey, TravelEstimate>>,
}

impl CachingEstimator {
    pub fn new(inner: Arc<dyn TravelEstimator>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn key(origin: &Point, destination: &Point, anchor: TimeAnchor) -> CacheKey {
        (
            origin.lat.to_bits(),
            origin.lng.to_bits(),
            destination.lat.to_bits(),
            destination.lng.to_bits(),
            anchor,
        )
    }
}

#[async_trait]
impl TravelEstimator for CachingEstimator {
    async fn estimate(
        &self,
        origin: Point,
        destination: Point,
        anchor: TimeAnchor,
    ) -> Result<TravelEstimate, OracleError> {
        let key = Self::key(&origin, &destination, anchor);
        let hit = self.cache.lock().get(&key).copied();
        if let Some(hit) = hit {
            return Ok(hit);
        }

        let estimate = self.inner.estimate(origin, destination, anchor).await?;
        self.cache.lock().insert(key, estimate);
        Ok(estimate)
    }

    async fn estimate_many(
        &self,
        origins: &[Point],
        destinations: &[Point],
        anchor: TimeAnchor,
    ) -> Result<Vec<Vec<TravelEstimate>>, OracleError> {
        let rows = self.inner.estimate_many(origins, destinations, anchor).await?;
        let mut cache = self.cache.lock();
        for (origin, row) in origins.iter().zip(&rows) {
            for (destination, estimate) in destinations.iter().zip(row) {
                cache.insert(Self::key(origin, destination, anchor), *estimate);
            }
        }
        Ok(rows)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Create the travel oracle with automatic Valhalla detection and fallback
///
/// Tries Valhalla if a URL is configured. Falls back to the mock estimator
/// if Valhalla is unavailable or not configured.
pub async fn create_travel_estimator_with_fallback(
    valhalla_url: Option<String>,
) -> Arc<dyn TravelEstimator> {
    if let Some(url) = valhalla_url {
        match check_valhalla_health(&url).await {
            Ok(()) => match ValhallaClient::new(ValhallaConfig::new(&url)) {
                Ok(client) => {
                    info!("Valhalla routing service available at {}", url);
                    return Arc::new(client);
                }
                Err(e) => warn!("Cannot build Valhalla client: {}. Falling back to mock routing.", e),
            },
            Err(e) => {
                warn!("Valhalla not available at {}: {}. Falling back to mock routing.", url, e);
            }
        }
    }

    info!("Using mock routing service (Valhalla not configured or unavailable)");
    Arc::new(MockTravelEstimator::new())
}

/// Check if Valhalla is healthy by making a simple status request
async fn check_valhalla_health(base_url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;

    let url = format!("{}/status", base_url);
    debug!("Probing Valhalla at {}", url);
    let response = client.get(&url).send().await?;

    if response.status().is_success() {
        Ok(())
    } else {
        anyhow::bail!("Valhalla returned status {}", response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::TableEstimator;
    use super::*;

    fn prague() -> Point {
        Point::new(50.0755, 14.4378)
    }

    fn brno() -> Point {
        Point::new(49.1951, 16.6068)
    }

    fn anchor() -> TimeAnchor {
        TimeAnchor::ArriveBy(instant_at(NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(), 480.0))
    }

    #[test]
    fn test_instant_at_handles_previous_day() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let at = instant_at(date, -15.0);
        assert_eq!(at.to_string(), "2026-08-31 23:45:00");

        let at = instant_at(date, 465.5);
        assert_eq!(at.to_string(), "2026-09-01 07:45:30");
    }

    #[tokio::test]
    async fn test_mock_estimate_same_point_is_zero() {
        let oracle = MockTravelEstimator::new();
        let estimate = oracle.estimate(prague(), prague(), anchor()).await.unwrap();
        assert_eq!(estimate.distance_km, 0.0);
        assert_eq!(estimate.duration_minutes, 0.0);
    }

    #[tokio::test]
    async fn test_mock_estimate_prague_brno() {
        let oracle = MockTravelEstimator::new();
        let estimate = oracle.estimate(prague(), brno(), anchor()).await.unwrap();

        // ~185 km straight line, ~240 km road, ~6 hours at 40 km/h
        assert!(estimate.distance_km > 200.0 && estimate.distance_km < 280.0,
            "Expected ~240 km, got {} km", estimate.distance_km);
        let hours = estimate.duration_minutes / 60.0;
        assert!(hours > 5.0 && hours < 8.0, "Expected ~6 hours, got {} hours", hours);
    }

    #[tokio::test]
    async fn test_default_estimate_many_fills_matrix() {
        let oracle = MockTravelEstimator::new();
        let points = [prague(), brno()];
        let matrix = oracle.estimate_many(&points, &points, anchor()).await.unwrap();

        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0][0].distance_km, 0.0);
        assert!((matrix[0][1].distance_km - matrix[1][0].distance_km).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_estimate_pairs_preserves_submission_order() {
        let a = Point::new(50.0, 14.0);
        let b = Point::new(50.1, 14.0);
        let c = Point::new(50.2, 14.0);
        let oracle = TableEstimator::new()
            .with_leg(a, b, 10.0, 1.0)
            .with_leg(b, c, 20.0, 2.0)
            .with_leg(c, a, 30.0, 3.0)
            .with_latency_ms_per_minute(1);

        let pairs = vec![(c, a), (a, b), (b, c)];
        let estimates = estimate_pairs(&oracle, &pairs, anchor(), 3).await.unwrap();

        let durations: Vec<f64> = estimates.iter().map(|e| e.duration_minutes).collect();
        assert_eq!(durations, vec![30.0, 10.0, 20.0]);
    }

    #[tokio::test]
    async fn test_estimate_pairs_propagates_failure() {
        let a = Point::new(50.0, 14.0);
        let b = Point::new(50.1, 14.0);
        let oracle = TableEstimator::new().with_leg(a, b, 10.0, 1.0).strict();

        let result = estimate_pairs(&oracle, &[(a, b), (b, a)], anchor(), 2).await;
        assert!(matches!(result, Err(OracleError::NoRoute { .. })));
    }

    #[tokio::test]
    async fn test_caching_estimator_queries_inner_once() {
        let a = Point::new(50.0, 14.0);
        let b = Point::new(50.1, 14.0);
        let inner = Arc::new(TableEstimator::new().with_leg(a, b, 12.0, 4.0));
        let cached = CachingEstimator::new(inner.clone());

        let first = cached.estimate(a, b, anchor()).await.unwrap();
        let second = cached.estimate(a, b, anchor()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls(), 1);
        assert_eq!(cached.cached_len(), 1);
    }

    #[tokio::test]
    async fn test_caching_estimator_serves_pairs_from_a_matrix() {
        let a = Point::new(50.0, 14.0);
        let b = Point::new(50.1, 14.0);
        let inner = Arc::new(TableEstimator::new().with_symmetric_leg(a, b, 12.0, 4.0));
        let cached = CachingEstimator::new(inner.clone());

        let matrix = cached.estimate_many(&[a, b], &[a, b], anchor()).await.unwrap();
        assert_eq!(inner.calls(), 4);
        assert_eq!(cached.cached_len(), 4);

        let single = cached.estimate(b, a, anchor()).await.unwrap();
        assert_eq!(single, matrix[1][0]);
        assert_eq!(inner.calls(), 4);
    }

    #[tokio::test]
    async fn test_caching_estimator_keys_on_anchor() {
        let a = Point::new(50.0, 14.0);
        let b = Point::new(50.1, 14.0);
        let inner = Arc::new(TableEstimator::new().with_leg(a, b, 12.0, 4.0));
        let cached = CachingEstimator::new(inner.clone());
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

        cached.estimate(a, b, TimeAnchor::DepartAt(instant_at(date, 420.0))).await.unwrap();
        cached.estimate(a, b, TimeAnchor::DepartAt(instant_at(date, 421.0))).await.unwrap();

        assert_eq!(inner.calls(), 2);
    }

    #[test]
    fn test_routing_service_name() {
        assert_eq!(MockTravelEstimator::new().name(), "MockRouting");
    }

    #[tokio::test]
    async fn test_create_with_fallback_no_url() {
        let oracle = create_travel_estimator_with_fallback(None).await;
        assert_eq!(oracle.name(), "MockRouting");
    }

    #[tokio::test]
    async fn test_create_with_fallback_unreachable_url() {
        let oracle =
            create_travel_estimator_with_fallback(Some("http://127.0.0.1:1".to_string())).await;
        assert_eq!(oracle.name(), "MockRouting");
    }
}
