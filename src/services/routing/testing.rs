//! Deterministic in-memory oracle for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MockTravelEstimator, TimeAnchor, TravelEstimate, TravelEstimator};
use crate::error::OracleError;
use crate::types::Point;

type LegKey = (u64, u64, u64, u64);

fn leg_key(from: &Point, to: &Point) -> LegKey {
    (from.lat.to_bits(), from.lng.to_bits(), to.lat.to_bits(), to.lng.to_bits())
}

/// Oracle answering from a fixed table of directed legs.
///
/// Unknown legs fall back to the haversine mock unless the table is strict.
pub struct TableEstimator {
    legs: HashMap<LegKey, TravelEstimate>,
    strict: bool,
    latency_ms_per_minute: u64,
    calls: AtomicUsize,
    queries: Mutex<Vec<(Point, Point, TimeAnchor)>>,
    fallback: MockTravelEstimator,
}

impl TableEstimator {
    pub fn new() -> Self {
        Self {
            legs: HashMap::new(),
            strict: false,
            latency_ms_per_minute: 0,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            fallback: MockTravelEstimator::new(),
        }
    }

    pub fn with_leg(mut self, from: Point, to: Point, duration_minutes: f64, distance_km: f64) -> Self {
        self.legs.insert(
            leg_key(&from, &to),
            TravelEstimate {
                duration_minutes,
                distance_km,
            },
        );
        self
    }

    /// Same answer in both directions
    pub fn with_symmetric_leg(self, a: Point, b: Point, duration_minutes: f64, distance_km: f64) -> Self {
        self.with_leg(a, b, duration_minutes, distance_km)
            .with_leg(b, a, duration_minutes, distance_km)
    }

    /// Unknown legs fail with `NoRoute`
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Simulated latency proportional to the leg duration
    pub fn with_latency_ms_per_minute(mut self, ms: u64) -> Self {
        self.latency_ms_per_minute = ms;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<(Point, Point, TimeAnchor)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl TravelEstimator for TableEstimator {
    async fn estimate(
        &self,
        origin: Point,
        destination: Point,
        anchor: TimeAnchor,
    ) -> Result<TravelEstimate, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push((origin, destination, anchor));

        let estimate = match self.legs.get(&leg_key(&origin, &destination)) {
            Some(estimate) => *estimate,
            None if origin == destination => TravelEstimate::default(),
            None if self.strict => {
                return Err(OracleError::NoRoute {
                    from: origin,
                    to: destination,
                })
            }
            None => self.fallback.estimate(origin, destination, anchor).await?,
        };

        if self.latency_ms_per_minute > 0 {
            let ms = (estimate.duration_minutes.max(0.0) as u64) * self.latency_ms_per_minute;
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }

        Ok(estimate)
    }

    fn name(&self) -> &str {
        "Table"
    }
}
