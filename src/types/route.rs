//! Route and result types

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::{SequencingStrategy, Stop};

/// One directed leg of a sequenced route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    pub from_label: String,
    pub to_label: String,
    pub duration_minutes: f64,
    pub distance_km: f64,
}

/// Scheduled clock time at one stop.
///
/// `ride_minutes` is the time the stop's students spend aboard on this leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopClock {
    pub address: String,
    pub clock_time: NaiveTime,
    pub minutes_from_midnight: f64,
    pub ride_minutes: f64,
}

/// A planned bus route (a single vehicle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusRoute {
    /// 1-based bus number, in the order capacities were given
    pub id: usize,
    pub capacity: u32,
    pub seats_used: u32,
    /// Pickup order
    pub ordered_stops: Vec<Stop>,
    pub morning_segments: Vec<RouteSegment>,
    /// Pickup times in pickup order
    pub morning_clock_times: Vec<StopClock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_segments: Option<Vec<RouteSegment>>,
    /// Drop-off times in drop-off order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_clock_times: Option<Vec<StopClock>>,
    pub min_ride_time: f64,
    pub max_ride_time: f64,
    pub ride_time_equity: f64,
    pub total_student_minutes: f64,
    pub total_ride_time: f64,
    pub distance_km: f64,
}

impl BusRoute {
    pub fn is_empty(&self) -> bool {
        self.ordered_stops.is_empty()
    }
}

#[cfg(test)]
impl BusRoute {
    pub fn morning_clock(&self, address: &str) -> Option<NaiveTime> {
        find_clock(&self.morning_clock_times, address)
    }

    pub fn return_clock(&self, address: &str) -> Option<NaiveTime> {
        self.return_clock_times
            .as_deref()
            .and_then(|times| find_clock(times, address))
    }
}

#[cfg(test)]
fn find_clock(times: &[StopClock], address: &str) -> Option<NaiveTime> {
    times
        .iter()
        .find(|entry| entry.address == address)
        .map(|entry| entry.clock_time)
}

/// Result of a full optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub strategy: SequencingStrategy,
    pub routes: Vec<BusRoute>,
    pub total_distance_km: f64,
    pub total_time_minutes: f64,
    pub min_ride_time: f64,
    pub max_ride_time: f64,
    pub ride_time_equity: f64,
    pub average_ride_time: f64,
    /// Stops no bus had room for (overflow policy `report`)
    pub unassigned_stops: Vec<Stop>,
}

impl OptimizationResult {
    pub fn seats_used(&self) -> u32 {
        self.routes.iter().map(|r| r.seats_used).sum()
    }
}
