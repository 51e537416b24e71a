//! School and clock-time helpers

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::Point;

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;

/// The destination of every morning route and origin of every return route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub name: String,
    pub location: Point,
    /// Bell time every morning route must meet
    pub arrival_time: NaiveTime,
    /// Dismissal time; required only when a return trip is planned
    pub departure_time: Option<NaiveTime>,
}

impl School {
    pub fn arrival_minutes(&self) -> f64 {
        minutes_since_midnight(self.arrival_time)
    }

    pub fn departure_minutes(&self) -> Option<f64> {
        self.departure_time.map(minutes_since_midnight)
    }
}

/// Parse an "HH:MM" clock string
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

pub fn minutes_since_midnight(time: NaiveTime) -> f64 {
    time.num_seconds_from_midnight() as f64 / 60.0
}

/// Convert minutes since midnight to a wall-clock time, wrapping around midnight.
/// Rounded to whole seconds.
pub fn clock_from_minutes(minutes: f64) -> NaiveTime {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    let secs = ((wrapped * 60.0).round() as u32) % (24 * 60 * 60);
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN)
}
