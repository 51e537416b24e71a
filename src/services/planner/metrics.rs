//! Route-level and fleet-level ride-time metrics

use super::assignment::BusLoad;
use super::schedule::LegSchedule;
use crate::types::{BusRoute, OptimizationResult, SequencingStrategy, Stop};

/// Assemble one bus's route and its metrics from the timed legs.
///
/// Ride-time extremes and student-minutes come from the morning leg.
/// `total_ride_time` spans bell-to-earliest-pickup plus, when a return run
/// was planned, dismissal-to-last-drop-off.
pub fn build_bus_route(id: usize, load: BusLoad, morning: LegSchedule, afternoon: Option<LegSchedule>) -> BusRoute {
    let rides: Vec<f64> = morning.clock_times.iter().map(|c| c.ride_minutes).collect();
    let (min_ride_time, max_ride_time) = extremes(&rides);

    let total_student_minutes = morning
        .clock_times
        .iter()
        .zip(&load.stops)
        .map(|(clock, stop)| clock.ride_minutes * stop.seats_needed as f64)
        .sum();

    let mut total_ride_time = morning.max_ride();
    let mut distance_km = morning.distance_km();
    if let Some(afternoon) = &afternoon {
        total_ride_time += afternoon.max_ride();
        distance_km += afternoon.distance_km();
    }

    let (return_segments, return_clock_times) = match afternoon {
        Some(leg) => (Some(leg.segments), Some(leg.clock_times)),
        None => (None, None),
    };

    BusRoute {
        id,
        capacity: load.capacity,
        seats_used: load.seats_used,
        ordered_stops: load.stops,
        morning_segments: morning.segments,
        morning_clock_times: morning.clock_times,
        return_segments,
        return_clock_times,
        min_ride_time,
        max_ride_time,
        ride_time_equity: max_ride_time - min_ride_time,
        total_student_minutes,
        total_ride_time,
        distance_km,
    }
}

/// Fleet-wide totals. Extremes and the average only consider buses with stops.
pub fn aggregate(strategy: SequencingStrategy, routes: Vec<BusRoute>, unassigned_stops: Vec<Stop>) -> OptimizationResult {
    let total_distance_km = routes.iter().map(|r| r.distance_km).sum();
    let total_time_minutes = routes.iter().map(|r| r.total_ride_time).sum();

    let active: Vec<&BusRoute> = routes.iter().filter(|r| !r.is_empty()).collect();
    let (min_ride_time, _) = extremes(&active.iter().map(|r| r.min_ride_time).collect::<Vec<_>>());
    let (_, max_ride_time) = extremes(&active.iter().map(|r| r.max_ride_time).collect::<Vec<_>>());

    let average_ride_time = if active.is_empty() {
        0.0
    } else {
        active
            .iter()
            .map(|r| (r.max_ride_time + r.min_ride_time) / 2.0)
            .sum::<f64>()
            / active.len() as f64
    };

    OptimizationResult {
        strategy,
        routes,
        total_distance_km,
        total_time_minutes,
        min_ride_time,
        max_ride_time,
        ride_time_equity: max_ride_time - min_ride_time,
        average_ride_time,
        unassigned_stops,
    }
}

/// (min, max), both 0 for no values
fn extremes(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}
