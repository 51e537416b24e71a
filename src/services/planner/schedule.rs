//! Clock-time propagation along one bus route
//!
//! Morning legs are timed backward from the school bell, return legs forward
//! from dismissal. Oracle queries are issued one leg at a time since each
//! query's anchor depends on the previous answer.

use chrono::NaiveDate;

use crate::error::OracleError;
use crate::services::geo;
use crate::services::routing::{instant_at, TimeAnchor, TravelEstimator};
use crate::types::{clock_from_minutes, ReturnOrder, RouteSegment, School, Stop, StopClock};

/// Timed legs of one direction of a route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegSchedule {
    /// Legs in travel order
    pub segments: Vec<RouteSegment>,
    /// One entry per stop, in visiting order
    pub clock_times: Vec<StopClock>,
}

impl LegSchedule {
    pub fn distance_km(&self) -> f64 {
        self.segments.iter().map(|s| s.distance_km).sum()
    }

    /// Longest ride on this leg, 0 when no stops
    pub fn max_ride(&self) -> f64 {
        self.clock_times.iter().map(|c| c.ride_minutes).fold(0.0, f64::max)
    }
}

/// Time the morning run so the bus reaches school exactly at the bell.
///
/// Walks from the last pickup backward: each stop's pickup is the running
/// clock minus the leg to the next point, and the clock then moves back by
/// the dwell time before the previous leg.
pub async fn propagate_morning(
    stops: &[Stop],
    school: &School,
    date: NaiveDate,
    dwell_minutes: f64,
    oracle: &dyn TravelEstimator,
) -> Result<LegSchedule, OracleError> {
    let arrival = school.arrival_minutes();
    let mut running = arrival;
    let mut segments = Vec::with_capacity(stops.len());
    let mut clock_times = Vec::with_capacity(stops.len());

    for (i, stop) in stops.iter().enumerate().rev() {
        let (to_location, to_label) = match stops.get(i + 1) {
            Some(next) => (next.location, next.address.as_str()),
            None => (school.location, school.name.as_str()),
        };

        let anchor = TimeAnchor::DepartAt(instant_at(date, running));
        let leg = oracle.estimate(stop.location, to_location, anchor).await?;
        let pickup = running - leg.duration_minutes;

        segments.push(RouteSegment {
            from_label: stop.address.clone(),
            to_label: to_label.to_string(),
            duration_minutes: leg.duration_minutes,
            distance_km: leg.distance_km,
        });
        clock_times.push(StopClock {
            address: stop.address.clone(),
            clock_time: clock_from_minutes(pickup),
            minutes_from_midnight: pickup,
            ride_minutes: arrival - pickup,
        });

        running = pickup - dwell_minutes;
    }

    segments.reverse();
    clock_times.reverse();

    Ok(LegSchedule {
        segments,
        clock_times,
    })
}

/// Time the afternoon run forward from dismissal, in the given drop-off order
pub async fn propagate_return(
    stops: &[Stop],
    school: &School,
    departure: f64,
    date: NaiveDate,
    dwell_minutes: f64,
    oracle: &dyn TravelEstimator,
) -> Result<LegSchedule, OracleError> {
    let mut running = departure;
    let mut from_location = school.location;
    let mut from_label = school.name.as_str();
    let mut segments = Vec::with_capacity(stops.len());
    let mut clock_times = Vec::with_capacity(stops.len());

    for stop in stops {
        let anchor = TimeAnchor::DepartAt(instant_at(date, running));
        let leg = oracle.estimate(from_location, stop.location, anchor).await?;
        let dropoff = running + leg.duration_minutes;

        segments.push(RouteSegment {
            from_label: from_label.to_string(),
            to_label: stop.address.clone(),
            duration_minutes: leg.duration_minutes,
            distance_km: leg.distance_km,
        });
        clock_times.push(StopClock {
            address: stop.address.clone(),
            clock_time: clock_from_minutes(dropoff),
            minutes_from_midnight: dropoff,
            ride_minutes: dropoff - departure,
        });

        running = dropoff + dwell_minutes;
        from_location = stop.location;
        from_label = stop.address.as_str();
    }

    Ok(LegSchedule {
        segments,
        clock_times,
    })
}

/// Drop-off order for the return run
pub fn return_order(morning: &[Stop], school: &School, order: ReturnOrder) -> Vec<Stop> {
    let mut stops = morning.to_vec();

    match order {
        ReturnOrder::ReverseMorning => stops.reverse(),
        ReturnOrder::LatitudeDescending => {
            stops.sort_by(|a, b| b.location.lat.total_cmp(&a.location.lat));
        }
        ReturnOrder::ProximityToSchool => {
            // Nearest first
            stops.sort_by(|a, b| {
                let da = geo::euclidean_degrees(&a.location, &school.location);
                let db = geo::euclidean_degrees(&b.location, &school.location);
                da.total_cmp(&db)
            });
        }
    }

    stops
}
