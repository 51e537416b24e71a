//! Turns raw run input into a geocoded planning problem

use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::PlanError;
use crate::services::geocoding::Geocoder;
use crate::types::{
    parse_clock, CustomStart, PlanningProblem, RunInput, RunOptions, School, Stop, StopInput,
};

/// Parse clock strings and geocode every address, one at a time.
///
/// Stops keep the caller's address as their identity; the geocoder's
/// formatted address is only logged.
pub async fn prepare_problem(
    geocoder: &dyn Geocoder,
    input: RunInput,
) -> Result<(PlanningProblem, RunOptions), PlanError> {
    let RunInput {
        school,
        stops,
        bus_capacities,
        date,
        custom_start,
        options,
    } = input;

    let arrival_time = parse_clock(&school.arrival_time).ok_or_else(|| {
        PlanError::input(format!("school arrival time '{}' is not HH:MM", school.arrival_time))
    })?;
    let departure_time = match school.departure_time.as_deref() {
        Some(value) if !value.trim().is_empty() => Some(
            parse_clock(value)
                .ok_or_else(|| PlanError::input(format!("school departure time '{}' is not HH:MM", value)))?,
        ),
        _ => None,
    };

    if let Some(blank) = stops.iter().position(|s| s.address.trim().is_empty()) {
        return Err(PlanError::input(format!("stop {} has no address", blank + 1)));
    }

    info!(
        "Geocoding school, {} stops{}",
        stops.len(),
        if custom_start.is_some() { " and custom start" } else { "" }
    );

    let school_location = geocoder.geocode(&school.address).await?;
    debug!("School '{}' -> {}", school.name, school_location.formatted_address);

    let custom_start = match custom_start {
        Some(start) => {
            let geocoded = geocoder.geocode(&start.address).await?;
            Some(CustomStart {
                address: start.address,
                location: geocoded.location,
            })
        }
        None => None,
    };

    let mut geocoded_stops = Vec::with_capacity(stops.len());
    for stop in stops {
        let geocoded = geocoder.geocode(&stop.address).await?;
        debug!("Stop '{}' -> {}", stop.address, geocoded.formatted_address);
        geocoded_stops.push(Stop::new(stop.address, stop.seats_needed, geocoded.location));
    }

    let problem = PlanningProblem {
        school: School {
            name: school.name,
            location: school_location.location,
            arrival_time,
            departure_time,
        },
        stops: geocoded_stops,
        bus_capacities,
        custom_start,
        date: date.unwrap_or_else(today),
    };

    Ok((problem, options))
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Deserialize)]
struct CsvStopRow {
    #[serde(alias = "Address")]
    address: String,
    #[serde(alias = "seatsNeeded", alias = "seats")]
    seats_needed: u32,
}

/// Read stops from a CSV with an `address,seats_needed` header row
pub fn read_stops_csv<R: Read>(reader: R) -> Result<Vec<StopInput>, PlanError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut stops = Vec::new();
    for (line, result) in reader.deserialize::<CsvStopRow>().enumerate() {
        let row = result.map_err(|e| PlanError::input(format!("stops CSV row {}: {}", line + 1, e)))?;
        stops.push(StopInput {
            address: row.address,
            seats_needed: row.seats_needed,
        });
    }

    Ok(stops)
}
