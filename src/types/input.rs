//! Run input as submitted by the caller, and its geocoded form

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CustomStart, RunOptions, School, Stop};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    pub school: SchoolInput,
    pub stops: Vec<StopInput>,
    pub bus_capacities: Vec<u32>,
    /// Service date used for time-of-day traffic; defaults to today
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub custom_start: Option<CustomStartInput>,
    #[serde(default)]
    pub options: RunOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolInput {
    pub name: String,
    pub address: String,
    /// "HH:MM"
    pub arrival_time: String,
    /// "HH:MM"
    #[serde(default)]
    pub departure_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopInput {
    pub address: String,
    pub seats_needed: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStartInput {
    pub address: String,
}

/// Fully geocoded problem handed to the optimizer
#[derive(Debug, Clone)]
pub struct PlanningProblem {
    pub school: School,
    pub stops: Vec<Stop>,
    pub bus_capacities: Vec<u32>,
    pub custom_start: Option<CustomStart>,
    pub date: NaiveDate,
}
