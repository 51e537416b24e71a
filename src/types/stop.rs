//! Stop and location types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Geographic point (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// A pickup location where a fixed number of students board.
///
/// The address is the stop's identity within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub address: String,
    pub seats_needed: u32,
    pub location: Point,
}

impl Stop {
    pub fn new(address: impl Into<String>, seats_needed: u32, location: Point) -> Self {
        Self {
            address: address.into(),
            seats_needed,
            location,
        }
    }
}

/// Alternate origin for morning sequencing, used in place of the school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomStart {
    pub address: String,
    pub location: Point,
}
