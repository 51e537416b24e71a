//! Caller-supplied run options

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_DWELL_MINUTES;

/// Algorithm used to produce the fleet-wide visiting order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SequencingStrategy {
    /// Farthest stop (by travel time to school) first
    #[default]
    DistanceFromSchool,
    /// Student-minute weighted ride time, refined by 2-opt
    MinimizeRideTime,
    /// Total path length, refined by 2-opt
    MinimizeTotalDistance,
    /// Greedy selection over a precomputed distance matrix
    DistanceMatrix,
    /// Greedy nearest neighbour with live oracle queries
    NearestNeighbor,
}

impl SequencingStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            SequencingStrategy::DistanceFromSchool => "distance_from_school",
            SequencingStrategy::MinimizeRideTime => "minimize_ride_time",
            SequencingStrategy::MinimizeTotalDistance => "minimize_total_distance",
            SequencingStrategy::DistanceMatrix => "distance_matrix",
            SequencingStrategy::NearestNeighbor => "nearest_neighbor",
        }
    }
}

/// What to do with a stop no bus has room for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Abort the run with a capacity overflow error
    Fail,
    /// Keep planning and list the stop under `unassignedStops`
    #[default]
    Report,
}

/// Visiting order of the afternoon drop-off leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnOrder {
    ReverseMorning,
    LatitudeDescending,
    ProximityToSchool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    pub include_return: bool,
    pub reverse_return_order: bool,
    /// Only consulted when `reverse_return_order` is off
    pub prioritize_direction: bool,
    pub dwell_minutes: u32,
    pub strategy: SequencingStrategy,
    pub overflow_policy: OverflowPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            include_return: false,
            reverse_return_order: true,
            prioritize_direction: false,
            dwell_minutes: DEFAULT_DWELL_MINUTES,
            strategy: SequencingStrategy::default(),
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl RunOptions {
    pub fn return_order(&self) -> ReturnOrder {
        if self.reverse_return_order {
            ReturnOrder::ReverseMorning
        } else if self.prioritize_direction {
            ReturnOrder::LatitudeDescending
        } else {
            ReturnOrder::ProximityToSchool
        }
    }
}
