//! Error taxonomy for a planning run
//!
//! Every collaborator failure is surfaced unmodified to the caller and aborts
//! the run; nothing in the engine retries.

use thiserror::Error;

use crate::types::Point;

/// Fatal failure of an optimization run
#[derive(Debug, Error)]
pub enum PlanError {
    /// Malformed run input or inconsistent options
    #[error("invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Geocoding(#[from] GeocodeError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// No bus had room for a stop and the overflow policy is `fail`
    #[error("no bus has room for stop '{address}' ({seats} seats needed)")]
    CapacityOverflow { address: String, seats: u32 },
}

impl PlanError {
    pub fn input(message: impl Into<String>) -> Self {
        PlanError::Input(message.into())
    }

    /// Stable machine-readable code used in error envelopes
    pub const fn code(&self) -> &'static str {
        match self {
            PlanError::Input(_) => "INVALID_INPUT",
            PlanError::Geocoding(_) => "GEOCODING_ERROR",
            PlanError::Oracle(_) => "ORACLE_ERROR",
            PlanError::CapacityOverflow { .. } => "CAPACITY_OVERFLOW",
        }
    }
}

/// Geocoding failure for a single address
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("address not found: '{0}'")]
    NotFound(String),

    #[error("geocoding '{address}' failed: {reason}")]
    Upstream { address: String, reason: String },
}

/// Travel oracle failure for a single query
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    #[error("no route found from {from} to {to}")]
    NoRoute { from: Point, to: Point },

    #[error("travel oracle returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("travel oracle request failed: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(PlanError::input("x").code(), "INVALID_INPUT");
        assert_eq!(
            PlanError::from(GeocodeError::NotFound("Main St 1".into())).code(),
            "GEOCODING_ERROR"
        );
        assert_eq!(
            PlanError::from(OracleError::Transport("timeout".into())).code(),
            "ORACLE_ERROR"
        );
        assert_eq!(
            PlanError::CapacityOverflow { address: "A".into(), seats: 3 }.code(),
            "CAPACITY_OVERFLOW"
        );
    }

    #[test]
    fn test_wrapped_errors_keep_originating_message() {
        let err = PlanError::from(GeocodeError::NotFound("Elm Road 4".into()));
        assert_eq!(err.to_string(), "address not found: 'Elm Road 4'");

        let err = PlanError::from(OracleError::NoRoute {
            from: Point::new(50.0, 14.0),
            to: Point::new(50.1, 14.1),
        });
        assert!(err.to_string().starts_with("no route found from (50.000000, 14.000000)"));
    }
}
