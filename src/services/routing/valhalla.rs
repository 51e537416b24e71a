//! Valhalla routing engine client
//!
//! Valhalla API documentation:
//! https://valhalla.github.io/valhalla/api/turn-by-turn/api-reference/
//! https://valhalla.github.io/valhalla/api/matrix/api-reference/

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{TimeAnchor, TravelEstimate, TravelEstimator};
use crate::error::OracleError;
use crate::types::Point;

/// Valhalla error code for "no path could be found for input"
const NO_PATH_ERROR_CODE: i64 = 442;

/// Valhalla client configuration
#[derive(Debug, Clone)]
pub struct ValhallaConfig {
    /// Base URL of Valhalla server (e.g., "http://localhost:8002")
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Costing model; school buses are routed as "bus"
    pub costing: String,
}

impl Default for ValhallaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8002".to_string(),
            timeout_seconds: 30,
            costing: "bus".to_string(),
        }
    }
}

impl ValhallaConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Valhalla routing client
pub struct ValhallaClient {
    client: Client,
    config: ValhallaConfig,
}

impl ValhallaClient {
    pub fn new(config: ValhallaConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn location(point: &Point) -> ValhallaLocation {
        ValhallaLocation {
            lat: point.lat,
            lon: point.lng,
            // Geocoded building centroids may sit off the road edge
            radius: Some(500),
        }
    }

    /// Build the single-leg route request
    fn build_route_request(&self, origin: &Point, destination: &Point, anchor: TimeAnchor) -> RouteRequest {
        RouteRequest {
            locations: vec![Self::location(origin), Self::location(destination)],
            costing: self.config.costing.clone(),
            units: "kilometers".to_string(),
            directions_type: "none".to_string(),
            date_time: DateTime::from_anchor(anchor),
        }
    }

    /// Build the sources_to_targets request
    fn build_matrix_request(&self, origins: &[Point], destinations: &[Point], anchor: TimeAnchor) -> MatrixRequest {
        MatrixRequest {
            sources: origins.iter().map(Self::location).collect(),
            targets: destinations.iter().map(Self::location).collect(),
            costing: self.config.costing.clone(),
            units: "kilometers".to_string(),
            date_time: DateTime::from_anchor(anchor),
        }
    }

    async fn post<Req: Serialize + Sync, Resp: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: &Req,
        origin: Point,
        destination: Point,
    ) -> Result<Resp, OracleError> {
        let url = format!("{}/{}", self.config.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_no_path(&body) {
                return Err(OracleError::NoRoute {
                    from: origin,
                    to: destination,
                });
            }
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::Transport(format!("failed to parse Valhalla {} response: {}", endpoint, e)))
    }
}

fn is_no_path(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.error_code == Some(NO_PATH_ERROR_CODE))
        .unwrap_or(false)
}

/// Convert a matrix response into `[origin][destination]` estimates.
///
/// The response must have exactly one row per origin and one cell per
/// destination; a cell without time or distance is an unroutable pair.
fn matrix_from_response(
    response: MatrixResponse,
    origins: &[Point],
    destinations: &[Point],
) -> Result<Vec<Vec<TravelEstimate>>, OracleError> {
    let rows = response.sources_to_targets;
    if rows.len() != origins.len() || rows.iter().any(|row| row.len() != destinations.len()) {
        return Err(OracleError::Transport(format!(
            "Valhalla matrix has shape {}x{:?}, expected {}x{}",
            rows.len(),
            rows.iter().map(Vec::len).collect::<Vec<_>>(),
            origins.len(),
            destinations.len()
        )));
    }

    rows.into_iter()
        .zip(origins)
        .map(|(row, origin)| {
            row.into_iter()
                .zip(destinations)
                .map(|(cell, destination)| match (cell.time, cell.distance) {
                    (Some(time), Some(distance)) => Ok(TravelEstimate {
                        duration_minutes: time / 60.0,
                        distance_km: distance,
                    }),
                    _ => {
                        warn!("No route for matrix cell {} -> {}", origin, destination);
                        Err(OracleError::NoRoute {
                            from: *origin,
                            to: *destination,
                        })
                    }
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}

#[async_trait]
impl TravelEstimator for ValhallaClient {
    async fn estimate(
        &self,
        origin: Point,
        destination: Point,
        anchor: TimeAnchor,
    ) -> Result<TravelEstimate, OracleError> {
        if origin == destination {
            return Ok(TravelEstimate::default());
        }

        let request = self.build_route_request(&origin, &destination, anchor);
        debug!("Requesting route {} -> {} from Valhalla", origin, destination);

        let response: RouteResponse = self.post("route", &request, origin, destination).await?;
        let summary = response.trip.summary;

        Ok(TravelEstimate {
            duration_minutes: summary.time / 60.0,
            distance_km: summary.length,
        })
    }

    async fn estimate_many(
        &self,
        origins: &[Point],
        destinations: &[Point],
        anchor: TimeAnchor,
    ) -> Result<Vec<Vec<TravelEstimate>>, OracleError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![vec![]; origins.len()]);
        }

        let request = self.build_matrix_request(origins, destinations, anchor);
        debug!(
            "Requesting {}x{} matrix from Valhalla",
            origins.len(),
            destinations.len()
        );

        let response: MatrixResponse = self
            .post("sources_to_targets", &request, origins[0], destinations[0])
            .await?;

        matrix_from_response(response, origins, destinations)
    }

    fn name(&self) -> &str {
        "Valhalla"
    }
}

// Valhalla API types

#[derive(Debug, Serialize, Clone)]
struct ValhallaLocation {
    lat: f64,
    lon: f64,
    /// Radius in meters for snapping to roads
    #[serde(skip_serializing_if = "Option::is_none")]
    radius: Option<u32>,
}

/// `type` 1 = depart at, 2 = arrive by; value is local "YYYY-MM-DDTHH:MM"
#[derive(Debug, Serialize)]
struct DateTime {
    #[serde(rename = "type")]
    kind: u8,
    value: String,
}

impl DateTime {
    fn from_anchor(anchor: TimeAnchor) -> Self {
        let kind = match anchor {
            TimeAnchor::DepartAt(_) => 1,
            TimeAnchor::ArriveBy(_) => 2,
        };
        Self {
            kind,
            value: anchor.instant().format("%Y-%m-%dT%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RouteRequest {
    locations: Vec<ValhallaLocation>,
    costing: String,
    units: String,
    directions_type: String,
    date_time: DateTime,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    trip: Trip,
}

#[derive(Debug, Deserialize)]
struct Trip {
    summary: Summary,
}

#[derive(Debug, Deserialize)]
struct Summary {
    /// Seconds
    time: f64,
    /// Kilometers (when units="kilometers")
    length: f64,
}

#[derive(Debug, Serialize)]
struct MatrixRequest {
    sources: Vec<ValhallaLocation>,
    targets: Vec<ValhallaLocation>,
    costing: String,
    units: String,
    date_time: DateTime,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    sources_to_targets: Vec<Vec<MatrixCell>>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    /// Kilometers
    distance: Option<f64>,
    /// Seconds
    time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: Option<i64>,
}
