//! `geocode` command: resolve a single address with the configured backend

use anyhow::Result;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::write_output;
use crate::config::Config;
use crate::error::PlanError;
use crate::services::geocoding::{create_geocoder, Geocoder};
use crate::types::{ErrorResponse, Point, SuccessResponse};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeOutput {
    pub address: String,
    pub formatted_address: String,
    pub location: Point,
    pub geocoder: String,
}

pub async fn handle_geocode(address: &str, config: &Config) -> Result<()> {
    let geocoder = create_geocoder(config)?;
    let run_id = Uuid::new_v4();

    let outcome = lookup(geocoder.as_ref(), address).await;
    let body = match &outcome {
        Ok(found) => {
            info!("Geocoded '{}' -> {}", address, found.location);
            serde_json::to_string_pretty(&SuccessResponse::new(run_id, found))?
        }
        Err(err) => {
            error!("Geocoding '{}' failed: {}", address, err);
            serde_json::to_string_pretty(&ErrorResponse::from_plan_error(run_id, err))?
        }
    };
    write_output(None, &body).await?;

    outcome.map(|_| ()).map_err(Into::into)
}

async fn lookup(geocoder: &dyn Geocoder, address: &str) -> Result<GeocodeOutput, PlanError> {
    let found = geocoder.geocode(address).await?;
    Ok(GeocodeOutput {
        address: address.to_string(),
        formatted_address: found.formatted_address,
        location: found.location,
        geocoder: geocoder.name().to_string(),
    })
}
