//! `plan` command: run input in, result envelope out

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use uuid::Uuid;

use super::write_output;
use crate::cli::PlanArgs;
use crate::config::Config;
use crate::error::PlanError;
use crate::services::geocoding::{create_geocoder, Geocoder};
use crate::services::input::{prepare_problem, read_stops_csv};
use crate::services::planner::RouteOptimizer;
use crate::services::routing::{create_travel_estimator_with_fallback, CachingEstimator};
use crate::types::{ErrorResponse, OptimizationResult, RunInput, SuccessResponse};

/// Build collaborators from config, plan, and write the envelope.
///
/// The envelope is written on failure too; the returned error only drives the
/// exit status.
pub async fn handle_plan(args: &PlanArgs, config: &Config) -> Result<()> {
    let run_id = Uuid::new_v4();
    info!("Plan run {} from {}", run_id, args.input.display());

    let geocoder = create_geocoder(config)?;
    let oracle = create_travel_estimator_with_fallback(config.valhalla_url.clone()).await;
    let cached = Arc::new(CachingEstimator::new(oracle));
    let optimizer = RouteOptimizer::new(cached.clone(), config.oracle_concurrency);

    let outcome = run_plan(args, geocoder.as_ref(), &optimizer).await;
    info!("Run {} answered {} distinct oracle queries", run_id, cached.cached_len());

    let body = match &outcome {
        Ok(result) => serde_json::to_string_pretty(&SuccessResponse::new(run_id, result))?,
        Err(err) => {
            error!("Run {} failed: {}", run_id, err);
            serde_json::to_string_pretty(&ErrorResponse::from_plan_error(run_id, err))?
        }
    };
    write_output(args.output.as_deref(), &body).await?;

    outcome.map(|_| ()).map_err(Into::into)
}

/// Load the input file (and optional stops CSV), apply flag overrides, geocode, optimize
pub async fn run_plan(
    args: &PlanArgs,
    geocoder: &dyn Geocoder,
    optimizer: &RouteOptimizer,
) -> Result<OptimizationResult, PlanError> {
    let mut input = load_input(&args.input).await?;

    if let Some(path) = &args.stops {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| PlanError::input(format!("cannot read {}: {}", path.display(), e)))?;
        input.stops = read_stops_csv(bytes.as_slice())?;
        info!("Loaded {} stops from {}", input.stops.len(), path.display());
    }

    args.apply_to(&mut input.options);

    let (problem, options) = prepare_problem(geocoder, input).await?;
    optimizer.optimize(&problem, &options).await
}

async fn load_input(path: &Path) -> Result<RunInput, PlanError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PlanError::input(format!("cannot read {}: {}", path.display(), e)))?;

    serde_json::from_str(&raw).map_err(|e| PlanError::input(format!("malformed run input: {}", e)))
}
