//! Route optimization engine
//!
//! One run walks a fixed pipeline: validate, sequence all stops fleet-wide,
//! split the sequence across buses, time each bus backward from the bell and
//! optionally forward from dismissal, then summarize. Any collaborator failure
//! aborts the run.

pub mod assignment;
pub mod metrics;
pub mod schedule;
pub mod sequencing;
pub mod two_opt;

use assignment::{assign_to_buses, Assignment};
use sequencing::{sequence_stops, SequencingContext};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::PlanError;
use crate::services::routing::{instant_at, TimeAnchor, TravelEstimator};
use crate::types::{OptimizationResult, OverflowPolicy, PlanningProblem, RunOptions};

/// Pipeline state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPhase {
    ValidatingInput,
    Sequencing,
    Assigning,
    PropagatingMorning,
    PropagatingReturn,
    Aggregating,
    Done,
    Failed,
}

impl PlanPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            PlanPhase::ValidatingInput => "validating_input",
            PlanPhase::Sequencing => "sequencing",
            PlanPhase::Assigning => "assigning",
            PlanPhase::PropagatingMorning => "propagating_morning",
            PlanPhase::PropagatingReturn => "propagating_return",
            PlanPhase::Aggregating => "aggregating",
            PlanPhase::Done => "done",
            PlanPhase::Failed => "failed",
        }
    }
}

/// Phases a run went through, in order
#[derive(Debug, Clone, Default)]
pub struct PhaseLog {
    phases: Vec<PlanPhase>,
}

impl PhaseLog {
    fn enter(&mut self, phase: PlanPhase) {
        debug!("Planner phase: {}", phase.as_str());
        self.phases.push(phase);
    }

    #[cfg(test)]
    pub fn phases(&self) -> &[PlanPhase] {
        &self.phases
    }

    /// "validating_input -> sequencing -> ..."
    fn trail(&self) -> String {
        self.phases
            .iter()
            .map(|phase| phase.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Plans all bus routes for one school against a travel oracle
pub struct RouteOptimizer {
    oracle: Arc<dyn TravelEstimator>,
    concurrency: usize,
}

impl RouteOptimizer {
    /// `concurrency` bounds in-flight oracle queries during sequencing
    pub fn new(oracle: Arc<dyn TravelEstimator>, concurrency: usize) -> Self {
        Self {
            oracle,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn optimize(
        &self,
        problem: &PlanningProblem,
        options: &RunOptions,
    ) -> Result<OptimizationResult, PlanError> {
        let mut log = PhaseLog::default();
        self.optimize_logged(problem, options, &mut log).await
    }

    /// Same as [`optimize`](Self::optimize), recording every phase entered
    pub async fn optimize_logged(
        &self,
        problem: &PlanningProblem,
        options: &RunOptions,
        log: &mut PhaseLog,
    ) -> Result<OptimizationResult, PlanError> {
        let started_at = Instant::now();
        info!(
            "Planning {} stops on {} buses with {} via {}",
            problem.stops.len(),
            problem.bus_capacities.len(),
            options.strategy.as_str(),
            self.oracle.name()
        );

        match self.run(problem, options, log).await {
            Ok(result) => {
                log.enter(PlanPhase::Done);
                debug!("Planner phases: {}", log.trail());
                info!(
                    "Planned {} routes in {} ms: {} seats, {:.1} km, ride {:.1}-{:.1} min, {} unassigned",
                    result.routes.len(),
                    started_at.elapsed().as_millis(),
                    result.seats_used(),
                    result.total_distance_km,
                    result.min_ride_time,
                    result.max_ride_time,
                    result.unassigned_stops.len()
                );
                Ok(result)
            }
            Err(err) => {
                log.enter(PlanPhase::Failed);
                warn!("Planning failed ({}): {}", log.trail(), err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        problem: &PlanningProblem,
        options: &RunOptions,
        log: &mut PhaseLog,
    ) -> Result<OptimizationResult, PlanError> {
        log.enter(PlanPhase::ValidatingInput);
        let departure = validate(problem, options)?;

        log.enter(PlanPhase::Sequencing);
        let school = &problem.school;
        let ctx = SequencingContext {
            school,
            custom_start: problem.custom_start.as_ref(),
            oracle: self.oracle.as_ref(),
            anchor: TimeAnchor::ArriveBy(instant_at(problem.date, school.arrival_minutes())),
            concurrency: self.concurrency,
        };
        let sequence = sequence_stops(options.strategy, &problem.stops, &ctx).await?;

        log.enter(PlanPhase::Assigning);
        let Assignment { buses, overflow } = assign_to_buses(sequence, &problem.bus_capacities);
        if let Some(first) = overflow.first() {
            match options.overflow_policy {
                OverflowPolicy::Fail => {
                    return Err(PlanError::CapacityOverflow {
                        address: first.address.clone(),
                        seats: first.seats_needed,
                    });
                }
                OverflowPolicy::Report => {
                    for stop in &overflow {
                        warn!(
                            "No bus has room for stop '{}' ({} seats); reporting it as unassigned",
                            stop.address, stop.seats_needed
                        );
                    }
                }
            }
        }

        log.enter(PlanPhase::PropagatingMorning);
        let dwell = options.dwell_minutes as f64;
        let mut mornings = Vec::with_capacity(buses.len());
        for bus in &buses {
            let morning =
                schedule::propagate_morning(&bus.stops, school, problem.date, dwell, self.oracle.as_ref()).await?;
            mornings.push(morning);
        }

        let mut afternoons = vec![None; buses.len()];
        if let Some(departure) = departure {
            log.enter(PlanPhase::PropagatingReturn);
            let order = options.return_order();
            for (bus, slot) in buses.iter().zip(afternoons.iter_mut()) {
                let drop_offs = schedule::return_order(&bus.stops, school, order);
                let afternoon = schedule::propagate_return(
                    &drop_offs,
                    school,
                    departure,
                    problem.date,
                    dwell,
                    self.oracle.as_ref(),
                )
                .await?;
                *slot = Some(afternoon);
            }
        }

        log.enter(PlanPhase::Aggregating);
        let routes = buses
            .into_iter()
            .zip(mornings)
            .zip(afternoons)
            .enumerate()
            .map(|(i, ((bus, morning), afternoon))| metrics::build_bus_route(i + 1, bus, morning, afternoon))
            .collect();

        Ok(metrics::aggregate(options.strategy, routes, overflow))
    }
}

/// Reject inconsistent input before any oracle query.
///
/// Returns the dismissal time in minutes when a return run is requested.
fn validate(problem: &PlanningProblem, options: &RunOptions) -> Result<Option<f64>, PlanError> {
    if problem.bus_capacities.is_empty() {
        return Err(PlanError::input("at least one bus capacity is required"));
    }
    if let Some(index) = problem.bus_capacities.iter().position(|&c| c == 0) {
        return Err(PlanError::input(format!("bus {} has zero capacity", index + 1)));
    }

    let mut seen = HashSet::with_capacity(problem.stops.len());
    for stop in &problem.stops {
        if !seen.insert(stop.address.as_str()) {
            return Err(PlanError::input(format!("duplicate stop address '{}'", stop.address)));
        }
    }

    if !options.include_return {
        return Ok(None);
    }
    match problem.school.departure_minutes() {
        Some(departure) => Ok(Some(departure)),
        None => Err(PlanError::input(
            "a return trip was requested but the school has no departure time",
        )),
    }
}
