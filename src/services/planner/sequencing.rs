//! Stop sequencing strategies
//!
//! Each strategy turns the unordered stop list into one fleet-wide visiting
//! order. None of them knows about buses; capacity is applied afterwards.

use tracing::debug;

use super::two_opt::two_opt;
use crate::error::OracleError;
use crate::services::routing::{self, TimeAnchor, TravelEstimate, TravelEstimator};
use crate::types::{CustomStart, Point, School, SequencingStrategy, Stop};

/// Everything a strategy may consult besides the stops themselves
pub struct SequencingContext<'a> {
    pub school: &'a School,
    pub custom_start: Option<&'a CustomStart>,
    pub oracle: &'a dyn TravelEstimator,
    /// Every sequencing query targets the morning bell
    pub anchor: TimeAnchor,
    pub concurrency: usize,
}

impl SequencingContext<'_> {
    /// Where the morning run begins: the custom start if given, else the school
    fn origin(&self) -> Point {
        self.custom_start
            .map(|start| start.location)
            .unwrap_or(self.school.location)
    }

    async fn estimate_pairs(&self, pairs: &[(Point, Point)]) -> Result<Vec<TravelEstimate>, OracleError> {
        routing::estimate_pairs(self.oracle, pairs, self.anchor, self.concurrency).await
    }
}

/// Order `stops` with the selected strategy
pub async fn sequence_stops(
    strategy: SequencingStrategy,
    stops: &[Stop],
    ctx: &SequencingContext<'_>,
) -> Result<Vec<Stop>, OracleError> {
    if stops.len() < 2 {
        return Ok(stops.to_vec());
    }

    let order = match strategy {
        SequencingStrategy::DistanceFromSchool => by_distance_from_school(stops, ctx).await?,
        SequencingStrategy::MinimizeRideTime => minimize_ride_time(stops, ctx).await?,
        SequencingStrategy::MinimizeTotalDistance => minimize_total_distance(stops, ctx).await?,
        SequencingStrategy::DistanceMatrix => by_distance_matrix(stops, ctx).await?,
        SequencingStrategy::NearestNeighbor => nearest_neighbor(stops, ctx).await?,
    };

    debug!(
        "Sequenced {} stops with {}: {:?}",
        stops.len(),
        strategy.as_str(),
        order
    );

    Ok(order.into_iter().map(|i| stops[i].clone()).collect())
}

/// Farthest-first by travel time to school. Ties keep input order.
async fn by_distance_from_school(stops: &[Stop], ctx: &SequencingContext<'_>) -> Result<Vec<usize>, OracleError> {
    let pairs: Vec<(Point, Point)> = stops
        .iter()
        .map(|stop| (stop.location, ctx.school.location))
        .collect();
    let to_school = ctx.estimate_pairs(&pairs).await?;

    let mut order: Vec<usize> = (0..stops.len()).collect();
    order.sort_by(|&a, &b| to_school[b].duration_minutes.total_cmp(&to_school[a].duration_minutes));
    Ok(order)
}

/// Seeded by student-weighted distance to school, refined by 2-opt on
/// student-minutes aboard
async fn minimize_ride_time(stops: &[Stop], ctx: &SequencingContext<'_>) -> Result<Vec<usize>, OracleError> {
    let table = TravelTable::gather(stops, ctx, false).await?;

    let weight = |i: usize| table.to_school[i].duration_minutes * stops[i].seats_needed as f64;
    let mut seed: Vec<usize> = (0..stops.len()).collect();
    seed.sort_by(|&a, &b| weight(b).total_cmp(&weight(a)));

    let outcome = two_opt(seed, |order| student_minutes(order, &table, stops));
    debug!(
        "2-opt settled at {:.1} student-minutes after {} passes",
        outcome.cost, outcome.passes
    );
    Ok(outcome.sequence)
}

/// Seeded farthest-first by distance, refined by 2-opt on total path length
async fn minimize_total_distance(stops: &[Stop], ctx: &SequencingContext<'_>) -> Result<Vec<usize>, OracleError> {
    let table = TravelTable::gather(stops, ctx, true).await?;

    let mut seed: Vec<usize> = (0..stops.len()).collect();
    seed.sort_by(|&a, &b| table.to_school[b].distance_km.total_cmp(&table.to_school[a].distance_km));

    let outcome = two_opt(seed, |order| path_distance(order, &table));
    debug!(
        "2-opt settled at {:.2} km after {} passes",
        outcome.cost, outcome.passes
    );
    Ok(outcome.sequence)
}

/// Greedy selection over a distance matrix of origin + stops.
///
/// Row `k` of the matrix is consulted after `k` stops are placed; row 0 is the
/// origin and row `k > 0` is input stop `k - 1`, whichever stop was actually
/// placed last.
async fn by_distance_matrix(stops: &[Stop], ctx: &SequencingContext<'_>) -> Result<Vec<usize>, OracleError> {
    let n = stops.len();
    let mut nodes = Vec::with_capacity(n + 1);
    nodes.push(ctx.origin());
    nodes.extend(stops.iter().map(|stop| stop.location));

    // Row/column 0 is the origin, k is stop k-1
    let matrix = ctx.oracle.estimate_many(&nodes, &nodes, ctx.anchor).await?;
    if matrix.len() != nodes.len() || matrix.iter().any(|row| row.len() != nodes.len()) {
        return Err(OracleError::Transport(format!(
            "expected a {0}x{0} travel matrix",
            nodes.len()
        )));
    }

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    while order.len() < n {
        let row = &matrix[order.len()];
        let next = (0..n)
            .filter(|&j| !visited[j])
            .min_by(|&a, &b| row[a + 1].distance_km.total_cmp(&row[b + 1].distance_km));

        match next {
            Some(j) => {
                visited[j] = true;
                order.push(j);
            }
            None => break,
        }
    }

    Ok(order)
}

/// Greedy nearest neighbour, querying the oracle live from the current position
async fn nearest_neighbor(stops: &[Stop], ctx: &SequencingContext<'_>) -> Result<Vec<usize>, OracleError> {
    let mut current = ctx.origin();
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());

    while !remaining.is_empty() {
        let pairs: Vec<(Point, Point)> = remaining
            .iter()
            .map(|&j| (current, stops[j].location))
            .collect();
        let estimates = ctx.estimate_pairs(&pairs).await?;

        let best = (0..remaining.len())
            .min_by(|&a, &b| estimates[a].distance_km.total_cmp(&estimates[b].distance_km))
            .unwrap_or(0);

        let next = remaining.remove(best);
        current = stops[next].location;
        order.push(next);
    }

    Ok(order)
}

/// Pairwise travel data shared by the 2-opt strategies
struct TravelTable {
    /// stop i -> school
    to_school: Vec<TravelEstimate>,
    /// stop i -> stop j
    between: Vec<Vec<TravelEstimate>>,
    /// origin -> stop i; empty unless requested
    from_origin: Vec<TravelEstimate>,
}

impl TravelTable {
    async fn gather(stops: &[Stop], ctx: &SequencingContext<'_>, with_origin: bool) -> Result<Self, OracleError> {
        let n = stops.len();
        let school = ctx.school.location;

        let mut pairs = Vec::with_capacity(n * (n + 1));
        pairs.extend(stops.iter().map(|stop| (stop.location, school)));
        for from in stops {
            for to in stops {
                if !std::ptr::eq(from, to) {
                    pairs.push((from.location, to.location));
                }
            }
        }
        if with_origin {
            let origin = ctx.origin();
            pairs.extend(stops.iter().map(|stop| (origin, stop.location)));
        }

        let mut answers = ctx.estimate_pairs(&pairs).await?.into_iter();

        let to_school: Vec<TravelEstimate> = answers.by_ref().take(n).collect();
        let mut between = vec![vec![TravelEstimate::default(); n]; n];
        for (i, row) in between.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                if i != j {
                    *cell = answers.next().unwrap_or_default();
                }
            }
        }
        let from_origin = answers.collect();

        Ok(Self {
            to_school,
            between,
            from_origin,
        })
    }
}

/// Σ over positions of (travel time from that stop to school along the
/// sequence) × seats needed there
fn student_minutes(order: &[usize], table: &TravelTable, stops: &[Stop]) -> f64 {
    let mut remaining = 0.0;
    let mut total = 0.0;

    for pos in (0..order.len()).rev() {
        let here = order[pos];
        remaining += match order.get(pos + 1) {
            Some(&next) => table.between[here][next].duration_minutes,
            None => table.to_school[here].duration_minutes,
        };
        total += remaining * stops[here].seats_needed as f64;
    }

    total
}

/// origin -> first + consecutive legs + last -> school, in kilometers
fn path_distance(order: &[usize], table: &TravelTable) -> f64 {
    let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
        return 0.0;
    };

    let legs: f64 = order
        .windows(2)
        .map(|w| table.between[w[0]][w[1]].distance_km)
        .sum();

    table.from_origin[first].distance_km + legs + table.to_school[last].distance_km
}
