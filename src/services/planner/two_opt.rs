//! Generic 2-opt local search over sequences
//!
//! The move set is "reverse a contiguous subrange". Search is first-improvement:
//! the first strictly improving reversal is adopted and the scan restarts at the
//! front. Deterministic for a given seed and cost function.

/// Cap on full scans of the neighbourhood
pub const MAX_PASSES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct TwoOptOutcome<T> {
    pub sequence: Vec<T>,
    pub cost: f64,
    /// Neighbourhood scans performed, including the final non-improving one
    pub passes: usize,
}

/// Improve `seed` under `cost` until no reversal helps or `MAX_PASSES` scans ran
pub fn two_opt<T, F>(seed: Vec<T>, cost: F) -> TwoOptOutcome<T>
where
    F: Fn(&[T]) -> f64,
{
    let mut sequence = seed;
    let mut best = cost(&sequence);
    let n = sequence.len();
    let mut passes = 0;

    if n < 2 {
        return TwoOptOutcome { sequence, cost: best, passes };
    }

    'scan: while passes < MAX_PASSES {
        passes += 1;

        for i in 0..n - 1 {
            for j in i + 1..n {
                sequence[i..=j].reverse();
                let candidate = cost(&sequence);

                if candidate < best {
                    best = candidate;
                    continue 'scan;
                }

                sequence[i..=j].reverse();
            }
        }

        break;
    }

    TwoOptOutcome {
        sequence,
        cost: best,
        passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open path length over points on a line
    fn path_length(points: &[f64]) -> f64 {
        points.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
    }

    #[test]
    fn test_empty_and_single_are_untouched() {
        let outcome = two_opt(Vec::<f64>::new(), path_length);
        assert!(outcome.sequence.is_empty());
        assert_eq!(outcome.passes, 0);

        let outcome = two_opt(vec![3.0], path_length);
        assert_eq!(outcome.sequence, vec![3.0]);
    }

    #[test]
    fn test_untangles_points_on_a_line() {
        let seed = vec![0.0, 3.0, 1.0, 2.0, 4.0];
        let outcome = two_opt(seed, path_length);

        assert_eq!(outcome.sequence, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert!((outcome.cost - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_returned_cost_never_exceeds_seed_cost() {
        let seeds: Vec<Vec<f64>> = vec![
            vec![5.0, 1.0],
            vec![1.0, 5.0],
            vec![9.0, 2.0, 7.0, 1.0, 8.0, 3.0],
            vec![4.0, 4.0, 4.0],
            vec![10.0, -3.0, 6.5, 0.0, 2.0, -8.0, 1.0],
        ];

        for seed in seeds {
            let seed_cost = path_length(&seed);
            let outcome = two_opt(seed.clone(), path_length);
            assert!(outcome.cost <= seed_cost, "seed {:?}", seed);
            assert!((outcome.cost - path_length(&outcome.sequence)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_first_improvement_adopts_earliest_reversal() {
        // Cost only rewards having the largest value first; the earliest
        // improving move is reversing [0..=1].
        let cost = |s: &[u32]| if s[0] == 3 { 0.0 } else { 1.0 };
        let outcome = two_opt(vec![1, 3, 2], cost);
        assert_eq!(outcome.sequence, vec![3, 1, 2]);
        assert_eq!(outcome.passes, 2);
    }

    #[test]
    fn test_tiny_strict_improvement_is_adopted() {
        let cost = |s: &[u32]| if s[0] == 0 { 1.0 - 5e-10 } else { 1.0 };
        let outcome = two_opt(vec![1, 0], cost);
        assert_eq!(outcome.sequence, vec![0, 1]);
        assert!(outcome.cost < 1.0);
    }

    #[test]
    fn test_is_deterministic() {
        let seed = vec![9.0, 2.0, 7.0, 1.0, 8.0, 3.0];
        let a = two_opt(seed.clone(), path_length);
        let b = two_opt(seed, path_length);
        assert_eq!(a, b);
    }

    #[test]
    fn test_pass_cap_bounds_the_search() {
        // Every reversal looks better than the last: only the cap stops it.
        let counter = std::cell::Cell::new(0.0);
        let cost = |_: &[u8]| {
            counter.set(counter.get() - 1.0);
            counter.get()
        };
        let outcome = two_opt(vec![1, 2, 3], cost);
        assert_eq!(outcome.passes, MAX_PASSES);
    }
}
