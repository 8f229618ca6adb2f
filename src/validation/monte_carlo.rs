//! Monte-Carlo estimates of single-turn scores.
//!
//! Used to cross-check the exact turn solver. Work is split into fixed
//! chunks, each with its own RNG seeded from the base seed, so a seeded run
//! gives the same answer regardless of the thread count.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::pig::{DiceModel, Result, SolverError};

/// Number of independently seeded chunks a simulation is split into.
const NUM_CHUNKS: u64 = 64;

/// z-score for a two-sided 99% confidence interval.
pub const Z_99: f64 = 2.5758;

/// Play one turn holding at `threshold`. Returns the banked points (0 on a bust).
pub fn simulate_turn<R: Rng>(dice: &DiceModel, threshold: u32, rng: &mut R) -> u32 {
    let mut total = 0;
    loop {
        let roll = rng.gen_range(1..=dice.sides);
        if dice.is_bust(roll) {
            return 0;
        }
        total += roll;
        if total >= threshold {
            return total;
        }
    }
}

/// Sample mean with its standard error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Sample mean.
    pub mean: f64,
    /// Standard error of the mean.
    pub std_error: f64,
    /// Number of samples.
    pub samples: u64,
}

impl Estimate {
    fn from_moments(sum: f64, sum_sq: f64, samples: u64) -> Self {
        let n = samples as f64;
        let mean = sum / n;
        let variance = if samples > 1 {
            ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0)
        } else {
            0.0
        };
        Self {
            mean,
            std_error: (variance / n).sqrt(),
            samples,
        }
    }

    /// `mean ± z * std_error`.
    pub fn confidence_interval(&self, z: f64) -> (f64, f64) {
        let half = z * self.std_error;
        (self.mean - half, self.mean + half)
    }

    /// Whether `value` falls inside the `z` confidence interval.
    pub fn contains(&self, value: f64, z: f64) -> bool {
        let (low, high) = self.confidence_interval(z);
        (low..=high).contains(&value)
    }
}

fn check_inputs(dice: &DiceModel, threshold: u32, turns: u64) -> Result<()> {
    dice.validate()?;
    if threshold == 0 {
        return Err(SolverError::invalid("threshold", "threshold must be at least 1"));
    }
    if turns == 0 {
        return Err(SolverError::invalid("turns", "need at least one simulated turn"));
    }
    Ok(())
}

/// Split `turns` into `NUM_CHUNKS` `(seed, count)` pairs.
fn chunks(turns: u64, seed: Option<u64>) -> Vec<(u64, u64)> {
    let base = seed.unwrap_or_else(rand::random);
    let per_chunk = turns / NUM_CHUNKS;
    let remainder = turns % NUM_CHUNKS;
    (0..NUM_CHUNKS)
        .map(|i| {
            let count = per_chunk + u64::from(i < remainder);
            (base.wrapping_add(i), count)
        })
        .filter(|&(_, count)| count > 0)
        .collect()
}

/// Estimate the expected score of one turn holding at `threshold`.
///
/// # Errors
/// [`SolverError::InvalidConfiguration`] for a malformed die, a zero
/// threshold, or zero turns.
pub fn estimate_expected_value(
    dice: &DiceModel,
    threshold: u32,
    turns: u64,
    seed: Option<u64>,
) -> Result<Estimate> {
    check_inputs(dice, threshold, turns)?;

    let parts: Vec<(f64, f64)> = chunks(turns, seed)
        .into_par_iter()
        .map(|(chunk_seed, count)| {
            let mut rng = StdRng::seed_from_u64(chunk_seed);
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for _ in 0..count {
                let score = simulate_turn(dice, threshold, &mut rng) as f64;
                sum += score;
                sum_sq += score * score;
            }
            (sum, sum_sq)
        })
        .collect();

    // Summed in chunk order so seeded runs are bit-identical.
    let (sum, sum_sq) = parts
        .into_iter()
        .fold((0.0, 0.0), |acc, part| (acc.0 + part.0, acc.1 + part.1));

    Ok(Estimate::from_moments(sum, sum_sq, turns))
}

/// Estimate expected turn scores for every threshold `1..=max_threshold` at once.
///
/// Each simulated turn rolls until it busts or reaches `max_threshold`. A
/// roll that moves the total from `t` to `t + r` is where every threshold in
/// `t+1..=t+r` would have banked, so it credits `t + r` to each of them.
/// Returns `result[T - 1]` for threshold `T`.
pub fn simulate_expected_values(
    dice: &DiceModel,
    max_threshold: u32,
    turns: u64,
    seed: Option<u64>,
) -> Result<Vec<f64>> {
    check_inputs(dice, max_threshold, turns)?;
    let width = max_threshold as usize;

    let parts: Vec<Vec<f64>> = chunks(turns, seed)
        .into_par_iter()
        .map(|(chunk_seed, count)| {
            let mut rng = StdRng::seed_from_u64(chunk_seed);
            let mut credit = vec![0.0; width];
            for _ in 0..count {
                let mut total = 0usize;
                while total < width {
                    let roll = rng.gen_range(1..=dice.sides);
                    if dice.is_bust(roll) {
                        break;
                    }
                    let next = total + roll as usize;
                    for slot in &mut credit[total..next.min(width)] {
                        *slot += next as f64;
                    }
                    total = next;
                }
            }
            credit
        })
        .collect();

    let mut totals = vec![0.0; width];
    for part in parts {
        for (total, p) in totals.iter_mut().zip(part) {
            *total += p;
        }
    }

    Ok(totals.into_iter().map(|sum| sum / turns as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pig::TurnOutcomes;

    #[test]
    fn test_simulate_turn_outcomes() {
        let dice = DiceModel::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let score = simulate_turn(&dice, 10, &mut rng);
            assert!(score == 0 || (10..16).contains(&score), "score {}", score);
        }
    }

    #[test]
    fn test_seeded_estimate_is_reproducible() {
        let dice = DiceModel::default();
        let a = estimate_expected_value(&dice, 12, 50_000, Some(42)).unwrap();
        let b = estimate_expected_value(&dice, 12, 50_000, Some(42)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.samples, 50_000);
    }

    #[test]
    fn test_estimate_matches_exact_small_threshold() {
        let dice = DiceModel::default();
        let exact = TurnOutcomes::solve(&dice, 6).unwrap().get(5).unwrap().expected_value();
        let estimate = estimate_expected_value(&dice, 5, 400_000, Some(1)).unwrap();
        assert!(
            estimate.contains(exact, 5.0),
            "exact {} outside {:?}",
            exact,
            estimate.confidence_interval(5.0)
        );
    }

    #[test]
    fn test_all_thresholds_simulation() {
        let dice = DiceModel::default();
        let exact = TurnOutcomes::solve(&dice, 30).unwrap().expected_values();
        let simulated = simulate_expected_values(&dice, 30, 400_000, Some(3)).unwrap();
        assert_eq!(simulated.len(), 30);
        for (t, ev) in exact.iter() {
            let sim = simulated[t as usize - 1];
            assert!((sim - ev).abs() < 0.1, "T={} simulated {} exact {}", t, sim, ev);
        }
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let dice = DiceModel::default();
        assert!(estimate_expected_value(&dice, 0, 10, Some(1)).is_err());
        assert!(estimate_expected_value(&dice, 5, 0, Some(1)).is_err());
        assert!(simulate_expected_values(&dice, 0, 10, Some(1)).is_err());
    }

    #[test]
    fn test_chunks_cover_all_turns() {
        let parts = chunks(1_000, Some(9));
        assert_eq!(parts.iter().map(|&(_, c)| c).sum::<u64>(), 1_000);
        let few = chunks(5, Some(9));
        assert_eq!(few.len(), 5);
    }
}
