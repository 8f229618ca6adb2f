//! Exact single-turn outcome distributions for threshold banking policies.
//!
//! A turn under threshold `T` keeps rolling until the running total reaches
//! `T` (bank it, possibly overshooting) or a bust face comes up (bank 0).
//!
//! The solver runs one forward recurrence over running totals,
//!
//! ```text
//! hist[0] = 1
//! hist[k] = Σ_{r = F+1..S, r <= k} hist[k - r] / S
//! ```
//!
//! then, for each threshold, collects the mass of every crossing roll
//! `k + r >= T` from a pre-bank total `k < T`. Bust mass is the residual
//! `1 - Σ banked`, which keeps each distribution normalized.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::pig::config::DiceModel;
use crate::pig::error::{Result, SolverError};

/// `hist[k]`: probability that a turn passes through running total `k`
/// without busting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankProbability {
    hist: Vec<f64>,
}

impl BankProbability {
    /// Run the forward recurrence for totals `0..=max_total`.
    pub fn compute(dice: &DiceModel, max_total: u32) -> Self {
        let p = dice.face_probability();
        let mut hist = vec![0.0; max_total as usize + 1];
        hist[0] = 1.0;

        for k in 1..hist.len() {
            let mut mass = 0.0;
            for roll in dice.scoring_faces() {
                let roll = roll as usize;
                if roll <= k {
                    mass += hist[k - roll] * p;
                }
            }
            hist[k] = mass;
        }

        Self { hist }
    }

    /// Probability of passing through `total`, or 0 outside the table.
    pub fn get(&self, total: u32) -> f64 {
        self.hist.get(total as usize).copied().unwrap_or(0.0)
    }

    /// Raw table, indexed by running total.
    pub fn as_slice(&self) -> &[f64] {
        &self.hist
    }
}

/// Probability mass over what a single turn banks under threshold `T`.
///
/// Outcome `0` is a bust; every other outcome is at least `T`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcomeDistribution {
    threshold: u32,
    /// Sorted by outcome, bust first.
    outcomes: Vec<(u32, f64)>,
}

impl TurnOutcomeDistribution {
    fn from_masses(threshold: u32, banked: FxHashMap<u32, f64>) -> Self {
        let banked_total: f64 = banked.values().sum();
        let mut outcomes: Vec<(u32, f64)> = banked.into_iter().collect();
        outcomes.sort_unstable_by_key(|&(value, _)| value);
        // Round-off can push the residual a ulp below zero when nothing busts.
        outcomes.insert(0, (0, (1.0 - banked_total).max(0.0)));
        Self { threshold, outcomes }
    }

    /// The banking threshold this distribution describes.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// `(outcome, probability)` pairs in ascending outcome order.
    pub fn outcomes(&self) -> &[(u32, f64)] {
        &self.outcomes
    }

    /// Probability of banking exactly `outcome` (0 = bust).
    pub fn probability(&self, outcome: u32) -> f64 {
        self.outcomes
            .binary_search_by_key(&outcome, |&(value, _)| value)
            .map(|idx| self.outcomes[idx].1)
            .unwrap_or(0.0)
    }

    /// Probability that the turn busts.
    pub fn bust_probability(&self) -> f64 {
        self.probability(0)
    }

    /// Total mass over every outcome, bust included.
    pub fn total_mass(&self) -> f64 {
        self.outcomes.iter().map(|&(_, p)| p).sum()
    }

    /// Expected points banked by the turn.
    pub fn expected_value(&self) -> f64 {
        self.outcomes
            .iter()
            .map(|&(value, p)| value as f64 * p)
            .sum()
    }
}

/// Expected points per turn for every threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedValueTable {
    /// `values[T - 1]` is the expectation under threshold `T`.
    values: Vec<f64>,
}

impl ExpectedValueTable {
    /// Expected value for threshold `T`.
    pub fn get(&self, threshold: u32) -> Option<f64> {
        let idx = (threshold as usize).checked_sub(1)?;
        self.values.get(idx).copied()
    }

    /// `(T, EV[T])` pairs in ascending threshold order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, &ev)| (idx as u32 + 1, ev))
    }

    /// Threshold with the highest single-turn expectation (lowest on ties).
    pub fn best_threshold(&self) -> Option<(u32, f64)> {
        self.iter()
            .fold(None, |best: Option<(u32, f64)>, (t, ev)| match best {
                Some((_, best_ev)) if best_ev >= ev => best,
                _ => Some((t, ev)),
            })
    }

    /// Number of thresholds in the table.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the table holds no thresholds.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome distributions for every threshold in `1..=max_threshold`.
///
/// Produced once and shared read-only with the strategy solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcomes {
    dice: DiceModel,
    bank: BankProbability,
    distributions: Vec<TurnOutcomeDistribution>,
}

impl TurnOutcomes {
    /// Solve every threshold in `1..=max_threshold`.
    ///
    /// # Errors
    /// [`SolverError::InsufficientRange`] when `max_threshold < S`, and
    /// [`SolverError::InvalidConfiguration`] for a malformed die. Both are
    /// checked before any computation.
    pub fn solve(dice: &DiceModel, max_threshold: u32) -> Result<Self> {
        dice.validate()?;
        if max_threshold < dice.sides {
            return Err(SolverError::InsufficientRange {
                max_threshold,
                sides: dice.sides,
            });
        }

        let bank = BankProbability::compute(dice, max_threshold);
        let p = dice.face_probability();

        let distributions = (1..=max_threshold)
            .map(|threshold| {
                let mut banked: FxHashMap<u32, f64> = FxHashMap::default();
                // Only totals within one roll of T can cross it.
                let lowest = threshold.saturating_sub(dice.sides);
                for k in lowest..threshold {
                    let reach = bank.get(k);
                    if reach == 0.0 {
                        continue;
                    }
                    for roll in dice.scoring_faces() {
                        if k + roll >= threshold {
                            *banked.entry(k + roll).or_insert(0.0) += reach * p;
                        }
                    }
                }
                TurnOutcomeDistribution::from_masses(threshold, banked)
            })
            .collect();

        Ok(Self {
            dice: *dice,
            bank,
            distributions,
        })
    }

    /// The die these distributions were computed for.
    pub fn dice(&self) -> &DiceModel {
        &self.dice
    }

    /// Largest threshold solved.
    pub fn max_threshold(&self) -> u32 {
        self.distributions.len() as u32
    }

    /// The pass-through probabilities the distributions were built from.
    pub fn bank_probability(&self) -> &BankProbability {
        &self.bank
    }

    /// Distribution for threshold `T`, if it was solved.
    pub fn get(&self, threshold: u32) -> Option<&TurnOutcomeDistribution> {
        let idx = (threshold as usize).checked_sub(1)?;
        self.distributions.get(idx)
    }

    /// All distributions in ascending threshold order.
    pub fn iter(&self) -> std::slice::Iter<'_, TurnOutcomeDistribution> {
        self.distributions.iter()
    }

    /// Project every distribution onto its expected value.
    pub fn expected_values(&self) -> ExpectedValueTable {
        ExpectedValueTable {
            values: self
                .distributions
                .iter()
                .map(TurnOutcomeDistribution::expected_value)
                .collect(),
        }
    }
}

/// Solve every threshold in `1..=max_threshold` for `dice`.
///
/// Shorthand for [`TurnOutcomes::solve`].
pub fn solve_turn_outcomes(dice: &DiceModel, max_threshold: u32) -> Result<TurnOutcomes> {
    TurnOutcomes::solve(dice, max_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d6() -> DiceModel {
        DiceModel::new(6, 1).unwrap()
    }

    #[test]
    fn test_insufficient_range() {
        let err = TurnOutcomes::solve(&d6(), 5).unwrap_err();
        assert_eq!(
            err,
            SolverError::InsufficientRange {
                max_threshold: 5,
                sides: 6
            }
        );
        assert!(TurnOutcomes::solve(&d6(), 6).is_ok());
    }

    #[test]
    fn test_bank_probability_recurrence() {
        let bank = BankProbability::compute(&d6(), 6);
        let h = bank.as_slice();
        assert_eq!(h[0], 1.0);
        assert_eq!(h[1], 0.0);
        assert!((h[2] - 1.0 / 6.0).abs() < 1e-15);
        assert!((h[3] - 1.0 / 6.0).abs() < 1e-15);
        // 4 = 4 or 2+2
        assert!((h[4] - (1.0 / 6.0 + 1.0 / 36.0)).abs() < 1e-15);
        assert_eq!(bank.get(100), 0.0);
    }

    #[test]
    fn test_normalization_and_bounds() {
        let outcomes = TurnOutcomes::solve(&d6(), 100).unwrap();
        assert_eq!(outcomes.max_threshold(), 100);
        for dist in outcomes.iter() {
            assert!(
                (dist.total_mass() - 1.0).abs() < 1e-9,
                "threshold {} has mass {}",
                dist.threshold(),
                dist.total_mass()
            );
            for &(value, p) in dist.outcomes() {
                assert!((0.0..=1.0).contains(&p), "p={} at {}", p, value);
                assert!(value == 0 || value >= dist.threshold());
                assert!(value < dist.threshold() + 6);
            }
        }
    }

    #[test]
    fn test_small_thresholds_exact() {
        let outcomes = TurnOutcomes::solve(&d6(), 6).unwrap();

        // T=1 and T=2: the first scoring roll banks.
        for t in [1, 2] {
            let dist = outcomes.get(t).unwrap();
            assert!((dist.bust_probability() - 1.0 / 6.0).abs() < 1e-12);
            for face in 2..=6 {
                assert!((dist.probability(face) - 1.0 / 6.0).abs() < 1e-12);
            }
            assert!((dist.expected_value() - 20.0 / 6.0).abs() < 1e-12);
        }

        // T=3: bank 3..6 directly, or 2 then any scoring roll.
        let dist = outcomes.get(3).unwrap();
        assert!((dist.probability(4) - (1.0 / 6.0 + 1.0 / 36.0)).abs() < 1e-12);
        assert!((dist.probability(8) - 1.0 / 36.0).abs() < 1e-12);
        assert!((dist.bust_probability() - (1.0 / 6.0 + 1.0 / 36.0)).abs() < 1e-12);
        assert!((dist.expected_value() - (3.0 + 30.0 / 36.0)).abs() < 1e-12);
    }

    #[test]
    fn test_expected_value_peak() {
        let ev = TurnOutcomes::solve(&d6(), 40).unwrap().expected_values();
        assert_eq!(ev.len(), 40);
        let (best, value) = ev.best_threshold().unwrap();
        assert!(best == 20 || best == 21, "best threshold {}", best);
        assert!(value > 8.0 && value < 8.3, "peak EV {}", value);
        assert!(ev.get(0).is_none());
        assert!(ev.get(41).is_none());
    }

    #[test]
    fn test_no_bust_faces() {
        for sides in [4, 5, 10, 12] {
            let die = DiceModel::new(sides, 0).unwrap();
            let outcomes = TurnOutcomes::solve(&die, 200).unwrap();
            for dist in outcomes.iter() {
                let bust = dist.bust_probability();
                assert!(bust >= 0.0 && bust < 1e-12, "d{} T={} bust {}", sides, dist.threshold(), bust);
                assert!(dist
                    .outcomes()
                    .iter()
                    .all(|&(_, p)| (0.0..=1.0).contains(&p)));
                assert!((dist.total_mass() - 1.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_invalid_die_rejected() {
        let die = DiceModel {
            sides: 3,
            bust_faces: 3,
        };
        assert!(matches!(
            TurnOutcomes::solve(&die, 10),
            Err(SolverError::InvalidConfiguration { .. })
        ));
    }
}
