//! Value iteration over the `(mover, opponent)` score lattice.
//!
//! Pig is an alternating, zero-sum race. For a state `(x, n)` and a banking
//! threshold `T`, the mover's win probability after one turn is
//!
//! ```text
//! score(T, x, n) = Σ_{(o, p) in turn(T)}  p                     if x + o >= goal
//!                                          p * (1 - V[n, x + o]) otherwise
//! ```
//!
//! and `V[x, n] = max_T score(T, x, n)`. A bust (`o = 0`) hands the turn over
//! with the mover's score unchanged. Since `V` appears on both sides, the
//! table is found by repeated sweeps until it stops moving.
//!
//! Sweeps visit mover scores in decreasing order, and opponent scores in
//! decreasing order within each mover score. With [`UpdateScheme::InPlace`]
//! a cell reads whatever its neighbours hold at that moment, including values
//! written earlier in the same sweep. That converges faster than reading a
//! snapshot but makes every sweep sequential. [`UpdateScheme::Snapshot`]
//! reads only the previous sweep's table and solves rows in parallel.

use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::pig::config::{ConvergencePolicy, SolveStats, SolverConfig, UpdateScheme};
use crate::pig::error::{Result, SolverError};
use crate::pig::progress::{NoProgress, ProgressReporter};
use crate::pig::storage::{GameState, StrategyTable, ValueTable};
use crate::pig::turn::{TurnOutcomeDistribution, TurnOutcomes};

/// Computes optimal thresholds and win probabilities for every state.
///
/// The turn distributions are borrowed read-only. The config's dice model and
/// threshold range must match the ones the distributions were solved for.
///
/// # Example
/// ```
/// use pig_solver::pig::{ConvergencePolicy, DiceModel, SolverConfig, StrategySolver, TurnOutcomes};
///
/// let outcomes = TurnOutcomes::solve(&DiceModel::default(), 10).unwrap();
/// let config = SolverConfig::default()
///     .with_max_threshold(10)
///     .with_goal(10)
///     .with_convergence(ConvergencePolicy::threshold(1e-9));
/// let solution = StrategySolver::new(&outcomes, config).unwrap().solve();
///
/// // Moving first is an advantage.
/// assert!(solution.win_probability(0, 0) > 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct StrategySolver<'a> {
    outcomes: &'a TurnOutcomes,
    config: SolverConfig,
}

impl<'a> StrategySolver<'a> {
    /// Create a solver over the given turn distributions.
    ///
    /// # Errors
    /// [`SolverError::InvalidConfiguration`] when the config fails validation,
    /// no thresholds were solved, or the config's dice model or threshold
    /// range differs from the one `outcomes` was solved for.
    pub fn new(outcomes: &'a TurnOutcomes, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        if outcomes.max_threshold() == 0 {
            return Err(SolverError::invalid(
                "max_threshold",
                "turn outcomes contain no thresholds",
            ));
        }
        if config.dice != *outcomes.dice() {
            return Err(SolverError::invalid(
                "dice",
                format!(
                    "config die d{} ({} bust) does not match outcomes solved for d{} ({} bust)",
                    config.dice.sides,
                    config.dice.bust_faces,
                    outcomes.dice().sides,
                    outcomes.dice().bust_faces
                ),
            ));
        }
        if config.max_threshold != outcomes.max_threshold() {
            return Err(SolverError::invalid(
                "max_threshold",
                format!(
                    "config asks for thresholds up to {} but outcomes were solved up to {}",
                    config.max_threshold,
                    outcomes.max_threshold()
                ),
            ));
        }
        Ok(Self { outcomes, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run value iteration without progress reporting.
    pub fn solve(&self) -> StrategySolution {
        self.solve_with_progress(&mut NoProgress)
    }

    /// Run value iteration, notifying `progress` after every row and sweep.
    pub fn solve_with_progress<P>(&self, progress: &mut P) -> StrategySolution
    where
        P: ProgressReporter + ?Sized,
    {
        let start_time = Instant::now();
        let goal = self.config.goal;
        let mut values = ValueTable::new(goal, self.config.initial_value);
        let mut strategy = StrategyTable::new(goal);
        let mut stats = SolveStats {
            cells: values.len(),
            ..SolveStats::default()
        };

        for sweep in 1..=self.config.convergence.sweep_limit() {
            let delta = match self.config.update_scheme {
                UpdateScheme::InPlace => self.sweep_in_place(&mut values, &mut strategy, progress),
                UpdateScheme::Snapshot => self.sweep_snapshot(&mut values, &mut strategy, progress),
            };
            stats.sweeps = sweep;
            stats.final_delta = delta;
            progress.on_sweep(sweep, delta);
            debug!("sweep {} max delta {:.3e}", sweep, delta);

            if let ConvergencePolicy::Threshold { delta: target, .. } = self.config.convergence {
                if delta < target {
                    stats.converged = true;
                    break;
                }
            }
        }

        match self.config.convergence {
            ConvergencePolicy::FixedSweeps { .. } => stats.converged = true,
            ConvergencePolicy::Threshold { delta, max_sweeps } if !stats.converged => {
                warn!(
                    "stopped after {} sweeps with delta {:.3e} still above {:.3e}",
                    max_sweeps, stats.final_delta, delta
                );
            }
            ConvergencePolicy::Threshold { .. } => {}
        }

        stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        info!(
            "solved goal {} over {} thresholds: {} sweeps, final delta {:.3e}, {:.2}s",
            goal,
            self.outcomes.max_threshold(),
            stats.sweeps,
            stats.final_delta,
            stats.elapsed_seconds
        );

        StrategySolution {
            goal,
            values,
            strategy,
            stats,
        }
    }

    /// Gauss-Seidel sweep in scan order. Returns the largest cell change.
    fn sweep_in_place<P>(
        &self,
        values: &mut ValueTable,
        strategy: &mut StrategyTable,
        progress: &mut P,
    ) -> f64
    where
        P: ProgressReporter + ?Sized,
    {
        let goal = self.config.goal;
        let total = values.len() as u64;
        let mut done = 0u64;
        let mut delta: f64 = 0.0;

        for x in (0..goal).rev() {
            for n in (0..goal).rev() {
                let (threshold, value) = self.best_threshold(x, n, values);
                let old = values.replace(x, n, value);
                strategy.set(x, n, threshold);
                delta = delta.max((value - old).abs());
            }
            done += goal as u64;
            progress.on_cells(done, total);
        }

        delta
    }

    /// Jacobi sweep: every row reads the previous table, rows run in parallel.
    fn sweep_snapshot<P>(
        &self,
        values: &mut ValueTable,
        strategy: &mut StrategyTable,
        progress: &mut P,
    ) -> f64
    where
        P: ProgressReporter + ?Sized,
    {
        let goal = self.config.goal;
        let snapshot = values.clone();

        let rows: Vec<Vec<(u32, f64)>> = (0..goal)
            .into_par_iter()
            .map(|x| {
                (0..goal)
                    .map(|n| self.best_threshold(x, n, &snapshot))
                    .collect()
            })
            .collect();

        let mut delta: f64 = 0.0;
        for (x, row) in rows.into_iter().enumerate() {
            for (n, (threshold, value)) in row.into_iter().enumerate() {
                let old = values.replace(x as u32, n as u32, value);
                strategy.set(x as u32, n as u32, threshold);
                delta = delta.max((value - old).abs());
            }
        }

        let total = values.len() as u64;
        progress.on_cells(total, total);
        delta
    }

    /// Best `(threshold, score)` at `(x, n)` against the current table.
    ///
    /// Thresholds are tried in ascending order; the tie rule comes from the
    /// convergence policy.
    fn best_threshold(&self, x: u32, n: u32, values: &ValueTable) -> (u32, f64) {
        let later_ties = self.config.convergence.prefers_later_ties();
        let mut best_threshold = 0;
        let mut best_score = f64::NEG_INFINITY;

        for dist in self.outcomes.iter() {
            let score = self.score(dist, x, n, values);
            if score > best_score || (later_ties && score == best_score) {
                best_threshold = dist.threshold();
                best_score = score;
            }
        }

        (best_threshold, best_score)
    }

    /// One-turn win probability for the mover at `(x, n)` holding at `dist`'s threshold.
    fn score(&self, dist: &TurnOutcomeDistribution, x: u32, n: u32, values: &ValueTable) -> f64 {
        let goal = self.config.goal;
        dist.outcomes()
            .iter()
            .map(|&(outcome, p)| {
                if x + outcome >= goal {
                    p
                } else {
                    p * (1.0 - values.get(n, x + outcome))
                }
            })
            .sum()
    }
}

/// Final tables from a value-iteration run.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategySolution {
    goal: u32,
    values: ValueTable,
    strategy: StrategyTable,
    stats: SolveStats,
}

impl StrategySolution {
    /// Goal score the solution was computed for.
    pub fn goal(&self) -> u32 {
        self.goal
    }

    /// Mover's win probability at `(mover, opponent)`.
    ///
    /// Scores at or past the goal are already decided: a mover there has won,
    /// and an opponent there has won.
    pub fn win_probability(&self, mover: u32, opponent: u32) -> f64 {
        if mover >= self.goal {
            1.0
        } else if opponent >= self.goal {
            0.0
        } else {
            self.values.get(mover, opponent)
        }
    }

    /// Optimal threshold at `(mover, opponent)`, `None` outside the lattice.
    pub fn best_threshold(&self, mover: u32, opponent: u32) -> Option<u32> {
        if mover >= self.goal || opponent >= self.goal {
            return None;
        }
        self.strategy.get(mover, opponent)
    }

    /// Optimal threshold at a [`GameState`].
    pub fn best_threshold_at(&self, state: GameState) -> Option<u32> {
        self.best_threshold(state.mover, state.opponent)
    }

    /// Win probability table.
    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    /// Optimal threshold table.
    pub fn strategy(&self) -> &StrategyTable {
        &self.strategy
    }

    /// Iteration statistics.
    pub fn stats(&self) -> &SolveStats {
        &self.stats
    }

    /// Split into the owned tables.
    pub fn into_parts(self) -> (ValueTable, StrategyTable, SolveStats) {
        (self.values, self.strategy, self.stats)
    }
}

/// Solve the game for `goal` with the given distributions and stopping rule.
pub fn solve_strategy(
    outcomes: &TurnOutcomes,
    goal: u32,
    convergence: ConvergencePolicy,
) -> Result<StrategySolution> {
    let config = SolverConfig::default()
        .with_dice(*outcomes.dice())
        .with_max_threshold(outcomes.max_threshold())
        .with_goal(goal)
        .with_convergence(convergence);
    Ok(StrategySolver::new(outcomes, config)?.solve())
}

/// Build the turn distributions from `config` and solve the game.
pub fn solve_game(config: &SolverConfig) -> Result<(TurnOutcomes, StrategySolution)> {
    config.validate()?;
    let outcomes = TurnOutcomes::solve(&config.dice, config.max_threshold)?;
    let solution = StrategySolver::new(&outcomes, config.clone())?.solve();
    Ok((outcomes, solution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pig::config::DiceModel;
    use crate::pig::progress::SweepCallback;

    fn d6_outcomes(max_threshold: u32) -> TurnOutcomes {
        TurnOutcomes::solve(&DiceModel::default(), max_threshold).unwrap()
    }

    #[test]
    fn test_goal_one_closed_form() {
        // Any scoring roll wins; a bust hands the same position over.
        // V = 5/6 + 1/6 * (1 - V)  =>  V = 6/7
        let outcomes = d6_outcomes(6);
        let solution = solve_strategy(&outcomes, 1, ConvergencePolicy::threshold(1e-14)).unwrap();
        assert!((solution.win_probability(0, 0) - 6.0 / 7.0).abs() < 1e-12);
        assert!(solution.stats().converged);
    }

    #[test]
    fn test_near_goal_wins_outright() {
        let outcomes = d6_outcomes(10);
        let solution = solve_strategy(&outcomes, 10, ConvergencePolicy::threshold(1e-12)).unwrap();
        let t1 = outcomes.get(1).unwrap();
        assert!((t1.bust_probability() - 1.0 / 6.0).abs() < 1e-12);

        for n in 0..10 {
            // Every non-bust outcome of T=1 reaches 9 + o >= 10.
            let expected = (1.0 - t1.bust_probability())
                + t1.bust_probability() * (1.0 - solution.win_probability(n, 9));
            assert!(
                (solution.win_probability(9, n) - expected).abs() < 1e-9,
                "state (9, {})",
                n
            );
        }
    }

    #[test]
    fn test_tie_break_rules() {
        // T=1 and T=2 have identical distributions on a d6 with one bust face,
        // so every near-goal state ties between them.
        let outcomes = d6_outcomes(10);
        let fixed = solve_strategy(&outcomes, 10, ConvergencePolicy::fixed(50)).unwrap();
        let delta = solve_strategy(&outcomes, 10, ConvergencePolicy::threshold(1e-9)).unwrap();
        for n in 0..10 {
            assert_eq!(fixed.best_threshold(9, n), Some(1));
            assert_eq!(delta.best_threshold(9, n), Some(2));
        }
    }

    #[test]
    fn test_values_are_probabilities() {
        let outcomes = d6_outcomes(20);
        let solution = solve_strategy(&outcomes, 20, ConvergencePolicy::threshold(1e-6)).unwrap();
        assert!(solution.strategy().is_resolved());
        for x in 0..20 {
            for n in 0..20 {
                let v = solution.win_probability(x, n);
                assert!((0.0..=1.0).contains(&v), "V({}, {}) = {}", x, n, v);
                let t = solution.best_threshold(x, n).unwrap();
                assert!((1..=20).contains(&t));
            }
        }
        assert!(solution.win_probability(0, 0) > 0.5);
        // Being further ahead never hurts.
        assert!(solution.win_probability(15, 0) > solution.win_probability(0, 15));
        assert_eq!(solution.win_probability(20, 3), 1.0);
        assert_eq!(solution.win_probability(3, 20), 0.0);
        assert_eq!(solution.best_threshold(20, 0), None);
    }

    #[test]
    fn test_deterministic() {
        let outcomes = d6_outcomes(15);
        let a = solve_strategy(&outcomes, 15, ConvergencePolicy::threshold(1e-8)).unwrap();
        let b = solve_strategy(&outcomes, 15, ConvergencePolicy::threshold(1e-8)).unwrap();
        assert_eq!(a.values(), b.values());
        assert_eq!(a.strategy(), b.strategy());
    }

    #[test]
    fn test_fixed_sweeps_run_exactly() {
        let outcomes = d6_outcomes(8);
        let solution = solve_strategy(&outcomes, 8, ConvergencePolicy::fixed(7)).unwrap();
        assert_eq!(solution.stats().sweeps, 7);
        assert!(solution.stats().converged);
        assert_eq!(solution.stats().cells, 64);
    }

    #[test]
    fn test_snapshot_reaches_same_fixed_point() {
        let outcomes = d6_outcomes(15);
        let base = SolverConfig::default()
            .with_max_threshold(15)
            .with_goal(15)
            .with_convergence(ConvergencePolicy::threshold(1e-12));

        let in_place = StrategySolver::new(&outcomes, base.clone()).unwrap().solve();
        let snapshot = StrategySolver::new(
            &outcomes,
            base.with_update_scheme(UpdateScheme::Snapshot),
        )
        .unwrap()
        .solve();

        assert!(in_place.values().max_abs_diff(snapshot.values()) < 1e-9);
        assert!(snapshot.stats().converged);
    }

    #[test]
    fn test_sweep_cap_stops_iteration() {
        let outcomes = d6_outcomes(10);
        let config = SolverConfig::default()
            .with_max_threshold(10)
            .with_goal(10)
            .with_convergence(ConvergencePolicy::Threshold {
                delta: 1e-300,
                max_sweeps: 3,
            });
        let solution = StrategySolver::new(&outcomes, config).unwrap().solve();
        assert_eq!(solution.stats().sweeps, 3);
        assert!(!solution.stats().converged);
    }

    #[test]
    fn test_progress_reports_every_sweep() {
        let outcomes = d6_outcomes(6);
        let config = SolverConfig::default()
            .with_max_threshold(6)
            .with_goal(6)
            .with_convergence(ConvergencePolicy::fixed(4));
        let solver = StrategySolver::new(&outcomes, config).unwrap();

        let mut seen = Vec::new();
        let solution = solver.solve_with_progress(&mut SweepCallback(|sweep: u32, delta: f64| {
            seen.push((sweep, delta))
        }));
        assert_eq!(seen.len(), 4);
        assert_eq!(seen.iter().map(|&(s, _)| s).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(seen[3].1, solution.stats().final_delta);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let outcomes = d6_outcomes(6);
        assert!(solve_strategy(&outcomes, 0, ConvergencePolicy::threshold(1e-3)).is_err());
        assert!(solve_strategy(&outcomes, 5, ConvergencePolicy::threshold(0.0)).is_err());
        assert!(solve_strategy(&outcomes, 5, ConvergencePolicy::fixed(0)).is_err());
    }

    #[test]
    fn test_config_must_match_outcomes() {
        let outcomes = d6_outcomes(30);
        let config = SolverConfig::default().with_max_threshold(30).with_goal(10);
        assert!(StrategySolver::new(&outcomes, config.clone()).is_ok());

        let narrower = config.clone().with_max_threshold(6);
        assert!(matches!(
            StrategySolver::new(&outcomes, narrower),
            Err(SolverError::InvalidConfiguration { field: "max_threshold", .. })
        ));

        let other_die = config.with_dice(DiceModel::new(8, 2).unwrap());
        assert!(matches!(
            StrategySolver::new(&outcomes, other_die),
            Err(SolverError::InvalidConfiguration { field: "dice", .. })
        ));
    }

    #[test]
    fn test_solve_game_propagates_range_error() {
        let config = SolverConfig::default().with_max_threshold(4).with_goal(10);
        assert!(matches!(
            solve_game(&config),
            Err(SolverError::InsufficientRange { .. })
        ));
    }
}
