//! Exact solvers for the dice game Pig.
//!
//! # Overview
//!
//! The player to move rolls an `S`-sided die repeatedly, adding each face
//! above `F` to a running turn total. Rolling a face in `1..=F` busts the
//! turn and banks nothing. Under a threshold policy the player stops and
//! banks as soon as the turn total reaches `T`. The first player to reach
//! the goal wins.
//!
//! Solving happens in two stages:
//!
//! 1. [`TurnOutcomes`] computes, for every `T` in `1..=max_threshold`, the
//!    exact distribution of what one turn banks.
//! 2. [`StrategySolver`] uses those distributions as the transition model
//!    and runs value iteration over every `(mover, opponent)` score pair,
//!    producing the win probability under optimal play and the threshold
//!    that achieves it.
//!
//! # Example
//!
//! ```
//! use pig_solver::pig::{solve_game, ConvergencePolicy, SolverConfig};
//!
//! let config = SolverConfig::default()
//!     .with_goal(20)
//!     .with_max_threshold(20)
//!     .with_convergence(ConvergencePolicy::threshold(1e-6));
//! let (outcomes, solution) = solve_game(&config).unwrap();
//!
//! println!("EV of holding at 20: {:.3}", outcomes.get(20).unwrap().expected_value());
//! println!("P(win) from the start: {:.4}", solution.win_probability(0, 0));
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod progress;
pub mod solver;
pub mod storage;
pub mod turn;

// Re-export main types for convenient access
pub use config::{
    ConvergencePolicy, DiceModel, SolveStats, SolverConfig, UpdateScheme, DEFAULT_INITIAL_VALUE,
    DEFAULT_MAX_SWEEPS,
};
pub use error::{Result, SolverError};
pub use output::StrategyExport;
pub use progress::{NoProgress, ProgressReporter, SweepCallback};
pub use solver::{solve_game, solve_strategy, StrategySolution, StrategySolver};
pub use storage::{GameState, StrategyTable, ValueTable};
pub use turn::{
    solve_turn_outcomes, BankProbability, ExpectedValueTable, TurnOutcomeDistribution, TurnOutcomes,
};
