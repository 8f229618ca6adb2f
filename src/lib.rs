//! # Pig Solver
//!
//! Exact solvers for the push-your-luck dice race Pig.
//!
//! ## Features
//!
//! - **Turn Outcome Solver**: Exact distribution of points banked in one turn
//!   for every "hold at `T`" threshold, with no sampling
//! - **Strategy Solver**: Value iteration over every `(mover, opponent)` score
//!   pair, giving the optimal threshold and win probability per state
//! - **Two Stopping Rules**: Fixed sweep count, or sweep until the largest
//!   change drops below a delta (with a hard sweep cap)
//! - **Monte-Carlo Cross-Check**: Seeded, parallel simulation of turns to
//!   validate the exact expectations
//!
//! ## Quick Start
//!
//! ```
//! use pig_solver::pig::{ConvergencePolicy, DiceModel, StrategySolver, SolverConfig, TurnOutcomes};
//!
//! // 1. Solve single-turn outcomes for thresholds 1..=20
//! let outcomes = TurnOutcomes::solve(&DiceModel::default(), 20).unwrap();
//!
//! // 2. Solve the race to 20
//! let config = SolverConfig::default()
//!     .with_max_threshold(20)
//!     .with_goal(20)
//!     .with_convergence(ConvergencePolicy::threshold(1e-6));
//! let solution = StrategySolver::new(&outcomes, config).unwrap().solve();
//!
//! // 3. Query the strategy
//! let hold_at = solution.best_threshold(0, 0);
//! assert!(hold_at.is_some());
//! ```
//!
//! ## Modules
//!
//! - [`pig`]: Dice model, turn outcome solver, value iteration
//! - [`validation`]: Monte-Carlo estimates used to cross-check the exact solver
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐   distributions   ┌───────────────────────┐
//! │ TurnOutcomes         │ ────────────────▶ │ StrategySolver        │
//! │  - bank recurrence   │    (read-only)    │  - value iteration    │
//! │  - per-T outcomes    │                   │  - ValueTable         │
//! └──────────────────────┘                   │  - StrategyTable      │
//!            ▲                               └───────────────────────┘
//!            │ cross-check
//! ┌──────────────────────┐
//! │ validation (MC)      │
//! └──────────────────────┘
//! ```

#![warn(missing_docs)]

/// Core Pig solvers.
///
/// Turn outcome distributions and the value iterator built on them.
pub mod pig;

/// Monte-Carlo validation of the exact turn solver.
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use pig::{
    ConvergencePolicy, DiceModel, SolverConfig, SolverError, StrategySolution, StrategySolver,
    TurnOutcomes,
};
