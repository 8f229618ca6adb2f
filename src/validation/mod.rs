//! Empirical checks for the exact solvers.
//!
//! Nothing in [`crate::pig`] depends on this module; it only samples the
//! same dice model to confirm the exact expectations within statistical
//! tolerance.

pub mod monte_carlo;

pub use monte_carlo::{
    estimate_expected_value, simulate_expected_values, simulate_turn, Estimate, Z_99,
};
