//! Error types for the turn-outcome and strategy solvers.

use thiserror::Error;

/// Errors raised by the solvers and the configuration loader.
///
/// All variants are precondition failures: they are returned before any
/// table is allocated or mutated, so there is never a partial result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The threshold range is too short to warm up the bank recurrence.
    ///
    /// The forward recurrence needs at least one full die's worth of entries;
    /// anything shorter produces distributions that do not sum to one.
    #[error("max threshold {max_threshold} is smaller than the die's {sides} faces")]
    InsufficientRange {
        /// Requested maximum threshold.
        max_threshold: u32,
        /// Number of faces on the die.
        sides: u32,
    },

    /// A parameter would produce a degenerate model or a non-terminating loop.
    #[error("invalid configuration for `{field}`: {message}")]
    InvalidConfiguration {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// Reading a configuration file failed.
    #[error("failed to read configuration: {0}")]
    Io(String),

    /// A configuration file was not valid JSON for `SolverConfig`.
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl SolverError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        SolverError::InvalidConfiguration {
            field,
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolverError>;
