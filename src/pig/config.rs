//! Configuration options for the Pig solvers.
//!
//! This module provides the dice model, the convergence policy for value
//! iteration, and a serde-loadable [`SolverConfig`] bundling every scalar
//! parameter the solvers need.

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pig::error::{Result, SolverError};

/// Default number of sweeps the delta-based variant may run before giving up.
pub const DEFAULT_MAX_SWEEPS: u32 = 10_000;

/// Seed value written into every cell before the first sweep.
pub const DEFAULT_INITIAL_VALUE: f64 = 0.25;

/// An `S`-sided die whose faces `1..=F` bust the turn.
///
/// Faces `F+1..=S` add their face value to the running turn total.
///
/// # Example
/// ```
/// use pig_solver::pig::DiceModel;
///
/// let die = DiceModel::new(6, 1).unwrap();
/// assert_eq!(die.scoring_faces(), 2..=6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceModel {
    /// Number of faces `S`.
    pub sides: u32,
    /// Number of low faces `F` that bust the turn.
    pub bust_faces: u32,
}

impl Default for DiceModel {
    fn default() -> Self {
        Self {
            sides: 6,
            bust_faces: 1,
        }
    }
}

impl DiceModel {
    /// Create a validated dice model.
    pub fn new(sides: u32, bust_faces: u32) -> Result<Self> {
        let model = Self { sides, bust_faces };
        model.validate()?;
        Ok(model)
    }

    /// Check `S > 0` and `F < S`.
    pub fn validate(&self) -> Result<()> {
        if self.sides == 0 {
            return Err(SolverError::invalid("sides", "die must have at least one face"));
        }
        if self.bust_faces >= self.sides {
            return Err(SolverError::invalid(
                "bust_faces",
                format!(
                    "{} bust faces leaves no scoring face on a {}-sided die",
                    self.bust_faces, self.sides
                ),
            ));
        }
        Ok(())
    }

    /// Face values that add to the running total.
    pub fn scoring_faces(&self) -> RangeInclusive<u32> {
        (self.bust_faces + 1)..=self.sides
    }

    /// Probability of any single face.
    pub fn face_probability(&self) -> f64 {
        1.0 / self.sides as f64
    }

    /// Probability that one roll busts.
    pub fn bust_probability(&self) -> f64 {
        self.bust_faces as f64 / self.sides as f64
    }

    /// Whether a rolled face ends the turn with nothing banked.
    pub fn is_bust(&self, face: u32) -> bool {
        face <= self.bust_faces
    }
}

/// When value iteration stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvergencePolicy {
    /// Run exactly `sweeps` full sweeps.
    ///
    /// Ties between thresholds keep the lowest threshold.
    FixedSweeps {
        /// Number of sweeps over the lattice.
        sweeps: u32,
    },

    /// Sweep until the largest per-cell change in a sweep drops below `delta`.
    ///
    /// Ties between thresholds keep the highest threshold. `max_sweeps`
    /// bounds the loop when floating-point oscillation keeps the change
    /// above `delta`.
    Threshold {
        /// Stop once the largest change in a sweep is below this value.
        delta: f64,
        /// Hard cap on the number of sweeps.
        #[serde(default = "default_max_sweeps")]
        max_sweeps: u32,
    },
}

fn default_max_sweeps() -> u32 {
    DEFAULT_MAX_SWEEPS
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        ConvergencePolicy::Threshold {
            delta: 1e-6,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }
}

impl ConvergencePolicy {
    /// Fixed number of sweeps.
    pub fn fixed(sweeps: u32) -> Self {
        ConvergencePolicy::FixedSweeps { sweeps }
    }

    /// Delta threshold with the default sweep cap.
    pub fn threshold(delta: f64) -> Self {
        ConvergencePolicy::Threshold {
            delta,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }

    /// Upper bound on the number of sweeps this policy can run.
    pub fn sweep_limit(&self) -> u32 {
        match *self {
            ConvergencePolicy::FixedSweeps { sweeps } => sweeps,
            ConvergencePolicy::Threshold { max_sweeps, .. } => max_sweeps,
        }
    }

    /// Whether an equal score replaces the current best threshold.
    ///
    /// The fixed-sweep variant compares with `>` (first maximum wins), the
    /// delta variant with `>=` (last maximum wins).
    pub fn prefers_later_ties(&self) -> bool {
        matches!(self, ConvergencePolicy::Threshold { .. })
    }

    /// Validate the policy and return any errors.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ConvergencePolicy::FixedSweeps { sweeps } => {
                if sweeps == 0 {
                    return Err(SolverError::invalid("sweeps", "must run at least one sweep"));
                }
            }
            ConvergencePolicy::Threshold { delta, max_sweeps } => {
                if !(delta.is_finite() && delta > 0.0) {
                    return Err(SolverError::invalid(
                        "delta",
                        format!("delta must be positive and finite, got {}", delta),
                    ));
                }
                if max_sweeps == 0 {
                    return Err(SolverError::invalid("max_sweeps", "must allow at least one sweep"));
                }
            }
        }
        Ok(())
    }
}

/// How a sweep reads the values it depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScheme {
    /// Gauss-Seidel: cells read values already updated earlier in the sweep.
    ///
    /// Converges faster but is order dependent and strictly sequential.
    #[default]
    InPlace,
    /// Jacobi: every cell reads the previous sweep's snapshot.
    ///
    /// Slower to converge, but rows are independent and solved in parallel.
    Snapshot,
}

/// Every parameter needed to solve a game.
///
/// # Example
/// ```
/// use pig_solver::pig::{ConvergencePolicy, SolverConfig};
///
/// let config = SolverConfig::default()
///     .with_goal(20)
///     .with_max_threshold(20)
///     .with_convergence(ConvergencePolicy::threshold(1e-3));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Die description.
    #[serde(default)]
    pub dice: DiceModel,

    /// Largest banking threshold considered; thresholds run `1..=max_threshold`.
    #[serde(default = "default_max_threshold")]
    pub max_threshold: u32,

    /// Score needed to win.
    #[serde(default = "default_goal")]
    pub goal: u32,

    /// Stopping rule for value iteration.
    #[serde(default)]
    pub convergence: ConvergencePolicy,

    /// Gauss-Seidel or Jacobi sweeps.
    #[serde(default)]
    pub update_scheme: UpdateScheme,

    /// Neutral seed for every cell before the first sweep.
    #[serde(default = "default_initial_value")]
    pub initial_value: f64,
}

fn default_max_threshold() -> u32 {
    100
}

fn default_goal() -> u32 {
    100
}

fn default_initial_value() -> f64 {
    DEFAULT_INITIAL_VALUE
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            dice: DiceModel::default(),
            max_threshold: default_max_threshold(),
            goal: default_goal(),
            convergence: ConvergencePolicy::default(),
            update_scheme: UpdateScheme::default(),
            initial_value: DEFAULT_INITIAL_VALUE,
        }
    }
}

impl SolverConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the dice model.
    pub fn with_dice(mut self, dice: DiceModel) -> Self {
        self.dice = dice;
        self
    }

    /// Builder method: set the largest threshold.
    pub fn with_max_threshold(mut self, max_threshold: u32) -> Self {
        self.max_threshold = max_threshold;
        self
    }

    /// Builder method: set the goal score.
    pub fn with_goal(mut self, goal: u32) -> Self {
        self.goal = goal;
        self
    }

    /// Builder method: set the convergence policy.
    pub fn with_convergence(mut self, convergence: ConvergencePolicy) -> Self {
        self.convergence = convergence;
        self
    }

    /// Builder method: set the update scheme.
    pub fn with_update_scheme(mut self, scheme: UpdateScheme) -> Self {
        self.update_scheme = scheme;
        self
    }

    /// Builder method: set the seed value for every cell.
    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| SolverError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SolverError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// The threshold range is checked separately by the turn solver, which
    /// reports [`SolverError::InsufficientRange`].
    pub fn validate(&self) -> Result<()> {
        self.dice.validate()?;
        if self.goal == 0 {
            return Err(SolverError::invalid("goal", "goal score must be positive"));
        }
        if self.max_threshold == 0 {
            return Err(SolverError::invalid("max_threshold", "need at least one threshold"));
        }
        if !(0.0..=1.0).contains(&self.initial_value) {
            return Err(SolverError::invalid(
                "initial_value",
                format!("seed {} is not a probability", self.initial_value),
            ));
        }
        self.convergence.validate()
    }
}

/// Statistics from a value-iteration run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Sweeps completed.
    pub sweeps: u32,
    /// Largest per-cell change during the last sweep.
    pub final_delta: f64,
    /// False only when the delta variant hit its sweep cap.
    pub converged: bool,
    /// Number of lattice cells (`goal * goal`).
    pub cells: usize,
    /// Total time spent iterating (in seconds).
    pub elapsed_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_model_validation() {
        assert!(DiceModel::new(6, 1).is_ok());
        assert!(DiceModel::new(6, 0).is_ok());
        assert!(matches!(
            DiceModel::new(6, 6),
            Err(SolverError::InvalidConfiguration { field: "bust_faces", .. })
        ));
        assert!(matches!(
            DiceModel::new(0, 0),
            Err(SolverError::InvalidConfiguration { field: "sides", .. })
        ));
    }

    #[test]
    fn test_dice_model_faces() {
        let die = DiceModel::new(8, 3).unwrap();
        assert_eq!(die.scoring_faces().collect::<Vec<_>>(), vec![4, 5, 6, 7, 8]);
        assert!(die.is_bust(3));
        assert!(!die.is_bust(4));
        assert!((die.bust_probability() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_convergence_validation() {
        assert!(ConvergencePolicy::fixed(0).validate().is_err());
        assert!(ConvergencePolicy::fixed(5).validate().is_ok());
        assert!(ConvergencePolicy::threshold(0.0).validate().is_err());
        assert!(ConvergencePolicy::threshold(-1e-3).validate().is_err());
        assert!(ConvergencePolicy::threshold(f64::NAN).validate().is_err());
        assert!(ConvergencePolicy::threshold(1e-3).validate().is_ok());
    }

    #[test]
    fn test_tie_preference() {
        assert!(!ConvergencePolicy::fixed(3).prefers_later_ties());
        assert!(ConvergencePolicy::threshold(1e-3).prefers_later_ties());
    }

    #[test]
    fn test_zero_goal_rejected() {
        let config = SolverConfig::default().with_goal(0);
        assert!(matches!(
            config.validate(),
            Err(SolverError::InvalidConfiguration { field: "goal", .. })
        ));
    }

    #[test]
    fn test_parse_config_json() {
        let json = r#"{
            "dice": { "sides": 6, "bust_faces": 1 },
            "max_threshold": 30,
            "goal": 25,
            "convergence": { "kind": "threshold", "delta": 0.001 }
        }"#;
        let config = SolverConfig::from_json_str(json).unwrap();
        assert_eq!(config.goal, 25);
        assert_eq!(config.max_threshold, 30);
        assert_eq!(
            config.convergence,
            ConvergencePolicy::Threshold {
                delta: 0.001,
                max_sweeps: DEFAULT_MAX_SWEEPS
            }
        );
        assert_eq!(config.update_scheme, UpdateScheme::InPlace);
        assert_eq!(config.initial_value, DEFAULT_INITIAL_VALUE);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        let json = r#"{ "dice": { "sides": 2, "bust_faces": 2 } }"#;
        assert!(matches!(
            SolverConfig::from_json_str(json),
            Err(SolverError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            SolverConfig::from_json_str("not json"),
            Err(SolverError::Parse(_))
        ));
    }
}
