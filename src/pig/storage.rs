//! Dense storage for win probabilities and optimal thresholds.
//!
//! Both tables cover the lattice `[0, goal) x [0, goal)` of
//! `(mover score, opponent score)` pairs, stored row-major by mover score.
//! States where the mover has already reached the goal are never stored;
//! the solver treats them as wins inline.

use serde::{Deserialize, Serialize};

/// A `(mover, opponent)` score pair, both below the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    /// Score of the player about to roll.
    pub mover: u32,
    /// Score of the player waiting.
    pub opponent: u32,
}

impl GameState {
    /// Create a state.
    pub fn new(mover: u32, opponent: u32) -> Self {
        Self { mover, opponent }
    }

    /// The same position seen from the other player's seat.
    pub fn swapped(&self) -> Self {
        Self {
            mover: self.opponent,
            opponent: self.mover,
        }
    }
}

#[inline]
fn cell(goal: u32, mover: u32, opponent: u32) -> usize {
    debug_assert!(mover < goal && opponent < goal, "({mover}, {opponent}) outside goal {goal}");
    mover as usize * goal as usize + opponent as usize
}

/// Mover's win probability under optimal play, per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueTable {
    goal: u32,
    values: Vec<f64>,
}

impl ValueTable {
    /// Table with every cell set to `initial`.
    pub fn new(goal: u32, initial: f64) -> Self {
        let cells = goal as usize * goal as usize;
        Self {
            goal,
            values: vec![initial; cells],
        }
    }

    /// Goal score the lattice is built for.
    pub fn goal(&self) -> u32 {
        self.goal
    }

    /// Win probability for the mover at `(mover, opponent)`.
    #[inline]
    pub fn get(&self, mover: u32, opponent: u32) -> f64 {
        self.values[cell(self.goal, mover, opponent)]
    }

    /// Overwrite one cell and return its previous value.
    #[inline]
    pub fn replace(&mut self, mover: u32, opponent: u32, value: f64) -> f64 {
        let idx = cell(self.goal, mover, opponent);
        std::mem::replace(&mut self.values[idx], value)
    }

    /// Value at a [`GameState`].
    pub fn at(&self, state: GameState) -> f64 {
        self.get(state.mover, state.opponent)
    }

    /// One row: every opponent score for a fixed mover score.
    pub fn row(&self, mover: u32) -> &[f64] {
        let start = cell(self.goal, mover, 0);
        &self.values[start..start + self.goal as usize]
    }

    /// Largest absolute per-cell difference to another table of the same goal.
    pub fn max_abs_diff(&self, other: &ValueTable) -> f64 {
        debug_assert_eq!(self.goal, other.goal);
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Dense 2-D copy indexed `[mover][opponent]`.
    pub fn to_grid(&self) -> Vec<Vec<f64>> {
        (0..self.goal).map(|x| self.row(x).to_vec()).collect()
    }

    /// Number of cells (`goal * goal`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a zero-goal table.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Optimal banking threshold per state.
///
/// `None` means the cell has not been resolved by any sweep yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyTable {
    goal: u32,
    thresholds: Vec<Option<u32>>,
}

impl StrategyTable {
    /// Table with every cell unresolved.
    pub fn new(goal: u32) -> Self {
        let cells = goal as usize * goal as usize;
        Self {
            goal,
            thresholds: vec![None; cells],
        }
    }

    /// Goal score the lattice is built for.
    pub fn goal(&self) -> u32 {
        self.goal
    }

    /// Optimal threshold at `(mover, opponent)`.
    #[inline]
    pub fn get(&self, mover: u32, opponent: u32) -> Option<u32> {
        self.thresholds[cell(self.goal, mover, opponent)]
    }

    /// Record the optimal threshold for one cell.
    #[inline]
    pub fn set(&mut self, mover: u32, opponent: u32, threshold: u32) {
        let idx = cell(self.goal, mover, opponent);
        self.thresholds[idx] = Some(threshold);
    }

    /// Threshold at a [`GameState`].
    pub fn at(&self, state: GameState) -> Option<u32> {
        self.get(state.mover, state.opponent)
    }

    /// Dense 2-D copy indexed `[mover][opponent]`.
    pub fn to_grid(&self) -> Vec<Vec<Option<u32>>> {
        self.thresholds
            .chunks(self.goal.max(1) as usize)
            .map(|row| row.to_vec())
            .collect()
    }

    /// Whether every cell has a threshold.
    pub fn is_resolved(&self) -> bool {
        self.thresholds.iter().all(Option::is_some)
    }
}
