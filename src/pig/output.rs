//! Serializable solution export for plotting and inspection.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pig::config::{DiceModel, SolveStats};
use crate::pig::solver::StrategySolution;
use crate::pig::turn::TurnOutcomes;

/// Dense grids of the solved game, indexed `[mover][opponent]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyExport {
    /// Die the game was solved for.
    pub dice: DiceModel,
    /// Goal score.
    pub goal: u32,
    /// Largest threshold considered.
    pub max_threshold: u32,
    /// Expected single-turn points for each threshold, starting at `T = 1`.
    pub expected_values: Vec<f64>,
    /// Optimal threshold per state.
    pub thresholds: Vec<Vec<Option<u32>>>,
    /// Mover's win probability per state.
    pub win_probabilities: Vec<Vec<f64>>,
    /// Iteration statistics.
    pub stats: SolveStats,
}

impl StrategyExport {
    /// Collect the export from a finished solve.
    pub fn new(outcomes: &TurnOutcomes, solution: &StrategySolution) -> Self {
        Self {
            dice: *outcomes.dice(),
            goal: solution.goal(),
            max_threshold: outcomes.max_threshold(),
            expected_values: outcomes.expected_values().iter().map(|(_, ev)| ev).collect(),
            thresholds: solution.strategy().to_grid(),
            win_probabilities: solution.values().to_grid(),
            stats: solution.stats().clone(),
        }
    }

    /// Save to JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())
    }

    /// Print the threshold grid, highest mover score first.
    pub fn print_grid(&self) {
        println!("\n=== Optimal thresholds (goal {}) ===", self.goal);
        println!("rows: mover score, columns: opponent score\n");

        for (mover, row) in self.thresholds.iter().enumerate().rev() {
            print!("{:>4} |", mover);
            for threshold in row {
                match threshold {
                    Some(t) => print!("{:>4}", t),
                    None => print!("{:>4}", "-"),
                }
            }
            println!();
        }
    }
}
