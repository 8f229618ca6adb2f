//! Pig strategy solver binary.
//!
//! Usage:
//!   cargo run --release --bin solve_pig -- [OPTIONS]
//!
//! Examples:
//!   solve_pig --goal 100 --max-threshold 100 --delta 1e-6 --output pig.json
//!   solve_pig --goal 20 --sweeps 50 --grid
//!   solve_pig --compare 1000000 --max-threshold 70

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use pig_solver::pig::{
    ConvergencePolicy, DiceModel, ProgressReporter, SolverConfig, StrategyExport, StrategySolver,
    TurnOutcomes, UpdateScheme, DEFAULT_MAX_SWEEPS,
};
use pig_solver::validation::simulate_expected_values;

#[derive(Parser, Debug)]
#[command(name = "solve_pig", about = "Optimal threshold strategy solver for the dice game Pig")]
struct Args {
    /// Configuration JSON file; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of die faces
    #[arg(long)]
    sides: Option<u32>,

    /// Number of low faces that bust the turn
    #[arg(long)]
    bust_faces: Option<u32>,

    /// Largest banking threshold to consider
    #[arg(short = 't', long)]
    max_threshold: Option<u32>,

    /// Score needed to win
    #[arg(short, long)]
    goal: Option<u32>,

    /// Run a fixed number of sweeps
    #[arg(long, conflicts_with = "delta")]
    sweeps: Option<u32>,

    /// Sweep until the largest change drops below this value
    #[arg(long)]
    delta: Option<f64>,

    /// Sweep cap for --delta
    #[arg(long, default_value_t = DEFAULT_MAX_SWEEPS)]
    max_sweeps: u32,

    /// Read the previous sweep only (parallel, slower to converge)
    #[arg(long)]
    jacobi: bool,

    /// Write the solution as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the threshold grid
    #[arg(long)]
    grid: bool,

    /// Also simulate this many turns and compare against the exact expectations
    #[arg(long)]
    compare: Option<u64>,

    /// Random seed for --compare
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Args {
    fn solver_config(&self) -> Result<SolverConfig> {
        let mut config = match &self.config {
            Some(path) => SolverConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SolverConfig::default(),
        };

        let dice = DiceModel {
            sides: self.sides.unwrap_or(config.dice.sides),
            bust_faces: self.bust_faces.unwrap_or(config.dice.bust_faces),
        };
        config = config.with_dice(dice);
        if let Some(max_threshold) = self.max_threshold {
            config = config.with_max_threshold(max_threshold);
        }
        if let Some(goal) = self.goal {
            config = config.with_goal(goal);
        }
        if let Some(sweeps) = self.sweeps {
            config = config.with_convergence(ConvergencePolicy::fixed(sweeps));
        } else if let Some(delta) = self.delta {
            config = config.with_convergence(ConvergencePolicy::Threshold {
                delta,
                max_sweeps: self.max_sweeps,
            });
        }
        if self.jacobi {
            config = config.with_update_scheme(UpdateScheme::Snapshot);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Drives an indicatif bar from sweep notifications.
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new(sweep_limit: u32) -> Self {
        let bar = ProgressBar::new(sweep_limit as u64);
        bar.set_style(
            ProgressStyle::with_template("{elapsed_precise} [{bar:40}] sweep {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn on_sweep(&mut self, sweep: u32, delta: f64) {
        self.bar.set_position(sweep as u64);
        self.bar.set_message(format!("delta {:.3e}", delta));
    }
}

fn compare_with_simulation(config: &SolverConfig, turns: u64, seed: Option<u64>) -> Result<()> {
    let start = Instant::now();
    let simulated = simulate_expected_values(&config.dice, config.max_threshold, turns, seed)?;
    let simulation_time = Instant::now();
    let exact = TurnOutcomes::solve(&config.dice, config.max_threshold)?.expected_values();
    let end = Instant::now();

    println!("{:>5} {:>12} {:>12}", "T", "simulated", "exact");
    for (threshold, ev) in exact.iter() {
        println!(
            "{:>5} {:>12.6} {:>12.6}",
            threshold,
            simulated[threshold as usize - 1],
            ev
        );
    }
    println!();
    println!(
        "Simulation time: {:.3}s\nSolver time:     {:.6}s",
        (simulation_time - start).as_secs_f64(),
        (end - simulation_time).as_secs_f64()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.solver_config()?;

    println!("=================================================");
    println!("  Pig Strategy Solver");
    println!("=================================================");
    println!();
    println!(
        "Die: d{} ({} bust face{})",
        config.dice.sides,
        config.dice.bust_faces,
        if config.dice.bust_faces == 1 { "" } else { "s" }
    );
    println!("Thresholds: 1..={}", config.max_threshold);
    println!("Goal: {}", config.goal);
    println!("Convergence: {:?}", config.convergence);
    println!();

    if let Some(turns) = args.compare {
        compare_with_simulation(&config, turns, args.seed)?;
        println!();
    }

    let outcomes = TurnOutcomes::solve(&config.dice, config.max_threshold)?;
    if let Some((threshold, ev)) = outcomes.expected_values().best_threshold() {
        println!("Best single-turn threshold: {} (EV {:.4})", threshold, ev);
    }

    let solver = StrategySolver::new(&outcomes, config.clone())?;
    let mut reporter = BarReporter::new(config.convergence.sweep_limit());
    let solution = solver.solve_with_progress(&mut reporter);
    reporter.bar.finish_and_clear();

    let stats = solution.stats();
    println!(
        "{} after {} sweeps (final delta {:.3e}, {:.2}s)",
        if stats.converged { "Converged" } else { "Stopped at sweep cap" },
        stats.sweeps,
        stats.final_delta,
        stats.elapsed_seconds
    );
    println!(
        "P(first player wins): {:.6}, opening threshold: {}",
        solution.win_probability(0, 0),
        solution
            .best_threshold(0, 0)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    );

    let export = StrategyExport::new(&outcomes, &solution);
    if args.grid {
        export.print_grid();
    }
    if let Some(path) = &args.output {
        export
            .save_json(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("saved solution to {}", path.display());
        println!("Saved JSON: {}", path.display());
    }

    Ok(())
}
