//! Progress notifications from the value iterator.
//!
//! Reporters are purely observational; nothing they do feeds back into the
//! solve.

/// Receives progress from [`crate::pig::StrategySolver`].
pub trait ProgressReporter {
    /// `done` of `total` cells finished in the current sweep.
    fn on_cells(&mut self, _done: u64, _total: u64) {}

    /// Sweep `sweep` (1-based) finished with largest per-cell change `delta`.
    fn on_sweep(&mut self, _sweep: u32, _delta: f64) {}
}

/// Reporter that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Adapts a `(sweep, delta)` closure into a reporter.
///
/// # Example
/// ```
/// use pig_solver::pig::{ProgressReporter, SweepCallback};
///
/// let mut deltas = Vec::new();
/// let mut reporter = SweepCallback(|_sweep: u32, delta: f64| deltas.push(delta));
/// reporter.on_sweep(1, 0.5);
/// drop(reporter);
/// assert_eq!(deltas, vec![0.5]);
/// ```
pub struct SweepCallback<F>(pub F);

impl<F> ProgressReporter for SweepCallback<F>
where
    F: FnMut(u32, f64),
{
    fn on_sweep(&mut self, sweep: u32, delta: f64) {
        (self.0)(sweep, delta)
    }
}
