//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events, allowing
//! composable data collection (progress bars, metrics, JSONL export, live
//! UI feeds) without coupling the scheduler to specific output formats.

use crate::{
    Result,
    pipeline::{
        convergence::ConvergenceStatus,
        episode::{EpisodeRecord, TrajectoryStep},
        scheduler::TrainingResult,
    },
};

/// Observer trait for monitoring training.
///
/// Observers can be composed to collect different types of data during
/// training. Every snapshot handed to an observer is read-only; observers
/// never feed state back into the scheduler.
///
/// # Event Sequence
///
/// 1. `on_training_start(max_episodes)` - once per session
/// 2. For each episode:
///    - `on_episode_start(index)`
///    - `on_step(index, step_num, step)` - for each environment step
///    - `on_episode_end(record)`
/// 3. `on_convergence(status)` - whenever a convergence check runs
/// 4. `on_training_end(result)` - once when scheduling halts
pub trait Observer: Send {
    /// Called when a training session starts.
    fn on_training_start(&mut self, _max_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called when an episode begins.
    fn on_episode_start(&mut self, _index: usize) -> Result<()> {
        Ok(())
    }

    /// Called after each environment step with the recorded trajectory entry.
    fn on_step(&mut self, _index: usize, _step_num: usize, _step: &TrajectoryStep) -> Result<()> {
        Ok(())
    }

    /// Called when an episode completes (goal reached or step limit hit).
    fn on_episode_end(&mut self, _record: &EpisodeRecord) -> Result<()> {
        Ok(())
    }

    /// Called whenever the convergence detector produces a fresh status.
    fn on_convergence(&mut self, _status: &ConvergenceStatus) -> Result<()> {
        Ok(())
    }

    /// Called when scheduling halts (max episodes, auto-stop, or stop).
    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        Ok(())
    }
}
