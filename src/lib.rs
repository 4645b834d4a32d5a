//! Tabular reinforcement learning on grid worlds
//!
//! This crate provides:
//! - A square grid environment with walls, start/goal cells, and reward presets
//! - Q-Learning, SARSA, and Expected SARSA value updates over a dense Q-table
//! - Epsilon-greedy, UCB, and Boltzmann exploration strategies
//! - A cooperative training scheduler with pause/resume/stop and manual stepping
//! - Convergence detection over the stream of TD updates
//! - Versioned session export/import with lossless numeric round-trips

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod grid;
pub mod learning;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod types;
pub mod utils;

pub use config::TrainingParameters;
pub use error::{Error, Result};
pub use grid::{Grid, GridWorld, RewardConfig, RewardPreset, StepOutcome};
pub use learning::{Algorithm, QTable, Strategy};
pub use pipeline::{SchedulerState, TrainingResult, TrainingScheduler};
pub use session::SavedSession;
pub use types::{Action, CellKind, Position};
