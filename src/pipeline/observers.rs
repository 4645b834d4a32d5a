//! Observer adapters for training schedulers.
//!
//! Observers allow composable data collection during training without
//! coupling the scheduler to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    pipeline::{convergence::ConvergenceStatus, episode::EpisodeRecord, scheduler::TrainingResult},
    ports::Observer,
};

/// Progress bar observer - shows episode progress and the running success
/// count.
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    successes: usize,
    failures: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            successes: 0,
            failures: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, max_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(max_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes ({msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        if record.success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        if let Some(pb) = &self.progress_bar {
            pb.set_position((record.index + 1) as u64);
            pb.set_message(format!("goal: {}, timeout: {}", self.successes, self.failures));
        }
        Ok(())
    }

    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!(
                "goal: {}, timeout: {}",
                self.successes, self.failures
            ));
        }
        Ok(())
    }
}

/// Metrics observer - tracks episode statistics during training.
pub struct MetricsObserver {
    total_episodes: usize,
    successes: usize,
    step_counts: Vec<usize>,
    reward_totals: Vec<f64>,
    last_convergence: Option<ConvergenceStatus>,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self {
            total_episodes: 0,
            successes: 0,
            step_counts: Vec::new(),
            reward_totals: Vec::new(),
            last_convergence: None,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_episodes as f64
        }
    }

    pub fn avg_episode_length(&self) -> f64 {
        if self.step_counts.is_empty() {
            0.0
        } else {
            self.step_counts.iter().sum::<usize>() as f64 / self.step_counts.len() as f64
        }
    }

    pub fn avg_episode_reward(&self) -> f64 {
        if self.reward_totals.is_empty() {
            0.0
        } else {
            self.reward_totals.iter().sum::<f64>() / self.reward_totals.len() as f64
        }
    }

    pub fn last_convergence(&self) -> Option<ConvergenceStatus> {
        self.last_convergence
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_episodes: self.total_episodes,
            successes: self.successes,
            success_rate: self.success_rate(),
            avg_episode_length: self.avg_episode_length(),
            avg_episode_reward: self.avg_episode_reward(),
        }
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_episodes: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub avg_episode_length: f64,
    pub avg_episode_reward: f64,
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        self.total_episodes += 1;
        if record.success {
            self.successes += 1;
        }
        self.step_counts.push(record.steps);
        self.reward_totals.push(record.total_reward);
        Ok(())
    }

    fn on_convergence(&mut self, status: &ConvergenceStatus) -> Result<()> {
        self.last_convergence = Some(*status);
        Ok(())
    }
}

/// JSONL observer - exports one episode record per line for charting.
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_end(&mut self, record: &EpisodeRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
