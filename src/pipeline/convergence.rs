//! Convergence detection over value-store update magnitudes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How many updates between convergence checks.
pub const CHECK_INTERVAL: usize = 100;

/// Sliding-window size for the update-magnitude metric.
const WINDOW_SIZE: usize = 100;

/// Result of the most recent convergence check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceStatus {
    pub is_converged: bool,
    /// Mean |TD update| over the recent window.
    pub convergence_value: f64,
    /// Consecutive converged checks; resets to 0 on any failed check.
    pub stable_checks: u32,
}

impl Default for ConvergenceStatus {
    fn default() -> Self {
        Self {
            is_converged: false,
            convergence_value: f64::INFINITY,
            stable_checks: 0,
        }
    }
}

/// Samples update magnitudes and judges whether values have stabilized.
///
/// Checks run at most once per [`CHECK_INTERVAL`] recorded updates, never
/// per step; the metric is the mean absolute update over a sliding window.
#[derive(Debug, Clone)]
pub struct ConvergenceDetector {
    window: VecDeque<f64>,
    threshold: f64,
    updates_since_check: usize,
    status: ConvergenceStatus,
}

impl ConvergenceDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_SIZE),
            threshold,
            updates_since_check: 0,
            status: ConvergenceStatus::default(),
        }
    }

    pub fn status(&self) -> ConvergenceStatus {
        self.status
    }

    /// Record one applied update; runs a check when the interval elapses.
    ///
    /// Returns the fresh status when a check ran, `None` otherwise.
    pub fn record_update(&mut self, td_delta: f64) -> Option<ConvergenceStatus> {
        if self.window.len() == WINDOW_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(td_delta.abs());

        self.updates_since_check += 1;
        if self.updates_since_check < CHECK_INTERVAL {
            return None;
        }
        self.updates_since_check = 0;
        Some(self.check())
    }

    fn check(&mut self) -> ConvergenceStatus {
        let value = if self.window.is_empty() {
            f64::INFINITY
        } else {
            self.window.iter().sum::<f64>() / self.window.len() as f64
        };
        let is_converged = value < self.threshold;
        let stable_checks = if is_converged {
            self.status.stable_checks + 1
        } else {
            0
        };
        self.status = ConvergenceStatus {
            is_converged,
            convergence_value: value,
            stable_checks,
        };
        self.status
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.updates_since_check = 0;
        self.status = ConvergenceStatus::default();
    }
}
