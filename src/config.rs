//! Training hyperparameters with a clamped, never-rejecting surface.
//!
//! Every setter clamps its input into the documented range instead of
//! returning an error, so a live parameter form can push arbitrary values
//! without breaking a running session.

use serde::{Deserialize, Serialize};

/// Lower bound for the learning rate.
pub const MIN_LEARNING_RATE: f64 = 0.001;
/// Smallest accepted temperature / UCB constant (both must stay positive).
pub const MIN_POSITIVE_PARAM: f64 = 1e-6;

/// Hyperparameters for one training session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingParameters {
    /// Learning rate alpha, clamped to [0.001, 1].
    pub learning_rate: f64,
    /// Discount factor gamma, clamped to [0, 1].
    pub discount_factor: f64,
    /// Initial exploration rate, clamped to [0, 1].
    pub epsilon: f64,
    /// Multiplicative decay applied every 10 episodes, clamped to [0.001, 0.1].
    pub epsilon_decay: f64,
    /// Exploration floor, clamped to [0, 0.5].
    pub min_epsilon: f64,
    /// Boltzmann temperature, clamped to stay positive.
    pub temperature: f64,
    /// UCB exploration constant, clamped to stay positive.
    pub ucb_constant: f64,
    /// Episodes before the scheduler auto-stops.
    pub max_episodes: usize,
    /// Step limit per episode.
    pub max_steps_per_episode: usize,
    /// Inter-tick delay in milliseconds (playback-speed control).
    pub tick_delay_ms: u64,
    /// Stop automatically once the convergence detector reports stability.
    pub auto_stop: bool,
    /// Mean |TD update| below which a convergence check passes.
    pub convergence_threshold: f64,
    /// Consecutive converged checks required before auto-stop fires.
    pub stable_checks_to_stop: u32,
}

impl TrainingParameters {
    /// Return a copy with every field forced into its legal range.
    pub fn clamped(mut self) -> Self {
        self.learning_rate = self.learning_rate.clamp(MIN_LEARNING_RATE, 1.0);
        self.discount_factor = self.discount_factor.clamp(0.0, 1.0);
        self.epsilon = self.epsilon.clamp(0.0, 1.0);
        self.epsilon_decay = self.epsilon_decay.clamp(0.001, 0.1);
        self.min_epsilon = self.min_epsilon.clamp(0.0, 0.5);
        self.temperature = self.temperature.max(MIN_POSITIVE_PARAM);
        self.ucb_constant = self.ucb_constant.max(MIN_POSITIVE_PARAM);
        self.max_steps_per_episode = self.max_steps_per_episode.max(1);
        self.stable_checks_to_stop = self.stable_checks_to_stop.max(1);
        self
    }

    pub fn with_learning_rate(mut self, value: f64) -> Self {
        self.learning_rate = value.clamp(MIN_LEARNING_RATE, 1.0);
        self
    }

    pub fn with_discount_factor(mut self, value: f64) -> Self {
        self.discount_factor = value.clamp(0.0, 1.0);
        self
    }

    pub fn with_epsilon(mut self, value: f64) -> Self {
        self.epsilon = value.clamp(0.0, 1.0);
        self
    }

    pub fn with_epsilon_decay(mut self, value: f64) -> Self {
        self.epsilon_decay = value.clamp(0.001, 0.1);
        self
    }

    pub fn with_min_epsilon(mut self, value: f64) -> Self {
        self.min_epsilon = value.clamp(0.0, 0.5);
        self
    }

    pub fn with_temperature(mut self, value: f64) -> Self {
        self.temperature = value.max(MIN_POSITIVE_PARAM);
        self
    }

    pub fn with_ucb_constant(mut self, value: f64) -> Self {
        self.ucb_constant = value.max(MIN_POSITIVE_PARAM);
        self
    }

    pub fn with_max_episodes(mut self, value: usize) -> Self {
        self.max_episodes = value;
        self
    }

    pub fn with_max_steps_per_episode(mut self, value: usize) -> Self {
        self.max_steps_per_episode = value.max(1);
        self
    }

    pub fn with_tick_delay_ms(mut self, value: u64) -> Self {
        self.tick_delay_ms = value;
        self
    }

    pub fn with_auto_stop(mut self, enabled: bool) -> Self {
        self.auto_stop = enabled;
        self
    }

    pub fn with_convergence_threshold(mut self, value: f64) -> Self {
        self.convergence_threshold = value.max(0.0);
        self
    }

    pub fn with_stable_checks_to_stop(mut self, value: u32) -> Self {
        self.stable_checks_to_stop = value.max(1);
        self
    }
}

impl Default for TrainingParameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon: 0.2,
            epsilon_decay: 0.01,
            min_epsilon: 0.01,
            temperature: 1.0,
            ucb_constant: 2.0,
            max_episodes: 500,
            max_steps_per_episode: 200,
            tick_delay_ms: 0,
            auto_stop: false,
            convergence_threshold: 1e-3,
            stable_checks_to_stop: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamping_pulls_values_into_range() {
        let params = TrainingParameters::default()
            .with_learning_rate(7.0)
            .with_discount_factor(-0.5)
            .with_epsilon(2.0)
            .with_epsilon_decay(0.5)
            .with_min_epsilon(0.9)
            .with_temperature(-3.0)
            .with_ucb_constant(0.0);

        assert_eq!(params.learning_rate, 1.0);
        assert_eq!(params.discount_factor, 0.0);
        assert_eq!(params.epsilon, 1.0);
        assert_eq!(params.epsilon_decay, 0.1);
        assert_eq!(params.min_epsilon, 0.5);
        assert!(params.temperature > 0.0);
        assert!(params.ucb_constant > 0.0);
    }

    #[test]
    fn test_in_range_values_untouched() {
        let params = TrainingParameters::default()
            .with_learning_rate(0.5)
            .with_epsilon(0.1);
        assert_eq!(params.learning_rate, 0.5);
        assert_eq!(params.epsilon, 0.1);
    }

    #[test]
    fn test_clamped_is_idempotent() {
        let params = TrainingParameters::default().clamped();
        assert_eq!(params, params.clamped());
    }
}
