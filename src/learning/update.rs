//! Temporal difference update rules.
//!
//! All three algorithms share the same contract: one observed transition in,
//! one in-place Q-table mutation out. The algorithm selector is a closed
//! enum, so an unknown algorithm is unrepresentable rather than a runtime
//! warning.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{learning::q_table::QTable, types::Action};

/// Value-update algorithm selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    #[default]
    QLearning,
    Sarsa,
    ExpectedSarsa,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::QLearning => "Q-learning",
            Algorithm::Sarsa => "SARSA",
            Algorithm::ExpectedSarsa => "Expected SARSA",
        }
    }
}

/// Parameters consumed by a single update call.
///
/// `epsilon` is only read by Expected SARSA, whose target averages over the
/// epsilon-greedy behavior distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateParams {
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub epsilon: f64,
}

/// The epsilon-greedy behavior distribution over `actions`.
///
/// The greedy action (first maximum in enumeration order) receives
/// `1 - epsilon + epsilon/n`; every other action receives `epsilon/n`.
/// Probabilities sum to exactly 1 for any nonempty action slice.
pub fn expected_sarsa_distribution(
    q: &QTable,
    state: usize,
    actions: &[Action],
    epsilon: f64,
) -> Vec<(Action, f64)> {
    let Some(greedy) = q.greedy_action(state, actions) else {
        return Vec::new();
    };
    let n = actions.len() as f64;
    let explore = epsilon / n;
    actions
        .iter()
        .map(|&action| {
            let p = if action == greedy {
                1.0 - epsilon + explore
            } else {
                explore
            };
            (action, p)
        })
        .collect()
}

/// Apply one TD update in place and return the new Q(s, a).
///
/// `valid_next` is the set of actions available in `next_state`; an empty
/// slice means terminal absorption and zeroes the next-state contribution
/// under all three algorithms. For SARSA, `next_action` must be the action
/// the policy will actually take next, selected by the exploration strategy
/// before this call.
pub fn update_value(
    q: &mut QTable,
    state: usize,
    action: Action,
    reward: f64,
    next_state: usize,
    valid_next: &[Action],
    algorithm: Algorithm,
    params: &UpdateParams,
    next_action: Option<Action>,
) -> f64 {
    let next_value = match algorithm {
        Algorithm::QLearning => q.max_q(next_state, valid_next),
        Algorithm::Sarsa => {
            if valid_next.is_empty() {
                0.0
            } else {
                match next_action {
                    Some(next) => q.get(next_state, next),
                    None => {
                        // Contract violation: the controller must pre-select
                        // the on-policy action. Recover as terminal.
                        warn!(state, next_state, "SARSA update without a next action");
                        0.0
                    }
                }
            }
        }
        Algorithm::ExpectedSarsa => {
            expected_sarsa_distribution(q, next_state, valid_next, params.epsilon)
                .into_iter()
                .map(|(a, p)| p * q.get(next_state, a))
                .sum()
        }
    };

    let current = q.get(state, action);
    let target = reward + params.discount_factor * next_value;
    let new_value = current + params.learning_rate * (target - current);
    q.set(state, action, new_value);
    new_value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> UpdateParams {
        UpdateParams {
            learning_rate: 0.5,
            discount_factor: 0.9,
            epsilon: 0.2,
        }
    }

    #[test]
    fn test_q_learning_update_uses_max() {
        let mut q = QTable::new(4);
        q.set(1, Action::Up, 1.0);
        q.set(1, Action::Down, 2.0);

        let new = update_value(
            &mut q,
            0,
            Action::Right,
            0.0,
            1,
            &[Action::Up, Action::Down],
            Algorithm::QLearning,
            &params(),
            None,
        );

        // target = 0 + 0.9 * 2.0 = 1.8; new = 0 + 0.5 * 1.8 = 0.9
        assert!((new - 0.9).abs() < 1e-12);
        assert_eq!(q.get(0, Action::Right), new);
    }

    #[test]
    fn test_q_learning_fixed_point_is_idempotent() {
        let mut q = QTable::new(4);
        q.set(1, Action::Up, 2.0);
        // Q(s,a) already equals r + gamma * max Q(next, .) = 1.0 + 0.9 * 2.0
        q.set(0, Action::Down, 2.8);

        let new = update_value(
            &mut q,
            0,
            Action::Down,
            1.0,
            1,
            &[Action::Up],
            Algorithm::QLearning,
            &params(),
            None,
        );
        assert!((new - 2.8).abs() < 1e-12);
    }

    #[test]
    fn test_sarsa_uses_actual_next_action() {
        let mut q = QTable::new(4);
        q.set(1, Action::Up, 5.0);
        q.set(1, Action::Down, 1.0);

        let new = update_value(
            &mut q,
            0,
            Action::Right,
            0.0,
            1,
            &[Action::Up, Action::Down],
            Algorithm::Sarsa,
            &params(),
            Some(Action::Down),
        );

        // target = 0 + 0.9 * Q(next, Down) = 0.9; new = 0.45
        assert!((new - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_expected_sarsa_distribution_sums_to_one() {
        let mut q = QTable::new(4);
        q.set(1, Action::Left, 3.0);
        for n in 1..=4 {
            let actions = &Action::ALL[..n];
            let dist = expected_sarsa_distribution(&q, 1, actions, 0.3);
            let total: f64 = dist.iter().map(|(_, p)| p).sum();
            assert!(
                (total - 1.0).abs() < 1e-12,
                "distribution over {n} actions sums to {total}"
            );
        }
    }

    #[test]
    fn test_expected_sarsa_weights_greedy_action() {
        let mut q = QTable::new(4);
        q.set(1, Action::Up, 1.0);
        q.set(1, Action::Down, 4.0);

        let new = update_value(
            &mut q,
            0,
            Action::Right,
            0.0,
            1,
            &[Action::Up, Action::Down],
            Algorithm::ExpectedSarsa,
            &params(),
            None,
        );

        // pi(Down) = 1 - 0.2 + 0.1 = 0.9, pi(Up) = 0.1
        // expected = 0.9 * 4.0 + 0.1 * 1.0 = 3.7; target = 3.33; new = 1.665
        assert!((new - 0.5 * 0.9 * 3.7).abs() < 1e-12);
    }

    #[test]
    fn test_empty_next_actions_is_terminal_for_all_algorithms() {
        for algorithm in [Algorithm::QLearning, Algorithm::Sarsa, Algorithm::ExpectedSarsa] {
            let mut q = QTable::new(4);
            let new = update_value(
                &mut q,
                0,
                Action::Up,
                10.0,
                1,
                &[],
                algorithm,
                &params(),
                None,
            );
            // target = reward alone
            assert!((new - 5.0).abs() < 1e-12, "{algorithm:?}");
        }
    }
}
