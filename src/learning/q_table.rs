//! Dense Q-table for temporal difference learning.
//!
//! Values live in a flat `Vec<f64>` indexed `state * 4 + action_index`,
//! which keeps lookups predictable and avoids string-keyed maps entirely.
//! A parallel visitation counter (keyed the same way) backs UCB selection,
//! and a per-state touched flag distinguishes states the learner has never
//! updated from states whose values genuinely are zero.

use serde::{Deserialize, Serialize};

use crate::types::{Action, Position};

/// Q-value table over `num_states * 4` state-action cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    values: Vec<f64>,
    visits: Vec<u32>,
    touched: Vec<bool>,
    num_states: usize,
}

impl QTable {
    /// Create a zero-initialized table for a fixed state count.
    pub fn new(num_states: usize) -> Self {
        Self {
            values: vec![0.0; num_states * Action::COUNT],
            visits: vec![0; num_states * Action::COUNT],
            touched: vec![false; num_states],
            num_states,
        }
    }

    /// Rebuild a table from exported values and visit counts.
    ///
    /// States with any nonzero value or visit count are marked touched, so
    /// exploration resumes exactly where the exported session left off.
    pub fn from_parts(num_states: usize, values: Vec<f64>, visits: Vec<u32>) -> Self {
        let touched = (0..num_states)
            .map(|state| {
                let base = state * Action::COUNT;
                values[base..base + Action::COUNT].iter().any(|v| *v != 0.0)
                    || visits[base..base + Action::COUNT].iter().any(|c| *c != 0)
            })
            .collect();
        Self {
            values,
            visits,
            touched,
            num_states,
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    fn index(&self, state: usize, action: Action) -> usize {
        debug_assert!(state < self.num_states, "state {state} out of range");
        state * Action::COUNT + action.index()
    }

    /// Q-value estimate for a state-action pair (zero until first update).
    pub fn get(&self, state: usize, action: Action) -> f64 {
        self.values[self.index(state, action)]
    }

    /// Overwrite a Q-value and mark the state as touched.
    pub fn set(&mut self, state: usize, action: Action, value: f64) {
        let idx = self.index(state, action);
        self.values[idx] = value;
        self.touched[state] = true;
    }

    /// True when no update has ever touched this state.
    pub fn is_untouched(&self, state: usize) -> bool {
        !self.touched[state]
    }

    /// Record one action selection for UCB bookkeeping.
    pub fn record_visit(&mut self, state: usize, action: Action) {
        let idx = self.index(state, action);
        self.visits[idx] = self.visits[idx].saturating_add(1);
    }

    /// Visitation count for a state-action pair.
    pub fn visit_count(&self, state: usize, action: Action) -> u32 {
        self.visits[self.index(state, action)]
    }

    /// Maximum Q-value over the given actions; zero for an empty slice
    /// (terminal absorption).
    pub fn max_q(&self, state: usize, actions: &[Action]) -> f64 {
        if actions.is_empty() {
            return 0.0;
        }
        actions
            .iter()
            .map(|&action| self.get(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Greedy action among the given actions.
    ///
    /// Ties break toward the first action in enumeration order; returns
    /// `None` for an empty slice.
    pub fn greedy_action(&self, state: usize, actions: &[Action]) -> Option<Action> {
        let mut best: Option<(Action, f64)> = None;
        for &action in actions {
            let q = self.get(state, action);
            match best {
                Some((_, best_q)) if q <= best_q => {}
                _ => best = Some((action, q)),
            }
        }
        best.map(|(action, _)| action)
    }

    /// All four action values for a state, in enumeration order.
    pub fn values_at(&self, state: usize) -> [f64; Action::COUNT] {
        let base = state * Action::COUNT;
        [
            self.values[base],
            self.values[base + 1],
            self.values[base + 2],
            self.values[base + 3],
        ]
    }

    /// Read-only snapshot of the full value vector.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Read-only snapshot of the visitation counters.
    pub fn visits(&self) -> &[u32] {
        &self.visits
    }

    /// Derived state-value function: `V(s) = max_a Q(s, a)`.
    pub fn state_values(&self) -> Vec<f64> {
        (0..self.num_states)
            .map(|state| {
                self.values_at(state)
                    .into_iter()
                    .fold(f64::NEG_INFINITY, f64::max)
            })
            .collect()
    }

    /// Derived greedy policy over a grid: best valid action per state.
    ///
    /// States with no valid actions (wall cells boxed in) map to `None`.
    pub fn greedy_policy(&self, grid: &crate::grid::Grid) -> Vec<Option<Action>> {
        (0..self.num_states)
            .map(|state| {
                let pos = Position::from_state(state, grid.size());
                self.greedy_action(state, &grid.valid_actions(pos))
            })
            .collect()
    }
}
