//! Export/import record for a training session.
//!
//! The saved record is the only persistence surface the core offers: a
//! versioned snapshot of the Q-table, hyperparameters, selectors, reward
//! structure, and grid configuration. Import rebuilds fresh state from the
//! record and replaces the live session atomically; numeric values
//! round-trip with no precision loss.

use serde::{Deserialize, Serialize};

use crate::{
    config::TrainingParameters,
    error::{Error, Result},
    grid::{Grid, GridWorld, RewardConfig},
    learning::{Algorithm, QTable, Strategy},
    types::{Action, CellKind, Position},
};

/// Grid layout portion of a saved session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub size: usize,
    pub cells: Vec<CellKind>,
    pub start_pos: Position,
    pub goal_pos: Position,
}

/// A complete, versioned session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSession {
    pub version: u32,
    pub algorithm: Algorithm,
    pub exploration_strategy: Strategy,
    pub parameters: TrainingParameters,
    pub reward_structure: RewardConfig,
    pub grid_config: GridSnapshot,
    pub q_table: Vec<f64>,
    pub visit_counts: Vec<u32>,
}

impl SavedSession {
    pub const VERSION: u32 = 1;

    /// Capture the current environment and value store.
    pub fn capture(
        env: &GridWorld,
        q: &QTable,
        algorithm: Algorithm,
        strategy: Strategy,
        parameters: TrainingParameters,
        rewards: RewardConfig,
    ) -> Self {
        Self {
            version: Self::VERSION,
            algorithm,
            exploration_strategy: strategy,
            parameters,
            reward_structure: rewards,
            grid_config: GridSnapshot {
                size: env.size(),
                cells: env.grid().cells().to_vec(),
                start_pos: env.start(),
                goal_pos: env.goal(),
            },
            q_table: q.values().to_vec(),
            visit_counts: q.visits().to_vec(),
        }
    }

    /// Validate the record and rebuild the environment and value store.
    ///
    /// Nothing is mutated on failure; the caller swaps the returned pair in
    /// only after this succeeds, which makes import atomic.
    pub fn restore(&self) -> Result<(GridWorld, QTable)> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedSessionVersion {
                version: self.version,
                expected: Self::VERSION,
            });
        }
        let num_cells = self.grid_config.size * self.grid_config.size;
        let expected_len = num_cells * Action::COUNT;
        if self.q_table.len() != expected_len || self.visit_counts.len() != expected_len {
            return Err(Error::SessionMismatch {
                message: format!(
                    "expected {expected_len} table entries for a {0}x{0} grid, got {1} values and {2} counts",
                    self.grid_config.size,
                    self.q_table.len(),
                    self.visit_counts.len()
                ),
            });
        }

        let grid = Grid::from_cells(self.grid_config.size, self.grid_config.cells.clone())?;
        let env = GridWorld::new(grid, self.grid_config.start_pos, self.grid_config.goal_pos)?;
        let q = QTable::from_parts(num_cells, self.q_table.clone(), self.visit_counts.clone());
        Ok((env, q))
    }
}
