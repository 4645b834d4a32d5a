//! Grid environment model: cell layout, legal moves, rewards, and the
//! single authoritative agent position.
//!
//! The environment is the sole source of truth for where the agent stands.
//! Every other component reads the position through [`GridWorld::agent_pos`]
//! and never caches a second copy.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{Action, CellKind, Position},
};

/// Immutable cell layout of a square grid.
///
/// Changing the layout invalidates any value store built against it, so the
/// grid is constructed once per training run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Create an all-empty grid.
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 {
            return Err(Error::InvalidGridSize { size });
        }
        Ok(Self {
            size,
            cells: vec![CellKind::Empty; size * size],
        })
    }

    /// Create a grid from an explicit cell vector (row-major).
    pub fn from_cells(size: usize, cells: Vec<CellKind>) -> Result<Self> {
        if size < 2 {
            return Err(Error::InvalidGridSize { size });
        }
        if cells.len() != size * size {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "expected {} cells for a {size}x{size} grid, got {}",
                    size * size,
                    cells.len()
                ),
            });
        }
        Ok(Self { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of encodable states (`size * size`).
    pub fn num_states(&self) -> usize {
        self.size * self.size
    }

    /// Cell kind at a position. Out-of-bounds queries return `None`.
    pub fn cell(&self, pos: Position) -> Option<CellKind> {
        if pos.is_valid(self.size) {
            Some(self.cells[pos.to_state(self.size)])
        } else {
            None
        }
    }

    /// Place a wall at a position.
    pub fn set_wall(&mut self, pos: Position) -> Result<()> {
        if !pos.is_valid(self.size) {
            return Err(Error::PositionOutOfBounds {
                row: pos.row,
                col: pos.col,
                size: self.size,
            });
        }
        self.cells[pos.to_state(self.size)] = CellKind::Wall;
        Ok(())
    }

    /// True if the position is a wall or out of bounds.
    ///
    /// Fail-closed: an invalid query is treated as a wall.
    pub fn is_wall(&self, pos: Position) -> bool {
        match self.cell(pos) {
            Some(kind) => kind == CellKind::Wall,
            None => true,
        }
    }

    /// Actions whose resulting position is in-bounds and not a wall.
    ///
    /// Returned in canonical enumeration order.
    pub fn valid_actions(&self, pos: Position) -> Vec<Action> {
        Action::ALL
            .iter()
            .copied()
            .filter(|action| match action.apply(pos) {
                Some(next) => !self.is_wall(next),
                None => false,
            })
            .collect()
    }

    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }
}

/// Named reward magnitude presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RewardPreset {
    Default,
    Sparse,
    Dense,
}

/// Reward magnitudes for one training run.
///
/// Wall and out-of-bounds moves share a single invalid-move penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub goal_reward: f64,
    pub step_cost: f64,
    pub invalid_penalty: f64,
}

impl RewardConfig {
    pub fn preset(preset: RewardPreset) -> Self {
        match preset {
            RewardPreset::Default => Self {
                goal_reward: 100.0,
                step_cost: -1.0,
                invalid_penalty: -10.0,
            },
            RewardPreset::Sparse => Self {
                goal_reward: 1.0,
                step_cost: 0.0,
                invalid_penalty: -1.0,
            },
            RewardPreset::Dense => Self {
                goal_reward: 10.0,
                step_cost: -0.5,
                invalid_penalty: -5.0,
            },
        }
    }

    /// Reward for a transition ending at `next`.
    ///
    /// Goal takes precedence; a collision (self-transition into a wall or
    /// off-grid) pays the invalid-move penalty; everything else pays the
    /// per-step cost.
    pub fn reward(&self, next: Position, goal: Position, collision: bool) -> f64 {
        if next == goal {
            self.goal_reward
        } else if collision {
            self.invalid_penalty
        } else {
            self.step_cost
        }
    }
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self::preset(RewardPreset::Default)
    }
}

/// Outcome of one environment step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f64,
    pub next_pos: Position,
    pub done: bool,
    pub collision: bool,
}

/// The grid environment: layout, start/goal, and the agent's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridWorld {
    grid: Grid,
    start: Position,
    goal: Position,
    agent: Position,
}

impl GridWorld {
    /// Create an environment with validated start and goal cells.
    ///
    /// # Errors
    ///
    /// Fails when start or goal is out of bounds or sits on a wall; training
    /// cannot begin against a malformed environment.
    pub fn new(grid: Grid, start: Position, goal: Position) -> Result<Self> {
        for (role, pos) in [("start", start), ("goal", goal)] {
            if !pos.is_valid(grid.size()) {
                return Err(Error::PositionOutOfBounds {
                    row: pos.row,
                    col: pos.col,
                    size: grid.size(),
                });
            }
            if grid.is_wall(pos) {
                return Err(Error::BlockedCell {
                    role,
                    row: pos.row,
                    col: pos.col,
                });
            }
        }
        Ok(Self {
            grid,
            start,
            goal,
            agent: start,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn num_states(&self) -> usize {
        self.grid.num_states()
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    /// The canonical agent position.
    pub fn agent_pos(&self) -> Position {
        self.agent
    }

    /// Move the agent back to the start cell.
    pub fn reset_agent(&mut self) {
        self.agent = self.start;
    }

    /// Valid actions at the agent's current position.
    pub fn valid_actions(&self) -> Vec<Action> {
        self.grid.valid_actions(self.agent)
    }

    /// Valid actions at an arbitrary position.
    pub fn valid_actions_at(&self, pos: Position) -> Vec<Action> {
        self.grid.valid_actions(pos)
    }

    /// Execute one action and move the agent.
    ///
    /// Moving into a wall or off-grid does not reject the action: the agent
    /// stays where it is (a self-transition), the invalid-move penalty is
    /// paid, and the step still counts toward the episode.
    pub fn step(&mut self, action: Action, rewards: &RewardConfig) -> StepOutcome {
        let (next_pos, collision) = match action.apply(self.agent) {
            Some(next) if !self.grid.is_wall(next) => (next, false),
            _ => (self.agent, true),
        };
        let reward = rewards.reward(next_pos, self.goal, collision);
        let done = next_pos == self.goal;
        self.agent = next_pos;
        StepOutcome {
            reward,
            next_pos,
            done,
            collision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_world() -> GridWorld {
        let mut grid = Grid::new(3).unwrap();
        grid.set_wall(Position::new(1, 1)).unwrap();
        GridWorld::new(grid, Position::new(0, 0), Position::new(2, 2)).unwrap()
    }

    #[test]
    fn test_out_of_bounds_is_wall() {
        let grid = Grid::new(3).unwrap();
        assert!(grid.is_wall(Position::new(3, 0)));
        assert!(grid.is_wall(Position::new(0, 3)));
        assert!(!grid.is_wall(Position::new(2, 2)));
    }

    #[test]
    fn test_valid_actions_exclude_walls_and_edges() {
        let world = small_world();
        // Corner (0,0): Up and Left leave the grid; Down and Right are open.
        assert_eq!(
            world.valid_actions_at(Position::new(0, 0)),
            vec![Action::Down, Action::Right]
        );
        // (0,1): Down hits the center wall.
        assert_eq!(
            world.valid_actions_at(Position::new(0, 1)),
            vec![Action::Left, Action::Right]
        );
    }

    #[test]
    fn test_wall_collision_is_self_transition() {
        let mut world = small_world();
        let rewards = RewardConfig::default();
        // Agent at (0,0); moving up leaves the grid.
        let outcome = world.step(Action::Up, &rewards);
        assert!(outcome.collision);
        assert!(!outcome.done);
        assert_eq!(outcome.next_pos, Position::new(0, 0));
        assert_eq!(outcome.reward, rewards.invalid_penalty);
        assert_eq!(world.agent_pos(), Position::new(0, 0));
    }

    #[test]
    fn test_goal_step_terminates() {
        let mut world = small_world();
        let rewards = RewardConfig::default();
        world.step(Action::Down, &rewards);
        world.step(Action::Down, &rewards);
        let outcome = world.step(Action::Right, &rewards);
        assert!(!outcome.collision);
        assert!(!outcome.done);
        let outcome = world.step(Action::Right, &rewards);
        assert!(outcome.done);
        assert_eq!(outcome.reward, rewards.goal_reward);
        assert_eq!(world.agent_pos(), world.goal());
    }

    #[test]
    fn test_start_on_wall_rejected() {
        let mut grid = Grid::new(3).unwrap();
        grid.set_wall(Position::new(0, 0)).unwrap();
        let result = GridWorld::new(grid, Position::new(0, 0), Position::new(2, 2));
        assert!(result.is_err());
    }
}
