//! Core grid domain types: cells, positions, actions, and state encoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Wall,
    Start,
    Goal,
}

/// A cell coordinate on the grid.
///
/// Positions are plain (row, col) pairs; bounds are checked against a grid
/// size where needed, never stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Bounds check against a `size x size` grid.
    pub fn is_valid(&self, size: usize) -> bool {
        self.row < size && self.col < size
    }

    /// Encode as a table index: `row * size + col`.
    ///
    /// Bijective with [`Position::from_state`] for any fixed `size`.
    pub fn to_state(&self, size: usize) -> usize {
        self.row * size + self.col
    }

    /// Decode a table index back into a position.
    pub fn from_state(state: usize, size: usize) -> Self {
        Self {
            row: state / size,
            col: state % size,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the four cardinal moves.
///
/// The declaration order is the canonical enumeration order used for
/// deterministic tie-breaking in greedy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in canonical enumeration order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Number of actions (the per-state width of the value store).
    pub const COUNT: usize = 4;

    /// Fixed (row, col) offset of this action.
    pub const fn offset(&self) -> (i64, i64) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// Stable index of this action within [`Action::ALL`].
    pub const fn index(&self) -> usize {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    /// Apply this action's offset to a position, without grid validation.
    ///
    /// Returns `None` when the offset would leave the coordinate space
    /// entirely (negative row or column). Callers treat `None` the same as
    /// an out-of-bounds cell: as a wall.
    pub fn apply(&self, pos: Position) -> Option<Position> {
        let (dr, dc) = self.offset();
        let row = pos.row as i64 + dr;
        let col = pos.col as i64 + dc;
        if row < 0 || col < 0 {
            None
        } else {
            Some(Position::new(row as usize, col as usize))
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        };
        write!(f, "{name}")
    }
}
