//! Value store, update rules, and exploration strategies for tabular
//! temporal difference learning.

pub mod exploration;
pub mod q_table;
pub mod update;

pub use exploration::{SelectionContext, Strategy, select_action};
pub use q_table::QTable;
pub use update::{Algorithm, UpdateParams, expected_sarsa_distribution, update_value};
