//! Error types for the gridrl crate

use thiserror::Error;

/// Main error type for the gridrl crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid grid size {size} (must be at least 2)")]
    InvalidGridSize { size: usize },

    #[error("position ({row}, {col}) is out of bounds for a {size}x{size} grid")]
    PositionOutOfBounds { row: usize, col: usize, size: usize },

    #[error("{role} position ({row}, {col}) is a wall cell")]
    BlockedCell {
        role: &'static str,
        row: usize,
        col: usize,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("manual stepping is not permitted while the scheduler is running")]
    ManualStepWhileRunning,

    #[error("scheduler cannot {operation} from the {state} state")]
    SchedulerState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("unsupported session format version {version} (expected {expected})")]
    UnsupportedSessionVersion { version: u32, expected: u32 },

    #[error("session does not match its grid: {message}")]
    SessionMismatch { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
