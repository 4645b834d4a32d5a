//! Training pipeline: episode execution, scheduling, convergence, and
//! observer adapters.

pub mod convergence;
pub mod episode;
pub mod observers;
pub mod scheduler;

pub use convergence::{ConvergenceDetector, ConvergenceStatus};
pub use episode::{EpisodeController, EpisodeRecord, EpisodeStatus, TrajectoryStep};
pub use observers::{JsonlObserver, MetricsObserver, ProgressObserver};
pub use scheduler::{
    CancelToken, SchedulerState, TickOutcome, TrainingResult, TrainingScheduler,
};
