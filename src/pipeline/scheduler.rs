//! Multi-episode training scheduler.
//!
//! The scheduler drives a sequence of episodes as cooperative ticks: each
//! tick performs exactly one environment step, and pause/stop cancel any
//! pending continuation through an explicit token that the tick handler
//! checks both before executing and before arming the next tick. Nothing
//! here spawns threads; `run` is a convenience driver that loops ticks with
//! the configured inter-tick delay.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::TrainingParameters,
    error::{Error, Result},
    grid::{GridWorld, RewardConfig},
    learning::{Algorithm, QTable, Strategy},
    pipeline::{
        convergence::{ConvergenceDetector, ConvergenceStatus},
        episode::{EpisodeController, EpisodeRecord, EpisodeStatus, StepContext},
    },
    ports::Observer,
    session::SavedSession,
    types::Action,
};

/// Completed episodes between multiplicative epsilon decays.
pub const EPSILON_DECAY_INTERVAL: usize = 10;

/// Scheduler lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Running => "running",
            SchedulerState::Paused => "paused",
            SchedulerState::Stopped => "stopped",
        }
    }
}

/// Cancellation token shared between the scheduler and its driver.
///
/// Cancelling is immediate and idempotent; a cancelled token never becomes
/// live again - resume hands out a fresh one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// One step executed; the episode continues.
    Stepped,
    /// One step executed and it completed an episode.
    EpisodeCompleted,
    /// No step executed; scheduling has halted.
    Halted,
}

/// Summary of a finished training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub total_episodes: usize,
    pub successes: usize,
    pub success_rate: f64,
    pub avg_steps: f64,
    pub total_steps: u64,
    pub final_epsilon: f64,
    pub converged: bool,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Drives episodes, epsilon decay, convergence checks, and the
/// pause/resume/stop lifecycle.
pub struct TrainingScheduler {
    env: GridWorld,
    q: QTable,
    algorithm: Algorithm,
    strategy: Strategy,
    params: TrainingParameters,
    rewards: RewardConfig,
    state: SchedulerState,
    episode: EpisodeController,
    history: Vec<EpisodeRecord>,
    current_episode: usize,
    total_steps: u64,
    epsilon: f64,
    detector: ConvergenceDetector,
    observers: Vec<Box<dyn Observer>>,
    rng: StdRng,
    seed: Option<u64>,
    token: CancelToken,
}

impl TrainingScheduler {
    /// Create a scheduler over an initialized environment.
    ///
    /// Parameters are clamped into their legal ranges; the value store is
    /// sized to the environment's state count.
    pub fn new(
        env: GridWorld,
        algorithm: Algorithm,
        strategy: Strategy,
        params: TrainingParameters,
        rewards: RewardConfig,
    ) -> Self {
        let params = params.clamped();
        let q = QTable::new(env.num_states());
        let detector = ConvergenceDetector::new(params.convergence_threshold);
        Self {
            env,
            q,
            algorithm,
            strategy,
            epsilon: params.epsilon,
            params,
            rewards,
            state: SchedulerState::Idle,
            episode: EpisodeController::new(),
            history: Vec::new(),
            current_episode: 0,
            total_steps: 0,
            detector,
            observers: Vec::new(),
            rng: StdRng::from_rng(&mut rand::rng()),
            seed: None,
            token: CancelToken::new(),
        }
    }

    /// Seed the internal RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.seed = Some(seed);
        self
    }

    /// Add an observer to the scheduler.
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    // ---- lifecycle ---------------------------------------------------

    /// Begin a fresh session: counters and history reset, state Running.
    ///
    /// The learned value store is kept; use [`TrainingScheduler::reset`] to
    /// discard it. Returns the session's cancellation token.
    pub fn start(&mut self) -> Result<CancelToken> {
        if matches!(self.state, SchedulerState::Running | SchedulerState::Paused) {
            return Err(Error::SchedulerState {
                operation: "start",
                state: self.state.as_str(),
            });
        }
        self.history.clear();
        self.current_episode = 0;
        self.total_steps = 0;
        self.epsilon = self.params.epsilon;
        self.detector.reset();
        self.episode = EpisodeController::new();
        self.env.reset_agent();
        self.token = CancelToken::new();
        self.state = SchedulerState::Running;
        let max_episodes = self.params.max_episodes;
        for observer in &mut self.observers {
            observer.on_training_start(max_episodes)?;
        }
        Ok(self.token.clone())
    }

    /// Cancel the pending continuation without discarding progress.
    pub fn pause(&mut self) {
        if self.state == SchedulerState::Running {
            self.token.cancel();
            self.state = SchedulerState::Paused;
        }
    }

    /// Re-arm continuation from the current point.
    pub fn resume(&mut self) -> Result<CancelToken> {
        if self.state != SchedulerState::Paused {
            return Err(Error::SchedulerState {
                operation: "resume",
                state: self.state.as_str(),
            });
        }
        self.token = CancelToken::new();
        self.state = SchedulerState::Running;
        Ok(self.token.clone())
    }

    /// Cancel the pending continuation and halt the session.
    pub fn stop(&mut self) -> Result<()> {
        self.token.cancel();
        if matches!(self.state, SchedulerState::Running | SchedulerState::Paused) {
            self.state = SchedulerState::Stopped;
            self.notify_training_end()?;
        }
        Ok(())
    }

    /// Stop, discard the value store and all history, and reinitialize.
    pub fn reset(&mut self) {
        self.token.cancel();
        self.q = QTable::new(self.env.num_states());
        self.history.clear();
        self.current_episode = 0;
        self.total_steps = 0;
        self.epsilon = self.params.epsilon;
        self.detector.reset();
        self.episode = EpisodeController::new();
        self.env.reset_agent();
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self.state = SchedulerState::Idle;
    }

    /// Execute one manual environment step.
    ///
    /// Refused while the scheduler is actively Running; starts a new episode
    /// if the previous one had completed. Returns whether the step finished
    /// an episode.
    pub fn step_manual(&mut self) -> Result<bool> {
        if self.state == SchedulerState::Running {
            return Err(Error::ManualStepWhileRunning);
        }
        let outcome = self.execute_one_step()?;
        Ok(outcome == TickOutcome::EpisodeCompleted)
    }

    /// Execute one scheduled tick.
    ///
    /// Checks the cancellation token before executing and again before
    /// reporting that another tick may be armed; after a completed episode
    /// it applies epsilon decay and the auto-stop rule.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.token.is_cancelled() || self.state != SchedulerState::Running {
            return Ok(TickOutcome::Halted);
        }

        let outcome = self.execute_one_step()?;

        if outcome == TickOutcome::EpisodeCompleted && self.should_auto_stop() {
            self.state = SchedulerState::Stopped;
            self.token.cancel();
            self.notify_training_end()?;
            return Ok(TickOutcome::Halted);
        }

        // Cancellation may have arrived during the step (pause/stop from an
        // observer callback); never arm another tick past it.
        if self.token.is_cancelled() {
            return Ok(TickOutcome::Halted);
        }
        Ok(outcome)
    }

    /// Drive ticks until the session halts or is paused.
    ///
    /// This is the cooperative single-threaded driver: one step per tick,
    /// sleeping the configured inter-tick delay between them.
    pub fn run(&mut self) -> Result<TrainingResult> {
        self.start()?;
        let delay = Duration::from_millis(self.params.tick_delay_ms);
        loop {
            match self.tick()? {
                TickOutcome::Halted => break,
                _ => {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
            }
        }
        Ok(self.result())
    }

    // ---- internals ---------------------------------------------------

    fn execute_one_step(&mut self) -> Result<TickOutcome> {
        if self.episode.status() != EpisodeStatus::Running {
            self.episode.start(&mut self.env, &self.q);
            let index = self.current_episode;
            for observer in &mut self.observers {
                observer.on_episode_start(index)?;
            }
        }

        let ctx = StepContext {
            algorithm: self.algorithm,
            strategy: self.strategy,
            params: &self.params,
            rewards: &self.rewards,
            epsilon: self.epsilon,
            total_steps: self.total_steps,
        };
        let report = self
            .episode
            .step(&mut self.env, &mut self.q, &ctx, &mut self.rng);
        self.total_steps += 1;

        if let Some(step) = self.episode.trajectory().last() {
            let index = self.current_episode;
            let step_num = self.episode.steps();
            for observer in &mut self.observers {
                observer.on_step(index, step_num, step)?;
            }
        }

        if let Some(status) = self.detector.record_update(report.td_delta) {
            debug!(
                convergence_value = status.convergence_value,
                is_converged = status.is_converged,
                stable_checks = status.stable_checks,
                "convergence check"
            );
            for observer in &mut self.observers {
                observer.on_convergence(&status)?;
            }
        }

        if !report.completed {
            return Ok(TickOutcome::Stepped);
        }

        let record = self
            .episode
            .to_record(self.current_episode, self.epsilon, &self.env);
        self.current_episode += 1;
        for observer in &mut self.observers {
            observer.on_episode_end(&record)?;
        }
        self.history.push(record);

        // Multiplicative decay gated on the episode count, not per episode.
        if self.current_episode.is_multiple_of(EPSILON_DECAY_INTERVAL) {
            self.epsilon =
                (self.epsilon * (1.0 - self.params.epsilon_decay)).max(self.params.min_epsilon);
        }

        Ok(TickOutcome::EpisodeCompleted)
    }

    fn should_auto_stop(&self) -> bool {
        if self.current_episode >= self.params.max_episodes {
            return true;
        }
        self.params.auto_stop
            && self.detector.status().stable_checks >= self.params.stable_checks_to_stop
    }

    fn notify_training_end(&mut self) -> Result<()> {
        let result = self.result();
        for observer in &mut self.observers {
            observer.on_training_end(&result)?;
        }
        Ok(())
    }

    // ---- snapshots ---------------------------------------------------

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn current_episode(&self) -> usize {
        self.current_episode
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Cumulative reward and step count of the episode in progress.
    pub fn live_counters(&self) -> (usize, f64) {
        (self.episode.steps(), self.episode.total_reward())
    }

    pub fn history(&self) -> &[EpisodeRecord] {
        &self.history
    }

    pub fn convergence_status(&self) -> ConvergenceStatus {
        self.detector.status()
    }

    /// Read-only view of the value store.
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    pub fn env(&self) -> &GridWorld {
        &self.env
    }

    /// Derived greedy policy: best valid action per state.
    pub fn greedy_policy(&self) -> Vec<Option<Action>> {
        self.q.greedy_policy(self.env.grid())
    }

    /// Derived state-value function: max value per state.
    pub fn state_values(&self) -> Vec<f64> {
        self.q.state_values()
    }

    /// Replace the hyperparameters, clamping every field.
    ///
    /// The live epsilon is left untouched mid-session so decay stays
    /// monotonic; an idle scheduler picks up the new initial epsilon.
    pub fn set_parameters(&mut self, params: TrainingParameters) {
        self.params = params.clamped();
        if self.state == SchedulerState::Idle {
            self.epsilon = self.params.epsilon;
        }
    }

    pub fn parameters(&self) -> &TrainingParameters {
        &self.params
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Summarize the session so far.
    pub fn result(&self) -> TrainingResult {
        let total = self.history.len();
        let successes = self.history.iter().filter(|r| r.success).count();
        let avg_steps = if total > 0 {
            self.history.iter().map(|r| r.steps).sum::<usize>() as f64 / total as f64
        } else {
            0.0
        };
        TrainingResult {
            total_episodes: total,
            successes,
            success_rate: if total > 0 {
                successes as f64 / total as f64
            } else {
                0.0
            },
            avg_steps,
            total_steps: self.total_steps,
            final_epsilon: self.epsilon,
            converged: self.detector.status().is_converged,
        }
    }

    // ---- export / import ---------------------------------------------

    /// Capture the full session as an export record.
    ///
    /// The exported epsilon is the live, decayed value, so a re-imported
    /// session resumes exploration where this one left off.
    pub fn export_session(&self) -> SavedSession {
        let mut params = self.params;
        params.epsilon = self.epsilon;
        SavedSession::capture(
            &self.env,
            &self.q,
            self.algorithm,
            self.strategy,
            params,
            self.rewards,
        )
    }

    /// Atomically replace the session from an export record.
    ///
    /// The record is validated and rebuilt in full before anything live is
    /// touched; on error the current session is unchanged.
    pub fn import_session(&mut self, session: &SavedSession) -> Result<()> {
        let (env, q) = session.restore()?;
        self.token.cancel();
        self.env = env;
        self.q = q;
        self.algorithm = session.algorithm;
        self.strategy = session.exploration_strategy;
        self.params = session.parameters.clamped();
        self.rewards = session.reward_structure;
        self.epsilon = self.params.epsilon;
        self.history.clear();
        self.current_episode = 0;
        self.total_steps = 0;
        self.detector = ConvergenceDetector::new(self.params.convergence_threshold);
        self.episode = EpisodeController::new();
        self.state = SchedulerState::Idle;
        Ok(())
    }
}
