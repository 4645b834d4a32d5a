//! Single-episode execution: reset, repeated steps, termination.

use std::time::Instant;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{
    config::TrainingParameters,
    grid::{GridWorld, RewardConfig},
    learning::{
        Algorithm, QTable, SelectionContext, Strategy, UpdateParams, select_action, update_value,
    },
    types::{Action, Position},
};

/// Lifecycle of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    NotStarted,
    Running,
    Complete,
}

/// One recorded step of a trajectory.
///
/// The first entry of every trajectory seeds the initial position with no
/// action or reward; `values` is the snapshot of the departed state's four
/// action values after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub position: Position,
    pub action: Option<Action>,
    pub reward: f64,
    pub values: [f64; Action::COUNT],
    pub collision: bool,
}

/// Completed-episode summary kept in the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub index: usize,
    pub steps: usize,
    pub total_reward: f64,
    pub success: bool,
    pub epsilon_at_completion: f64,
    pub duration_ms: u64,
    pub trajectory: Vec<TrajectoryStep>,
}

/// Everything one step needs besides the episode's own state.
pub struct StepContext<'a> {
    pub algorithm: Algorithm,
    pub strategy: Strategy,
    pub params: &'a TrainingParameters,
    pub rewards: &'a RewardConfig,
    /// Live exploration rate (initial epsilon after any decay).
    pub epsilon: f64,
    /// Total environment steps performed across the session.
    pub total_steps: u64,
}

/// Outcome of one controller step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub completed: bool,
    /// Signed change applied to Q(s, a) by this step's update.
    pub td_delta: f64,
}

/// Drives one trajectory from reset to termination.
///
/// The controller holds counters and the trajectory only; the agent's
/// position lives in the environment and is read fresh on every step.
#[derive(Debug, Clone)]
pub struct EpisodeController {
    status: EpisodeStatus,
    steps: usize,
    total_reward: f64,
    trajectory: Vec<TrajectoryStep>,
    last_action: Option<Action>,
    last_reward: f64,
    // On-policy lookahead already committed by a SARSA update.
    pending_action: Option<Action>,
    started_at: Option<Instant>,
}

impl EpisodeController {
    pub fn new() -> Self {
        Self {
            status: EpisodeStatus::NotStarted,
            steps: 0,
            total_reward: 0.0,
            trajectory: Vec::new(),
            last_action: None,
            last_reward: 0.0,
            pending_action: None,
            started_at: None,
        }
    }

    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    pub fn last_action(&self) -> Option<Action> {
        self.last_action
    }

    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    pub fn trajectory(&self) -> &[TrajectoryStep] {
        &self.trajectory
    }

    /// Reset the agent to the start cell and seed the trajectory.
    pub fn start(&mut self, env: &mut GridWorld, q: &QTable) {
        env.reset_agent();
        let state = env.agent_pos().to_state(env.size());
        self.status = EpisodeStatus::Running;
        self.steps = 0;
        self.total_reward = 0.0;
        self.last_action = None;
        self.last_reward = 0.0;
        self.pending_action = None;
        self.started_at = Some(Instant::now());
        self.trajectory = vec![TrajectoryStep {
            position: env.agent_pos(),
            action: None,
            reward: 0.0,
            values: q.values_at(state),
            collision: false,
        }];
    }

    /// Execute one step: select, transition, update, record.
    ///
    /// Returns whether the episode just completed. Stepping a finished or
    /// unstarted episode is a no-op reporting completion.
    pub fn step(
        &mut self,
        env: &mut GridWorld,
        q: &mut QTable,
        ctx: &StepContext<'_>,
        rng: &mut StdRng,
    ) -> StepReport {
        if self.status != EpisodeStatus::Running {
            return StepReport {
                completed: true,
                td_delta: 0.0,
            };
        }

        let size = env.size();
        let pos = env.agent_pos();
        let state = pos.to_state(size);
        let valid = env.valid_actions();

        let selection_ctx = SelectionContext {
            epsilon: ctx.epsilon,
            ucb_constant: ctx.params.ucb_constant,
            temperature: ctx.params.temperature,
            total_steps: ctx.total_steps,
        };
        // A SARSA update in the previous step already committed us to an
        // action; otherwise consult the exploration strategy now.
        let action = self
            .pending_action
            .take()
            .unwrap_or_else(|| select_action(q, state, &valid, ctx.strategy, &selection_ctx, rng));
        q.record_visit(state, action);

        let outcome = env.step(action, ctx.rewards);
        let next_state = outcome.next_pos.to_state(size);
        let valid_next = if outcome.done {
            Vec::new()
        } else {
            env.valid_actions()
        };

        let next_action = if ctx.algorithm == Algorithm::Sarsa && !valid_next.is_empty() {
            let next =
                select_action(q, next_state, &valid_next, ctx.strategy, &selection_ctx, rng);
            self.pending_action = Some(next);
            Some(next)
        } else {
            None
        };

        let update_params = UpdateParams {
            learning_rate: ctx.params.learning_rate,
            discount_factor: ctx.params.discount_factor,
            epsilon: ctx.epsilon,
        };
        let before = q.get(state, action);
        let after = update_value(
            q,
            state,
            action,
            outcome.reward,
            next_state,
            &valid_next,
            ctx.algorithm,
            &update_params,
            next_action,
        );

        self.steps += 1;
        self.total_reward += outcome.reward;
        self.last_action = Some(action);
        self.last_reward = outcome.reward;
        self.trajectory.push(TrajectoryStep {
            position: outcome.next_pos,
            action: Some(action),
            reward: outcome.reward,
            values: q.values_at(state),
            collision: outcome.collision,
        });

        let completed = outcome.done || self.steps >= ctx.params.max_steps_per_episode;
        if completed {
            self.status = EpisodeStatus::Complete;
            self.pending_action = None;
        }

        StepReport {
            completed,
            td_delta: after - before,
        }
    }

    /// True if the agent finished on the goal cell.
    pub fn succeeded(&self, env: &GridWorld) -> bool {
        self.status == EpisodeStatus::Complete && env.agent_pos() == env.goal()
    }

    /// Snapshot this episode into a history record.
    pub fn to_record(&self, index: usize, epsilon: f64, env: &GridWorld) -> EpisodeRecord {
        EpisodeRecord {
            index,
            steps: self.steps,
            total_reward: self.total_reward,
            success: self.succeeded(env),
            epsilon_at_completion: epsilon,
            duration_ms: self
                .started_at
                .map(|t| t.elapsed().as_millis() as u64)
                .unwrap_or(0),
            trajectory: self.trajectory.clone(),
        }
    }
}

impl Default for EpisodeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::grid::Grid;

    fn setup() -> (GridWorld, QTable, TrainingParameters, RewardConfig) {
        let grid = Grid::new(3).unwrap();
        let env = GridWorld::new(grid, Position::new(0, 0), Position::new(2, 2)).unwrap();
        let q = QTable::new(env.num_states());
        let params = TrainingParameters::default();
        let rewards = RewardConfig::default();
        (env, q, params, rewards)
    }

    fn ctx<'a>(
        params: &'a TrainingParameters,
        rewards: &'a RewardConfig,
        algorithm: Algorithm,
    ) -> StepContext<'a> {
        StepContext {
            algorithm,
            strategy: Strategy::EpsilonGreedy,
            params,
            rewards,
            epsilon: params.epsilon,
            total_steps: 0,
        }
    }

    #[test]
    fn test_start_seeds_trajectory() {
        let (mut env, q, _, _) = setup();
        let mut controller = EpisodeController::new();
        controller.start(&mut env, &q);

        assert_eq!(controller.status(), EpisodeStatus::Running);
        assert_eq!(controller.trajectory().len(), 1);
        assert_eq!(controller.trajectory()[0].position, env.start());
        assert_eq!(controller.trajectory()[0].action, None);
    }

    #[test]
    fn test_episode_terminates_within_step_limit() {
        let (mut env, mut q, params, rewards) = setup();
        let params = params.with_max_steps_per_episode(10);
        let mut controller = EpisodeController::new();
        let mut rng = StdRng::seed_from_u64(21);

        controller.start(&mut env, &q);
        let mut completed = false;
        for _ in 0..10 {
            let report = controller.step(
                &mut env,
                &mut q,
                &ctx(&params, &rewards, Algorithm::QLearning),
                &mut rng,
            );
            if report.completed {
                completed = true;
                break;
            }
        }
        assert!(completed || controller.steps() == 10);
        assert!(controller.trajectory().len() <= 11);
    }

    #[test]
    fn test_sarsa_reuses_preselected_action() {
        let (mut env, mut q, params, rewards) = setup();
        let mut controller = EpisodeController::new();
        let mut rng = StdRng::seed_from_u64(5);

        controller.start(&mut env, &q);
        controller.step(
            &mut env,
            &mut q,
            &ctx(&params, &rewards, Algorithm::Sarsa),
            &mut rng,
        );
        let committed = controller.pending_action;
        if let Some(expected) = committed {
            controller.step(
                &mut env,
                &mut q,
                &ctx(&params, &rewards, Algorithm::Sarsa),
                &mut rng,
            );
            assert_eq!(controller.last_action(), Some(expected));
        }
    }

    #[test]
    fn test_step_after_completion_is_noop() {
        let (mut env, mut q, params, rewards) = setup();
        let params = params.with_max_steps_per_episode(1);
        let mut controller = EpisodeController::new();
        let mut rng = StdRng::seed_from_u64(2);

        controller.start(&mut env, &q);
        let report = controller.step(
            &mut env,
            &mut q,
            &ctx(&params, &rewards, Algorithm::QLearning),
            &mut rng,
        );
        assert!(report.completed);

        let report = controller.step(
            &mut env,
            &mut q,
            &ctx(&params, &rewards, Algorithm::QLearning),
            &mut rng,
        );
        assert!(report.completed);
        assert_eq!(report.td_delta, 0.0);
        assert_eq!(controller.steps(), 1);
    }
}
