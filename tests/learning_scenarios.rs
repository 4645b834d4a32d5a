//! End-to-end learning scenarios on small grids.

use gridrl::{
    Action, Algorithm, Grid, GridWorld, Position, RewardConfig, Strategy, TrainingParameters,
    TrainingScheduler,
};

/// Follow the greedy policy from the start cell, returning the visited path.
fn greedy_rollout(scheduler: &TrainingScheduler, cap: usize) -> Vec<Position> {
    let env = scheduler.env();
    let size = env.size();
    let policy = scheduler.greedy_policy();
    let mut pos = env.start();
    let mut path = vec![pos];
    for _ in 0..cap {
        if pos == env.goal() {
            break;
        }
        let Some(action) = policy[pos.to_state(size)] else {
            break;
        };
        let Some(next) = action.apply(pos) else {
            break;
        };
        pos = next;
        path.push(pos);
    }
    path
}

fn train(env: GridWorld, episodes: usize, seed: u64) -> TrainingScheduler {
    let params = TrainingParameters::default()
        .with_max_episodes(episodes)
        .with_max_steps_per_episode(200);
    let mut scheduler = TrainingScheduler::new(
        env,
        Algorithm::QLearning,
        Strategy::EpsilonGreedy,
        params,
        RewardConfig::default(),
    )
    .with_seed(seed);
    scheduler.run().unwrap();
    scheduler
}

#[test]
fn empty_grid_learns_shortest_path() {
    let grid = Grid::new(5).unwrap();
    let env = GridWorld::new(grid, Position::new(0, 0), Position::new(4, 4)).unwrap();
    let scheduler = train(env, 1000, 42);

    let path = greedy_rollout(&scheduler, 50);
    assert_eq!(
        path.last(),
        Some(&Position::new(4, 4)),
        "greedy policy should reach the goal"
    );
    // Manhattan distance on an empty 5x5 grid: 8 moves.
    assert_eq!(path.len() - 1, 8, "greedy path should be optimal: {path:?}");
}

#[test]
fn wall_row_funnels_path_through_gap() {
    let mut grid = Grid::new(5).unwrap();
    for col in [0, 1, 3, 4] {
        grid.set_wall(Position::new(2, col)).unwrap();
    }
    let env = GridWorld::new(grid, Position::new(0, 0), Position::new(4, 4)).unwrap();
    let scheduler = train(env, 1500, 7);

    let path = greedy_rollout(&scheduler, 50);
    assert_eq!(path.last(), Some(&Position::new(4, 4)));
    assert!(
        path.contains(&Position::new(2, 2)),
        "the only opening in the wall row is (2,2): {path:?}"
    );
    assert_eq!(path.len() - 1, 8, "the gap lies on a shortest path: {path:?}");
}

#[test]
fn wall_collision_pays_exact_penalty_and_stays_put() {
    let mut grid = Grid::new(3).unwrap();
    grid.set_wall(Position::new(1, 2)).unwrap();
    let mut env = GridWorld::new(grid, Position::new(1, 1), Position::new(2, 2)).unwrap();
    let rewards = RewardConfig::default();

    let outcome = env.step(Action::Right, &rewards);
    assert_eq!(outcome.reward, -10.0);
    assert!(outcome.collision);
    assert_eq!(env.agent_pos(), Position::new(1, 1));

    let total = outcome.reward
        + env.step(Action::Down, &rewards).reward
        + env.step(Action::Right, &rewards).reward;
    assert_eq!(total, -10.0 - 1.0 + 100.0);
    assert_eq!(env.agent_pos(), env.goal());
}

#[test]
fn epsilon_decay_matches_closed_form() {
    let grid = Grid::new(3).unwrap();
    let env = GridWorld::new(grid, Position::new(0, 0), Position::new(2, 2)).unwrap();
    let params = TrainingParameters::default()
        .with_epsilon(0.1)
        .with_epsilon_decay(0.01)
        .with_min_epsilon(0.01)
        .with_max_episodes(100)
        .with_max_steps_per_episode(50);
    let mut scheduler = TrainingScheduler::new(
        env,
        Algorithm::QLearning,
        Strategy::EpsilonGreedy,
        params,
        RewardConfig::default(),
    )
    .with_seed(11);
    scheduler.run().unwrap();

    // Ten decays over one hundred episodes, none clipped by the floor.
    let expected = 0.1 * 0.99_f64.powi(10);
    assert!(
        (scheduler.epsilon() - expected).abs() < 1e-12,
        "epsilon after 100 episodes: {} vs {}",
        scheduler.epsilon(),
        expected
    );
}

#[test]
fn ucb_and_boltzmann_strategies_reach_the_goal() {
    for strategy in [Strategy::Ucb, Strategy::Boltzmann] {
        let grid = Grid::new(4).unwrap();
        let env = GridWorld::new(grid, Position::new(0, 0), Position::new(3, 3)).unwrap();
        let params = TrainingParameters::default()
            .with_max_episodes(800)
            .with_max_steps_per_episode(100);
        let mut scheduler = TrainingScheduler::new(
            env,
            Algorithm::QLearning,
            strategy,
            params,
            RewardConfig::default(),
        )
        .with_seed(17);
        let result = scheduler.run().unwrap();
        assert!(
            result.success_rate > 0.5,
            "{:?} should solve an empty 4x4 grid, success rate {}",
            strategy,
            result.success_rate
        );
    }
}

#[test]
fn sarsa_and_expected_sarsa_also_reach_the_goal() {
    for algorithm in [Algorithm::Sarsa, Algorithm::ExpectedSarsa] {
        let grid = Grid::new(4).unwrap();
        let env = GridWorld::new(grid, Position::new(0, 0), Position::new(3, 3)).unwrap();
        let params = TrainingParameters::default()
            .with_max_episodes(800)
            .with_max_steps_per_episode(100);
        let mut scheduler = TrainingScheduler::new(
            env,
            algorithm,
            Strategy::EpsilonGreedy,
            params,
            RewardConfig::default(),
        )
        .with_seed(13);
        let result = scheduler.run().unwrap();
        assert!(
            result.success_rate > 0.5,
            "{} should solve an empty 4x4 grid, success rate {}",
            algorithm.name(),
            result.success_rate
        );
        let path = greedy_rollout(&scheduler, 50);
        assert_eq!(
            path.last(),
            Some(&Position::new(3, 3)),
            "{} greedy policy should reach the goal",
            algorithm.name()
        );
    }
}
