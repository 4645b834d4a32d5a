//! Train command - run a full training session on a grid world

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use crate::{
    adapters::JsonRepository,
    config::TrainingParameters,
    grid::{Grid, GridWorld, RewardConfig, RewardPreset},
    learning::{Algorithm, Strategy},
    pipeline::{JsonlObserver, ProgressObserver, TrainingScheduler},
    ports::SessionRepository,
    types::Position,
};

#[derive(Parser, Debug)]
#[command(about = "Train an agent on a grid world")]
pub struct TrainArgs {
    /// Grid side length
    #[arg(long, default_value_t = 5)]
    pub size: usize,

    /// Start cell as `row,col`
    #[arg(long, default_value = "0,0", value_parser = parse_position)]
    pub start: Position,

    /// Goal cell as `row,col` (defaults to the bottom-right corner)
    #[arg(long, value_parser = parse_position)]
    pub goal: Option<Position>,

    /// Wall cell as `row,col` (repeatable)
    #[arg(long = "wall", value_parser = parse_position)]
    pub walls: Vec<Position>,

    /// Learning algorithm
    #[arg(long, short = 'a', value_enum, default_value_t = Algorithm::QLearning)]
    pub algorithm: Algorithm,

    /// Exploration strategy
    #[arg(long, short = 's', value_enum, default_value_t = Strategy::EpsilonGreedy)]
    pub strategy: Strategy,

    /// Reward preset
    #[arg(long, value_enum, default_value_t = RewardPreset::Default)]
    pub rewards: RewardPreset,

    /// Learning rate (alpha)
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    /// Discount factor (gamma)
    #[arg(long, default_value_t = 0.9)]
    pub discount_factor: f64,

    /// Initial exploration rate
    #[arg(long, default_value_t = 0.2)]
    pub epsilon: f64,

    /// Multiplicative epsilon decay applied every ten episodes
    #[arg(long, default_value_t = 0.01)]
    pub epsilon_decay: f64,

    /// Exploration rate floor
    #[arg(long, default_value_t = 0.01)]
    pub min_epsilon: f64,

    /// Boltzmann temperature
    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    /// UCB exploration constant
    #[arg(long, default_value_t = 2.0)]
    pub ucb_constant: f64,

    /// Number of training episodes
    #[arg(long, short = 'e', default_value_t = 500)]
    pub episodes: usize,

    /// Step cap per episode
    #[arg(long, default_value_t = 200)]
    pub max_steps: usize,

    /// Delay between steps in milliseconds
    #[arg(long, default_value_t = 0)]
    pub tick_delay_ms: u64,

    /// Stop early once the value function stabilizes
    #[arg(long)]
    pub auto_stop: bool,

    /// Mean absolute update threshold for convergence
    #[arg(long, default_value_t = 1e-3)]
    pub convergence_threshold: f64,

    /// Consecutive stable checks required before auto-stop
    #[arg(long, default_value_t = 3)]
    pub stable_checks: u32,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Export the finished session to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Write per-episode records as JSON lines
    #[arg(long)]
    pub jsonl: Option<PathBuf>,

    /// Write the training summary as JSON
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Suppress the progress bar
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Parse a `row,col` pair from the command line.
pub fn parse_position(value: &str) -> Result<Position, String> {
    let (row, col) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `row,col`, got '{value}'"))?;
    let row = row
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid row '{row}': {e}"))?;
    let col = col
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid col '{col}': {e}"))?;
    Ok(Position::new(row, col))
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let mut grid = Grid::new(args.size)?;
    let goal = args
        .goal
        .unwrap_or_else(|| Position::new(args.size - 1, args.size - 1));

    for wall in &args.walls {
        if *wall == args.start || *wall == goal {
            return Err(anyhow!("wall at {wall} overlaps the start or goal cell"));
        }
        grid.set_wall(*wall)?;
    }
    let env = GridWorld::new(grid, args.start, goal)?;

    let params = TrainingParameters::default()
        .with_learning_rate(args.learning_rate)
        .with_discount_factor(args.discount_factor)
        .with_epsilon(args.epsilon)
        .with_epsilon_decay(args.epsilon_decay)
        .with_min_epsilon(args.min_epsilon)
        .with_temperature(args.temperature)
        .with_ucb_constant(args.ucb_constant)
        .with_max_episodes(args.episodes)
        .with_max_steps_per_episode(args.max_steps)
        .with_tick_delay_ms(args.tick_delay_ms)
        .with_auto_stop(args.auto_stop)
        .with_convergence_threshold(args.convergence_threshold)
        .with_stable_checks_to_stop(args.stable_checks);

    println!("=== Training Configuration ===");
    println!("Grid: {0}x{0}, start {1}, goal {2}", args.size, args.start, goal);
    if !args.walls.is_empty() {
        println!("Walls: {}", args.walls.len());
    }
    println!("Algorithm: {}", args.algorithm.name());
    println!("Strategy: {}", args.strategy.name());
    println!("Episodes: {} (max {} steps each)", args.episodes, args.max_steps);
    if let Some(seed) = args.seed {
        println!("Seed: {seed}");
    }

    let mut scheduler = TrainingScheduler::new(
        env,
        args.algorithm,
        args.strategy,
        params,
        RewardConfig::preset(args.rewards),
    );
    if let Some(seed) = args.seed {
        scheduler = scheduler.with_seed(seed);
    }
    if !args.quiet {
        scheduler = scheduler.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.jsonl {
        scheduler = scheduler.with_observer(Box::new(JsonlObserver::new(path)?));
    }

    let result = scheduler.run()?;

    println!("\n=== Training Results ===");
    println!("Episodes: {}", result.total_episodes);
    println!(
        "Goal reached: {} ({:.1}%)",
        result.successes,
        result.success_rate * 100.0
    );
    println!("Average steps per episode: {:.1}", result.avg_steps);
    println!("Total steps: {}", result.total_steps);
    println!("Final epsilon: {:.4}", result.final_epsilon);
    println!("Converged: {}", result.converged);

    if let Some(path) = &args.results {
        result.save(path)?;
        println!("Results saved to: {}", path.display());
    }

    if let Some(path) = &args.export {
        let session = scheduler.export_session();
        JsonRepository::new()
            .save(&session, path)
            .with_context(|| format!("failed to export session to {}", path.display()))?;
        println!("Session exported to: {}", path.display());
    }

    Ok(())
}
