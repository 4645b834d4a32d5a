//! Policy command - render the greedy policy of a saved session

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    adapters::JsonRepository,
    ports::SessionRepository,
    types::{Action, Position},
};

#[derive(Parser, Debug)]
#[command(about = "Print the greedy policy and state values of a saved session")]
pub struct PolicyArgs {
    /// Path to an exported session file
    pub session: PathBuf,

    /// Also print the state-value table
    #[arg(long)]
    pub values: bool,
}

pub fn execute(args: PolicyArgs) -> Result<()> {
    let session = JsonRepository::new()
        .load(&args.session)
        .with_context(|| format!("failed to load session from {}", args.session.display()))?;
    let (env, q) = session.restore()?;

    println!("Grid: {0}x{0}", env.size());
    println!("Algorithm: {}", session.algorithm.name());
    println!("Strategy: {}", session.exploration_strategy.name());
    println!("Epsilon: {:.4}", session.parameters.epsilon);
    println!();

    let policy = q.greedy_policy(env.grid());
    let size = env.size();
    for row in 0..size {
        let mut line = String::with_capacity(size * 2);
        for col in 0..size {
            let pos = Position::new(row, col);
            let glyph = if pos == env.goal() {
                'G'
            } else if env.grid().is_wall(pos) {
                '#'
            } else {
                match policy[pos.to_state(size)] {
                    Some(Action::Up) => '^',
                    Some(Action::Down) => 'v',
                    Some(Action::Left) => '<',
                    Some(Action::Right) => '>',
                    None => '.',
                }
            };
            line.push(glyph);
            line.push(' ');
        }
        println!("{}", line.trim_end());
    }

    if args.values {
        println!();
        let values = q.state_values();
        for row in 0..size {
            let line: Vec<String> = (0..size)
                .map(|col| format!("{:8.2}", values[Position::new(row, col).to_state(size)]))
                .collect();
            println!("{}", line.join(" "));
        }
    }

    Ok(())
}
