//! Grid-world RL CLI
//!
//! This CLI provides:
//! - Training tabular agents on configurable grid worlds
//! - Inspecting the greedy policy of an exported session

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gridrl")]
#[command(version, about = "Tabular reinforcement learning on grid worlds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent on a grid world
    Train(Box<gridrl::cli::commands::train::TrainArgs>),

    /// Print the greedy policy of a saved session
    Policy(gridrl::cli::commands::policy::PolicyArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(args) => gridrl::cli::commands::train::execute(*args),
        Commands::Policy(args) => gridrl::cli::commands::policy::execute(args),
    }
}
