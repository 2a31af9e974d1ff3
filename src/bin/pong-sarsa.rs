//! pong-sarsa CLI - train and inspect SARSA(λ) Pong agents
//!
//! - `train` runs a learner (or the random baseline) on the simulated court
//! - `inspect` reports on a saved agent's settings and tables

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pong-sarsa")]
#[command(version, about = "SARSA(lambda) agents for Pong", long_about = None)]
struct Cli {
    /// Log at info level unless RUST_LOG says otherwise
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train an agent on the simulated court
    Train(Box<pong_sarsa::cli::commands::train::TrainArgs>),

    /// Inspect a saved agent
    Inspect(pong_sarsa::cli::commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Train(args) => pong_sarsa::cli::commands::train::execute(*args),
        Commands::Inspect(args) => pong_sarsa::cli::commands::inspect::execute(args),
    }
}
