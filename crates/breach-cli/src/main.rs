mod cmd;
mod output;
mod root;

use breach_core::types::DifficultyLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "breach",
    about = "Terminal hacking game: scan, crack, connect, escalate",
    version,
    propagate_version = true
)]
struct Cli {
    /// Game root (default: auto-detect from .breach/)
    #[arg(long, global = true, env = "BREACH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new game in the current directory
    Init {
        /// easy, normal, hard, or expert
        #[arg(long)]
        difficulty: Option<DifficultyLevel>,
    },

    /// Interactive shell; time advances in real time
    Play,

    /// Run one in-game command, fast-forward until idle, and save
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show the saved game state
    State,

    /// List discovered hosts
    Hosts,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Play => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { difficulty } => cmd::init::run(&root, difficulty),
        Commands::Play => cmd::play::run(&root),
        Commands::Exec { command } => cmd::exec::run(&root, &command.join(" "), cli.json),
        Commands::State => cmd::state::run(&root, cli.json),
        Commands::Hosts => cmd::hosts::run(&root, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
