//! credit-sim - Credit Assessment Event Stream Simulator
//!
//! # Commands
//!
//! - `credit-sim run` - Stream events until a limit or Ctrl-C
//! - `credit-sim profiles` - List the built-in network profiles
//! - `credit-sim inspect --dataset <file>` - Summarise a dataset file

use anyhow::Result;
use clap::{Parser, Subcommand};
use credit_producer::config::ProducerConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// Credit assessment event stream simulator
#[derive(Parser)]
#[command(name = "credit-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "credit-sim.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream credit assessment events
    Run(commands::run::RunArgs),

    /// List the built-in network profiles
    Profiles,

    /// Summarise a dataset file
    Inspect {
        /// Dataset path (defaults to the configured dataset)
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ProducerConfig::load_or_default(&cli.config)?.with_env_override();

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!(config = %cli.config.display(), "credit-sim starting");

    match cli.command {
        Commands::Run(args) => commands::run::run(config, args).await,
        Commands::Profiles => commands::profiles::run(),
        Commands::Inspect { dataset } => {
            let path = dataset.unwrap_or(config.dataset.path);
            commands::inspect::run(&path)
        }
    }
}
