//! Cotick CLI
//!
//! Run a coroutine timeline from a config file.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod demo;

use config::{CotickConfig, DriverKind};

#[derive(Parser)]
#[command(name = "cotick")]
#[command(author, version, about = "Cooperative coroutine scheduler demo", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo timeline
    Run {
        /// Config file or directory containing cotick.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scheduling source that drives ticks
        #[arg(long, value_enum)]
        driver: Option<DriverKind>,

        /// Frame rate for the frames driver
        #[arg(long)]
        fps: Option<u32>,

        /// Stop after this many turns
        #[arg(long)]
        max_turns: Option<u64>,
    },

    /// Write a default cotick.toml
    Init {
        /// Target directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            driver,
            fps,
            max_turns,
        } => {
            let mut config = CotickConfig::load(config.as_deref())?;
            if let Some(driver) = driver {
                config.driver.kind = driver;
            }
            if let Some(fps) = fps {
                config.driver.fps = fps;
            }
            if max_turns.is_some() {
                config.driver.max_turns = max_turns;
            }

            let report = demo::run(&config)?;
            tracing::info!(
                scheduler = %report.scheduler,
                ticks = report.ticks,
                turns = report.turns,
                position = report.position,
                finished = report.finished,
                "demo complete"
            );
        }
        Commands::Init { path } => {
            let written = CotickConfig::write_default(&path)?;
            tracing::info!("wrote {}", written.display());
        }
    }

    Ok(())
}
