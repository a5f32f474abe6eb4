//! # FTRM Sim Binary
//!
//! # Usage
//!
//! ```bash
//! # Inject 1% of every defect kind into an rr_graph, voter cells
//! ftrm_sim simulate --rr-graph rr_graph.xml --p 0.01 --cell voter
//!
//! # Undefined-only defects, JSON report, no pruned graph
//! ftrm_sim simulate --rr-graph rr_graph.xml --p-ud 0.02 --report report.json --no-write
//!
//! # Base vs voter sweep with settings from a file
//! ftrm_sim sweep --config ftrm.toml --output sweep.json -v
//! ```

#![deny(warnings)]

use clap::Parser;
use ftrm_common::config::LogLevel;
use ftrm_sim::cli::{Cli, Command};
use ftrm_sim::commands;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        error!("FATAL: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Log level comes from the file; a load error is returned after tracing is up.
    let config = cli.resolve_config();
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&cli, level);
    let config = config?;

    info!(
        "{} v{} starting",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );

    match &cli.command {
        Command::Simulate(args) => {
            let outcome = commands::simulate(args, &config)?;
            if let Some(path) = outcome.graph_path {
                info!("Pruned rr_graph: {}", path.display());
            }
        }
        Command::Sweep(args) => {
            commands::sweep(args, &config)?;
        }
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(cli: &Cli, level: LogLevel) {
    let directive = if cli.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if cli.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
