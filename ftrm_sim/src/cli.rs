//! Command-line arguments and their effect on the loaded configuration.

use clap::{Args, Parser, Subcommand};
use ftrm_common::config::{ConfigError, ConfigLoader, Probabilities, SimConfig, SweepMode};
use ftrm_common::fault::CellKind;
use std::path::PathBuf;

/// FTRM Sim - memristor fault simulation for two-stage routing muxes
#[derive(Parser, Debug)]
#[command(name = "ftrm_sim")]
#[command(author = "Lucas Gaia de Castro")]
#[command(version)]
#[command(about = "Fault simulation for memristor-based FPGA routing muxes")]
#[command(long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inject faults into every routing mux of an rr_graph and write the pruned graph
    Simulate(SimulateArgs),
    /// Sweep a defect probability over one synthetic mux
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub struct SimulateArgs {
    /// Routing resource graph to read
    #[arg(long, value_name = "FILE")]
    pub rr_graph: PathBuf,

    /// Cell architecture (base | voter)
    #[arg(long)]
    pub cell: Option<CellKind>,

    /// Same probability for SA0, SA1 and UD
    #[arg(long, conflicts_with_all = ["p_sa0", "p_sa1", "p_ud"])]
    pub p: Option<f64>,

    /// Stuck-at-0 probability
    #[arg(long)]
    pub p_sa0: Option<f64>,

    /// Stuck-at-1 probability
    #[arg(long)]
    pub p_sa1: Option<f64>,

    /// Undefined-state probability
    #[arg(long)]
    pub p_ud: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// rr_graph switch name designating routing muxes
    #[arg(long)]
    pub switch_name: Option<String>,

    /// Pruned graph path (derived from the input name and probabilities when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the simulation report as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Skip writing the pruned graph
    #[arg(long)]
    pub no_write: bool,
}

impl SimulateArgs {
    /// Override configuration values given on the command line.
    pub fn apply(&self, config: &mut SimConfig) {
        let sim = &mut config.simulation;
        if let Some(cell) = self.cell {
            sim.cell_kind = cell;
        }
        if let Some(seed) = self.seed {
            sim.seed = seed;
        }
        if let Some(workers) = self.workers {
            sim.workers = workers;
        }
        if let Some(name) = &self.switch_name {
            sim.switch_name = name.clone();
        }

        let probs = &mut config.probabilities;
        if let Some(p) = self.p {
            *probs = Probabilities::uniform(p);
        }
        if let Some(p) = self.p_sa0 {
            probs.p_sa0 = p;
        }
        if let Some(p) = self.p_sa1 {
            probs.p_sa1 = p;
        }
        if let Some(p) = self.p_ud {
            probs.p_ud = p;
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SweepArgs {
    /// Trials per swept value
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Number of sources of the simulated mux
    #[arg(long)]
    pub mux_inputs: Option<usize>,

    /// How the swept value maps to defect probabilities (undefined_only | uniform)
    #[arg(long)]
    pub mode: Option<SweepMode>,

    #[arg(long)]
    pub start: Option<f64>,

    /// Exclusive upper bound
    #[arg(long)]
    pub stop: Option<f64>,

    #[arg(long)]
    pub step: Option<f64>,

    /// Sweep a single cell architecture instead of comparing both
    #[arg(long)]
    pub cell: Option<CellKind>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the JSON series here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SweepArgs {
    /// Override configuration values given on the command line.
    pub fn apply(&self, config: &mut SimConfig) {
        let sweep = &mut config.sweep;
        if let Some(iterations) = self.iterations {
            sweep.iterations = iterations;
        }
        if let Some(n) = self.mux_inputs {
            sweep.mux_inputs = n;
        }
        if let Some(mode) = self.mode {
            sweep.mode = mode;
        }
        if let Some(start) = self.start {
            sweep.start = start;
        }
        if let Some(stop) = self.stop {
            sweep.stop = stop;
        }
        if let Some(step) = self.step {
            sweep.step = step;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
    }
}

impl Cli {
    /// Load the configuration file (or defaults), apply overrides and
    /// validate the result.
    pub fn resolve_config(&self) -> Result<SimConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        match &self.command {
            Command::Simulate(args) => args.apply(&mut config),
            Command::Sweep(args) => args.apply(&mut config),
        }
        config.validate()?;
        Ok(config)
    }
}
