//! Subcommand implementations.

use crate::cli::{SimulateArgs, SweepArgs};
use crate::error::CommandError;
use ftrm_common::config::SimConfig;
use ftrm_common::fault::{CellKind, Fault};
use ftrm_core::{FaultSimulator, SimulationReport, SweepPoint, faulty_graph_path};
use ftrm_rrg::RrGraph;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What `simulate` produced.
#[derive(Debug)]
pub struct SimulateOutcome {
    pub report: SimulationReport,
    /// Pruned graph, unless writing was skipped.
    pub graph_path: Option<PathBuf>,
}

/// Parse the rr_graph, inject faults into every mux and write the results.
pub fn simulate(args: &SimulateArgs, config: &SimConfig) -> Result<SimulateOutcome, CommandError> {
    let sim_cfg = &config.simulation;
    let graph = RrGraph::parse(&args.rr_graph, &sim_cfg.switch_name)?;
    let topology = graph.mux_topology();
    info!(
        path = %args.rr_graph.display(),
        muxes = topology.len(),
        edges = graph.edge_count(),
        "rr_graph loaded"
    );

    let simulator = FaultSimulator::new(
        topology,
        sim_cfg.cell_kind,
        config.probabilities,
        sim_cfg.seed,
    )?;
    let report = simulator.run(sim_cfg.workers)?;
    log_summary(&report);

    let graph_path = if args.no_write {
        None
    } else {
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| faulty_graph_path(&args.rr_graph, &config.probabilities));
        graph.write_without_edges(&path, &report.defect_edges)?;
        Some(path)
    };

    if let Some(path) = &args.report {
        write_json(path, &report)?;
        info!(path = %path.display(), "report written");
    }

    Ok(SimulateOutcome { report, graph_path })
}

fn log_summary(report: &SimulationReport) {
    info!(
        "{} of {} muxes unusable ({:.2}%)",
        report.unusable,
        report.mux_count,
        report.unusable_ratio() * 100.0
    );
    info!(
        "{} of {} edges lost, {} remain",
        report.defect_edge_count,
        report.initial_edge_count,
        report.surviving_edge_count()
    );
    for fault in Fault::ALL {
        info!(
            fault = fault.as_str(),
            cells = report.cell_faults.get(fault),
            "cell fault count"
        );
    }
}

/// JSON document emitted by `sweep`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SweepOutput {
    Single {
        cell_kind: CellKind,
        points: Vec<SweepPoint>,
    },
    Comparison(ftrm_core::SweepComparison),
}

/// Sweep one cell architecture, or compare both, and emit the series.
pub fn sweep(args: &SweepArgs, config: &SimConfig) -> Result<SweepOutput, CommandError> {
    let seed = config.simulation.seed;
    let output = match args.cell {
        Some(cell_kind) => {
            let points = ftrm_core::sweep(&config.sweep, cell_kind, seed)?;
            for point in &points {
                info!(
                    "p = {:.3}: {:.2}% unusable ({})",
                    point.p,
                    point.unusable_ratio * 100.0,
                    cell_kind
                );
            }
            SweepOutput::Single { cell_kind, points }
        }
        None => {
            let comparison = ftrm_core::compare(&config.sweep, seed)?;
            for (p, base, voter) in comparison.rows() {
                info!(
                    "p = {p:.3}: base {:.2}%, voter {:.2}%",
                    base * 100.0,
                    voter * 100.0
                );
            }
            SweepOutput::Comparison(comparison)
        }
    };

    match &args.output {
        Some(path) => {
            write_json(path, &output)?;
            info!(path = %path.display(), "sweep written");
        }
        None => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(output)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CommandError> {
    let body = serde_json::to_string_pretty(value)?;
    fs::write(path, body).map_err(|source| CommandError::Output {
        path: path.to_path_buf(),
        source,
    })
}
