//! Fault simulation over every routing mux of a device.
//!
//! Each mux of the topology is built, injected once and resolved. Results are
//! folded into a [`SimulationReport`] holding usability counters, per-kind
//! cell fault tallies and the map of dead edges for the graph writer.
//!
//! ## Reproducibility
//!
//! Every mux draws from its own generator seeded from the run seed and the
//! mux position in the topology. The report therefore depends on the seed
//! only, never on the number of worker threads.

use crate::cell::{ControlCell, MemCell, VoterCell};
use crate::error::{SimError, SimResult};
use crate::mux::{RoutingMux, check_sources};
use crate::source::RandomErrorGen;
use ftrm_common::config::Probabilities;
use ftrm_common::fault::{CellKind, DefectMap, FaultTally, MuxTopology, NodeId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Seed of the generator used for the mux at `index`.
///
/// SplitMix64 finalizer over the run seed and the index, so neighbouring
/// muxes get uncorrelated streams.
pub fn mux_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed.wrapping_add((index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Aggregate outcome of one simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub cell_kind: CellKind,
    pub probabilities: Probabilities,
    pub seed: u64,
    pub mux_count: usize,
    pub usable: usize,
    pub unusable: usize,
    /// Source→sink edges across all muxes before injection.
    pub initial_edge_count: usize,
    /// Edges lost to defects.
    pub defect_edge_count: usize,
    /// Cell faults over every arena cell of every mux.
    pub cell_faults: FaultTally,
    pub defect_edges: DefectMap,
    pub elapsed_secs: f64,
}

impl SimulationReport {
    /// Fraction of muxes left unusable (0 when there are no muxes).
    pub fn unusable_ratio(&self) -> f64 {
        if self.mux_count == 0 {
            0.0
        } else {
            self.unusable as f64 / self.mux_count as f64
        }
    }

    pub fn surviving_edge_count(&self) -> usize {
        self.initial_edge_count - self.defect_edge_count
    }
}

/// Result of one injected and resolved mux.
#[derive(Debug)]
struct MuxOutcome {
    sink: NodeId,
    unusable: bool,
    tally: FaultTally,
    lost: BTreeSet<NodeId>,
}

/// Drives fault injection over a whole mux topology.
#[derive(Debug, Clone)]
pub struct FaultSimulator {
    topology: MuxTopology,
    cell_kind: CellKind,
    probabilities: Probabilities,
    seed: u64,
}

impl FaultSimulator {
    /// Validate the topology and the defect distribution.
    ///
    /// # Errors
    /// `SimError::Mux` for a sink without sources or with a repeated source,
    /// `SimError::Probability` for an invalid distribution.
    pub fn new(
        topology: MuxTopology,
        cell_kind: CellKind,
        probabilities: Probabilities,
        seed: u64,
    ) -> SimResult<Self> {
        probabilities.validate()?;
        for (&sink, sources) in &topology {
            check_sources(sink, sources)?;
        }
        Ok(Self {
            topology,
            cell_kind,
            probabilities,
            seed,
        })
    }

    pub fn topology(&self) -> &MuxTopology {
        &self.topology
    }

    pub const fn cell_kind(&self) -> CellKind {
        self.cell_kind
    }

    pub fn mux_count(&self) -> usize {
        self.topology.len()
    }

    /// Number of source→sink edges across every mux.
    pub fn initial_edge_count(&self) -> usize {
        self.topology.values().map(Vec::len).sum()
    }

    /// Run one trial over every mux using `workers` threads.
    pub fn run(&self, workers: usize) -> SimResult<SimulationReport> {
        match self.cell_kind {
            CellKind::Base => self.run_with::<MemCell>(workers),
            CellKind::Voter => self.run_with::<VoterCell>(workers),
        }
    }

    fn run_with<C: ControlCell>(&self, workers: usize) -> SimResult<SimulationReport> {
        let start = Instant::now();
        let entries: Vec<(usize, NodeId, &[NodeId])> = self
            .topology
            .iter()
            .enumerate()
            .map(|(index, (&sink, sources))| (index, sink, sources.as_slice()))
            .collect();
        let workers = workers.clamp(1, entries.len().max(1));

        info!(
            muxes = entries.len(),
            edges = self.initial_edge_count(),
            cell_kind = %self.cell_kind,
            workers,
            "fault simulation started"
        );

        let outcomes = if workers == 1 {
            entries
                .iter()
                .map(|entry| self.simulate_one::<C>(entry))
                .collect::<SimResult<Vec<_>>>()?
        } else {
            let chunk = entries.len().div_ceil(workers);
            std::thread::scope(|scope| {
                let handles: Vec<_> = entries
                    .chunks(chunk)
                    .map(|part| {
                        scope.spawn(move || {
                            part.iter()
                                .map(|entry| self.simulate_one::<C>(entry))
                                .collect::<SimResult<Vec<_>>>()
                        })
                    })
                    .collect();

                let mut all = Vec::with_capacity(entries.len());
                for (worker, handle) in handles.into_iter().enumerate() {
                    let part = handle
                        .join()
                        .map_err(|_| SimError::WorkerPanicked { worker })??;
                    debug!(worker, muxes = part.len(), "worker finished");
                    all.extend(part);
                }
                Ok::<_, SimError>(all)
            })?
        };

        let report = self.fold(outcomes, start.elapsed().as_secs_f64());
        info!(
            usable = report.usable,
            unusable = report.unusable,
            defect_edges = report.defect_edge_count,
            elapsed_secs = report.elapsed_secs,
            "fault simulation finished"
        );
        Ok(report)
    }

    fn simulate_one<C: ControlCell>(
        &self,
        &(index, sink, sources): &(usize, NodeId, &[NodeId]),
    ) -> SimResult<MuxOutcome> {
        let mut mux = RoutingMux::<C>::new(sink, sources.to_vec())?;
        let mut source = RandomErrorGen::new(self.probabilities, mux_seed(self.seed, index))?;
        let mut resolution = mux.inject_and_resolve(&mut source);
        Ok(MuxOutcome {
            sink,
            unusable: resolution.unusable,
            tally: mux.fault_tally(),
            lost: resolution.defect_edges.remove(&sink).unwrap_or_default(),
        })
    }

    fn fold(&self, outcomes: Vec<MuxOutcome>, elapsed_secs: f64) -> SimulationReport {
        let mut report = SimulationReport {
            cell_kind: self.cell_kind,
            probabilities: self.probabilities,
            seed: self.seed,
            mux_count: outcomes.len(),
            usable: 0,
            unusable: 0,
            initial_edge_count: self.initial_edge_count(),
            defect_edge_count: 0,
            cell_faults: FaultTally::default(),
            defect_edges: DefectMap::new(),
            elapsed_secs,
        };

        for outcome in outcomes {
            if outcome.unusable {
                report.unusable += 1;
            } else {
                report.usable += 1;
            }
            report.cell_faults.merge(&outcome.tally);
            if !outcome.lost.is_empty() {
                report.defect_edge_count += outcome.lost.len();
                report.defect_edges.insert(outcome.sink, outcome.lost);
            }
        }
        report
    }
}

/// Output path for the defect-pruned graph of `input`.
///
/// `<input>_<p>` when all three probabilities are equal, otherwise
/// `<input>_<sa0>_<sa1>_<ud>`; values in percent with one decimal.
pub fn faulty_graph_path(input: &Path, probabilities: &Probabilities) -> PathBuf {
    let Probabilities {
        p_sa0,
        p_sa1,
        p_ud,
    } = *probabilities;
    let suffix = if p_sa0 == p_sa1 && p_sa1 == p_ud {
        format!("_{:.1}", p_sa0 * 100.0)
    } else {
        format!(
            "_{:.1}_{:.1}_{:.1}",
            p_sa0 * 100.0,
            p_sa1 * 100.0,
            p_ud * 100.0
        )
    };
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
