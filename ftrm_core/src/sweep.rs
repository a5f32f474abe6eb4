//! Defect-probability sweep over a single synthetic mux.
//!
//! For every swept probability the same mux (sources `0..n`, sink `n`) is
//! injected and resolved `iterations` times; the fraction of trials that
//! leave it unusable is recorded.

use crate::cell::{ControlCell, MemCell, VoterCell};
use crate::error::{SimError, SimResult};
use crate::mux::RoutingMux;
use crate::simulator::mux_seed;
use crate::source::RandomErrorGen;
use ftrm_common::config::{Probabilities, SweepConfig};
use ftrm_common::fault::{CellKind, NodeId};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of all trials at one swept probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Swept value.
    pub p: f64,
    /// Absolute probabilities derived from `p` by the sweep mode.
    pub probabilities: Probabilities,
    pub trials: u32,
    pub unusable: u32,
    pub unusable_ratio: f64,
}

/// Base and voter sweeps over the same probability grid.
#[derive(Debug, Clone, Serialize)]
pub struct SweepComparison {
    pub base: Vec<SweepPoint>,
    pub voter: Vec<SweepPoint>,
}

impl SweepComparison {
    /// `(p, base ratio, voter ratio)` rows.
    pub fn rows(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.base
            .iter()
            .zip(&self.voter)
            .map(|(b, v)| (b.p, b.unusable_ratio, v.unusable_ratio))
    }
}

/// Sweep the configured range for one cell architecture.
///
/// # Errors
/// Fails when the configuration is invalid or a swept value produces an
/// invalid distribution.
pub fn sweep(config: &SweepConfig, cell_kind: CellKind, seed: u64) -> SimResult<Vec<SweepPoint>> {
    match cell_kind {
        CellKind::Base => sweep_with::<MemCell>(config, seed),
        CellKind::Voter => sweep_with::<VoterCell>(config, seed),
    }
}

/// Run the same sweep for both cell architectures.
pub fn compare(config: &SweepConfig, seed: u64) -> SimResult<SweepComparison> {
    Ok(SweepComparison {
        base: sweep_with::<MemCell>(config, seed)?,
        voter: sweep_with::<VoterCell>(config, seed)?,
    })
}

/// Generic sweep over cell type `C`.
pub fn sweep_with<C: ControlCell>(config: &SweepConfig, seed: u64) -> SimResult<Vec<SweepPoint>> {
    let n = config.mux_inputs;
    let sources: Vec<NodeId> = (0..n as NodeId).collect();
    let mut mux = RoutingMux::<C>::new(n as NodeId, sources)?;

    info!(
        cell_kind = %C::KIND,
        mux_inputs = n,
        block_size = mux.block_size(),
        iterations = config.iterations,
        mode = ?config.mode,
        "sweep started"
    );

    config
        .points()
        .into_iter()
        .enumerate()
        .map(|(index, p)| {
            let probabilities = config.mode.probabilities(p);
            let mut source = RandomErrorGen::new(probabilities, mux_seed(seed, index))?;
            let mut unusable = 0u32;
            for _ in 0..config.iterations {
                if mux.inject_and_resolve(&mut source).unusable {
                    unusable += 1;
                }
            }
            let point = SweepPoint {
                p,
                probabilities,
                trials: config.iterations,
                unusable,
                unusable_ratio: f64::from(unusable) / f64::from(config.iterations.max(1)),
            };
            debug!(p, unusable, ratio = point.unusable_ratio, "sweep point");
            Ok::<_, SimError>(point)
        })
        .collect()
}
