//! Two-stage routing mux.
//!
//! An N:1 routing mux is split into a first stage of `ceil(N / b)` blocks of
//! `b` inputs each and a second stage selecting one of those blocks. The
//! block size `b` minimizes the number of selection cells, `b + ceil(N / b)`.
//!
//! ## Cell Arena
//!
//! First-stage blocks do not own their cells. One column of `b` cells drives
//! the same input position of every first-stage block, so a single defective
//! cell hits that lane in every partition. The mux owns one arena:
//!
//! ```text
//! index:  0 .. b-1          b .. b+P-1
//!         first-stage pool  second-stage pool (one cell per partition)
//! ```
//!
//! ## Lifecycle
//!
//! `Built → FaultInjected → Resolved`. Re-injecting moves back to
//! `FaultInjected`; a mux never returns to `Built`. Resolution reads cell
//! state only and may be repeated.

use crate::block::BlockView;
use crate::cell::ControlCell;
use crate::error::MuxError;
use crate::source::ErrorSource;
use ftrm_common::fault::{DefectMap, Fault, FaultTally, NodeId};
use std::collections::BTreeSet;
use tracing::trace;

/// Selection cells of a two-stage mux with block size `b` over `n` sources.
#[inline]
pub const fn cell_cost(n_sources: usize, block_size: usize) -> usize {
    block_size + n_sources.div_ceil(block_size)
}

/// Block size minimizing the total cell count for `n_sources` inputs.
///
/// Ties keep the smallest block size.
///
/// # Errors
/// `MuxError::NoSources` when `n_sources == 0`.
pub fn compute_block_size(n_sources: usize) -> Result<usize, MuxError> {
    if n_sources == 0 {
        return Err(MuxError::NoSources);
    }
    let mut best = 1;
    let mut best_cost = cell_cost(n_sources, 1);
    for b in 2..=n_sources {
        let cost = cell_cost(n_sources, b);
        if cost < best_cost {
            best = b;
            best_cost = cost;
        }
    }
    Ok(best)
}

/// Check that `sources` is a non-empty list of distinct nodes.
///
/// # Errors
/// `MuxError::EmptySources` or `MuxError::DuplicateSource`.
pub fn check_sources(sink: NodeId, sources: &[NodeId]) -> Result<(), MuxError> {
    if sources.is_empty() {
        return Err(MuxError::EmptySources { sink });
    }
    let mut seen = BTreeSet::new();
    match sources.iter().find(|&&source| !seen.insert(source)) {
        Some(&source_node) => Err(MuxError::DuplicateSource { sink, source_node }),
        None => Ok(()),
    }
}

/// Lifecycle phase of a routing mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuxPhase {
    /// Freshly built, all cells fault-free.
    Built,
    /// Faults injected (or forced), not yet resolved.
    FaultInjected,
    /// Usability and defect edges computed for the current faults.
    Resolved,
}

/// Result of resolving a mux against its current cell faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxResolution {
    pub unusable: bool,
    pub defect_edges: DefectMap,
}

/// Two-stage routing mux over a cell arena.
#[derive(Debug, Clone)]
pub struct RoutingMux<C> {
    sink: NodeId,
    sources: Vec<NodeId>,
    block_size: usize,
    partitions: Vec<Vec<NodeId>>,
    cells: Vec<C>,
    phase: MuxPhase,
}

impl<C: ControlCell> RoutingMux<C> {
    /// Build a mux with the cell-optimal block size.
    pub fn new(sink: NodeId, sources: Vec<NodeId>) -> Result<Self, MuxError> {
        check_sources(sink, &sources)?;
        let block_size = compute_block_size(sources.len())?;
        Self::with_block_size(sink, sources, block_size)
    }

    /// Build a mux with an explicit block size.
    ///
    /// # Errors
    /// `MuxError::EmptySources` for an empty source list,
    /// `MuxError::DuplicateSource` when a source appears twice,
    /// `MuxError::InvalidBlockSize` unless `1 <= block_size <= sources.len()`.
    pub fn with_block_size(
        sink: NodeId,
        sources: Vec<NodeId>,
        block_size: usize,
    ) -> Result<Self, MuxError> {
        check_sources(sink, &sources)?;
        if block_size == 0 || block_size > sources.len() {
            return Err(MuxError::InvalidBlockSize {
                block_size,
                sources: sources.len(),
            });
        }

        let partitions: Vec<Vec<NodeId>> =
            sources.chunks(block_size).map(<[NodeId]>::to_vec).collect();
        let cells = vec![C::default(); block_size + partitions.len()];

        trace!(
            sink,
            sources = sources.len(),
            block_size,
            partitions = partitions.len(),
            "routing mux built"
        );

        Ok(Self {
            sink,
            sources,
            block_size,
            partitions,
            cells,
            phase: MuxPhase::Built,
        })
    }

    pub const fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn sources(&self) -> &[NodeId] {
        &self.sources
    }

    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Contiguous first-stage partitions of the source list.
    pub fn partitions(&self) -> &[Vec<NodeId>] {
        &self.partitions
    }

    pub const fn phase(&self) -> MuxPhase {
        self.phase
    }

    /// Whole cell arena: first-stage pool followed by second-stage pool.
    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    /// Shared first-stage pool (`block_size` cells).
    pub fn first_stage_pool(&self) -> &[C] {
        &self.cells[..self.block_size]
    }

    /// Second-stage pool (one cell per partition).
    pub fn second_stage_pool(&self) -> &[C] {
        &self.cells[self.block_size..]
    }

    /// Mutable access to one arena cell, for forcing faults.
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut C> {
        let cell = self.cells.get_mut(index)?;
        self.phase = MuxPhase::FaultInjected;
        Some(cell)
    }

    /// First-stage blocks, one per partition, all viewing the shared pool.
    pub fn first_stage_blocks(&self) -> impl Iterator<Item = BlockView<'_, C, NodeId>> + '_ {
        (0..self.partitions.len()).filter_map(move |index| self.first_stage_block(index))
    }

    /// First-stage block over partition `index`.
    pub fn first_stage_block(&self, index: usize) -> Option<BlockView<'_, C, NodeId>> {
        let partition = self.partitions.get(index)?;
        Some(BlockView::new(self.first_stage_pool(), partition.as_slice()))
    }

    /// Second-stage block selecting among whole partitions.
    pub fn second_stage_block(&self) -> BlockView<'_, C, Vec<NodeId>> {
        BlockView::new(self.second_stage_pool(), self.partitions.as_slice())
    }

    /// Draw new faults for the first-stage pool, then the second-stage pool.
    pub fn inject<S: ErrorSource + ?Sized>(&mut self, source: &mut S) {
        for cell in &mut self.cells {
            cell.inject(source);
        }
        self.phase = MuxPhase::FaultInjected;
    }

    /// Evaluate usability and lost edges for the current faults.
    pub fn resolve(&mut self) -> MuxResolution {
        let resolution = MuxResolution {
            unusable: self.mux_unusable(),
            defect_edges: self.defect_edges(),
        };
        self.phase = MuxPhase::Resolved;
        resolution
    }

    /// Inject faults from `source` and resolve them.
    pub fn inject_and_resolve<S: ErrorSource + ?Sized>(&mut self, source: &mut S) -> MuxResolution {
        self.inject(source);
        self.resolve()
    }

    /// True iff any first-stage block or the second-stage block is unusable.
    pub fn mux_unusable(&self) -> bool {
        self.first_stage_blocks().any(|block| block.is_unusable())
            || self.second_stage_block().is_unusable()
    }

    /// Union of leaf sources lost in either stage.
    pub fn defect_sources(&self) -> BTreeSet<NodeId> {
        let mut lost: BTreeSet<NodeId> = self
            .first_stage_blocks()
            .flat_map(|block| block.defect_edges())
            .collect();
        lost.extend(self.second_stage_block().defect_edges());
        lost
    }

    /// Lost edges keyed by sink; empty when nothing is lost.
    pub fn defect_edges(&self) -> DefectMap {
        let lost = self.defect_sources();
        let mut map = DefectMap::new();
        if !lost.is_empty() {
            map.insert(self.sink, lost);
        }
        map
    }

    /// Faults of every arena cell, in arena order.
    pub fn cell_errors(&self) -> impl Iterator<Item = Fault> + '_ {
        self.cells.iter().map(|cell| cell.error())
    }

    pub fn fault_tally(&self) -> FaultTally {
        self.cell_errors().collect()
    }
}
