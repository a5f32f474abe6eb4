//! Mux blocks: groups of cells each gating one input onto a shared output.
//!
//! ## Block Rule
//!
//! Only the first `inputs.len()` cells of a block are consulted. With their
//! faults the block falls in exactly one [`BlockVerdict`]:
//!
//! - any UD, or two or more SA1 → the output is undetermined and every input
//!   is lost;
//! - exactly one SA1 → that input is permanently selected, every other input
//!   is lost;
//! - otherwise → only the inputs whose cell is SA0 are lost.
//!
//! A first-stage block has scalar node inputs. A second-stage block has whole
//! first-stage partitions as inputs; its defects are the flattened leaves.

use crate::cell::ControlCell;
use crate::error::MuxError;
use crate::source::ErrorSource;
use ftrm_common::fault::{Fault, NodeId};

// ─── Block Inputs ───────────────────────────────────────────────────

/// An input of a mux block, expanding to one or more leaf source nodes.
pub trait BlockInput {
    /// Leaf source nodes reached through this input, in order.
    fn leaves(&self) -> impl Iterator<Item = NodeId> + '_;
}

impl BlockInput for NodeId {
    fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(*self)
    }
}

impl BlockInput for Vec<NodeId> {
    fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().copied()
    }
}

// ─── Verdict ────────────────────────────────────────────────────────

/// Outcome of evaluating the cell faults of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockVerdict {
    /// Output undetermined: UD present or multiple SA1.
    Unusable,
    /// Exactly one SA1: the input at this index is always selected.
    Selected(usize),
    /// Usable; inputs at these indices (cells at SA0) are blocked.
    Blocked(Vec<usize>),
}

impl BlockVerdict {
    #[inline]
    pub const fn is_unusable(&self) -> bool {
        matches!(self, Self::Unusable)
    }
}

/// Classify a block from the faults of its consulted cells.
pub fn classify(errors: impl IntoIterator<Item = Fault>) -> BlockVerdict {
    let mut selected = None;
    let mut blocked = Vec::new();

    for (i, fault) in errors.into_iter().enumerate() {
        match fault {
            Fault::UD => return BlockVerdict::Unusable,
            Fault::SA1 if selected.is_some() => return BlockVerdict::Unusable,
            Fault::SA1 => selected = Some(i),
            Fault::SA0 => blocked.push(i),
            Fault::FF => {}
        }
    }

    match selected {
        Some(i) => BlockVerdict::Selected(i),
        None => BlockVerdict::Blocked(blocked),
    }
}

/// Leaf sources lost under `verdict`, in input order.
fn lost_leaves<I: BlockInput>(verdict: &BlockVerdict, inputs: &[I]) -> Vec<NodeId> {
    match verdict {
        BlockVerdict::Unusable => inputs.iter().flat_map(|input| input.leaves()).collect(),
        BlockVerdict::Selected(keep) => inputs
            .iter()
            .enumerate()
            .filter(|(i, _)| i != keep)
            .flat_map(|(_, input)| input.leaves())
            .collect(),
        BlockVerdict::Blocked(lost) => lost
            .iter()
            .flat_map(|&i| inputs[i].leaves())
            .collect(),
    }
}

// ─── Borrowed View ──────────────────────────────────────────────────

/// Block over borrowed cells and inputs.
///
/// Routing muxes hand out views so that all first-stage blocks can share one
/// physical pool of cells.
#[derive(Debug)]
pub struct BlockView<'a, C, I> {
    cells: &'a [C],
    inputs: &'a [I],
}

impl<C, I> Clone for BlockView<'_, C, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, I> Copy for BlockView<'_, C, I> {}

impl<'a, C: ControlCell, I: BlockInput> BlockView<'a, C, I> {
    /// Caller guarantees `cells.len() >= inputs.len()`.
    pub(crate) fn new(cells: &'a [C], inputs: &'a [I]) -> Self {
        debug_assert!(cells.len() >= inputs.len());
        Self { cells, inputs }
    }

    pub fn inputs(&self) -> &'a [I] {
        self.inputs
    }

    /// Faults of the consulted cells, one per input.
    pub fn cell_errors(&self) -> impl Iterator<Item = Fault> + 'a {
        let cells: &'a [C] = self.cells;
        cells[..self.inputs.len()].iter().map(|cell| cell.error())
    }

    pub fn verdict(&self) -> BlockVerdict {
        classify(self.cell_errors())
    }

    /// True iff a consulted cell is UD or more than one is SA1.
    pub fn is_unusable(&self) -> bool {
        self.verdict().is_unusable()
    }

    /// Leaf sources that can no longer reach the block output.
    pub fn defect_edges(&self) -> Vec<NodeId> {
        lost_leaves(&self.verdict(), self.inputs)
    }
}

// ─── Owned Block ────────────────────────────────────────────────────

/// Standalone mux block owning its cells.
#[derive(Debug, Clone)]
pub struct MuxBlock<C, I = NodeId> {
    sink: NodeId,
    inputs: Vec<I>,
    cells: Vec<C>,
}

/// Second-stage block: each input is a whole first-stage partition.
pub type SecondStageBlock<C> = MuxBlock<C, Vec<NodeId>>;

impl<C: ControlCell, I: BlockInput> MuxBlock<C, I> {
    /// Build a block from an existing cell pool.
    ///
    /// The pool may be larger than the input list; surplus cells are never
    /// consulted.
    ///
    /// # Errors
    /// `MuxError::EmptySources` for an empty input list,
    /// `MuxError::CellPoolTooSmall` if there are fewer cells than inputs.
    pub fn new(sink: NodeId, inputs: Vec<I>, cells: Vec<C>) -> Result<Self, MuxError> {
        if inputs.is_empty() {
            return Err(MuxError::EmptySources { sink });
        }
        if cells.len() < inputs.len() {
            return Err(MuxError::CellPoolTooSmall {
                cells: cells.len(),
                required: inputs.len(),
            });
        }
        Ok(Self {
            sink,
            inputs,
            cells,
        })
    }

    /// Build a block with one fault-free cell per input.
    pub fn with_fresh_cells(sink: NodeId, inputs: Vec<I>) -> Result<Self, MuxError> {
        let cells = vec![C::default(); inputs.len()];
        Self::new(sink, inputs, cells)
    }

    pub const fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn inputs(&self) -> &[I] {
        &self.inputs
    }

    pub fn cells(&self) -> &[C] {
        &self.cells
    }

    /// Mutable access to one cell, for forcing faults.
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut C> {
        self.cells.get_mut(index)
    }

    /// Inject fresh faults into every owned cell, in pool order.
    pub fn inject<S: ErrorSource + ?Sized>(&mut self, source: &mut S) {
        for cell in &mut self.cells {
            cell.inject(source);
        }
    }

    pub fn view(&self) -> BlockView<'_, C, I> {
        BlockView::new(self.cells.as_slice(), self.inputs.as_slice())
    }

    pub fn verdict(&self) -> BlockVerdict {
        self.view().verdict()
    }

    pub fn is_unusable(&self) -> bool {
        self.view().is_unusable()
    }

    pub fn defect_edges(&self) -> Vec<NodeId> {
        self.view().defect_edges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{MemCell, VoterCell};
    use crate::source::ScriptedSource;
    use Fault::{FF, SA0, SA1, UD};

    const SINK: NodeId = 10;

    fn sources() -> Vec<NodeId> {
        (0..7).collect()
    }

    fn block_with(faults: &[(usize, Fault, Fault)]) -> MuxBlock<MemCell> {
        let mut cells = vec![MemCell::new(); 7];
        for &(i, pull_up, pull_down) in faults {
            cells[i].set_errors(pull_up, pull_down);
        }
        MuxBlock::new(SINK, sources(), cells).unwrap()
    }

    #[test]
    fn classify_covers_every_rule() {
        assert_eq!(classify([FF, FF, FF]), BlockVerdict::Blocked(vec![]));
        assert_eq!(classify([SA0, FF, SA0]), BlockVerdict::Blocked(vec![0, 2]));
        assert_eq!(classify([SA0, SA1, FF]), BlockVerdict::Selected(1));
        assert_eq!(classify([SA1, FF, SA1]), BlockVerdict::Unusable);
        assert_eq!(classify([FF, UD, FF]), BlockVerdict::Unusable);
        assert_eq!(classify(std::iter::empty()), BlockVerdict::Blocked(vec![]));
    }

    #[test]
    fn no_failure_no_defects() {
        let block = block_with(&[]);
        assert!(!block.is_unusable());
        assert!(block.defect_edges().is_empty());
    }

    #[test]
    fn ud_kills_whole_block() {
        let block = block_with(&[(0, UD, UD)]);
        assert!(block.is_unusable());
        assert_eq!(block.defect_edges(), sources());
    }

    #[test]
    fn ud_dominates_any_other_cell_state() {
        for other in [FF, SA0, SA1, UD] {
            let block = block_with(&[(0, UD, FF), (3, other, FF), (6, FF, other)]);
            assert!(block.is_unusable(), "UD with {other} must stay unusable");
        }
    }

    #[test]
    fn second_sa1_flips_to_unusable() {
        let mut block = block_with(&[(1, FF, SA0)]);
        assert!(!block.is_unusable());
        block.cell_mut(2).unwrap().set_errors(FF, SA0);
        assert!(block.is_unusable());
        assert_eq!(block.defect_edges(), sources());
    }

    #[test]
    fn single_sa1_keeps_only_its_input() {
        let block = block_with(&[(3, FF, SA0)]);
        assert_eq!(block.verdict(), BlockVerdict::Selected(3));
        assert_eq!(block.defect_edges(), vec![0, 1, 2, 4, 5, 6]);
    }

    #[test]
    fn single_sa0_blocks_its_input() {
        let block = block_with(&[(4, FF, SA1)]);
        assert_eq!(block.defect_edges(), vec![4]);
    }

    #[test]
    fn two_sa0_block_both_inputs() {
        let block = block_with(&[(5, FF, SA1), (6, FF, SA1)]);
        assert_eq!(block.defect_edges(), vec![5, 6]);
    }

    #[test]
    fn sa1_overrides_sa0_losses() {
        let block = block_with(&[(0, FF, SA1), (2, SA1, FF)]);
        assert_eq!(block.defect_edges(), vec![0, 1, 3, 4, 5, 6]);
    }

    #[test]
    fn surplus_cells_are_ignored() {
        let mut cells = vec![MemCell::new(); 5];
        cells[4].set_errors(UD, UD);
        let block = MuxBlock::new(SINK, vec![0u64, 1, 2], cells).unwrap();
        assert!(!block.is_unusable());
        assert!(block.defect_edges().is_empty());
    }

    #[test]
    fn rejects_small_pool_and_empty_inputs() {
        let err = MuxBlock::new(SINK, vec![0u64, 1, 2], vec![MemCell::new(); 2]).unwrap_err();
        assert_eq!(
            err,
            MuxError::CellPoolTooSmall {
                cells: 2,
                required: 3
            }
        );
        let err = MuxBlock::<MemCell>::with_fresh_cells(SINK, vec![]).unwrap_err();
        assert_eq!(err, MuxError::EmptySources { sink: SINK });
        assert!(BlockView::<MemCell, NodeId>::new(&[], &[1]).is_err());
    }

    #[test]
    fn defect_edges_idempotent() {
        let block = block_with(&[(1, SA0, FF), (4, FF, SA1)]);
        let first = block.defect_edges();
        let second = block.defect_edges();
        assert_eq!(first, second);
        assert_eq!(first, vec![1, 4]);
    }

    #[test]
    fn inject_assigns_every_cell() {
        let mut block = MuxBlock::<MemCell>::with_fresh_cells(SINK, sources()).unwrap();
        // Every cell gets (FF, SA1) → SA0 → every input blocked.
        let mut source = ScriptedSource::new(vec![FF, SA1]);
        block.inject(&mut source);
        assert_eq!(source.drawn(), 14);
        assert!(!block.is_unusable());
        assert_eq!(block.defect_edges(), sources());
    }

    #[test]
    fn voter_block_grounds_instead_of_failing() {
        let mut block = MuxBlock::<VoterCell>::with_fresh_cells(SINK, vec![0u64, 1, 2]).unwrap();
        // Main FF, control UD: plain cell would kill the block, voter grounds it.
        block.cell_mut(1).unwrap().set_errors((FF, FF), (UD, FF));
        assert!(!block.is_unusable());
        assert_eq!(block.defect_edges(), vec![1]);
    }

    // ── Second stage ──

    fn partitions() -> Vec<Vec<NodeId>> {
        vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8], vec![9, 10, 11]]
    }

    fn all_leaves() -> Vec<NodeId> {
        (0..12).collect()
    }

    fn second_stage_with(faults: &[(usize, Fault, Fault)]) -> SecondStageBlock<MemCell> {
        let mut cells = vec![MemCell::new(); 7];
        for &(i, pull_up, pull_down) in faults {
            cells[i].set_errors(pull_up, pull_down);
        }
        MuxBlock::new(SINK, partitions(), cells).unwrap()
    }

    #[test]
    fn second_stage_no_failure() {
        let block = SecondStageBlock::<MemCell>::with_fresh_cells(SINK, partitions()).unwrap();
        assert!(block.defect_edges().is_empty());
    }

    #[test]
    fn second_stage_ud_flattens_all() {
        let block = second_stage_with(&[(0, UD, UD)]);
        assert_eq!(block.defect_edges(), all_leaves());
    }

    #[test]
    fn second_stage_multiple_sa1_flattens_all() {
        let block = second_stage_with(&[(0, FF, SA0), (1, FF, SA0)]);
        assert_eq!(block.defect_edges(), all_leaves());
    }

    #[test]
    fn second_stage_single_sa1_keeps_its_partition() {
        let block = second_stage_with(&[(2, FF, SA0)]);
        assert_eq!(block.defect_edges(), vec![0, 1, 2, 3, 4, 5, 9, 10, 11]);
    }

    #[test]
    fn second_stage_sa0_loses_partitions() {
        let block = second_stage_with(&[(3, FF, SA1)]);
        assert_eq!(block.defect_edges(), vec![9, 10, 11]);

        let block = second_stage_with(&[(2, FF, SA1), (3, FF, SA1)]);
        assert_eq!(block.defect_edges(), (6..12).collect::<Vec<_>>());
    }
}
