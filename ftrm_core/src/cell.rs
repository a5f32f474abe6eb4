//! Configuration cells selecting mux inputs.
//!
//! A cell only stores the faults of its memristors. The cell fault is
//! recomputed from them on every read through the composition tables in
//! [`ftrm_common::fault`], so there is no derived state to keep in sync.

use crate::source::ErrorSource;
use ftrm_common::fault::{CellKind, Fault};
use std::fmt;

/// A selection cell that reports a fault on demand.
pub trait ControlCell: Default + Clone + fmt::Debug + Send + Sync {
    /// Architecture tag of this cell type.
    const KIND: CellKind;

    /// Current cell fault.
    fn error(&self) -> Fault;

    /// Overwrite every memristor with faults drawn from `source`.
    fn inject<S: ErrorSource + ?Sized>(&mut self, source: &mut S);

    /// Number of memristors in this cell.
    fn memristor_count() -> usize;
}

// ─── Memory Cell ────────────────────────────────────────────────────

/// 2T2R memory cell: one pull-up and one pull-down memristor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemCell {
    pull_up: Fault,
    pull_down: Fault,
}

impl MemCell {
    /// Fault-free cell.
    pub const fn new() -> Self {
        Self {
            pull_up: Fault::FF,
            pull_down: Fault::FF,
        }
    }

    /// Cell with the given memristor faults.
    pub const fn with_errors(pull_up: Fault, pull_down: Fault) -> Self {
        Self { pull_up, pull_down }
    }

    /// Assign both memristor faults.
    #[inline]
    pub fn set_errors(&mut self, pull_up: Fault, pull_down: Fault) {
        self.pull_up = pull_up;
        self.pull_down = pull_down;
    }

    #[inline]
    pub const fn pull_up(&self) -> Fault {
        self.pull_up
    }

    #[inline]
    pub const fn pull_down(&self) -> Fault {
        self.pull_down
    }
}

impl ControlCell for MemCell {
    const KIND: CellKind = CellKind::Base;

    #[inline]
    fn error(&self) -> Fault {
        Fault::memcell(self.pull_up, self.pull_down)
    }

    fn inject<S: ErrorSource + ?Sized>(&mut self, source: &mut S) {
        let (pull_up, pull_down) = source.sample_pair();
        self.set_errors(pull_up, pull_down);
    }

    fn memristor_count() -> usize {
        2
    }
}

// ─── Voter Cell ─────────────────────────────────────────────────────

/// Main memory cell whose output is grounded when the control cell fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoterCell {
    main: MemCell,
    control: MemCell,
}

impl VoterCell {
    /// Fault-free voter cell.
    pub const fn new() -> Self {
        Self {
            main: MemCell::new(),
            control: MemCell::new(),
        }
    }

    /// Assign `(pull_up, pull_down)` faults of the main and control cells.
    pub fn set_errors(&mut self, main: (Fault, Fault), control: (Fault, Fault)) {
        self.main.set_errors(main.0, main.1);
        self.control.set_errors(control.0, control.1);
    }

    pub const fn main(&self) -> &MemCell {
        &self.main
    }

    pub const fn control(&self) -> &MemCell {
        &self.control
    }
}

impl ControlCell for VoterCell {
    const KIND: CellKind = CellKind::Voter;

    #[inline]
    fn error(&self) -> Fault {
        Fault::voter(self.main.error(), self.control.error())
    }

    /// Main cell first, then control cell.
    fn inject<S: ErrorSource + ?Sized>(&mut self, source: &mut S) {
        self.main.inject(source);
        self.control.inject(source);
    }

    fn memristor_count() -> usize {
        2 * MemCell::memristor_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptedSource;
    use Fault::{FF, SA0, SA1, UD};

    #[test]
    fn memcell_starts_fault_free() {
        let cell = MemCell::new();
        assert_eq!(cell.error(), FF);
        assert_eq!(MemCell::default(), cell);
    }

    #[test]
    fn memcell_stuck_at_0() {
        let mut cell = MemCell::new();
        // Pull-down SA1, pull-up ok.
        cell.set_errors(FF, SA1);
        assert_eq!(cell.error(), SA0);
        // Pull-up SA0, pull-down ok or SA1.
        cell.set_errors(SA0, FF);
        assert_eq!(cell.error(), SA0);
        cell.set_errors(SA0, SA1);
        assert_eq!(cell.error(), SA0);
    }

    #[test]
    fn memcell_stuck_at_1() {
        let mut cell = MemCell::new();
        cell.set_errors(FF, SA0);
        assert_eq!(cell.error(), SA1);
        cell.set_errors(SA1, FF);
        assert_eq!(cell.error(), SA1);
        cell.set_errors(SA1, SA0);
        assert_eq!(cell.error(), SA1);
    }

    #[test]
    fn memcell_undefined() {
        let mut cell = MemCell::new();
        for other in [FF, SA0, SA1, UD] {
            cell.set_errors(other, UD);
            assert_eq!(cell.error(), UD);
            cell.set_errors(UD, other);
            assert_eq!(cell.error(), UD);
        }
        // Same stuck value on both rails.
        cell.set_errors(SA1, SA1);
        assert_eq!(cell.error(), UD);
        cell.set_errors(SA0, SA0);
        assert_eq!(cell.error(), UD);
    }

    #[test]
    fn memcell_reassignment_leaves_no_stale_state() {
        let mut cell = MemCell::new();
        cell.set_errors(UD, UD);
        cell.set_errors(FF, FF);
        assert_eq!(cell.error(), FF);
    }

    #[test]
    fn memcell_inject_takes_pull_up_then_pull_down() {
        let mut cell = MemCell::new();
        let mut source = ScriptedSource::new(vec![FF, SA1]);
        cell.inject(&mut source);
        assert_eq!(cell.pull_up(), FF);
        assert_eq!(cell.pull_down(), SA1);
        assert_eq!(cell.error(), SA0);
        assert_eq!(source.drawn(), 2);
    }

    #[test]
    fn voter_starts_fault_free() {
        assert_eq!(VoterCell::new().error(), FF);
    }

    #[test]
    fn voter_fault_free_paths() {
        let mut cell = VoterCell::new();
        cell.set_errors((FF, FF), (FF, FF));
        assert_eq!(cell.error(), FF);
        // Control stuck at 1 keeps the main cell selected.
        cell.set_errors((FF, FF), (SA1, FF));
        assert_eq!(cell.error(), FF);
        cell.set_errors((SA1, FF), (FF, FF));
        assert_eq!(cell.error(), FF);
    }

    #[test]
    fn voter_grounds_on_control_failure() {
        let mut cell = VoterCell::new();
        cell.set_errors((FF, FF), (SA0, FF));
        assert_eq!(cell.error(), SA0);
        cell.set_errors((FF, FF), (UD, FF));
        assert_eq!(cell.error(), SA0);
        cell.set_errors((SA0, FF), (UD, FF));
        assert_eq!(cell.error(), SA0);
        cell.set_errors((SA1, FF), (SA0, FF));
        assert_eq!(cell.error(), SA0);
        cell.set_errors((UD, FF), (SA0, FF));
        assert_eq!(cell.error(), SA0);
        cell.set_errors((UD, FF), (FF, FF));
        assert_eq!(cell.error(), SA0);
    }

    #[test]
    fn voter_main_fault_dominates() {
        let mut cell = VoterCell::new();
        cell.set_errors((SA0, FF), (SA1, FF));
        assert_eq!(cell.error(), SA0);
        cell.set_errors((SA1, FF), (SA1, FF));
        assert_eq!(cell.error(), SA1);
        cell.set_errors((SA1, FF), (UD, FF));
        assert_eq!(cell.error(), UD);
        cell.set_errors((UD, FF), (UD, FF));
        assert_eq!(cell.error(), UD);
        cell.set_errors((UD, FF), (SA1, FF));
        assert_eq!(cell.error(), UD);
    }

    #[test]
    fn voter_inject_draws_main_then_control() {
        let mut cell = VoterCell::new();
        let mut source = ScriptedSource::new(vec![SA1, FF, UD, FF]);
        cell.inject(&mut source);
        assert_eq!(cell.main().error(), SA1);
        assert_eq!(cell.control().error(), UD);
        assert_eq!(cell.error(), UD);
        assert_eq!(source.drawn(), VoterCell::memristor_count());
    }

    #[test]
    fn kinds_are_tagged() {
        assert_eq!(MemCell::KIND, CellKind::Base);
        assert_eq!(VoterCell::KIND, CellKind::Voter);
    }
}
