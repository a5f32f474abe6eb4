//! Memristor fault algebra.
//!
//! A configuration memristor, a memory cell and a voter cell all report one
//! of four fault values. Cells reduce the faults of their parts through the
//! two fixed composition tables defined here. Both tables are total: every
//! combination yields exactly one [`Fault`], and no other value exists.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Routing resource graph node identifier.
pub type NodeId = u64;

/// Mux topology: sink node → ordered source nodes.
pub type MuxTopology = BTreeMap<NodeId, Vec<NodeId>>;

/// Dead edges: sink node → source nodes that can no longer reach it.
pub type DefectMap = BTreeMap<NodeId, BTreeSet<NodeId>>;

// ─── Fault ──────────────────────────────────────────────────────────

/// Fault state of a memristor or of a whole cell.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Fault {
    /// Free of failure.
    FF = 0,
    /// Stuck at 0 (signal pinned low).
    SA0 = 1,
    /// Stuck at 1 (signal pinned high).
    SA1 = 2,
    /// Undefined behaviour (contention or indeterminate output).
    UD = 3,
}

const_assert_eq!(core::mem::size_of::<Fault>(), 1);

use Fault::{FF, SA0, SA1, UD};

/// Memory cell table, indexed `[pull_down][pull_up]`.
const MEMCELL_TABLE: [[Fault; 4]; 4] = [
    //  FF   SA0  SA1  UD      ← pull-up
    [FF, SA0, SA1, UD], // pull-down FF
    [SA1, UD, SA1, UD], // pull-down SA0
    [SA0, SA0, UD, UD], // pull-down SA1
    [UD, UD, UD, UD],   // pull-down UD
];

/// Voter cell table, indexed `[main][control]`.
const VOTER_TABLE: [[Fault; 4]; 4] = [
    //  FF   SA0  SA1  UD      ← control
    [FF, SA0, FF, SA0],  // main FF
    [SA0, SA0, SA0, SA0], // main SA0
    [FF, SA0, SA1, UD],  // main SA1
    [SA0, SA0, UD, UD],  // main UD
];

impl Fault {
    /// All fault values in declaration order.
    pub const ALL: [Fault; 4] = [FF, SA0, SA1, UD];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FF),
            1 => Some(SA0),
            2 => Some(SA1),
            3 => Some(UD),
            _ => None,
        }
    }

    /// Table index of this value.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Cell fault of a 2T2R memory cell from its two memristor faults.
    ///
    /// A stuck pull-down drives the opposite rail unless the pull-up is
    /// stuck the same way, which leaves both rails fighting (UD).
    #[inline]
    pub const fn memcell(pull_up: Fault, pull_down: Fault) -> Fault {
        MEMCELL_TABLE[pull_down.index()][pull_up.index()]
    }

    /// Cell fault of a voter cell from its main and control cell faults.
    ///
    /// A failing control cell grounds the output (SA0) unless the main cell
    /// is itself stuck high or undefined.
    #[inline]
    pub const fn voter(main: Fault, control: Fault) -> Fault {
        VOTER_TABLE[main.index()][control.index()]
    }

    /// True for any value other than [`Fault::FF`].
    #[inline]
    pub const fn is_faulty(self) -> bool {
        !matches!(self, FF)
    }

    /// Short mnemonic (`FF`, `SA0`, `SA1`, `UD`).
    pub const fn as_str(self) -> &'static str {
        match self {
            FF => "FF",
            SA0 => "SA0",
            SA1 => "SA1",
            UD => "UD",
        }
    }
}

impl Default for Fault {
    fn default() -> Self {
        FF
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Fault Tally ────────────────────────────────────────────────────

/// Per-kind counters of observed cell faults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultTally {
    pub ff: u64,
    pub sa0: u64,
    pub sa1: u64,
    pub ud: u64,
}

impl FaultTally {
    /// Count one observation.
    #[inline]
    pub fn record(&mut self, fault: Fault) {
        match fault {
            FF => self.ff += 1,
            SA0 => self.sa0 += 1,
            SA1 => self.sa1 += 1,
            UD => self.ud += 1,
        }
    }

    /// Add another tally into this one.
    pub fn merge(&mut self, other: &FaultTally) {
        self.ff += other.ff;
        self.sa0 += other.sa0;
        self.sa1 += other.sa1;
        self.ud += other.ud;
    }

    /// Count for a single fault kind.
    pub const fn get(&self, fault: Fault) -> u64 {
        match fault {
            FF => self.ff,
            SA0 => self.sa0,
            SA1 => self.sa1,
            UD => self.ud,
        }
    }

    /// Total number of observations.
    pub const fn total(&self) -> u64 {
        self.ff + self.sa0 + self.sa1 + self.ud
    }

    /// Number of faulty (non-FF) observations.
    pub const fn faulty(&self) -> u64 {
        self.sa0 + self.sa1 + self.ud
    }
}

impl FromIterator<Fault> for FaultTally {
    fn from_iter<T: IntoIterator<Item = Fault>>(iter: T) -> Self {
        let mut tally = Self::default();
        for fault in iter {
            tally.record(fault);
        }
        tally
    }
}

// ─── Cell Kind ──────────────────────────────────────────────────────

/// Configuration cell architecture used for every selection cell of a mux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Plain 2T2R memory cell.
    #[default]
    Base,
    /// Main cell guarded by a control cell that grounds the output on failure.
    Voter,
}

impl CellKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Voter => "voter",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" | "memcell" => Ok(Self::Base),
            "voter" | "proto-voter" => Ok(Self::Voter),
            other => Err(format!("unknown cell kind '{other}' (expected base|voter)")),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memcell_pull_down_ff_passes_pull_up() {
        assert_eq!(Fault::memcell(FF, FF), FF);
        assert_eq!(Fault::memcell(SA0, FF), SA0);
        assert_eq!(Fault::memcell(SA1, FF), SA1);
        assert_eq!(Fault::memcell(UD, FF), UD);
    }

    #[test]
    fn memcell_pull_down_sa0() {
        assert_eq!(Fault::memcell(FF, SA0), SA1);
        assert_eq!(Fault::memcell(SA0, SA0), UD);
        assert_eq!(Fault::memcell(SA1, SA0), SA1);
        assert_eq!(Fault::memcell(UD, SA0), UD);
    }

    #[test]
    fn memcell_pull_down_sa1() {
        assert_eq!(Fault::memcell(FF, SA1), SA0);
        assert_eq!(Fault::memcell(SA0, SA1), SA0);
        assert_eq!(Fault::memcell(SA1, SA1), UD);
        assert_eq!(Fault::memcell(UD, SA1), UD);
    }

    #[test]
    fn memcell_pull_down_ud() {
        assert_eq!(Fault::memcell(FF, UD), UD);
        assert_eq!(Fault::memcell(SA0, UD), UD);
        assert_eq!(Fault::memcell(SA1, UD), UD);
        assert_eq!(Fault::memcell(UD, UD), UD);
    }

    #[test]
    fn voter_main_ff() {
        assert_eq!(Fault::voter(FF, FF), FF);
        assert_eq!(Fault::voter(FF, SA0), SA0);
        assert_eq!(Fault::voter(FF, SA1), FF);
        assert_eq!(Fault::voter(FF, UD), SA0);
    }

    #[test]
    fn voter_main_sa0() {
        assert_eq!(Fault::voter(SA0, FF), SA0);
        assert_eq!(Fault::voter(SA0, SA0), SA0);
        assert_eq!(Fault::voter(SA0, SA1), SA0);
        assert_eq!(Fault::voter(SA0, UD), SA0);
    }

    #[test]
    fn voter_main_sa1() {
        assert_eq!(Fault::voter(SA1, FF), FF);
        assert_eq!(Fault::voter(SA1, SA0), SA0);
        assert_eq!(Fault::voter(SA1, SA1), SA1);
        assert_eq!(Fault::voter(SA1, UD), UD);
    }

    #[test]
    fn voter_main_ud() {
        assert_eq!(Fault::voter(UD, FF), SA0);
        assert_eq!(Fault::voter(UD, SA0), SA0);
        assert_eq!(Fault::voter(UD, SA1), UD);
        assert_eq!(Fault::voter(UD, UD), UD);
    }

    #[test]
    fn from_u8_roundtrip_and_rejects_out_of_range() {
        for f in Fault::ALL {
            assert_eq!(Fault::from_u8(f as u8), Some(f));
        }
        assert_eq!(Fault::from_u8(4), None);
        assert_eq!(Fault::from_u8(255), None);
    }

    #[test]
    fn default_is_fault_free() {
        assert_eq!(Fault::default(), FF);
        assert!(!Fault::default().is_faulty());
        assert!(UD.is_faulty());
    }

    #[test]
    fn tally_counts_per_kind() {
        let tally: FaultTally = [FF, FF, SA0, UD, SA1, UD].into_iter().collect();
        assert_eq!(tally.get(FF), 2);
        assert_eq!(tally.get(SA0), 1);
        assert_eq!(tally.get(SA1), 1);
        assert_eq!(tally.get(UD), 2);
        assert_eq!(tally.total(), 6);
        assert_eq!(tally.faulty(), 4);
    }

    #[test]
    fn tally_merge_adds_counters() {
        let mut a: FaultTally = [FF, SA0].into_iter().collect();
        let b: FaultTally = [SA0, UD].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.sa0, 2);
        assert_eq!(a.ud, 1);
        assert_eq!(a.total(), 4);
    }

    #[test]
    fn cell_kind_parse() {
        assert_eq!("base".parse::<CellKind>(), Ok(CellKind::Base));
        assert_eq!("Voter".parse::<CellKind>(), Ok(CellKind::Voter));
        assert!("triple".parse::<CellKind>().is_err());
    }

    #[test]
    fn fault_serializes_as_mnemonic() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Wrapper {
            fault: Fault,
            kind: CellKind,
        }

        let text = toml::to_string(&Wrapper {
            fault: SA1,
            kind: CellKind::Voter,
        })
        .unwrap();
        assert!(text.contains("\"SA1\""));
        assert!(text.contains("\"voter\""));

        let back: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(back.fault, SA1);
    }
}
