//! Prelude module for common re-exports.
//!
//! ```rust
//! use ftrm_common::prelude::*;
//! ```

// ─── Fault Algebra ──────────────────────────────────────────────────
pub use crate::fault::{CellKind, DefectMap, Fault, FaultTally, MuxTopology, NodeId};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ConfigError, ConfigLoader, LogLevel, Probabilities, ProbabilityError, SharedConfig,
    SimConfig, SweepConfig, SweepMode,
};

// ─── Defaults ───────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_SEED, DEFAULT_SWITCH_NAME};
