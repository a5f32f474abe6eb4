//! # FTRM Core
//!
//! Fault propagation model for memristor-based two-stage FPGA routing muxes.
//! Memristor faults are drawn from an [`source::ErrorSource`], combined into
//! cell faults, and propagated through the first-stage blocks and the
//! second-stage block of each mux to decide which source→sink edges survive.
//!
//! ## Layers
//!
//! 1. **Cell** ([`cell`]): 2T2R memory cell or voter cell, fault computed on read
//! 2. **Block** ([`block`]): one selection stage over a slice of cells
//! 3. **Mux** ([`mux`]): shared first-stage pool plus second-stage pool
//! 4. **Simulator** ([`simulator`]): every mux of a device, report and dead edges
//! 5. **Sweep** ([`sweep`]): unusable ratio of one mux over a probability range
//!
//! ## Determinism
//!
//! All randomness flows through seeded generators. The same seed yields the
//! same report regardless of the worker count.

pub mod block;
pub mod cell;
pub mod error;
pub mod mux;
pub mod simulator;
pub mod source;
pub mod sweep;

pub use block::{BlockVerdict, BlockView, MuxBlock, SecondStageBlock};
pub use cell::{ControlCell, MemCell, VoterCell};
pub use error::{MuxError, SimError, SimResult};
pub use mux::{MuxPhase, MuxResolution, RoutingMux, compute_block_size};
pub use simulator::{FaultSimulator, SimulationReport, faulty_graph_path};
pub use source::{ErrorSource, RandomErrorGen, ScriptedSource};
pub use sweep::{SweepComparison, SweepPoint, compare, sweep};
