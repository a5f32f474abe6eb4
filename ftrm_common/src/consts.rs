//! Workspace-wide defaults.
//!
//! Single source of truth for seeds, sweep ranges and rr-graph defaults.

/// Default seed for the defect sampler.
pub const DEFAULT_SEED: u64 = 42;

/// Name of the rr-graph switch that designates routing muxes.
pub const DEFAULT_SWITCH_NAME: &str = "0";

/// Default number of trials per sweep point.
pub const DEFAULT_SWEEP_ITERATIONS: u32 = 10_000;

/// Default first probability of a sweep.
pub const DEFAULT_SWEEP_START: f64 = 0.0;

/// Default end of a sweep (exclusive upper bound, so 0.15 is the last point).
pub const DEFAULT_SWEEP_STOP: f64 = 0.155;

/// Default probability increment of a sweep.
pub const DEFAULT_SWEEP_STEP: f64 = 0.005;

/// Default mux width used by the sweep.
pub const DEFAULT_MUX_INPUTS: usize = 16;

/// Default number of simulation worker threads.
pub const DEFAULT_WORKERS: usize = 1;
