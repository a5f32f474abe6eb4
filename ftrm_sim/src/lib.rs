//! # FTRM Sim
//!
//! Command-line driver around [`ftrm_core`] and [`ftrm_rrg`]:
//!
//! - **simulate**: rr_graph → fault injection → pruned rr_graph + JSON report
//! - **sweep**: unusable ratio of one mux over a probability range

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Command};
pub use error::CommandError;
