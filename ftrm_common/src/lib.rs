//! Fault-Tolerant Routing Mux Common Library
//!
//! Shared types and configuration loading used by every crate of the
//! workspace.
//!
//! # Module Structure
//!
//! - [`fault`] - The four-valued fault algebra and its composition tables
//! - [`config`] - Configuration loading traits and simulation settings
//! - [`consts`] - Workspace-wide defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use ftrm_common::fault::Fault;
//!
//! // Pull-down stuck at 1 forces the cell output low.
//! assert_eq!(Fault::memcell(Fault::FF, Fault::SA1), Fault::SA0);
//! ```

pub mod config;
pub mod consts;
pub mod fault;
pub mod prelude;
