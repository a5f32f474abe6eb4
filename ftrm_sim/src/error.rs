//! Error type of the command-line driver.

use ftrm_common::config::ConfigError;
use ftrm_core::SimError;
use ftrm_rrg::RrgError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] RrgError),

    #[error(transparent)]
    Simulation(#[from] SimError),

    /// Report serialization failed.
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    /// Output file could not be written.
    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}
