//! Error types of the propagation model.
//!
//! Resolution itself cannot fail: every fault combination is covered by the
//! composition tables. Errors only arise while building a mux or an error
//! source from malformed input. Defect distributions are checked by
//! [`ftrm_common::config::Probabilities::validate`].

use ftrm_common::config::ProbabilityError;
use ftrm_common::fault::NodeId;
use thiserror::Error;

/// Malformed mux or block topology, rejected before any cell is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MuxError {
    /// A mux or block without any source.
    #[error("mux for sink {sink} has no source nodes")]
    EmptySources {
        /// Sink node of the rejected mux.
        sink: NodeId,
    },

    /// Block size requested for zero sources.
    #[error("cannot size a mux without sources")]
    NoSources,

    /// The same source listed twice for one sink.
    #[error("mux for sink {sink} lists source {source_node} more than once")]
    DuplicateSource { sink: NodeId, source_node: NodeId },

    /// Block size outside `1..=sources`.
    #[error("invalid block size {block_size} for {sources} sources")]
    InvalidBlockSize { block_size: usize, sources: usize },

    /// Fewer cells than inputs to select from.
    #[error("cell pool too small: {cells} cells for {required} inputs")]
    CellPoolTooSmall { cells: usize, required: usize },
}

/// Failure of a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("topology error: {0}")]
    Mux(#[from] MuxError),

    #[error("defect distribution: {0}")]
    Probability(#[from] ProbabilityError),

    /// A worker thread panicked.
    #[error("simulation worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
