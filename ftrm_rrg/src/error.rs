//! Error types for routing resource graph I/O

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or rewriting an rr_graph file
#[derive(Error, Debug)]
pub enum RrgError {
    /// File could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Offending file
        path: PathBuf,
        /// Source IO error
        source: std::io::Error,
    },

    /// A required section never opened
    #[error("Section <{section}> not found")]
    MissingSection {
        /// Section tag name
        section: &'static str,
    },

    /// No switch carries the requested name
    #[error("No switch named \"{name}\" in <switches>")]
    UnknownSwitch {
        /// Requested switch name
        name: String,
    },

    /// A switch line without a usable id
    #[error("Line {line}: malformed switch ({reason})")]
    MalformedSwitch {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// An edge line of the mux switch without usable node ids
    #[error("Line {line}: malformed edge ({reason})")]
    MalformedEdge {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// Attribute pattern failed to compile
    #[error("Pattern error: {source}")]
    Pattern {
        /// Source regex error
        #[from]
        source: regex::Error,
    },
}

impl RrgError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
