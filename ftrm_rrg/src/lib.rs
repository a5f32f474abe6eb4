//! # FTRM Routing Resource Graph
//!
//! Reads the routing muxes out of a VPR `rr_graph` file and writes a copy
//! with defective edges removed.
//!
//! ```no_run
//! use ftrm_rrg::RrGraph;
//! use ftrm_common::fault::DefectMap;
//!
//! let graph = RrGraph::parse("rr_graph.xml", "0")?;
//! let topology = graph.mux_topology();
//! graph.write_without_edges("rr_graph.xml_1.0", &DefectMap::new())?;
//! # Ok::<(), ftrm_rrg::RrgError>(())
//! ```

pub mod error;
pub mod graph;

pub use error::RrgError;
pub use graph::{MuxEdge, RrGraph};
