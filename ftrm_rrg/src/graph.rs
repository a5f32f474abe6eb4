//! rr_graph scanning and defect-pruned rewriting.
//!
//! The file is scanned line by line; only two sections matter:
//!
//! ```text
//! <switches>
//!   <switch id="ID" name="NAME" ...>     NAME selects the mux switch
//! </switches>
//! <rr_edges>
//!   <edge src_node="S" sink_node="K" switch_id="ID"/>
//! </rr_edges>
//! ```
//!
//! Every edge through the mux switch is one source of the routing mux that
//! drives its sink. A repeated (source, sink) pair is one mux input: the
//! topology keeps its first occurrence and pruning removes all of its lines.
//! The original text is kept so the pruned copy differs from it only by the
//! removed edge lines.

use crate::error::RrgError;
use ftrm_common::fault::{DefectMap, MuxTopology, NodeId};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

const ATTRIBUTE_PATTERN: &str = r#"([A-Za-z_][\w-]*)\s*=\s*"([^"]*)""#;

/// One edge through the mux switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuxEdge {
    /// 0-based line index in the source text.
    pub line: usize,
    pub src: NodeId,
    pub sink: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Outside,
    Switches,
    Edges,
    Done,
}

/// Parsed routing resource graph.
#[derive(Debug, Clone)]
pub struct RrGraph {
    text: String,
    switch_id: String,
    edges: Vec<MuxEdge>,
}

impl RrGraph {
    /// Read and scan `path`, taking mux edges from the switch named
    /// `switch_name`.
    pub fn parse(path: impl AsRef<Path>, switch_name: &str) -> Result<Self, RrgError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| RrgError::io(path, e))?;
        let graph = Self::scan(text, switch_name)?;
        debug!(
            path = %path.display(),
            switch_id = %graph.switch_id,
            edges = graph.edge_count(),
            edge_lines = graph.edges.len(),
            "rr_graph parsed"
        );
        let repeated = graph.edges.len() - graph.edge_count();
        if repeated > 0 {
            warn!(repeated, "rr_graph repeats mux edges, keeping one per pair");
        }
        Ok(graph)
    }

    /// Scan an in-memory rr_graph document.
    pub fn from_str(text: &str, switch_name: &str) -> Result<Self, RrgError> {
        Self::scan(text.to_owned(), switch_name)
    }

    fn scan(text: String, switch_name: &str) -> Result<Self, RrgError> {
        let pattern = Regex::new(ATTRIBUTE_PATTERN)?;
        let mut section = Section::Outside;
        let mut seen_switches = false;
        let mut seen_edges = false;
        let mut switch_id: Option<String> = None;
        let mut edges = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            match section {
                Section::Outside => {
                    if line == "<switches>" {
                        seen_switches = true;
                        section = Section::Switches;
                    } else if line == "<rr_edges>" {
                        if switch_id.is_none() {
                            return Err(missing_switch(seen_switches, switch_name));
                        }
                        seen_edges = true;
                        section = Section::Edges;
                    }
                }
                Section::Switches => {
                    if line.starts_with("</switches") {
                        section = Section::Outside;
                    } else if line.starts_with("<switch ")
                        && switch_id.is_none()
                        && attribute(&pattern, line, "name") == Some(switch_name)
                    {
                        let id = attribute(&pattern, line, "id").ok_or_else(|| {
                            RrgError::MalformedSwitch {
                                line: index + 1,
                                reason: "missing id attribute".to_string(),
                            }
                        })?;
                        switch_id = Some(id.to_string());
                    }
                }
                Section::Edges => {
                    if line.starts_with("</rr_edges") {
                        section = Section::Done;
                    } else if line.starts_with("<edge ")
                        && attribute(&pattern, line, "switch_id") == switch_id.as_deref()
                    {
                        edges.push(MuxEdge {
                            line: index,
                            src: node(&pattern, line, "src_node", index)?,
                            sink: node(&pattern, line, "sink_node", index)?,
                        });
                    }
                }
                Section::Done => break,
            }
        }

        let switch_id = switch_id.ok_or_else(|| missing_switch(seen_switches, switch_name))?;
        if !seen_edges {
            return Err(RrgError::MissingSection {
                section: "rr_edges",
            });
        }

        Ok(Self {
            text,
            switch_id,
            edges,
        })
    }

    /// Id of the mux switch.
    pub fn switch_id(&self) -> &str {
        &self.switch_id
    }

    /// Mux edge lines in order of appearance, repeats included.
    pub fn edges(&self) -> &[MuxEdge] {
        &self.edges
    }

    /// Number of distinct (source, sink) mux edges.
    pub fn edge_count(&self) -> usize {
        self.edges
            .iter()
            .map(|edge| (edge.sink, edge.src))
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Sources of every mux keyed by sink, in order of first appearance.
    pub fn mux_topology(&self) -> MuxTopology {
        let mut seen: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        let mut topology = MuxTopology::new();
        for edge in &self.edges {
            if seen.entry(edge.sink).or_default().insert(edge.src) {
                topology.entry(edge.sink).or_default().push(edge.src);
            }
        }
        topology
    }

    /// Line indices of the mux edges named by `defects`, every repeat of a
    /// lost pair included.
    fn dropped_lines(&self, defects: &DefectMap) -> BTreeSet<usize> {
        self.edges
            .iter()
            .filter(|edge| {
                defects
                    .get(&edge.sink)
                    .is_some_and(|lost| lost.contains(&edge.src))
            })
            .map(|edge| edge.line)
            .collect()
    }

    /// Source text with the defective edge lines removed.
    pub fn without_edges(&self, defects: &DefectMap) -> String {
        let dropped = self.dropped_lines(defects);
        self.text
            .split_inclusive('\n')
            .enumerate()
            .filter(|(index, _)| !dropped.contains(index))
            .map(|(_, line)| line)
            .collect()
    }

    /// Write the pruned graph to `output`; returns the number of removed
    /// edge lines.
    pub fn write_without_edges(
        &self,
        output: impl AsRef<Path>,
        defects: &DefectMap,
    ) -> Result<usize, RrgError> {
        let output = output.as_ref();
        let dropped = self.dropped_lines(defects);
        let file = fs::File::create(output).map_err(|e| RrgError::io(output, e))?;
        let mut writer = BufWriter::new(file);
        for (index, line) in self.text.split_inclusive('\n').enumerate() {
            if !dropped.contains(&index) {
                writer
                    .write_all(line.as_bytes())
                    .map_err(|e| RrgError::io(output, e))?;
            }
        }
        writer.flush().map_err(|e| RrgError::io(output, e))?;

        info!(
            path = %output.display(),
            removed_lines = dropped.len(),
            remaining_lines = self.edges.len() - dropped.len(),
            "defect rr_graph written"
        );
        Ok(dropped.len())
    }
}

fn missing_switch(seen_switches: bool, switch_name: &str) -> RrgError {
    if seen_switches {
        RrgError::UnknownSwitch {
            name: switch_name.to_string(),
        }
    } else {
        RrgError::MissingSection {
            section: "switches",
        }
    }
}

fn attribute<'l>(pattern: &Regex, line: &'l str, key: &str) -> Option<&'l str> {
    pattern.captures_iter(line).find_map(|caps| {
        let name = caps.get(1)?;
        let value = caps.get(2)?;
        (name.as_str() == key).then_some(value.as_str())
    })
}

fn node(pattern: &Regex, line: &str, key: &str, index: usize) -> Result<NodeId, RrgError> {
    let value = attribute(pattern, line, key).ok_or_else(|| RrgError::MalformedEdge {
        line: index + 1,
        reason: format!("missing {key}"),
    })?;
    value.parse().map_err(|_| RrgError::MalformedEdge {
        line: index + 1,
        reason: format!("{key}=\"{value}\" is not a node id"),
    })
}
