//! # Provenance Index
//!
//! Records which input lines mentioned each terminal of each cabinet.
//! Filled by the line parser, read by the report writer; merging never
//! touches it.

use crate::model::Link;
use rustc_hash::FxHashMap;

/// Cabinet -> terminal -> ordered provenance tags (`<file>_<line>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceIndex {
    entries: FxHashMap<String, FxHashMap<String, Vec<String>>>,
}

impl ProvenanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag for a terminal of a cabinet.
    pub fn record(&mut self, cabinet: &str, terminal: &str, tag: impl Into<String>) {
        self.entries
            .entry(cabinet.to_string())
            .or_default()
            .entry(terminal.to_string())
            .or_default()
            .push(tag.into());
    }

    /// Tags that mentioned a terminal, in input order.
    pub fn tags(&self, cabinet: &str, terminal: &str) -> &[String] {
        self.entries
            .get(cabinet)
            .and_then(|terminals| terminals.get(terminal))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of tags recorded for a terminal.
    pub fn count(&self, cabinet: &str, terminal: &str) -> usize {
        self.tags(cabinet, terminal).len()
    }

    /// Highest tag count among the terminals of a link.
    pub fn max_count(&self, link: &Link) -> usize {
        link.terminals()
            .map(|terminal| self.count(link.cabinet(), terminal))
            .max()
            .unwrap_or(0)
    }

    /// Number of cabinets with at least one recorded terminal.
    pub fn cabinet_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of distinct terminals recorded for a cabinet.
    pub fn terminal_count(&self, cabinet: &str) -> usize {
        self.entries.get(cabinet).map_or(0, FxHashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
