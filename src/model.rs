//! # Data Model
//!
//! Core data structures for connection merging: the multi-terminal [`Link`],
//! the raw record shape produced by the line parser, and the error raised when
//! links from different cabinets are combined.

use crate::ordering::{self, TerminalRank};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A connection among one cabinet, one signal, and a set of terminals.
///
/// Identity is the cabinet plus the terminal set; the signal is carried along
/// but does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    cabinet: String,
    signal: String,
    terminals: FxHashSet<String>,
}

impl Link {
    /// Create a link. Empty terminal identifiers are dropped, so a link may
    /// hold fewer terminals than were passed, including none.
    pub fn new<C, S, I, T>(cabinet: C, signal: S, terminals: I) -> Self
    where
        C: Into<String>,
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let terminals = terminals
            .into_iter()
            .map(Into::into)
            .filter(|terminal: &String| !terminal.is_empty())
            .collect();
        Self {
            cabinet: cabinet.into(),
            signal: signal.into(),
            terminals,
        }
    }

    /// Create a link with no terminals (the identity element for merging).
    pub fn empty(cabinet: impl Into<String>, signal: impl Into<String>) -> Self {
        Self {
            cabinet: cabinet.into(),
            signal: signal.into(),
            terminals: FxHashSet::default(),
        }
    }

    pub fn cabinet(&self) -> &str {
        &self.cabinet
    }

    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Iterate terminals in storage order (unspecified).
    pub fn terminals(&self) -> impl Iterator<Item = &str> + '_ {
        self.terminals.iter().map(String::as_str)
    }

    pub fn contains(&self, terminal: &str) -> bool {
        self.terminals.contains(terminal)
    }

    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    /// True iff both links belong to the same cabinet and share a terminal.
    /// Signals are not compared.
    pub fn intersects(&self, other: &Link) -> bool {
        if self.cabinet != other.cabinet {
            return false;
        }
        let (small, large) = if self.terminals.len() <= other.terminals.len() {
            (&self.terminals, &other.terminals)
        } else {
            (&other.terminals, &self.terminals)
        };
        small.iter().any(|terminal| large.contains(terminal))
    }

    /// Union of both terminal sets under this link's cabinet and signal.
    pub fn merge_with(&self, other: &Link) -> Result<Link, IncompatibleMergeError> {
        let mut merged = self.clone();
        merged.absorb(other.clone())?;
        Ok(merged)
    }

    /// In-place form of [`Link::merge_with`]: `self` keeps its signal and
    /// gains every terminal of `other`.
    pub fn absorb(&mut self, other: Link) -> Result<(), IncompatibleMergeError> {
        if self.cabinet != other.cabinet {
            return Err(IncompatibleMergeError::new(&self.cabinet, &other.cabinet));
        }
        if self.terminals.len() < other.terminals.len() {
            let mut terminals = other.terminals;
            terminals.extend(std::mem::take(&mut self.terminals));
            self.terminals = terminals;
        } else {
            self.terminals.extend(other.terminals);
        }
        Ok(())
    }

    /// Terminals sorted by the ordering policy.
    pub fn ordered_terminals(&self) -> Vec<&str> {
        let mut terminals: Vec<&str> = self.terminals().collect();
        ordering::sort_terminals(&mut terminals);
        terminals
    }

    /// Smallest terminal under the ordering policy.
    pub fn min_terminal(&self) -> Option<&str> {
        ordering::min_terminal(self.terminals())
    }

    /// Sort key of the link: the rank of its smallest terminal.
    pub fn order_key(&self) -> Option<TerminalRank<'_>> {
        self.min_terminal().map(ordering::rank)
    }

    /// Compare links by order key. Links without terminals sort last.
    pub fn order_cmp(&self, other: &Link) -> Ordering {
        match (self.order_key(), other.order_key()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Ordered terminals joined by tabs.
    pub fn tabulated(&self) -> String {
        self.ordered_terminals().join("\t")
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.cabinet == other.cabinet && self.terminals == other.terminals
    }
}

impl Eq for Link {}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) ({})",
            self.cabinet,
            self.ordered_terminals().join(" -> "),
            self.signal
        )
    }
}

/// One well-formed input record as forwarded by the line parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub cabinet: String,
    pub signal: String,
    pub terminal_a: String,
    pub terminal_b: Option<String>,
    /// `<file>_<line>` tag of the input line
    pub provenance: String,
}

impl RawRecord {
    /// Non-empty terminals of this record, without repeats.
    pub fn terminals(&self) -> impl Iterator<Item = &str> + '_ {
        let a = Some(self.terminal_a.as_str()).filter(|t| !t.is_empty());
        let b = self
            .terminal_b
            .as_deref()
            .filter(|t| !t.is_empty() && Some(*t) != a);
        a.into_iter().chain(b)
    }

    /// Build the raw two-terminal (or one-terminal) link for this record.
    pub fn to_link(&self) -> Link {
        Link::new(
            self.cabinet.as_str(),
            self.signal.as_str(),
            self.terminals(),
        )
    }
}

/// Raised when two links from different cabinets are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompatibleMergeError {
    pub left: String,
    pub right: String,
}

impl IncompatibleMergeError {
    pub fn new(left: &str, right: &str) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

impl fmt::Display for IncompatibleMergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot merge a link of cabinet `{}` with a link of cabinet `{}`",
            self.left, self.right
        )
    }
}

impl std::error::Error for IncompatibleMergeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_creation() {
        let link = Link::new("Cab1", "Signal1", ["term1", "term2"]);
        assert_eq!(link.cabinet(), "Cab1");
        assert_eq!(link.signal(), "Signal1");
        assert_eq!(link.len(), 2);
        assert!(link.contains("term1"));
        assert!(link.contains("term2"));
    }

    #[test]
    fn test_link_drops_empty_terminals() {
        let link = Link::new("Cab1", "Signal1", ["", "term1"]);
        assert_eq!(link.len(), 1);
        assert!(!link.contains(""));

        let link = Link::new("Cab1", "Signal1", Vec::<String>::new());
        assert!(link.is_empty());
        assert_eq!(link, Link::empty("Cab1", "other"));
    }

    #[test]
    fn test_link_deduplicates_terminals() {
        let link = Link::new("Cab1", "Signal1", ["term1", "term1", "term2"]);
        assert_eq!(link.len(), 2);
    }

    #[test]
    fn test_equality_ignores_signal() {
        let a = Link::new("Cab1", "Signal1", ["a", "b"]);
        let b = Link::new("Cab1", "Signal2", ["b", "a"]);
        let c = Link::new("Cab2", "Signal1", ["a", "b"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_intersects() {
        let a = Link::new("Cab1", "Signal1", ["term1", "term2"]);
        let b = Link::new("Cab1", "Signal2", ["term2", "term3"]);
        let c = Link::new("Cab1", "Signal1", ["term4"]);
        let d = Link::new("Cab2", "Signal1", ["term1", "term2"]);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&d));
        assert!(!a.intersects(&Link::empty("Cab1", "Signal1")));
    }

    #[test]
    fn test_merge_with_keeps_left_signal() {
        let a = Link::new("Cab1", "Signal1", ["term1", "term2"]);
        let b = Link::new("Cab1", "Signal2", ["term2", "term3"]);

        let merged = a.merge_with(&b).unwrap();
        assert_eq!(merged.signal(), "Signal1");
        assert_eq!(merged, Link::new("Cab1", "", ["term1", "term2", "term3"]));

        let reversed = b.merge_with(&a).unwrap();
        assert_eq!(reversed.signal(), "Signal2");
        assert_eq!(reversed, merged);
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let a = Link::new("Cab1", "Signal1", ["term1", "term2"]);
        let merged = a.merge_with(&Link::empty("Cab1", "x")).unwrap();
        assert_eq!(merged, a);
        assert_eq!(merged.signal(), "Signal1");
    }

    #[test]
    fn test_merge_across_cabinets_fails() {
        let a = Link::new("Cab1", "Signal1", ["term1"]);
        let b = Link::new("Cab2", "Signal1", ["term1"]);

        let err = a.merge_with(&b).unwrap_err();
        assert_eq!(err, IncompatibleMergeError::new("Cab1", "Cab2"));
        assert!(err.to_string().contains("Cab2"));
    }

    #[test]
    fn test_ordered_terminals_and_display() {
        let link = Link::new("Cab1", "Signal1", ["XT2-b1", "XT1-b2"]);
        assert_eq!(link.ordered_terminals(), vec!["XT1-b2", "XT2-b1"]);
        assert_eq!(link.to_string(), "Cab1 (XT1-b2 -> XT2-b1) (Signal1)");
        assert_eq!(link.tabulated(), "XT1-b2\tXT2-b1");

        let empty = Link::empty("Cab1", "Signal1");
        assert_eq!(empty.to_string(), "Cab1 () (Signal1)");
        assert_eq!(empty.tabulated(), "");
    }

    #[test]
    fn test_real_world_merge() {
        let first = Link::new("1HV19", "0501", ["XT11-b9", "XT10-b9"]);
        let second = Link::new("1HV19", "0501", ["XT11-b9", "XT12-b9"]);
        let merged = first.merge_with(&second).unwrap();

        assert_eq!(merged.signal(), "0501");
        assert_eq!(merged.ordered_terminals(), vec!["XT10-b9", "XT11-b9", "XT12-b9"]);
        assert_eq!(merged.to_string(), "1HV19 (XT10-b9 -> XT11-b9 -> XT12-b9) (0501)");
    }

    #[test]
    fn test_order_cmp() {
        let a = Link::new("Cab1", "s", ["XT5-1", "XTK9"]);
        let b = Link::new("Cab1", "s", ["XT1-1"]);
        let empty = Link::empty("Cab1", "s");

        assert_eq!(a.min_terminal(), Some("XTK9"));
        assert_eq!(a.order_cmp(&b), Ordering::Less);
        assert_eq!(b.order_cmp(&empty), Ordering::Less);
        assert_eq!(empty.order_cmp(&a), Ordering::Greater);
        assert!(empty.order_key().is_none());
    }

    #[test]
    fn test_raw_record_to_link() {
        let record = RawRecord {
            cabinet: "Cab1".to_string(),
            signal: "S".to_string(),
            terminal_a: "XT1-1".to_string(),
            terminal_b: None,
            provenance: "1_1".to_string(),
        };
        assert_eq!(record.to_link(), Link::new("Cab1", "S", ["XT1-1"]));

        let record = RawRecord {
            terminal_b: Some("XT1-1".to_string()),
            ..record
        };
        assert_eq!(record.terminals().count(), 1);
    }
}
