//! # Ordering Policy
//!
//! Total order over terminal identifiers. Terminals are grouped by their block
//! prefix (`XTK`, plain `XT`, `XTN`, everything else), then ordered by the first
//! two embedded integers, and finally by the identifier text itself so that no
//! two distinct identifiers ever compare equal.
//!
//! The same key orders links: a link sorts by the rank of its smallest terminal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Prefix group of a terminal identifier, in sort priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerminalGroup {
    /// Identifiers starting with `XTK`
    Xtk = 0,
    /// Identifiers starting with `XT` but not `XTN`
    Xt = 1,
    /// Identifiers starting with `XTN`
    Xtn = 2,
    /// Everything else
    Other = 3,
}

impl TerminalGroup {
    /// Classify an identifier. `XTK` and `XTN` are both prefixed by `XT`, so
    /// the longer prefixes are tested first.
    pub fn of(terminal: &str) -> Self {
        if terminal.starts_with("XTK") {
            TerminalGroup::Xtk
        } else if terminal.starts_with("XTN") {
            TerminalGroup::Xtn
        } else if terminal.starts_with("XT") {
            TerminalGroup::Xt
        } else {
            TerminalGroup::Other
        }
    }

    /// Numeric priority (0 sorts first).
    pub fn priority(self) -> u8 {
        self as u8
    }
}

/// Value of one run of ASCII digits, compared numerically at any length.
///
/// Holds the run with leading zeros stripped; a missing run is the empty
/// string and equals zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DigitRun<'a>(&'a str);

impl<'a> DigitRun<'a> {
    fn new(digits: &'a str) -> Self {
        Self(digits.trim_start_matches('0'))
    }

    /// Significant digits, empty for zero.
    pub fn digits(&self) -> &'a str {
        self.0
    }

    /// The value as `u64`, if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        if self.0.is_empty() {
            return Some(0);
        }
        self.0.parse().ok()
    }
}

impl Ord for DigitRun<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(other.0))
    }
}

impl PartialOrd for DigitRun<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DigitRun<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("0")
        } else {
            f.write_str(self.0)
        }
    }
}

/// Sort key of a single terminal identifier.
///
/// Field order is comparison order; the derived `Ord` is the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalRank<'a> {
    pub group: TerminalGroup,
    pub number_one: DigitRun<'a>,
    pub number_two: DigitRun<'a>,
    pub original: &'a str,
}

impl TerminalRank<'_> {
    pub fn group_priority(&self) -> u8 {
        self.group.priority()
    }
}

impl fmt::Display for TerminalRank<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.group_priority(),
            self.number_one,
            self.number_two,
            self.original
        )
    }
}

/// Compute the rank of a terminal identifier.
pub fn rank(terminal: &str) -> TerminalRank<'_> {
    let mut runs = DigitRuns::new(terminal);
    let number_one = runs.next().unwrap_or_default();
    let number_two = runs.next().unwrap_or_default();
    TerminalRank {
        group: TerminalGroup::of(terminal),
        number_one,
        number_two,
        original: terminal,
    }
}

/// Compare two terminal identifiers under the ordering policy.
#[inline]
pub fn compare_terminals(a: &str, b: &str) -> Ordering {
    rank(a).cmp(&rank(b))
}

/// Sort terminal identifiers in place under the ordering policy.
pub fn sort_terminals<S: AsRef<str>>(terminals: &mut [S]) {
    terminals.sort_unstable_by(|a, b| compare_terminals(a.as_ref(), b.as_ref()));
}

/// The smallest terminal of a collection under the ordering policy.
pub fn min_terminal<'a, I>(terminals: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    terminals.into_iter().min_by(|a, b| compare_terminals(a, b))
}

/// Iterator over the maximal ASCII digit runs, left to right.
struct DigitRuns<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> DigitRuns<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for DigitRuns<'a> {
    type Item = DigitRun<'a>;

    fn next(&mut self) -> Option<DigitRun<'a>> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && !bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos >= bytes.len() {
            return None;
        }

        let start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        // ASCII digits are single bytes, so both ends are char boundaries.
        Some(DigitRun::new(&self.text[start..self.pos]))
    }
}
