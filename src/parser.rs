//! # Line Parser
//!
//! Reads tab-separated connection records and feeds the cabinet registry and
//! the provenance index.
//!
//! Input is a concatenation of exported tables. A line containing the header
//! marker starts a new table: the file counter advances and the line counter
//! restarts. Each record line gets the provenance tag `<file>_<line>`.
//!
//! ```text
//! Откуда	Куда	Сигнал
//! 1HV19	0501	XT11-b9	XT10-b9
//! 1HV19	0501	XT11-b9
//! ```

use crate::config::DEFAULT_HEADER_MARKER;
use crate::model::RawRecord;
use crate::provenance::ProvenanceIndex;
use crate::registry::CabinetRegistry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, instrument, warn};

/// Parser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Substring identifying a table header line
    pub header_marker: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            header_marker: DEFAULT_HEADER_MARKER.to_string(),
        }
    }
}

/// A record line that does not split into 3 or 4 fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecordError {
    pub provenance: String,
    pub fields: usize,
    pub line: String,
}

impl fmt::Display for MalformedRecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed record at {}: expected 3 or 4 tab-separated fields, found {}",
            self.provenance, self.fields
        )
    }
}

impl std::error::Error for MalformedRecordError {}

/// What a single input line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Header,
    Record(RawRecord),
}

/// Counters collected while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    /// Header lines seen
    pub files: u32,
    /// Record lines seen (valid or not)
    pub lines: u64,
    /// Records forwarded to the registry
    pub records: u64,
    /// Malformed lines skipped
    pub skipped: u64,
}

/// Everything the merge and write phases need from the input.
#[derive(Debug, Clone, Default)]
pub struct ParsedInput {
    pub registry: CabinetRegistry,
    pub provenance: ProvenanceIndex,
    pub stats: ParseStats,
}

/// Stateful line parser tracking the file/line counters.
#[derive(Debug, Clone)]
pub struct LineParser {
    options: ParserOptions,
    file_number: u32,
    line_number: u32,
    output: ParsedInput,
}

impl LineParser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            file_number: 0,
            line_number: 0,
            output: ParsedInput::default(),
        }
    }

    /// Current `(file, line)` counters.
    pub fn position(&self) -> (u32, u32) {
        (self.file_number, self.line_number)
    }

    /// Classify one line and advance the counters. Does not touch the
    /// registry or the provenance index.
    pub fn parse_line(&mut self, line: &str) -> Result<LineKind, MalformedRecordError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(LineKind::Blank);
        }
        if line.contains(self.options.header_marker.as_str()) {
            self.file_number += 1;
            self.line_number = 0;
            return Ok(LineKind::Header);
        }

        self.line_number += 1;
        let provenance = format!("{}_{}", self.file_number, self.line_number);
        let fields: Vec<&str> = line.split('\t').collect();
        let (cabinet, signal, terminal_a, terminal_b) = match fields.as_slice() {
            [cabinet, signal, a] => (*cabinet, *signal, *a, None),
            [cabinet, signal, a, b] => (*cabinet, *signal, *a, Some(*b)),
            _ => {
                return Err(MalformedRecordError {
                    provenance,
                    fields: fields.len(),
                    line: line.to_string(),
                })
            }
        };

        Ok(LineKind::Record(RawRecord {
            cabinet: cabinet.to_string(),
            signal: signal.to_string(),
            terminal_a: terminal_a.to_string(),
            terminal_b: terminal_b.filter(|b| !b.is_empty()).map(str::to_string),
            provenance,
        }))
    }

    /// Parse one line and store its record. Malformed lines are logged and
    /// skipped.
    pub fn feed(&mut self, line: &str) {
        match self.parse_line(line) {
            Ok(LineKind::Blank) => {}
            Ok(LineKind::Header) => {
                self.output.stats.files += 1;
                debug!(file = self.file_number, "table header");
            }
            Ok(LineKind::Record(record)) => {
                self.output.stats.lines += 1;
                self.output.stats.records += 1;
                self.store(record);
            }
            Err(err) => {
                self.output.stats.lines += 1;
                self.output.stats.skipped += 1;
                warn!(provenance = %err.provenance, fields = err.fields, line = %err.line, "skipping malformed record");
            }
        }
    }

    fn store(&mut self, record: RawRecord) {
        for terminal in record.terminals() {
            self.output
                .provenance
                .record(&record.cabinet, terminal, record.provenance.as_str());
        }
        self.output.registry.register(record.to_link());
    }

    /// Parse every line of a reader.
    #[instrument(skip_all, level = "debug")]
    pub fn parse_reader<R: BufRead>(mut self, reader: R) -> Result<ParsedInput> {
        for (index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read input line {}", index + 1))?;
            self.feed(&line);
        }
        Ok(self.finish())
    }

    /// Parse an in-memory text.
    pub fn parse_str(mut self, text: &str) -> ParsedInput {
        for line in text.lines() {
            self.feed(line);
        }
        self.finish()
    }

    /// Parse a UTF-8 file.
    pub fn parse_file(self, path: impl AsRef<Path>) -> Result<ParsedInput> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open input {}", path.display()))?;
        self.parse_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse input {}", path.display()))
    }

    /// Hand off the collected registry, provenance and counters.
    pub fn finish(self) -> ParsedInput {
        let stats = self.output.stats;
        debug!(
            files = stats.files,
            records = stats.records,
            skipped = stats.skipped,
            cabinets = self.output.registry.cabinet_count(),
            "input parsed"
        );
        self.output
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}
