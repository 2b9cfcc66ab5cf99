//! # Jumpers
//!
//! Merges point-to-point terminal connections into multi-point links.
//!
//! Input tables report wiring one pair of terminals at a time. Connections
//! that share a terminal inside one cabinet are really a single physical link
//! (a jumper or a bus); this library discovers those links as connected
//! components, orders them deterministically, and renders a report that keeps
//! track of which input lines mentioned every terminal.
//!
//! The pipeline runs in three strictly ordered phases: parse everything,
//! merge per cabinet, write.

pub mod config;
pub mod dsu;
pub mod merge;
pub mod model;
pub mod ordering;
pub mod parser;
pub mod provenance;
pub mod registry;
pub mod writer;

// Re-export main types for convenience
pub use config::{ConfigError, ConfigOverrides, JumpersConfig};
pub use merge::{merge_links, MergeError, MergeOptions, MergeStrategy, SignalPolicy};
pub use model::{IncompatibleMergeError, Link, RawRecord};
pub use ordering::{rank, DigitRun, TerminalRank};
pub use parser::{LineParser, MalformedRecordError, ParseStats, ParsedInput};
pub use provenance::ProvenanceIndex;
pub use registry::{CabinetRegistry, FinalizedCabinets};
pub use writer::{ReportSummary, ReportWriter};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tracing::info;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub parse: ParseStats,
    pub report: ReportSummary,
}

/// Main API: parse, merge and write with one configuration.
#[derive(Debug, Clone, Default)]
pub struct Jumpers {
    config: JumpersConfig,
}

impl Jumpers {
    pub fn new(config: JumpersConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JumpersConfig {
        &self.config
    }

    /// Parse the configured input file.
    pub fn parse(&self) -> Result<ParsedInput> {
        LineParser::new(self.config.parser.clone()).parse_file(&self.config.input)
    }

    /// Merge every cabinet of a parsed input.
    pub fn finalize(&self, parsed: ParsedInput) -> Result<(FinalizedCabinets, ProvenanceIndex)> {
        let ParsedInput {
            registry,
            provenance,
            ..
        } = parsed;
        let cabinets = registry.into_finalized(&self.config.merge)?;
        Ok((cabinets, provenance))
    }

    /// Run the whole pipeline between a reader and a writer.
    pub fn process<R: BufRead, W: Write>(&self, input: R, output: &mut W) -> Result<RunReport> {
        let parsed = LineParser::new(self.config.parser.clone()).parse_reader(input)?;
        let stats = parsed.stats;
        let (cabinets, provenance) = self.finalize(parsed)?;
        let report =
            ReportWriter::new(self.config.report.clone()).write(output, &cabinets, &provenance)?;
        Ok(RunReport {
            parse: stats,
            report,
        })
    }

    /// Run the whole pipeline from the configured input file to the configured output file.
    pub fn run(&self) -> Result<RunReport> {
        info!(
            input = %self.config.input.display(),
            output = %self.config.output.display(),
            "starting"
        );
        let parsed = self.parse()?;
        let stats = parsed.stats;
        let (cabinets, provenance) = self.finalize(parsed)?;
        let report = ReportWriter::new(self.config.report.clone()).write_file(
            &self.config.output,
            &cabinets,
            &provenance,
        )?;
        Ok(RunReport {
            parse: stats,
            report,
        })
    }
}
