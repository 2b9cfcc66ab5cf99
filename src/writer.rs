//! # Report Writer
//!
//! Renders finalized cabinets as a tab-indented text report. Each cabinet
//! prints its id, then two rows per link: the ordered terminals, and the
//! provenance tags of each terminal in the same column order.
//!
//! ```text
//! 1HV19
//! 	XT10-b9	XT11-b9	XT12-b9
//! 	1_1	1_1, 1_2	1_2
//! ```

use crate::config::{DEFAULT_ANNOTATION, DEFAULT_ANNOTATION_THRESHOLD};
use crate::model::Link;
use crate::provenance::ProvenanceIndex;
use crate::registry::FinalizedCabinets;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Report rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    /// A link is annotated when one of its terminals has more tags than this
    pub annotation_threshold: usize,
    /// Text appended to the provenance row of an annotated link
    pub annotation: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            annotation_threshold: DEFAULT_ANNOTATION_THRESHOLD,
            annotation: DEFAULT_ANNOTATION.to_string(),
        }
    }
}

/// Totals of one rendered report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub cabinets: usize,
    pub links: usize,
    pub terminals: usize,
    /// Largest terminal count of a single cabinet
    pub max_cabinet_terminals: usize,
    /// Links whose provenance row carried the annotation
    pub annotated: usize,
}

/// Numeric part of a cabinet id: all its digits, concatenated.
pub fn cabinet_number(cabinet: &str) -> Option<u64> {
    let digits: String = cabinet.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.bytes().fold(0u64, |value, digit| {
        value
            .saturating_mul(10)
            .saturating_add(u64::from(digit - b'0'))
    }))
}

/// Cabinet ids in report order: by numeric part, ids without digits last,
/// ties broken on the id text.
pub fn cabinet_order(cabinets: &FinalizedCabinets) -> Vec<&str> {
    let mut order: Vec<&str> = cabinets.keys().map(String::as_str).collect();
    order.sort_by_cached_key(|cabinet| {
        let number = cabinet_number(cabinet);
        (number.is_none(), number, *cabinet)
    });
    order
}

/// Writes finalized cabinets with their provenance.
#[derive(Debug, Clone, Default)]
pub struct ReportWriter {
    options: ReportOptions,
}

impl ReportWriter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Render the report into any writer.
    #[instrument(skip_all, level = "debug")]
    pub fn write<W: Write>(
        &self,
        out: &mut W,
        cabinets: &FinalizedCabinets,
        provenance: &ProvenanceIndex,
    ) -> Result<ReportSummary> {
        let mut summary = ReportSummary::default();

        for cabinet in cabinet_order(cabinets) {
            let links = &cabinets[cabinet];
            writeln!(out, "{cabinet}")?;

            let mut cabinet_terminals = 0;
            for link in links.iter().filter(|link| !link.is_empty()) {
                if self.write_link(out, link, provenance)? {
                    summary.annotated += 1;
                }
                summary.links += 1;
                cabinet_terminals += link.len();
            }

            debug!(cabinet, links = links.len(), terminals = cabinet_terminals, "cabinet written");
            summary.cabinets += 1;
            summary.terminals += cabinet_terminals;
            summary.max_cabinet_terminals = summary.max_cabinet_terminals.max(cabinet_terminals);
        }

        out.flush()?;
        info!(
            cabinets = summary.cabinets,
            links = summary.links,
            terminals = summary.terminals,
            max_cabinet_terminals = summary.max_cabinet_terminals,
            annotated = summary.annotated,
            "report written"
        );
        Ok(summary)
    }

    /// Returns whether the link was annotated.
    fn write_link<W: Write>(
        &self,
        out: &mut W,
        link: &Link,
        provenance: &ProvenanceIndex,
    ) -> Result<bool> {
        let terminals = link.ordered_terminals();
        let sources: Vec<String> = terminals
            .iter()
            .map(|terminal| provenance.tags(link.cabinet(), terminal).join(", "))
            .collect();
        let annotated = provenance.max_count(link) > self.options.annotation_threshold;

        writeln!(out, "\t{}", terminals.join("\t"))?;
        if annotated {
            writeln!(out, "\t{}\t{}", sources.join("\t"), self.options.annotation)?;
        } else {
            writeln!(out, "\t{}", sources.join("\t"))?;
        }
        Ok(annotated)
    }

    /// Render the report into a string.
    pub fn render(
        &self,
        cabinets: &FinalizedCabinets,
        provenance: &ProvenanceIndex,
    ) -> Result<(String, ReportSummary)> {
        let mut buffer = Vec::new();
        let summary = self.write(&mut buffer, cabinets, provenance)?;
        let text = String::from_utf8(buffer).context("report is not valid UTF-8")?;
        Ok((text, summary))
    }

    /// Write the report to a file, creating parent directories as needed.
    pub fn write_file(
        &self,
        path: impl AsRef<Path>,
        cabinets: &FinalizedCabinets,
        provenance: &ProvenanceIndex,
    ) -> Result<ReportSummary> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        self.write(&mut out, cabinets, provenance)
            .with_context(|| format!("failed to write report {}", path.display()))
    }
}
