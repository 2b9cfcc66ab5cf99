//! # Cabinet Registry
//!
//! Owns the raw link list of every cabinet and turns it into the final,
//! ordered list of merged links. Registration is cheap and never merges;
//! merging happens once per cabinet in [`CabinetRegistry::finalize`].

use crate::merge::{merge_links, MergeError, MergeOptions};
use crate::model::Link;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Finalized output: cabinet id -> merged links in canonical order.
pub type FinalizedCabinets = BTreeMap<String, Vec<Link>>;

/// Per-cabinet link lists.
#[derive(Debug, Clone, Default)]
pub struct CabinetRegistry {
    cabinets: FxHashMap<String, Vec<Link>>,
}

impl CabinetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw link to its cabinet's list.
    pub fn register(&mut self, link: Link) {
        match self.cabinets.get_mut(link.cabinet()) {
            Some(links) => links.push(link),
            None => {
                self.cabinets.insert(link.cabinet().to_string(), vec![link]);
            }
        }
    }

    /// Append many raw links.
    pub fn register_all(&mut self, links: impl IntoIterator<Item = Link>) {
        for link in links {
            self.register(link);
        }
    }

    /// Current links of a cabinet (raw before finalize, merged after).
    pub fn links(&self, cabinet: &str) -> Option<&[Link]> {
        self.cabinets.get(cabinet).map(Vec::as_slice)
    }

    /// Cabinet ids in unspecified order.
    pub fn cabinets(&self) -> impl Iterator<Item = &str> + '_ {
        self.cabinets.keys().map(String::as_str)
    }

    pub fn cabinet_count(&self) -> usize {
        self.cabinets.len()
    }

    /// Total number of links across all cabinets.
    pub fn link_count(&self) -> usize {
        self.cabinets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cabinets.is_empty()
    }

    /// Merge and sort every cabinet, replacing the raw lists with the result.
    ///
    /// Idempotent: finalizing an already finalized registry performs no
    /// further merges and returns the same lists.
    #[instrument(skip_all, level = "debug", fields(cabinets = self.cabinets.len()))]
    pub fn finalize(&mut self, options: &MergeOptions) -> Result<FinalizedCabinets, MergeError> {
        let finalized = if options.parallel {
            self.cabinets
                .par_iter()
                .map(|(cabinet, links)| finalize_cabinet(cabinet, links.clone(), options))
                .collect::<Result<Vec<_>, MergeError>>()?
        } else {
            self.cabinets
                .iter()
                .map(|(cabinet, links)| finalize_cabinet(cabinet, links.clone(), options))
                .collect::<Result<Vec<_>, MergeError>>()?
        };

        let mut output = FinalizedCabinets::new();
        for (cabinet, links) in finalized {
            self.cabinets.insert(cabinet.clone(), links.clone());
            output.insert(cabinet, links);
        }

        info!(
            cabinets = output.len(),
            links = output.values().map(Vec::len).sum::<usize>(),
            strategy = ?options.strategy,
            "cabinets finalized"
        );
        Ok(output)
    }

    /// Finalize and hand the result off, consuming the registry.
    pub fn into_finalized(mut self, options: &MergeOptions) -> Result<FinalizedCabinets, MergeError> {
        self.finalize(options)
    }
}

/// Merge one cabinet's links and sort the components by order key.
pub fn finalize_cabinet(
    cabinet: &str,
    links: Vec<Link>,
    options: &MergeOptions,
) -> Result<(String, Vec<Link>), MergeError> {
    let raw = links.len();
    let mut merged = merge_links(links, options)?;
    merged.sort_by(|a, b| a.order_cmp(b));
    debug!(cabinet, raw, components = merged.len(), "cabinet merged");
    Ok((cabinet.to_string(), merged))
}
