//! # Merge Engine
//!
//! Coalesces the raw links of one cabinet into connected components: two
//! links end up in the same component iff a chain of pairwise-intersecting
//! links connects them.
//!
//! Two strategies are provided and produce identical results:
//! - [`MergeStrategy::Pairwise`] repeatedly absorbs every intersecting link
//!   into the current one, rebuilding the pending buffer on each pass.
//! - [`MergeStrategy::UnionFind`] unions the terminals of each link in a
//!   [`TerminalDSU`] and groups terminals by root.
//!
//! Before either strategy runs, links are sorted by their order key, then by
//! their full ordered terminal list, then by signal text. A component takes
//! the signal of its first member in that order, so the surviving signal
//! depends only on which links were given, never on their input order.

use crate::dsu::{TerminalDSU, TerminalId};
use crate::model::{IncompatibleMergeError, Link};
use crate::ordering::rank;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Component discovery algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Repeated pairwise absorption, O(n^2) passes in the worst case
    Pairwise,
    /// Disjoint-set union over terminals
    #[default]
    UnionFind,
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pairwise" => Ok(MergeStrategy::Pairwise),
            "union-find" | "union_find" | "unionfind" => Ok(MergeStrategy::UnionFind),
            other => Err(format!("unknown merge strategy: {other}")),
        }
    }
}

/// What to do when links with different signals join one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalPolicy {
    /// Keep the signal of the first link, accept the merge
    #[default]
    KeepFirst,
    /// Fail the merge
    Reject,
}

/// Options for merging and finalizing cabinets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub strategy: MergeStrategy,
    pub signal_policy: SignalPolicy,
    /// Merge independent cabinets on the rayon pool
    pub parallel: bool,
}

impl MergeOptions {
    pub fn with_strategy(strategy: MergeStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// Merge failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Links of different cabinets reached the engine
    Incompatible(IncompatibleMergeError),
    /// Differing signals met under [`SignalPolicy::Reject`]
    SignalConflict {
        cabinet: String,
        kept: String,
        rejected: String,
    },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::Incompatible(err) => fmt::Display::fmt(err, f),
            MergeError::SignalConflict {
                cabinet,
                kept,
                rejected,
            } => write!(
                f,
                "cabinet `{cabinet}`: signal `{rejected}` conflicts with `{kept}` in one connection"
            ),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::Incompatible(err) => Some(err),
            MergeError::SignalConflict { .. } => None,
        }
    }
}

impl From<IncompatibleMergeError> for MergeError {
    fn from(err: IncompatibleMergeError) -> Self {
        MergeError::Incompatible(err)
    }
}

/// Merge one cabinet's raw links into its connected components.
///
/// Links without terminals are dropped. All links must share a cabinet.
/// Output order is the order of each component's first member after the
/// order-key sort; callers sort the result for rendering.
pub fn merge_links(links: Vec<Link>, options: &MergeOptions) -> Result<Vec<Link>, MergeError> {
    let Some(first) = links.first() else {
        return Ok(Vec::new());
    };
    if let Some(stray) = links.iter().find(|link| link.cabinet() != first.cabinet()) {
        return Err(IncompatibleMergeError::new(first.cabinet(), stray.cabinet()).into());
    }

    let mut links: Vec<Link> = links.into_iter().filter(|link| !link.is_empty()).collect();
    links.sort_by(precedence);

    match options.strategy {
        MergeStrategy::Pairwise => merge_pairwise(links, options.signal_policy),
        MergeStrategy::UnionFind => merge_union_find(links, options.signal_policy),
    }
}

/// Total order deciding which link of a component supplies its signal.
/// Links comparing equal have the same terminals and signal.
fn precedence(a: &Link, b: &Link) -> Ordering {
    a.order_cmp(b)
        .then_with(|| {
            let left = a.ordered_terminals();
            let right = b.ordered_terminals();
            left.iter()
                .copied()
                .map(rank)
                .cmp(right.iter().copied().map(rank))
        })
        .then_with(|| a.signal().cmp(b.signal()))
}

fn merge_pairwise(links: Vec<Link>, policy: SignalPolicy) -> Result<Vec<Link>, MergeError> {
    let mut merged = Vec::new();
    let mut pending = links.into_iter();

    while let Some(mut current) = pending.next() {
        let mut rest: Vec<Link> = pending.collect();
        loop {
            let (touching, untouched): (Vec<Link>, Vec<Link>) =
                rest.into_iter().partition(|link| current.intersects(link));
            rest = untouched;
            if touching.is_empty() {
                break;
            }
            for link in touching {
                check_signal(&current, &link, policy)?;
                current.absorb(link)?;
            }
        }
        merged.push(current);
        pending = rest.into_iter();
    }

    Ok(merged)
}

fn merge_union_find(links: Vec<Link>, policy: SignalPolicy) -> Result<Vec<Link>, MergeError> {
    let Some(cabinet) = links.first().map(|link| link.cabinet().to_string()) else {
        return Ok(Vec::new());
    };

    let mut dsu = TerminalDSU::with_capacity(links.len() * 2);
    let mut anchors: Vec<TerminalId> = Vec::with_capacity(links.len());
    for link in &links {
        let mut anchor = None;
        for terminal in link.terminals() {
            let id = dsu.add_terminal(terminal);
            match anchor {
                None => anchor = Some(id),
                Some(first) => {
                    dsu.union(first, id);
                }
            }
        }
        // Empty links were filtered out by the caller.
        if let Some(anchor) = anchor {
            anchors.push(anchor);
        }
    }

    // First member (in sorted order) of each component supplies its signal.
    let mut winners: Vec<(TerminalId, &Link)> = Vec::new();
    let mut winner_of_root: FxHashMap<TerminalId, usize> = FxHashMap::default();
    for (link, &anchor) in links.iter().zip(&anchors) {
        let root = dsu.find(anchor);
        match winner_of_root.get(&root) {
            Some(&slot) => check_signal(winners[slot].1, link, policy)?,
            None => {
                winner_of_root.insert(root, winners.len());
                winners.push((root, link));
            }
        }
    }

    let mut terminals_of_root: FxHashMap<TerminalId, Vec<TerminalId>> = dsu
        .components()
        .into_iter()
        .map(|component| (component.root, component.terminals))
        .collect();

    let merged = winners
        .into_iter()
        .map(|(root, winner)| {
            let ids = terminals_of_root.remove(&root).unwrap_or_default();
            Link::new(
                cabinet.as_str(),
                winner.signal(),
                ids.into_iter().map(|id| dsu.name(id)),
            )
        })
        .collect();

    Ok(merged)
}

fn check_signal(kept: &Link, other: &Link, policy: SignalPolicy) -> Result<(), MergeError> {
    if kept.signal() == other.signal() {
        return Ok(());
    }
    match policy {
        SignalPolicy::KeepFirst => {
            debug!(
                cabinet = kept.cabinet(),
                kept = kept.signal(),
                dropped = other.signal(),
                "merging links with different signals"
            );
            Ok(())
        }
        SignalPolicy::Reject => Err(MergeError::SignalConflict {
            cabinet: kept.cabinet().to_string(),
            kept: kept.signal().to_string(),
            rejected: other.signal().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRATEGIES: [MergeStrategy; 2] = [MergeStrategy::Pairwise, MergeStrategy::UnionFind];

    fn link(terminals: &[&str]) -> Link {
        Link::new("cab1", "1", terminals.iter().copied())
    }

    fn merge(links: Vec<Link>, strategy: MergeStrategy) -> Vec<Link> {
        merge_links(links, &MergeOptions::with_strategy(strategy)).unwrap()
    }

    #[test]
    fn test_basic_merging() {
        for strategy in STRATEGIES {
            let merged = merge(vec![link(&["a", "b"]), link(&["b", "c"])], strategy);
            assert_eq!(merged, vec![link(&["a", "b", "c"])], "{strategy:?}");
        }
    }

    #[test]
    fn test_no_intersection() {
        for strategy in STRATEGIES {
            let links = vec![link(&["a", "b"]), link(&["c", "d"]), link(&["e", "f"])];
            let merged = merge(links.clone(), strategy);
            assert_eq!(merged, links, "{strategy:?}");
        }
    }

    #[test]
    fn test_transitive_closure() {
        for strategy in STRATEGIES {
            let merged = merge(
                vec![link(&["a", "b"]), link(&["b", "c"]), link(&["d", "e"])],
                strategy,
            );
            assert_eq!(merged, vec![link(&["a", "b", "c"]), link(&["d", "e"])]);
        }
    }

    #[test]
    fn test_complex_merging() {
        for strategy in STRATEGIES {
            let merged = merge(
                vec![
                    link(&["a", "b"]),
                    link(&["b", "c", "d"]),
                    link(&["e", "f"]),
                    link(&["d", "e"]),
                    link(&["g", "h"]),
                ],
                strategy,
            );
            assert_eq!(
                merged,
                vec![link(&["a", "b", "c", "d", "e", "f"]), link(&["g", "h"])],
                "{strategy:?}"
            );
        }
    }

    #[test]
    fn test_late_bridge_joins_earlier_components() {
        // {c,d} only touches the component once the bridge has been absorbed.
        for strategy in STRATEGIES {
            let merged = merge(
                vec![link(&["c", "d"]), link(&["a", "b"]), link(&["z", "b", "d"])],
                strategy,
            );
            assert_eq!(merged, vec![link(&["a", "b", "c", "d", "z"])], "{strategy:?}");
        }
    }

    #[test]
    fn test_singleton_preserved() {
        for strategy in STRATEGIES {
            let merged = merge(vec![link(&["a"]), link(&["b", "c"])], strategy);
            assert_eq!(merged, vec![link(&["a"]), link(&["b", "c"])], "{strategy:?}");
        }
    }

    #[test]
    fn test_empty_links_dropped() {
        for strategy in STRATEGIES {
            assert!(merge(vec![Link::empty("cab1", "1")], strategy).is_empty());
            assert!(merge(Vec::new(), strategy).is_empty());

            let merged = merge(vec![Link::empty("cab1", "1"), link(&["a", "b"])], strategy);
            assert_eq!(merged, vec![link(&["a", "b"])]);
        }
    }

    #[test]
    fn test_mixed_cabinets_rejected() {
        for strategy in STRATEGIES {
            let links = vec![
                Link::new("cab1", "1", ["X", "Y"]),
                Link::new("cab2", "1", ["X", "Y"]),
            ];
            let err = merge_links(links, &MergeOptions::with_strategy(strategy)).unwrap_err();
            assert_eq!(
                err,
                MergeError::Incompatible(IncompatibleMergeError::new("cab1", "cab2"))
            );
        }
    }

    #[test]
    fn test_lowest_order_key_signal_wins() {
        for strategy in STRATEGIES {
            let links = vec![
                Link::new("cab1", "late", ["XT9-1", "XT5-1"]),
                Link::new("cab1", "early", ["XT5-1", "XT1-1"]),
            ];
            let merged = merge(links.clone(), strategy);
            assert_eq!(merged.len(), 1);
            assert_eq!(merged[0].signal(), "early", "{strategy:?}");

            let reversed: Vec<Link> = links.into_iter().rev().collect();
            assert_eq!(merge(reversed, strategy)[0].signal(), "early");
        }
    }

    #[test]
    fn test_equal_order_keys_resolved_by_terminals() {
        for strategy in STRATEGIES {
            let links = vec![
                Link::new("cab1", "second", ["XT1-1", "XT3-1"]),
                Link::new("cab1", "first", ["XT1-1", "XT2-1"]),
            ];
            assert_eq!(merge(links.clone(), strategy)[0].signal(), "first", "{strategy:?}");

            let reversed: Vec<Link> = links.into_iter().rev().collect();
            assert_eq!(merge(reversed, strategy)[0].signal(), "first", "{strategy:?}");
        }
    }

    #[test]
    fn test_shorter_link_wins_on_shared_prefix() {
        for strategy in STRATEGIES {
            let links = vec![
                Link::new("cab1", "long", ["XT1-1", "XT2-1", "XT3-1"]),
                Link::new("cab1", "short", ["XT1-1", "XT2-1"]),
            ];
            assert_eq!(merge(links.clone(), strategy)[0].signal(), "short", "{strategy:?}");

            let reversed: Vec<Link> = links.into_iter().rev().collect();
            assert_eq!(merge(reversed, strategy)[0].signal(), "short", "{strategy:?}");
        }
    }

    #[test]
    fn test_identical_terminals_resolved_by_signal() {
        for strategy in STRATEGIES {
            let links = vec![
                Link::new("cab1", "B", ["XT1-1", "XT2-1"]),
                Link::new("cab1", "A", ["XT2-1", "XT1-1"]),
            ];
            assert_eq!(merge(links.clone(), strategy)[0].signal(), "A", "{strategy:?}");

            let reversed: Vec<Link> = links.into_iter().rev().collect();
            assert_eq!(merge(reversed, strategy)[0].signal(), "A", "{strategy:?}");
        }
    }

    #[test]
    fn test_signal_conflict_rejected() {
        for strategy in STRATEGIES {
            let options = MergeOptions {
                strategy,
                signal_policy: SignalPolicy::Reject,
                parallel: false,
            };
            let links = vec![
                Link::new("cab1", "A", ["a", "b"]),
                Link::new("cab1", "B", ["b", "c"]),
            ];
            let err = merge_links(links, &options).unwrap_err();
            assert!(matches!(err, MergeError::SignalConflict { .. }), "{strategy:?}");

            // Disjoint links with different signals are fine.
            let links = vec![
                Link::new("cab1", "A", ["a", "b"]),
                Link::new("cab1", "B", ["c", "d"]),
            ];
            assert_eq!(merge_links(links, &options).unwrap().len(), 2);
        }
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("pairwise".parse::<MergeStrategy>(), Ok(MergeStrategy::Pairwise));
        assert_eq!("union-find".parse::<MergeStrategy>(), Ok(MergeStrategy::UnionFind));
        assert!("quick".parse::<MergeStrategy>().is_err());
        assert_eq!(MergeStrategy::default(), MergeStrategy::UnionFind);
    }
}
