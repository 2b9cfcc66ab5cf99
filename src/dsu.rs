//! # Disjoint Set Union over Terminals
//!
//! Implements the Union-Find data structure used by the merge engine.
//! Terminal identifiers are interned into a dense arena, so parents and ranks
//! live in plain vectors indexed by [`TerminalId`] and no string is hashed
//! after interning.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense index of an interned terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerminalId(pub u32);

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl TerminalId {
    /// Id of the arena slot `index`.
    ///
    /// # Panics
    /// If the arena holds more than `u32::MAX` terminals.
    #[inline]
    fn from_index(index: usize) -> Self {
        TerminalId(u32::try_from(index).expect("terminal arena exceeds u32::MAX entries"))
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Disjoint Set Union keyed by terminal identifier
#[derive(Debug, Clone, Default)]
pub struct TerminalDSU {
    /// Interned identifier -> arena index
    index: FxHashMap<String, TerminalId>,
    /// Arena index -> identifier
    names: Vec<String>,
    /// Parent array for Union-Find
    parent: Vec<TerminalId>,
    /// Rank array for union by rank
    rank: Vec<u8>,
    /// Current number of components
    component_count: usize,
}

impl TerminalDSU {
    /// Create a new, empty DSU
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a DSU with room for `capacity` terminals
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            names: Vec::with_capacity(capacity),
            parent: Vec::with_capacity(capacity),
            rank: Vec::with_capacity(capacity),
            component_count: 0,
        }
    }

    /// Intern a terminal, adding it as a singleton component if unseen
    pub fn add_terminal(&mut self, terminal: &str) -> TerminalId {
        if let Some(&id) = self.index.get(terminal) {
            return id;
        }
        let id = TerminalId::from_index(self.names.len());
        self.index.insert(terminal.to_string(), id);
        self.names.push(terminal.to_string());
        self.parent.push(id);
        self.rank.push(0);
        self.component_count += 1;
        id
    }

    /// Look up an interned terminal
    pub fn get(&self, terminal: &str) -> Option<TerminalId> {
        self.index.get(terminal).copied()
    }

    /// Identifier of an interned terminal
    pub fn name(&self, id: TerminalId) -> &str {
        &self.names[id.index()]
    }

    /// Find the root of a terminal (with path compression via path halving)
    #[inline]
    pub fn find(&mut self, id: TerminalId) -> TerminalId {
        let mut current = id;
        loop {
            let parent = self.parent[current.index()];
            if parent == current {
                return current;
            }
            // Point current to grandparent (skip parent)
            let grandparent = self.parent[parent.index()];
            self.parent[current.index()] = grandparent;
            current = grandparent;
        }
    }

    /// Union the components of two terminals.
    /// Returns `false` when they were already in the same component.
    pub fn union(&mut self, a: TerminalId, b: TerminalId) -> bool {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return false;
        }

        let rank_a = self.rank[root_a.index()];
        let rank_b = self.rank[root_b.index()];
        if rank_a < rank_b {
            self.parent[root_a.index()] = root_b;
        } else if rank_a > rank_b {
            self.parent[root_b.index()] = root_a;
        } else {
            self.parent[root_a.index()] = root_b;
            self.rank[root_b.index()] = rank_b.saturating_add(1);
        }
        self.component_count -= 1;
        true
    }

    /// Check if two terminals are in the same component
    pub fn same_component(&mut self, a: TerminalId, b: TerminalId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Number of interned terminals
    pub fn terminal_count(&self) -> usize {
        self.names.len()
    }

    /// Number of components
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Group all terminals by root.
    /// Components are listed in order of their first interned terminal, and
    /// terminals inside a component in interning order.
    pub fn components(&mut self) -> Components {
        let mut slot_of_root: FxHashMap<TerminalId, usize> =
            FxHashMap::with_capacity_and_hasher(self.component_count, Default::default());
        let mut components: Vec<Component> = Vec::with_capacity(self.component_count);

        for raw in 0..self.names.len() {
            let id = TerminalId::from_index(raw);
            let root = self.find(id);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                components.push(Component {
                    root,
                    terminals: Vec::new(),
                });
                components.len() - 1
            });
            components[slot].terminals.push(id);
        }

        Components { components }
    }
}

/// One connected component of terminals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// The root terminal of this component
    pub root: TerminalId,
    /// All terminals in this component
    pub terminals: Vec<TerminalId>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terminals.is_empty()
    }

    pub fn contains(&self, id: TerminalId) -> bool {
        self.terminals.contains(&id)
    }
}

/// Collection of all components
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Components {
    pub components: Vec<Component>,
}

impl Components {
    /// Component rooted at `root`, if any
    pub fn get(&self, root: TerminalId) -> Option<&Component> {
        self.components.iter().find(|c| c.root == root)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }
}

impl IntoIterator for Components {
    type Item = Component;
    type IntoIter = std::vec::IntoIter<Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dsu_creation() {
        let mut dsu = TerminalDSU::new();
        assert_eq!(dsu.component_count(), 0);
        assert!(dsu.components().is_empty());
    }

    #[test]
    fn test_add_terminal_is_idempotent() {
        let mut dsu = TerminalDSU::new();
        let a = dsu.add_terminal("XT1-1");
        let again = dsu.add_terminal("XT1-1");
        assert_eq!(a, again);
        assert_eq!(dsu.terminal_count(), 1);
        assert_eq!(dsu.component_count(), 1);
        assert_eq!(dsu.find(a), a);
        assert_eq!(dsu.name(a), "XT1-1");
        assert_eq!(dsu.get("XT1-1"), Some(a));
        assert_eq!(dsu.get("XT2-1"), None);
    }

    #[test]
    fn test_union_find_functionality() {
        let mut dsu = TerminalDSU::new();
        let a = dsu.add_terminal("a");
        let b = dsu.add_terminal("b");
        let c = dsu.add_terminal("c");
        let d = dsu.add_terminal("d");
        assert_eq!(dsu.component_count(), 4);

        assert!(dsu.union(a, b));
        assert!(dsu.union(c, d));
        assert_eq!(dsu.component_count(), 2);
        assert!(dsu.same_component(a, b));
        assert!(!dsu.same_component(a, c));

        assert!(dsu.union(b, d));
        assert_eq!(dsu.component_count(), 1);
        assert!(dsu.same_component(a, c));
    }

    #[test]
    fn test_union_find_self_union() {
        let mut dsu = TerminalDSU::new();
        let a = dsu.add_terminal("a");
        let b = dsu.add_terminal("b");
        assert!(!dsu.union(a, a));
        assert!(dsu.union(a, b));
        assert!(!dsu.union(b, a));
        assert_eq!(dsu.component_count(), 1);
    }

    #[test]
    fn test_union_find_path_compression() {
        let mut dsu = TerminalDSU::new();
        let ids: Vec<TerminalId> = (0..64).map(|i| dsu.add_terminal(&format!("t{i}"))).collect();
        for pair in ids.windows(2) {
            dsu.union(pair[0], pair[1]);
        }
        let root = dsu.find(ids[0]);
        for &id in &ids {
            assert_eq!(dsu.find(id), root);
        }
        // After compression every terminal is at most two hops from the root.
        for &id in &ids {
            let parent = dsu.parent[id.index()];
            assert!(parent == root || dsu.parent[parent.index()] == root);
        }
    }

    #[test]
    fn test_union_find_rank_optimization() {
        let mut dsu = TerminalDSU::new();
        let a = dsu.add_terminal("a");
        let b = dsu.add_terminal("b");
        let c = dsu.add_terminal("c");

        dsu.union(a, b);
        let root = dsu.find(a);
        assert_eq!(dsu.rank[root.index()], 1);

        // A rank-0 singleton hangs under the higher-rank root.
        dsu.union(c, a);
        assert_eq!(dsu.find(c), root);
        assert_eq!(dsu.rank[root.index()], 1);
    }

    #[test]
    fn test_terminal_id_from_index() {
        assert_eq!(TerminalId::from_index(0), TerminalId(0));
        assert_eq!(TerminalId::from_index(u32::MAX as usize), TerminalId(u32::MAX));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "terminal arena exceeds u32::MAX entries")]
    fn test_terminal_id_overflow_panics() {
        TerminalId::from_index(u32::MAX as usize + 1);
    }

    #[test]
    fn test_components_grouping() {
        let mut dsu = TerminalDSU::new();
        let a = dsu.add_terminal("a");
        let b = dsu.add_terminal("b");
        let c = dsu.add_terminal("c");
        let d = dsu.add_terminal("d");
        let e = dsu.add_terminal("e");
        dsu.union(a, c);
        dsu.union(d, e);

        let components = dsu.components();
        assert_eq!(components.len(), 3);

        let first = &components.components[0];
        assert_eq!(first.terminals, vec![a, c]);
        assert!(first.contains(c));
        assert_eq!(components.components[1].terminals, vec![b]);
        assert_eq!(components.components[2].terminals, vec![d, e]);

        let root = dsu.find(d);
        assert_eq!(components.get(root).map(Component::len), Some(2));
        let total: usize = components.iter().map(Component::len).sum();
        assert_eq!(total, dsu.terminal_count());
    }
}
