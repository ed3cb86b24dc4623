//! FQN → path symbol table, built lazily from the IR cache and invalidated
//! on mutation (spec §4.1 "symbol table").
//!
//! Grounded on the `IndexPlugin`-style incremental index shape (capability
//! port pack): a lazily-populated forward map plus enough bookkeeping to
//! invalidate a single file's contribution without rebuilding the whole
//! table.

use std::collections::{BTreeMap, BTreeSet};

use super::ir::{IrCache, IrDocument};

/// Maps fully-qualified symbol names to the set of files that define them
/// (more than one file can legitimately define the same FQN transiently,
/// e.g. during a rename-in-progress).
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_fqn: BTreeMap<String, BTreeSet<String>>,
    indexed_files: BTreeSet<String>,
    dirty: bool,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_fqn: BTreeMap::new(),
            indexed_files: BTreeSet::new(),
            dirty: true,
        }
    }

    /// Mark the table stale without rebuilding it. The next `lookup` or
    /// `rebuild_from` call pays the cost.
    pub fn invalidate(&mut self, path: &str) {
        self.indexed_files.remove(path);
        for files in self.by_fqn.values_mut() {
            files.remove(path);
        }
        self.dirty = true;
    }

    /// Index one file's IR document into the table, replacing any prior
    /// contribution from that path.
    pub fn index_document(&mut self, doc: &IrDocument) {
        for files in self.by_fqn.values_mut() {
            files.remove(&doc.file_path);
        }
        for node in &doc.nodes {
            self.by_fqn
                .entry(node.fqn.clone())
                .or_default()
                .insert(doc.file_path.clone());
        }
        self.indexed_files.insert(doc.file_path.clone());
    }

    /// Lazily rebuild from every document currently in `cache` that has not
    /// yet been indexed, then clear the dirty flag.
    pub fn rebuild_from(&mut self, cache: &IrCache) {
        for (path, doc) in cache.iter() {
            if !self.indexed_files.contains(path) {
                self.index_document(doc);
            }
        }
        self.dirty = false;
    }

    #[must_use]
    pub fn lookup(&self, fqn: &str) -> Vec<&str> {
        self.by_fqn
            .get(fqn)
            .map(|files| files.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tofs::ir::{IrKind, IrNode};

    fn doc(path: &str, fqns: &[&str]) -> IrDocument {
        IrDocument {
            kind: IrKind::Parsed,
            file_path: path.to_string(),
            nodes: fqns
                .iter()
                .map(|f| IrNode {
                    fqn: (*f).to_string(),
                    kind: "fn".to_string(),
                })
                .collect(),
            edges: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn index_then_lookup_finds_defining_file() {
        let mut table = SymbolTable::new();
        table.index_document(&doc("a.rs", &["foo", "bar"]));
        assert_eq!(table.lookup("foo"), vec!["a.rs"]);
    }

    #[test]
    fn reindexing_same_path_replaces_old_contribution() {
        let mut table = SymbolTable::new();
        table.index_document(&doc("a.rs", &["foo"]));
        table.index_document(&doc("a.rs", &["baz"]));
        assert!(table.lookup("foo").is_empty());
        assert_eq!(table.lookup("baz"), vec!["a.rs"]);
    }

    #[test]
    fn invalidate_removes_file_contribution() {
        let mut table = SymbolTable::new();
        table.index_document(&doc("a.rs", &["foo"]));
        table.invalidate("a.rs");
        assert!(table.lookup("foo").is_empty());
        assert!(table.is_dirty());
    }
}
