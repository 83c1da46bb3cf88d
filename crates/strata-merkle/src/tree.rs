//! The immutable, content-addressed Merkle tree.
//!
//! A [`Merkle`] is a handle on one tree root. Leaves are object entries,
//! interior nodes are tree entries, and every node is stored under the
//! address of its canonical serialization. Updates never mutate: folding a
//! batch of staged writes and tombstones produces a new root while
//! untouched subtrees keep their addresses.

use std::collections::BTreeMap;

use strata_ident::tree_address;
use strata_store::{RepoReadOps, RepoWriteOps};
use strata_types::{
    Address, Entry, EntryKind, IndexError, IndexResult, Object, TreeNode, WorkspaceData,
    WorkspaceEntry,
};

use crate::path;

/// A pending change to one named entry of a directory node.
enum Change {
    Put(EntryKind, Address),
    Drop,
}

/// A handle on an immutable tree root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Merkle {
    root: Address,
}

impl Merkle {
    /// Wrap an existing root address.
    pub fn new(root: Address) -> Self {
        Self { root }
    }

    /// The root address of this tree.
    pub fn root(&self) -> Address {
        self.root
    }

    /// Resolve `path` to the address of an entry of the expected kind.
    ///
    /// The empty path resolves to the root, which is always a tree. A walk
    /// that leaves the tree reports `NotFound`; a resolved entry of the
    /// wrong kind reports `TypeMismatch`.
    pub fn get_address<S: RepoReadOps + ?Sized>(
        &self,
        tx: &S,
        path: &str,
        expected: EntryKind,
    ) -> IndexResult<Address> {
        let parts = path::split(path)?;
        let Some((name, dir)) = parts.split_last() else {
            return match expected {
                EntryKind::Tree => Ok(self.root),
                EntryKind::Object => Err(IndexError::InvalidPath(
                    "the empty path names the root tree".to_string(),
                )),
            };
        };

        let mut node = tx.read_tree(&self.root)?;
        for part in dir {
            let entry = node.find(part).ok_or(IndexError::NotFound)?;
            if entry.kind != EntryKind::Tree {
                // an object in the middle of the path: nothing below it
                return Err(IndexError::NotFound);
            }
            node = tx.read_tree(&entry.address)?;
        }

        let entry = node.find(name).ok_or(IndexError::NotFound)?;
        if entry.kind != expected {
            return Err(IndexError::TypeMismatch {
                path: path.to_string(),
                expected,
                actual: entry.kind,
            });
        }
        Ok(entry.address)
    }

    /// Walk to the leaf at `path` and read its object descriptor.
    pub fn get_object<S: RepoReadOps + ?Sized>(
        &self,
        tx: &S,
        path: &str,
    ) -> IndexResult<Object> {
        let addr = self.get_address(tx, path, EntryKind::Object)?;
        tx.read_object(&addr)
    }

    /// Fold a batch of workspace entries into the tree, returning the new
    /// root.
    ///
    /// The batch is grouped by parent directory and applied deepest-first,
    /// so each rebuilt child is recorded in its parent before the parent is
    /// itself rebuilt. Within the batch, the last entry for a given
    /// `(directory, name)` wins. A directory left empty is dropped from its
    /// parent; unchanged subtrees are not rewritten.
    pub fn update(
        &self,
        tx: &mut dyn RepoWriteOps,
        batch: &[WorkspaceEntry],
    ) -> IndexResult<Merkle> {
        let mut dirs: BTreeMap<Vec<String>, BTreeMap<String, Change>> = BTreeMap::new();
        for staged in batch {
            let parts = path::split(&staged.path)?;
            let Some((name, dir)) = parts.split_last() else {
                return Err(IndexError::InvalidPath(
                    "cannot stage the empty path".to_string(),
                ));
            };
            let change = match &staged.data {
                WorkspaceData::Address(addr) => Change::Put(EntryKind::Object, *addr),
                WorkspaceData::Tombstone => Change::Drop,
            };
            dirs.entry(dir.iter().map(|s| s.to_string()).collect())
                .or_default()
                .insert(name.to_string(), change);
        }
        if dirs.is_empty() {
            return Ok(*self);
        }

        // Deepest directories first: rebuilding a child inserts its new
        // address (or its removal) into the parent's pending changes.
        let max_depth = dirs.keys().map(|d| d.len()).max().unwrap_or(0);
        for depth in (1..=max_depth).rev() {
            let level: Vec<Vec<String>> = dirs
                .keys()
                .filter(|d| d.len() == depth)
                .cloned()
                .collect();
            for dir in level {
                let Some(changes) = dirs.remove(&dir) else {
                    continue;
                };
                let rebuilt = apply(self.load_dir(&*tx, &dir)?, changes);
                let (name, parent) = dir.split_last().ok_or(IndexError::Store(
                    "directory at nonzero depth has no name".to_string(),
                ))?;
                let change = if rebuilt.is_empty() {
                    Change::Drop
                } else {
                    let addr = tree_address(&rebuilt)?;
                    tx.write_tree(&addr, &rebuilt)?;
                    Change::Put(EntryKind::Tree, addr)
                };
                dirs.entry(parent.to_vec())
                    .or_default()
                    .insert(name.clone(), change);
            }
        }

        let root_changes = dirs.remove(&Vec::new()).unwrap_or_default();
        let rebuilt = apply(tx.read_tree(&self.root)?, root_changes);
        let addr = tree_address(&rebuilt)?;
        tx.write_tree(&addr, &rebuilt)?;
        Ok(Merkle::new(addr))
    }

    /// Load the node at `dir` from the pre-update tree.
    ///
    /// A directory that does not exist yet (missing component, or an object
    /// in the way that the batch is about to shadow) loads as empty.
    fn load_dir<S: RepoReadOps + ?Sized>(
        &self,
        tx: &S,
        dir: &[String],
    ) -> IndexResult<TreeNode> {
        let mut node = tx.read_tree(&self.root)?;
        for part in dir {
            match node.find(part) {
                Some(entry) if entry.kind == EntryKind::Tree => {
                    node = tx.read_tree(&entry.address)?;
                }
                _ => return Ok(TreeNode::empty()),
            }
        }
        Ok(node)
    }
}

/// Apply pending changes to a directory node's entries.
fn apply(node: TreeNode, changes: BTreeMap<String, Change>) -> TreeNode {
    let mut by_name: BTreeMap<String, Entry> = node
        .entries
        .into_iter()
        .map(|e| (e.name.clone(), e))
        .collect();
    for (name, change) in changes {
        match change {
            Change::Put(kind, address) => {
                by_name.insert(name.clone(), Entry::new(name, kind, address));
            }
            Change::Drop => {
                by_name.remove(&name);
            }
        }
    }
    TreeNode::new(by_name.into_values().collect())
}
