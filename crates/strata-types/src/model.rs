//! Persistent entity schemas for the Strata index.
//!
//! Every type here is serialized canonically: struct fields in declaration
//! order, metadata maps as `BTreeMap` so keys encode sorted. Content
//! addresses computed over these encodings are therefore stable across runs
//! and across implementations sharing the schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A repository record, owned by a client.
///
/// The `(client_id, repo_id)` pair scopes every other entity: branches,
/// workspaces, commits, trees and objects all live under one repo partition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Repo {
    pub client_id: String,
    pub repo_id: String,
    /// Unix timestamp (seconds) of repository creation.
    pub creation_date: i64,
    /// Branch created at repo birth and used as the read fallback.
    pub default_branch: String,
    /// Probability in [0, 1] that a single write triggers a workspace fold.
    pub partial_commit_ratio: f64,
}

/// A branch: a named, mutable pointer into the commit graph plus the roots
/// of its two trees.
///
/// `commit_root` is always the tree of the commit named by `commit`.
/// `workspace_root` starts equal to `commit_root` and diverges only when a
/// partial commit folds staged workspace entries into the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub commit: Address,
    pub commit_root: Address,
    pub workspace_root: Address,
}

/// An immutable commit, identified by the address of its canonical encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Root tree captured by this commit.
    pub tree: Address,
    /// Parent commit addresses; empty for the repository epoch.
    pub parents: Vec<Address>,
    pub committer: String,
    pub message: String,
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    pub metadata: BTreeMap<String, String>,
}

/// What a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Tree,
    Object,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => write!(f, "tree"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// A single named entry inside a tree node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub address: Address,
    /// Open annotation map; empty for entries written by the fold path.
    pub metadata: BTreeMap<String, String>,
}

impl Entry {
    /// Create an entry with no metadata.
    pub fn new(name: impl Into<String>, kind: EntryKind, address: Address) -> Self {
        Self {
            name: name.into(),
            kind,
            address,
            metadata: BTreeMap::new(),
        }
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// An interior node of the Merkle tree: a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Entries sorted lexicographically by name.
    pub entries: Vec<Entry>,
}

impl TreeNode {
    /// Create a node from entries, sorting them by name.
    pub fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// The canonical empty tree.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Binary-search lookup by entry name.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Opaque descriptor of a blob stored outside the index.
///
/// The index never holds object bytes; it records where they live and
/// enough metadata to verify and serve them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Location of the bytes in the external blob store.
    pub physical_address: String,
    /// Digest of the blob contents, as recorded by the writer.
    pub checksum: String,
    /// Blob size in bytes.
    pub size: u64,
    pub metadata: BTreeMap<String, String>,
}

/// A staged mutation in a branch workspace, keyed by path.
///
/// Workspace entries are ephemeral: a partial commit folds them into the
/// Merkle tree and clears them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceEntry {
    pub path: String,
    pub data: WorkspaceData,
}

/// The payload of a workspace entry: exactly a write or a delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkspaceData {
    /// A staged write: the address of the object now at this path.
    Address(Address),
    /// A staged delete. Suppresses any tree entry at this path at fold time.
    Tombstone,
}

impl WorkspaceEntry {
    /// Stage a write of `address` at `path`.
    pub fn write(path: impl Into<String>, address: Address) -> Self {
        Self {
            path: path.into(),
            data: WorkspaceData::Address(address),
        }
    }

    /// Stage a delete at `path`.
    pub fn tombstone(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: WorkspaceData::Tombstone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_raw([b; 32])
    }

    #[test]
    fn tree_node_sorts_entries() {
        let node = TreeNode::new(vec![
            Entry::new("zeta", EntryKind::Object, addr(1)),
            Entry::new("alpha", EntryKind::Object, addr(2)),
            Entry::new("mid", EntryKind::Tree, addr(3)),
        ]);
        let names: Vec<_> = node.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn tree_node_find() {
        let node = TreeNode::new(vec![
            Entry::new("a", EntryKind::Object, addr(1)),
            Entry::new("b", EntryKind::Tree, addr(2)),
            Entry::new("c", EntryKind::Object, addr(3)),
        ]);
        assert_eq!(node.find("b").unwrap().address, addr(2));
        assert!(node.find("missing").is_none());
        assert_eq!(node.len(), 3);
        assert!(!node.is_empty());
    }

    #[test]
    fn empty_tree_node() {
        let node = TreeNode::empty();
        assert!(node.is_empty());
        assert!(node.find("anything").is_none());
    }

    #[test]
    fn commit_metadata_serializes_sorted() {
        let mut metadata = BTreeMap::new();
        metadata.insert("zz".to_string(), "1".to_string());
        metadata.insert("aa".to_string(), "2".to_string());
        let commit = Commit {
            tree: addr(9),
            parents: vec![],
            committer: String::new(),
            message: "m".into(),
            timestamp: 0,
            metadata,
        };
        let json = serde_json::to_string(&commit).unwrap();
        let aa = json.find("\"aa\"").unwrap();
        let zz = json.find("\"zz\"").unwrap();
        assert!(aa < zz);
    }

    #[test]
    fn identical_trees_encode_identically() {
        let build = || {
            TreeNode::new(vec![
                Entry::new("b", EntryKind::Object, addr(2)),
                Entry::new("a", EntryKind::Object, addr(1)),
            ])
        };
        let one = serde_json::to_vec(&build()).unwrap();
        let two = serde_json::to_vec(&build()).unwrap();
        assert_eq!(one, two);
    }

    #[test]
    fn workspace_entry_constructors() {
        let w = WorkspaceEntry::write("a/b", addr(5));
        assert_eq!(w.path, "a/b");
        assert!(matches!(w.data, WorkspaceData::Address(a) if a == addr(5)));

        let t = WorkspaceEntry::tombstone("a/b");
        assert!(matches!(t.data, WorkspaceData::Tombstone));
    }

    #[test]
    fn entry_kind_display() {
        assert_eq!(EntryKind::Tree.to_string(), "tree");
        assert_eq!(EntryKind::Object.to_string(), "object");
    }
}
