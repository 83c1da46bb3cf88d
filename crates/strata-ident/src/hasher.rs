use std::sync::OnceLock;

use strata_types::{Address, Commit, IndexError, IndexResult, Object, TreeNode};

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every computation,
/// so an object and a tree with identical canonical bytes still address
/// differently. The tag carries a schema version; bumping it re-addresses
/// every entity of that kind.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for object descriptors.
    pub const OBJECT: Self = Self {
        domain: "strata-object-v1",
    };
    /// Hasher for tree nodes.
    pub const TREE: Self = Self {
        domain: "strata-tree-v1",
    };
    /// Hasher for commits.
    pub const COMMIT: Self = Self {
        domain: "strata-commit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Address {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Address::from_raw(*hasher.finalize().as_bytes())
    }

    /// Hash a value's canonical serialization with domain separation.
    ///
    /// Canonical means: JSON with struct fields in declaration order and
    /// map keys sorted (all entity maps are `BTreeMap`).
    pub fn hash_canonical<T: serde::Serialize>(&self, value: &T) -> IndexResult<Address> {
        let data = serde_json::to_vec(value)
            .map_err(|e| IndexError::Serialization(e.to_string()))?;
        Ok(self.hash(&data))
    }

    /// Verify that data produces the expected address.
    pub fn verify(&self, data: &[u8], expected: &Address) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Content address of an object descriptor.
pub fn object_address(object: &Object) -> IndexResult<Address> {
    ContentHasher::OBJECT.hash_canonical(object)
}

/// Content address of a tree node.
pub fn tree_address(tree: &TreeNode) -> IndexResult<Address> {
    ContentHasher::TREE.hash_canonical(tree)
}

/// Content address of a commit.
pub fn commit_address(commit: &Commit) -> IndexResult<Address> {
    ContentHasher::COMMIT.hash_canonical(commit)
}

/// The fixed, well-known address of the canonical empty tree.
///
/// Every fresh repository's epoch commit points here, and a fold that
/// removes the last entry of a root collapses back to it.
pub fn empty_tree() -> Address {
    static EMPTY: OnceLock<Address> = OnceLock::new();
    *EMPTY.get_or_init(|| {
        tree_address(&TreeNode::empty()).expect("the empty tree always serializes")
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use strata_types::{Entry, EntryKind};

    use super::*;

    fn addr(b: u8) -> Address {
        Address::from_raw([b; 32])
    }

    #[test]
    fn hash_is_deterministic() {
        let one = ContentHasher::OBJECT.hash(b"payload");
        let two = ContentHasher::OBJECT.hash(b"payload");
        assert_eq!(one, two);
    }

    #[test]
    fn domains_separate() {
        let data = b"same bytes";
        let o = ContentHasher::OBJECT.hash(data);
        let t = ContentHasher::TREE.hash(data);
        let c = ContentHasher::COMMIT.hash(data);
        assert_ne!(o, t);
        assert_ne!(o, c);
        assert_ne!(t, c);
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::TREE.hash(b"original");
        assert!(ContentHasher::TREE.verify(b"original", &id));
        assert!(!ContentHasher::TREE.verify(b"tampered", &id));
    }

    #[test]
    fn empty_tree_is_stable() {
        assert_eq!(empty_tree(), empty_tree());
        assert_eq!(empty_tree(), tree_address(&TreeNode::empty()).unwrap());
    }

    #[test]
    fn identical_trees_share_an_address() {
        let build = || {
            TreeNode::new(vec![
                Entry::new("b.txt", EntryKind::Object, addr(2)),
                Entry::new("a.txt", EntryKind::Object, addr(1)),
            ])
        };
        assert_eq!(
            tree_address(&build()).unwrap(),
            tree_address(&build()).unwrap()
        );
    }

    #[test]
    fn nonempty_tree_differs_from_empty() {
        let node = TreeNode::new(vec![Entry::new("x", EntryKind::Object, addr(1))]);
        assert_ne!(tree_address(&node).unwrap(), empty_tree());
    }

    #[test]
    fn object_address_covers_metadata() {
        let base = Object {
            physical_address: "s3://bucket/key".into(),
            checksum: "abcd".into(),
            size: 10,
            metadata: BTreeMap::new(),
        };
        let mut annotated = base.clone();
        annotated
            .metadata
            .insert("content-type".into(), "text/plain".into());
        assert_ne!(
            object_address(&base).unwrap(),
            object_address(&annotated).unwrap()
        );
    }

    #[test]
    fn commit_address_depends_on_parents() {
        let commit = |parents: Vec<Address>| Commit {
            tree: addr(9),
            parents,
            committer: "u".into(),
            message: "m".into(),
            timestamp: 100,
            metadata: BTreeMap::new(),
        };
        let root = commit_address(&commit(vec![])).unwrap();
        let child = commit_address(&commit(vec![addr(1)])).unwrap();
        assert_ne!(root, child);
    }

    #[test]
    fn custom_domain() {
        let hasher = ContentHasher::new("strata-test-v1");
        assert_ne!(hasher.hash(b"x"), ContentHasher::OBJECT.hash(b"x"));
        assert_eq!(hasher.domain(), "strata-test-v1");
    }
}
