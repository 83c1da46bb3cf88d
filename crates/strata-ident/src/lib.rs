//! Content addressing for the Strata index.
//!
//! Identity of every versioned entity is the domain-separated BLAKE3 digest
//! of its canonical serialization. Two entities with identical contents
//! share an address; the empty tree has a fixed, well-known one.
//!
//! # Key Items
//!
//! - [`ContentHasher`] — domain-separated hasher (`OBJECT`, `TREE`, `COMMIT`)
//! - [`object_address`], [`tree_address`], [`commit_address`] — entity hashing
//! - [`empty_tree`] — the canonical empty tree's address

pub mod hasher;

pub use hasher::{commit_address, empty_tree, object_address, tree_address, ContentHasher};
