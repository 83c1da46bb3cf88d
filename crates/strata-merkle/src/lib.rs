//! Immutable content-addressed Merkle tree engine for the Strata index.
//!
//! Leaves are object entries, interior nodes are tree entries, and every
//! node is stored under the address of its canonical serialization. Point
//! reads walk the tree; the bulk [`Merkle::update`] folds a batch of staged
//! writes and tombstones into a new root, rewriting only the directories the
//! batch touches.
//!
//! # Key Items
//!
//! - [`Merkle`] — handle on one tree root: `get_object`, `get_address`,
//!   `update`
//! - [`path::split`] — path validation (slash-separated, no empty segments)

pub mod path;
pub mod tree;

pub use tree::Merkle;
