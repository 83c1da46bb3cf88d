//! The Strata index: a git-like, object-versioned index layer over a
//! transactional key-value store.
//!
//! Strata exposes repositories, branches, commits, trees and objects for
//! multi-tenant, many-branch workloads. Writes are cheap: they stage into a
//! per-branch workspace and are folded into the immutable content-addressed
//! Merkle tree probabilistically, or on demand when a listing or a commit
//! needs the tree current. Object bytes live in an external blob store; the
//! index records their addresses.
//!
//! # Key Types
//!
//! - [`Index`] — the public API trait (read/write/delete/list objects,
//!   branch reset/checkout/delete/merge, commit, repo lifecycle)
//! - [`KVIndex`] — the implementation over any [`strata_store::Store`]
//! - [`FlushDecider`] — gate deciding when a staged write folds the
//!   workspace ([`RandomFlush`] in production, [`NeverFlush`] /
//!   [`AlwaysFlush`] for tests and embedders)
//!
//! # Read model
//!
//! The workspace is authoritative for point reads; the tree is
//! authoritative for listings, which force a fold first. Reads against an
//! unknown branch fall back to the default branch's last commit, never to
//! anyone's dirty workspace.

pub mod flush;
pub mod index;

pub use flush::{AlwaysFlush, FlushDecider, NeverFlush, RandomFlush};
pub use index::{Index, KVIndex, DEFAULT_BRANCH, DEFAULT_PARTIAL_COMMIT_RATIO};
