//! Transactional key-value facade for the Strata index.
//!
//! The index never talks to a physical database directly; it runs closures
//! inside one of three transaction scopes, each exposing typed operations
//! over the entity namespace of a `(client, repo)` partition:
//!
//! - [`ClientReadOps`] — repo listing and lookup for one client
//! - [`RepoReadOps`] — snapshot reads of branches, workspace, commits,
//!   trees and objects
//! - [`RepoWriteOps`] — all reads plus writes, with write-once semantics
//!   for content-addressed entities
//!
//! # Backends
//!
//! - [`InMemoryStore`] — `BTreeMap`-based backend with a global lock;
//!   serializable by construction, for tests and embedding

pub mod memory;
pub mod traits;

pub use memory::InMemoryStore;
pub use traits::{ClientReadOps, RepoReadOps, RepoWriteOps, Store};
