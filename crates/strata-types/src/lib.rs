//! Foundation types for the Strata versioned object index.
//!
//! This crate provides the content-address type, the persistent entity
//! schemas, and the shared error type. Every other Strata crate depends on
//! `strata-types`.
//!
//! # Key Types
//!
//! - [`Address`] — 32-byte content address of any versioned entity
//! - [`Repo`], [`Branch`], [`Commit`] — repository structure
//! - [`TreeNode`], [`Entry`] — Merkle tree nodes and their entries
//! - [`Object`] — descriptor of an externally stored blob
//! - [`WorkspaceEntry`] — a staged write or tombstone in a branch workspace
//! - [`IndexError`] — the shared error enum, with `NotFound` as the one
//!   sentinel callers branch on

pub mod address;
pub mod error;
pub mod model;

pub use address::Address;
pub use error::{IndexError, IndexResult};
pub use model::{
    Branch, Commit, Entry, EntryKind, Object, Repo, TreeNode, WorkspaceData, WorkspaceEntry,
};
