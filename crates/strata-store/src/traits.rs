//! The transaction-scope traits every Strata backend implements.
//!
//! A backend exposes three scopes — client read-only, repo read-only, and
//! repo read-write — each running a user-supplied function atomically
//! against one `(client, repo)` partition (or one client, for the client
//! scope). Implementations must provide serializable isolation, or at
//! minimum snapshot isolation with write-set conflict detection.

use strata_types::{
    Address, Branch, Commit, Entry, IndexResult, Object, Repo, TreeNode, WorkspaceEntry,
};

/// Read operations available in a client-scoped transaction.
pub trait ClientReadOps {
    /// List every repo owned by the client, ordered by repo id.
    fn list_repos(&self) -> IndexResult<Vec<Repo>>;

    /// Read one repo record by id.
    fn read_repo(&self, repo_id: &str) -> IndexResult<Repo>;
}

/// Read operations available inside a repo-scoped transaction.
///
/// All reads observe one consistent snapshot of the `(client, repo)`
/// partition. Missing entities report `IndexError::NotFound`.
pub trait RepoReadOps {
    /// The repo record this transaction is scoped to.
    fn read_repo(&self) -> IndexResult<Repo>;

    /// Read a branch record by name.
    fn read_branch(&self, branch: &str) -> IndexResult<Branch>;

    /// Read the staged workspace entry at `(branch, path)`, if any.
    fn read_from_workspace(&self, branch: &str, path: &str) -> IndexResult<WorkspaceEntry>;

    /// Read a commit by content address.
    fn read_commit(&self, addr: &Address) -> IndexResult<Commit>;

    /// Read a tree node by content address.
    fn read_tree(&self, addr: &Address) -> IndexResult<TreeNode>;

    /// Read an object descriptor by content address.
    fn read_object(&self, addr: &Address) -> IndexResult<Object>;

    /// The direct children of a tree node, in stored (sorted) order.
    fn list_tree(&self, addr: &Address) -> IndexResult<Vec<Entry>>;
}

/// Read-write operations available inside a repo-scoped transaction.
///
/// Commits, trees and objects are write-once under their content address;
/// writing the same address again is a no-op. Branch and workspace writes
/// are last-write-wins within the transaction.
pub trait RepoWriteOps: RepoReadOps {
    fn write_repo(&mut self, repo: &Repo) -> IndexResult<()>;

    fn write_branch(&mut self, name: &str, branch: &Branch) -> IndexResult<()>;

    /// Remove a branch record. Removing an absent branch is a no-op.
    fn delete_branch(&mut self, name: &str) -> IndexResult<()>;

    /// Stage a workspace entry at `(branch, path)`, replacing any entry
    /// already staged there.
    fn write_to_workspace_path(
        &mut self,
        branch: &str,
        path: &str,
        entry: &WorkspaceEntry,
    ) -> IndexResult<()>;

    /// Every staged entry for `branch`, ordered by path.
    fn list_workspace(&self, branch: &str) -> IndexResult<Vec<WorkspaceEntry>>;

    /// Drop every staged entry for `branch`.
    fn clear_workspace(&mut self, branch: &str) -> IndexResult<()>;

    fn write_commit(&mut self, addr: &Address, commit: &Commit) -> IndexResult<()>;

    fn write_tree(&mut self, addr: &Address, tree: &TreeNode) -> IndexResult<()>;

    fn write_object(&mut self, addr: &Address, object: &Object) -> IndexResult<()>;
}

/// A transactional key-value backend.
///
/// Each method runs `f` atomically: every write commits, or none do. On a
/// serialization conflict the backend may re-invoke `f` (hence `FnMut`),
/// so the function must be deterministic and free of side effects outside
/// the transaction. An error returned from `f` aborts the transaction and
/// is surfaced unmodified.
pub trait Store: Send + Sync {
    fn client_read_transact<T, F>(&self, client_id: &str, f: F) -> IndexResult<T>
    where
        F: FnMut(&dyn ClientReadOps) -> IndexResult<T>;

    fn repo_read_transact<T, F>(&self, client_id: &str, repo_id: &str, f: F) -> IndexResult<T>
    where
        F: FnMut(&dyn RepoReadOps) -> IndexResult<T>;

    fn repo_transact<T, F>(&self, client_id: &str, repo_id: &str, f: F) -> IndexResult<T>
    where
        F: FnMut(&mut dyn RepoWriteOps) -> IndexResult<T>;
}
