//! The public index API over a transactional store.
//!
//! [`KVIndex`] binds the store scopes, the Merkle engine and the flush
//! decider into the repository model: object reads and writes staged in a
//! per-branch workspace, probabilistic folding of the workspace into the
//! content-addressed tree, and branch lifecycle (commit, reset, checkout,
//! delete). Every operation runs inside exactly one transaction.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use strata_ident::{commit_address, empty_tree, object_address};
use strata_merkle::Merkle;
use strata_store::{RepoReadOps, RepoWriteOps, Store};
use strata_types::{
    Address, Branch, Commit, Entry, EntryKind, IndexError, IndexResult, Object, Repo, TreeNode,
    WorkspaceData, WorkspaceEntry,
};

use crate::flush::{FlushDecider, RandomFlush};

/// Ratio of writes that trigger a partial commit (between 0 and 1).
/// At 0.02, roughly 50 writes land between folds.
pub const DEFAULT_PARTIAL_COMMIT_RATIO: f64 = 0.02;

/// Branch created automatically when a repo is born, and the fallback
/// read target when a requested branch does not exist.
pub const DEFAULT_BRANCH: &str = "master";

/// The versioned object index.
///
/// All operations are scoped to a `(client, repo)` partition and are safe
/// to call concurrently; the transactional store serializes conflicting
/// writers.
pub trait Index {
    /// Read the object at `path` on `branch`.
    ///
    /// The workspace is authoritative: a staged write is returned as-is, a
    /// staged tombstone reads as `NotFound`. Only on a workspace miss does
    /// the read fall through to the branch's tree (or, for an unknown
    /// branch, to the default branch's last commit).
    fn read_object(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
    ) -> IndexResult<Object>;

    /// Record `object` at `path` on `branch`.
    ///
    /// The descriptor is stored under its content address and the write is
    /// staged in the workspace; folding into the tree happens later.
    fn write_object(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
        object: &Object,
    ) -> IndexResult<()>;

    /// Stage a delete of `path` on `branch`.
    ///
    /// Unconditional: the path need not currently exist. The tombstone
    /// suppresses any tree entry at the path at fold time.
    fn delete_object(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
    ) -> IndexResult<()>;

    /// List the direct children of the tree at `path` on `branch`.
    ///
    /// Forces a fold first, so every prior staged write on the branch is
    /// visible. The empty path lists the root.
    fn list_objects(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
    ) -> IndexResult<Vec<Entry>>;

    /// Discard the branch's staged and folded-but-uncommitted state,
    /// returning `workspace_root` to `commit_root`.
    fn reset_branch(&self, client_id: &str, repo_id: &str, branch: &str) -> IndexResult<()>;

    /// Seal the branch's workspace root as a new commit.
    fn commit(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        message: &str,
        committer: &str,
        metadata: BTreeMap<String, String>,
    ) -> IndexResult<()>;

    /// Delete a branch, discarding its workspace.
    fn delete_branch(&self, client_id: &str, repo_id: &str, branch: &str) -> IndexResult<()>;

    /// Move `branch` to an existing commit, discarding its workspace.
    fn checkout(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        commit: &Address,
    ) -> IndexResult<()>;

    /// Merge `source` into `destination`.
    ///
    /// Declared interface only: the intended algorithm is lowest common
    /// ancestor discovery followed by a three-way tree merge recording a
    /// commit with both parents. The current contract is a no-op success.
    fn merge(
        &self,
        client_id: &str,
        repo_id: &str,
        source: &str,
        destination: &str,
    ) -> IndexResult<()>;

    /// Create a repo with an empty epoch commit and its default branch.
    fn create_repo(
        &self,
        client_id: &str,
        repo_id: &str,
        default_branch: &str,
    ) -> IndexResult<()>;

    /// All repos owned by `client_id`, ordered by repo id.
    fn list_repos(&self, client_id: &str) -> IndexResult<Vec<Repo>>;

    /// One repo record.
    fn get_repo(&self, client_id: &str, repo_id: &str) -> IndexResult<Repo>;

    /// One branch record.
    fn get_branch(&self, client_id: &str, repo_id: &str, branch: &str) -> IndexResult<Branch>;

    /// One commit by address.
    fn get_commit(&self, client_id: &str, repo_id: &str, addr: &Address) -> IndexResult<Commit>;
}

/// [`Index`] implementation over any transactional [`Store`].
pub struct KVIndex<S: Store, F: FlushDecider = RandomFlush> {
    store: S,
    flush: F,
}

impl<S: Store> KVIndex<S, RandomFlush> {
    /// Create an index with the default probabilistic flush gate.
    pub fn new(store: S) -> Self {
        Self {
            store,
            flush: RandomFlush,
        }
    }
}

impl<S: Store, F: FlushDecider> KVIndex<S, F> {
    /// Create an index with a caller-supplied flush decider.
    pub fn with_flush_decider(store: S, flush: F) -> Self {
        Self { store, flush }
    }

    /// Stage `entry` at `(branch, path)` and maybe fold the workspace.
    fn stage_entry(
        &self,
        tx: &mut dyn RepoWriteOps,
        repo: &Repo,
        branch: &str,
        path: &str,
        entry: WorkspaceEntry,
    ) -> IndexResult<()> {
        tx.write_to_workspace_path(branch, path, &entry)?;
        if self.flush.should_flush(repo.partial_commit_ratio) {
            partial_commit(tx, branch)?;
        }
        Ok(())
    }
}

/// The tree root reads against `branch` should use.
///
/// A known branch reads at its workspace root, so folded-but-uncommitted
/// writes are visible. An unknown branch falls back to the default
/// branch's commit root; the fallback never leaks another branch's dirty
/// workspace.
fn resolve_read_root<S: RepoReadOps + ?Sized>(
    tx: &S,
    repo: &Repo,
    branch: &str,
) -> IndexResult<Address> {
    match tx.read_branch(branch) {
        Ok(branch_data) => Ok(branch_data.workspace_root),
        Err(IndexError::NotFound) => {
            let fallback = tx.read_branch(&repo.default_branch)?;
            Ok(fallback.commit_root)
        }
        Err(e) => Err(e),
    }
}

/// Fold every staged workspace entry of `branch` into its Merkle tree.
///
/// Advances `workspace_root` only; `commit` and `commit_root` are
/// untouched. An empty workspace is a no-op, as is a branch that was
/// deleted concurrently.
fn partial_commit(tx: &mut dyn RepoWriteOps, branch: &str) -> IndexResult<()> {
    let ws_entries = tx.list_workspace(branch)?;
    if ws_entries.is_empty() {
        return Ok(());
    }

    let branch_data = match tx.read_branch(branch) {
        Ok(b) => b,
        Err(IndexError::NotFound) => return Ok(()),
        Err(e) => return Err(e),
    };

    let tree = Merkle::new(branch_data.workspace_root).update(tx, &ws_entries)?;
    tx.clear_workspace(branch)?;
    debug!(
        branch,
        folded = ws_entries.len(),
        root = %tree.root().short_hex(),
        "workspace folded into tree"
    );
    tx.write_branch(
        branch,
        &Branch {
            commit: branch_data.commit,
            commit_root: branch_data.commit_root,
            workspace_root: tree.root(),
        },
    )
}

/// Reclamation hook, invoked whenever a tree root becomes unreachable
/// (branch reset, checkout, delete). Collection policy is not implemented;
/// the call sites mark every root-abandonment point.
fn gc(_tx: &mut dyn RepoWriteOps, _root: Address) {}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl<S: Store, F: FlushDecider> Index for KVIndex<S, F> {
    fn read_object(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
    ) -> IndexResult<Object> {
        self.store.repo_read_transact(client_id, repo_id, |tx| {
            match tx.read_from_workspace(branch, path) {
                Ok(staged) => match staged.data {
                    WorkspaceData::Tombstone => Err(IndexError::NotFound),
                    WorkspaceData::Address(addr) => tx.read_object(&addr),
                },
                Err(IndexError::NotFound) => {
                    let repo = tx.read_repo()?;
                    let root = resolve_read_root(tx, &repo, branch)?;
                    Merkle::new(root).get_object(tx, path)
                }
                Err(e) => Err(e),
            }
        })
    }

    fn write_object(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
        object: &Object,
    ) -> IndexResult<()> {
        self.store.repo_transact(client_id, repo_id, |tx| {
            let addr = object_address(object)?;
            tx.write_object(&addr, object)?;
            let repo = tx.read_repo()?;
            self.stage_entry(tx, &repo, branch, path, WorkspaceEntry::write(path, addr))
        })
    }

    fn delete_object(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
    ) -> IndexResult<()> {
        self.store.repo_transact(client_id, repo_id, |tx| {
            let repo = tx.read_repo()?;
            self.stage_entry(tx, &repo, branch, path, WorkspaceEntry::tombstone(path))
        })
    }

    fn list_objects(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        path: &str,
    ) -> IndexResult<Vec<Entry>> {
        self.store.repo_transact(client_id, repo_id, |tx| {
            partial_commit(tx, branch)?;
            let repo = tx.read_repo()?;
            let root = resolve_read_root(&*tx, &repo, branch)?;
            let addr = Merkle::new(root).get_address(&*tx, path, EntryKind::Tree)?;
            tx.list_tree(&addr)
        })
    }

    fn reset_branch(&self, client_id: &str, repo_id: &str, branch: &str) -> IndexResult<()> {
        self.store.repo_transact(client_id, repo_id, |tx| {
            tx.clear_workspace(branch)?;
            let mut branch_data = tx.read_branch(branch)?;
            gc(tx, branch_data.workspace_root);
            branch_data.workspace_root = branch_data.commit_root;
            tx.write_branch(branch, &branch_data)
        })
    }

    fn commit(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        message: &str,
        committer: &str,
        metadata: BTreeMap<String, String>,
    ) -> IndexResult<()> {
        // Captured outside the transaction: the store may retry the
        // closure, and retries must hash identical commit bytes.
        let timestamp = unix_timestamp();
        self.store.repo_transact(client_id, repo_id, |tx| {
            partial_commit(tx, branch)?;
            let mut branch_data = tx.read_branch(branch)?;
            let commit = Commit {
                tree: branch_data.workspace_root,
                parents: vec![branch_data.commit],
                committer: committer.to_string(),
                message: message.to_string(),
                timestamp,
                metadata: metadata.clone(),
            };
            let commit_addr = commit_address(&commit)?;
            tx.write_commit(&commit_addr, &commit)?;
            branch_data.commit = commit_addr;
            branch_data.commit_root = commit.tree;
            branch_data.workspace_root = commit.tree;
            tx.write_branch(branch, &branch_data)
        })
    }

    fn delete_branch(&self, client_id: &str, repo_id: &str, branch: &str) -> IndexResult<()> {
        self.store.repo_transact(client_id, repo_id, |tx| {
            let branch_data = tx.read_branch(branch)?;
            tx.clear_workspace(branch)?;
            // staged and folded-but-uncommitted changes are destroyed here
            gc(tx, branch_data.workspace_root);
            tx.delete_branch(branch)
        })?;
        debug!(branch, "branch deleted");
        Ok(())
    }

    fn checkout(
        &self,
        client_id: &str,
        repo_id: &str,
        branch: &str,
        commit: &Address,
    ) -> IndexResult<()> {
        self.store.repo_transact(client_id, repo_id, |tx| {
            tx.clear_workspace(branch)?;
            let commit_data = tx.read_commit(commit)?;
            let mut branch_data = tx.read_branch(branch)?;
            gc(tx, branch_data.workspace_root);
            branch_data.commit = *commit;
            branch_data.commit_root = commit_data.tree;
            branch_data.workspace_root = commit_data.tree;
            tx.write_branch(branch, &branch_data)
        })
    }

    fn merge(
        &self,
        client_id: &str,
        repo_id: &str,
        _source: &str,
        _destination: &str,
    ) -> IndexResult<()> {
        // TODO: lowest-common-ancestor discovery and three-way tree merge;
        // the concurrency contract (what happens when source advances
        // mid-merge) is still undecided.
        self.store.repo_transact(client_id, repo_id, |_tx| Ok(()))
    }

    fn create_repo(
        &self,
        client_id: &str,
        repo_id: &str,
        default_branch: &str,
    ) -> IndexResult<()> {
        let creation_date = unix_timestamp();
        let repo = Repo {
            client_id: client_id.to_string(),
            repo_id: repo_id.to_string(),
            creation_date,
            default_branch: default_branch.to_string(),
            partial_commit_ratio: DEFAULT_PARTIAL_COMMIT_RATIO,
        };

        self.store.repo_transact(client_id, repo_id, |tx| {
            tx.write_repo(&repo)?;
            tx.write_tree(&empty_tree(), &TreeNode::empty())?;
            let commit = Commit {
                tree: empty_tree(),
                parents: Vec::new(),
                committer: String::new(),
                message: "Repository Epoch".to_string(),
                timestamp: creation_date,
                metadata: BTreeMap::new(),
            };
            let commit_addr = commit_address(&commit)?;
            tx.write_commit(&commit_addr, &commit)?;
            tx.write_branch(
                default_branch,
                &Branch {
                    commit: commit_addr,
                    commit_root: commit.tree,
                    workspace_root: commit.tree,
                },
            )
        })?;
        debug!(client = client_id, repo = repo_id, "repository created");
        Ok(())
    }

    fn list_repos(&self, client_id: &str) -> IndexResult<Vec<Repo>> {
        self.store
            .client_read_transact(client_id, |tx| tx.list_repos())
    }

    fn get_repo(&self, client_id: &str, repo_id: &str) -> IndexResult<Repo> {
        self.store
            .client_read_transact(client_id, |tx| tx.read_repo(repo_id))
    }

    fn get_branch(&self, client_id: &str, repo_id: &str, branch: &str) -> IndexResult<Branch> {
        self.store
            .repo_read_transact(client_id, repo_id, |tx| tx.read_branch(branch))
    }

    fn get_commit(&self, client_id: &str, repo_id: &str, addr: &Address) -> IndexResult<Commit> {
        self.store
            .repo_read_transact(client_id, repo_id, |tx| tx.read_commit(addr))
    }
}
