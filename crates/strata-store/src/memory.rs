//! In-memory transactional backend for tests and embedding.
//!
//! [`InMemoryStore`] keeps every `(client, repo)` partition in `BTreeMap`s
//! behind one `Mutex`. Holding the lock for the whole transaction makes
//! every transaction trivially serializable, so the closure runs at most
//! once. Writes go to a scratch clone of the partition that is published
//! only when the closure returns `Ok`, which gives the all-or-nothing
//! contract of [`Store`].

use std::collections::BTreeMap;
use std::sync::Mutex;

use strata_types::{
    Address, Branch, Commit, Entry, IndexError, IndexResult, Object, Repo, TreeNode,
    WorkspaceEntry,
};

use crate::traits::{ClientReadOps, RepoReadOps, RepoWriteOps, Store};

/// One `(client, repo)` partition of the keyspace.
#[derive(Clone, Default)]
struct RepoPartition {
    repo: Option<Repo>,
    branches: BTreeMap<String, Branch>,
    /// branch name -> path -> staged entry; `BTreeMap` keeps workspace
    /// enumeration ordered by path.
    workspaces: BTreeMap<String, BTreeMap<String, WorkspaceEntry>>,
    commits: BTreeMap<Address, Commit>,
    trees: BTreeMap<Address, TreeNode>,
    objects: BTreeMap<Address, Object>,
}

impl RepoPartition {
    fn read_repo(&self) -> IndexResult<Repo> {
        self.repo.clone().ok_or(IndexError::NotFound)
    }

    fn read_branch(&self, branch: &str) -> IndexResult<Branch> {
        self.branches.get(branch).cloned().ok_or(IndexError::NotFound)
    }

    fn read_from_workspace(&self, branch: &str, path: &str) -> IndexResult<WorkspaceEntry> {
        self.workspaces
            .get(branch)
            .and_then(|ws| ws.get(path))
            .cloned()
            .ok_or(IndexError::NotFound)
    }

    fn read_commit(&self, addr: &Address) -> IndexResult<Commit> {
        self.commits.get(addr).cloned().ok_or(IndexError::NotFound)
    }

    fn read_tree(&self, addr: &Address) -> IndexResult<TreeNode> {
        self.trees.get(addr).cloned().ok_or(IndexError::NotFound)
    }

    fn read_object(&self, addr: &Address) -> IndexResult<Object> {
        self.objects.get(addr).cloned().ok_or(IndexError::NotFound)
    }

    fn list_tree(&self, addr: &Address) -> IndexResult<Vec<Entry>> {
        self.trees
            .get(addr)
            .map(|t| t.entries.clone())
            .ok_or(IndexError::NotFound)
    }
}

#[derive(Default)]
struct StoreState {
    /// client id -> repo id -> partition.
    clients: BTreeMap<String, BTreeMap<String, RepoPartition>>,
}

/// An in-memory implementation of [`Store`].
///
/// Data is lost when the store is dropped. Suitable for unit tests and
/// short-lived embedders; production deployments back the same traits with
/// a transactional key-value database.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let clients = match self.state.lock() {
            Ok(state) => state.clients.len(),
            Err(_) => 0,
        };
        f.debug_struct("InMemoryStore")
            .field("client_count", &clients)
            .finish()
    }
}

struct ClientReadTx<'a> {
    repos: &'a BTreeMap<String, RepoPartition>,
}

impl ClientReadOps for ClientReadTx<'_> {
    fn list_repos(&self) -> IndexResult<Vec<Repo>> {
        Ok(self.repos.values().filter_map(|p| p.repo.clone()).collect())
    }

    fn read_repo(&self, repo_id: &str) -> IndexResult<Repo> {
        self.repos
            .get(repo_id)
            .and_then(|p| p.repo.clone())
            .ok_or(IndexError::NotFound)
    }
}

struct RepoReadTx<'a> {
    part: &'a RepoPartition,
}

impl RepoReadOps for RepoReadTx<'_> {
    fn read_repo(&self) -> IndexResult<Repo> {
        self.part.read_repo()
    }

    fn read_branch(&self, branch: &str) -> IndexResult<Branch> {
        self.part.read_branch(branch)
    }

    fn read_from_workspace(&self, branch: &str, path: &str) -> IndexResult<WorkspaceEntry> {
        self.part.read_from_workspace(branch, path)
    }

    fn read_commit(&self, addr: &Address) -> IndexResult<Commit> {
        self.part.read_commit(addr)
    }

    fn read_tree(&self, addr: &Address) -> IndexResult<TreeNode> {
        self.part.read_tree(addr)
    }

    fn read_object(&self, addr: &Address) -> IndexResult<Object> {
        self.part.read_object(addr)
    }

    fn list_tree(&self, addr: &Address) -> IndexResult<Vec<Entry>> {
        self.part.list_tree(addr)
    }
}

struct RepoWriteTx<'a> {
    part: &'a mut RepoPartition,
}

impl RepoReadOps for RepoWriteTx<'_> {
    fn read_repo(&self) -> IndexResult<Repo> {
        self.part.read_repo()
    }

    fn read_branch(&self, branch: &str) -> IndexResult<Branch> {
        self.part.read_branch(branch)
    }

    fn read_from_workspace(&self, branch: &str, path: &str) -> IndexResult<WorkspaceEntry> {
        self.part.read_from_workspace(branch, path)
    }

    fn read_commit(&self, addr: &Address) -> IndexResult<Commit> {
        self.part.read_commit(addr)
    }

    fn read_tree(&self, addr: &Address) -> IndexResult<TreeNode> {
        self.part.read_tree(addr)
    }

    fn read_object(&self, addr: &Address) -> IndexResult<Object> {
        self.part.read_object(addr)
    }

    fn list_tree(&self, addr: &Address) -> IndexResult<Vec<Entry>> {
        self.part.list_tree(addr)
    }
}

impl RepoWriteOps for RepoWriteTx<'_> {
    fn write_repo(&mut self, repo: &Repo) -> IndexResult<()> {
        self.part.repo = Some(repo.clone());
        Ok(())
    }

    fn write_branch(&mut self, name: &str, branch: &Branch) -> IndexResult<()> {
        self.part.branches.insert(name.to_string(), branch.clone());
        Ok(())
    }

    fn delete_branch(&mut self, name: &str) -> IndexResult<()> {
        self.part.branches.remove(name);
        Ok(())
    }

    fn write_to_workspace_path(
        &mut self,
        branch: &str,
        path: &str,
        entry: &WorkspaceEntry,
    ) -> IndexResult<()> {
        self.part
            .workspaces
            .entry(branch.to_string())
            .or_default()
            .insert(path.to_string(), entry.clone());
        Ok(())
    }

    fn list_workspace(&self, branch: &str) -> IndexResult<Vec<WorkspaceEntry>> {
        Ok(self
            .part
            .workspaces
            .get(branch)
            .map(|ws| ws.values().cloned().collect())
            .unwrap_or_default())
    }

    fn clear_workspace(&mut self, branch: &str) -> IndexResult<()> {
        self.part.workspaces.remove(branch);
        Ok(())
    }

    fn write_commit(&mut self, addr: &Address, commit: &Commit) -> IndexResult<()> {
        // Write-once: content addressing guarantees identical payloads.
        self.part.commits.entry(*addr).or_insert_with(|| commit.clone());
        Ok(())
    }

    fn write_tree(&mut self, addr: &Address, tree: &TreeNode) -> IndexResult<()> {
        self.part.trees.entry(*addr).or_insert_with(|| tree.clone());
        Ok(())
    }

    fn write_object(&mut self, addr: &Address, object: &Object) -> IndexResult<()> {
        self.part.objects.entry(*addr).or_insert_with(|| object.clone());
        Ok(())
    }
}

impl Store for InMemoryStore {
    fn client_read_transact<T, F>(&self, client_id: &str, mut f: F) -> IndexResult<T>
    where
        F: FnMut(&dyn ClientReadOps) -> IndexResult<T>,
    {
        let state = self
            .state
            .lock()
            .map_err(|e| IndexError::Store(format!("lock poisoned: {e}")))?;
        let empty = BTreeMap::new();
        let repos = state.clients.get(client_id).unwrap_or(&empty);
        f(&ClientReadTx { repos })
    }

    fn repo_read_transact<T, F>(&self, client_id: &str, repo_id: &str, mut f: F) -> IndexResult<T>
    where
        F: FnMut(&dyn RepoReadOps) -> IndexResult<T>,
    {
        let state = self
            .state
            .lock()
            .map_err(|e| IndexError::Store(format!("lock poisoned: {e}")))?;
        let empty = RepoPartition::default();
        let part = state
            .clients
            .get(client_id)
            .and_then(|repos| repos.get(repo_id))
            .unwrap_or(&empty);
        f(&RepoReadTx { part })
    }

    fn repo_transact<T, F>(&self, client_id: &str, repo_id: &str, mut f: F) -> IndexResult<T>
    where
        F: FnMut(&mut dyn RepoWriteOps) -> IndexResult<T>,
    {
        let mut state = self
            .state
            .lock()
            .map_err(|e| IndexError::Store(format!("lock poisoned: {e}")))?;

        // Run the closure against a scratch copy of the partition; publish
        // it only on success so an aborted transaction leaves no trace.
        let mut scratch = state
            .clients
            .get(client_id)
            .and_then(|repos| repos.get(repo_id))
            .cloned()
            .unwrap_or_default();
        let value = f(&mut RepoWriteTx { part: &mut scratch })?;
        state
            .clients
            .entry(client_id.to_string())
            .or_default()
            .insert(repo_id.to_string(), scratch);
        Ok(value)
    }
}
