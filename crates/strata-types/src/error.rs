//! The shared error type for the Strata index.

use crate::model::EntryKind;

/// Errors surfaced by index, store, and tree operations.
///
/// `NotFound` is the one sentinel callers branch on: a workspace miss, a
/// missing branch, a missing path in a tree, and a missing repo all report
/// it, and several code paths treat it as a signal rather than a failure
/// (workspace miss falls through to a tree read; a partial commit against a
/// concurrently deleted branch is a no-op). Everything else aborts the
/// enclosing transaction and reaches the caller unmodified.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The requested entity (repo, branch, commit, object, path) does not exist.
    #[error("not found")]
    NotFound,

    /// A malformed path: empty segment, leading slash, or an empty path
    /// where a named entry is required.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A tree walk resolved the path to an entry of the wrong kind.
    #[error("entry kind mismatch at {path:?}: expected {expected}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: EntryKind,
        actual: EntryKind,
    },

    /// The transaction was aborted by concurrent modification after the
    /// backend's retry budget was exhausted.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// Canonical encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other failure from the key-value backend.
    #[error("store error: {0}")]
    Store(String),
}

impl IndexError {
    /// Returns `true` for the `NotFound` sentinel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound)
    }
}

/// Result alias used across all Strata crates.
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished() {
        assert!(IndexError::NotFound.is_not_found());
        assert!(!IndexError::Store("io".into()).is_not_found());
        assert!(!IndexError::InvalidPath("//".into()).is_not_found());
    }

    #[test]
    fn type_mismatch_message_names_kinds() {
        let err = IndexError::TypeMismatch {
            path: "a/b".into(),
            expected: EntryKind::Tree,
            actual: EntryKind::Object,
        };
        let msg = err.to_string();
        assert!(msg.contains("tree"));
        assert!(msg.contains("object"));
    }
}
