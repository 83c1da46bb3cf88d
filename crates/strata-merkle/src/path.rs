//! Path handling for tree walks.
//!
//! Paths are forward-slash separated with no leading slash. The empty path
//! names the root tree itself.

use strata_types::{IndexError, IndexResult};

/// Split a path into its components.
///
/// Rejects empty segments, which rules out leading slashes, trailing
/// slashes and `a//b`. The empty path splits to no components.
pub fn split(path: &str) -> IndexResult<Vec<&str>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let parts: Vec<&str> = path.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_names_the_root() {
        assert!(split("").unwrap().is_empty());
    }

    #[test]
    fn single_component() {
        assert_eq!(split("file.txt").unwrap(), vec!["file.txt"]);
    }

    #[test]
    fn nested_components() {
        assert_eq!(split("a/b/c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_leading_slash() {
        assert!(matches!(
            split("/a/b"),
            Err(IndexError::InvalidPath(_))
        ));
    }

    #[test]
    fn rejects_trailing_slash() {
        assert!(split("a/b/").is_err());
    }

    #[test]
    fn rejects_empty_segment() {
        assert!(split("a//b").is_err());
    }
}
