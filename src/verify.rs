//! Path validation for entries accepted into the index. Grounded on
//! `original_source/update-cache.c`'s `verify_path()`: a path is rejected
//! if it is empty, absolute, or has any component that is empty or begins
//! with `.` (this catches `.`, `..`, and dotfile-led traversal attempts
//! alike — a deliberately blunter rule than a git-style `..`-only check).

use std::path::Path;

use crate::error::DircacheError;

pub fn verify_path(path: &str) -> Result<(), DircacheError> {
    if path.is_empty() {
        return Err(DircacheError::InvalidPath(path.into()));
    }
    if Path::new(path).is_absolute() {
        return Err(DircacheError::InvalidPath(path.into()));
    }

    for component in path.split('/') {
        if component.is_empty() || component.starts_with('.') {
            return Err(DircacheError::InvalidPath(path.into()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_relative_paths() {
        assert!(verify_path("a.txt").is_ok());
        assert!(verify_path("src/lib.rs").is_ok());
    }

    #[test]
    fn rejects_empty_path() {
        assert!(verify_path("").is_err());
    }

    #[test]
    fn rejects_absolute_path() {
        assert!(verify_path("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_dot_prefixed_component() {
        assert!(verify_path(".git/config").is_err());
        assert!(verify_path("src/../lib.rs").is_err());
        assert!(verify_path("./a.txt").is_err());
    }

    #[test]
    fn rejects_empty_component_from_double_slash() {
        assert!(verify_path("a//b").is_err());
        assert!(verify_path("a/").is_err());
    }
}
