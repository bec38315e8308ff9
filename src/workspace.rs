//! Workspace boundary enforcement
//!
//! Every file-system-facing tool resolves its path arguments through a
//! [`WorkspaceBoundary`] before any I/O happens. A path is in bounds iff its
//! canonical form equals the canonical workspace root or sits strictly below
//! it. Traversal components (`..`), mixed relative/absolute forms, and
//! symlinks pointing outside the root all resolve to a violation.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from boundary construction and validation
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("Workspace root {path} is not accessible: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path {path} escapes workspace {root}")]
    Escape { path: PathBuf, root: PathBuf },

    #[error("Malformed path: {0}")]
    Malformed(String),
}

/// The single root directory outside of which no read may occur
///
/// The root is canonicalized once at construction; all validation compares
/// against that canonical form.
#[derive(Debug, Clone)]
pub struct WorkspaceBoundary {
    root: PathBuf,
}

impl WorkspaceBoundary {
    /// Create a boundary rooted at `root`
    ///
    /// Fails if the root does not exist or cannot be canonicalized.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, BoundaryError> {
        let root = root.into();
        let canonical = root.canonicalize().map_err(|source| BoundaryError::RootUnavailable {
            path: root.clone(),
            source,
        })?;
        debug!(root = %canonical.display(), "WorkspaceBoundary::new");
        Ok(Self { root: canonical })
    }

    /// The canonical workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a candidate path against the boundary
    ///
    /// Relative candidates are resolved against the root. Returns the
    /// canonical in-bounds path, or an error naming the violation. Never
    /// panics on malformed input.
    pub fn validate(&self, candidate: &Path) -> Result<PathBuf, BoundaryError> {
        if candidate.as_os_str().is_empty() {
            return Err(BoundaryError::Malformed("empty path".to_string()));
        }

        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let normalized = normalize(&joined);

        // Canonicalize when possible so symlinks cannot smuggle reads out of
        // the workspace. Nonexistent paths fall back to the lexical form;
        // the read itself will then fail with not-found, not a violation.
        let resolved = if normalized.exists() {
            normalized.canonicalize().unwrap_or(normalized)
        } else {
            normalized
        };

        if resolved == self.root || resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            debug!(path = %candidate.display(), root = %self.root.display(), "boundary violation");
            Err(BoundaryError::Escape {
                path: candidate.to_path_buf(),
                root: self.root.clone(),
            })
        }
    }

    /// Check containment without producing the resolved path
    pub fn contains(&self, candidate: &Path) -> bool {
        self.validate(candidate).is_ok()
    }

    /// Render a resolved path relative to the root for display
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the filesystem root stays at the root, which
                // mirrors how the OS resolves "/.."
                out.pop();
            }
            Component::Normal(seg) => out.push(seg),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_validate_relative_inside() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.rs"), "").unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        let resolved = boundary.validate(Path::new("a.rs")).unwrap();
        assert!(resolved.starts_with(boundary.root()));
    }

    #[test]
    fn test_validate_absolute_inside() {
        let temp = tempdir().unwrap();
        let sub = temp.path().join("src");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("lib.rs"), "").unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        let resolved = boundary.validate(&sub.join("lib.rs")).unwrap();
        assert!(resolved.starts_with(boundary.root()));
    }

    #[test]
    fn test_root_itself_is_valid() {
        let temp = tempdir().unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        assert!(boundary.validate(Path::new(".")).is_ok());
        assert_eq!(boundary.validate(boundary.root()).unwrap(), boundary.root());
    }

    #[test]
    fn test_traversal_escape_rejected() {
        let temp = tempdir().unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        let result = boundary.validate(Path::new("../etc/passwd"));
        assert!(matches!(result, Err(BoundaryError::Escape { .. })));

        let sneaky = temp.path().join("src/../../outside.txt");
        let result = boundary.validate(&sneaky);
        assert!(matches!(result, Err(BoundaryError::Escape { .. })));
    }

    #[test]
    fn test_absolute_outside_rejected() {
        let temp = tempdir().unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        let result = boundary.validate(Path::new("/etc/passwd"));
        assert!(matches!(result, Err(BoundaryError::Escape { .. })));
    }

    #[test]
    fn test_traversal_that_returns_inside_is_valid() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        // Climbs out of src/ but lands back inside the root
        assert!(boundary.validate(Path::new("src/../src")).is_ok());
    }

    #[test]
    fn test_symlink_escape_rejected() {
        let temp = tempdir().unwrap();
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();

        let link = temp.path().join("link");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();
        let result = boundary.validate(&link.join("secret.txt"));
        assert!(matches!(result, Err(BoundaryError::Escape { .. })));
    }

    #[test]
    fn test_empty_path_is_malformed() {
        let temp = tempdir().unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        let result = boundary.validate(Path::new(""));
        assert!(matches!(result, Err(BoundaryError::Malformed(_))));
    }

    #[test]
    fn test_missing_root_fails() {
        let result = WorkspaceBoundary::new("/definitely/not/a/real/root");
        assert!(matches!(result, Err(BoundaryError::RootUnavailable { .. })));
    }

    #[test]
    fn test_nonexistent_path_inside_is_in_bounds() {
        let temp = tempdir().unwrap();
        let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

        // Validation is about bounds, not existence; the read reports not-found
        assert!(boundary.validate(Path::new("no_such_file.txt")).is_ok());
    }

    #[test]
    fn test_normalize_mixed_components() {
        let normalized = normalize(Path::new("/repo/./src/../src/a.ts"));
        assert_eq!(normalized, PathBuf::from("/repo/src/a.ts"));

        let normalized = normalize(Path::new("/repo/../etc/passwd"));
        assert_eq!(normalized, PathBuf::from("/etc/passwd"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn segment() -> impl Strategy<Value = String> {
            "[a-z]{1,8}"
        }

        proptest! {
            // Any candidate built purely from normal segments under the root
            // must validate, and the resolved path must stay under the root.
            #[test]
            fn inside_paths_always_validate(segs in prop::collection::vec(segment(), 1..5)) {
                let temp = tempdir().unwrap();
                let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

                let candidate = segs.iter().collect::<PathBuf>();
                let resolved = boundary.validate(&candidate).unwrap();
                prop_assert!(resolved.starts_with(boundary.root()));
            }

            // Prepending more parent components than path depth always escapes.
            #[test]
            fn climbing_above_root_always_escapes(
                segs in prop::collection::vec(segment(), 0..4),
                extra_ups in 1usize..4,
            ) {
                let temp = tempdir().unwrap();
                let boundary = WorkspaceBoundary::new(temp.path()).unwrap();

                let mut candidate = PathBuf::new();
                for _ in 0..segs.len() + extra_ups {
                    candidate.push("..");
                }
                for seg in &segs {
                    candidate.push(seg);
                }

                // Escapes unless the climb happens to land back on the root's
                // own ancestors and then walk down into it, which these
                // generated segments cannot do (the root is a fresh tempdir).
                prop_assert!(!boundary.contains(&candidate));
            }
        }
    }
}
