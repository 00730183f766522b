//! Filesystem utilities.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;

use crate::core::error::{FinderError, Result};

/// Read a file to string, mapping failures into the finder taxonomy.
pub fn read_to_string(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FinderError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(FinderError::io(path, e)),
    }
}

/// Canonicalize a path, falling back to lexical normalization if it doesn't exist.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .unwrap_or_else(|_| normalize_lexically(path))
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Check whether `path` has one of `extensions` (case-insensitive, no dot).
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
}

/// Compiled exclude patterns, matched against a directory name or a path
/// relative to the walk root.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    /// Compile glob patterns; invalid patterns are skipped with a warning.
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("ignoring invalid exclude pattern `{}`: {}", p, e);
                    None
                }
            })
            .collect();
        ExcludeSet { patterns }
    }

    /// Whether `path` (below `root`) should be excluded.
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let relative = relative_path(root, path);
        let relative = relative.to_string_lossy().replace('\\', "/");

        self.patterns
            .iter()
            .any(|p| p.matches(name) || p.matches(&relative))
    }
}
