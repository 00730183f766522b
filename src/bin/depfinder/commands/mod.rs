//! Command implementations

pub mod completions;
pub mod projects;
pub mod references;
pub mod solutions;
pub mod types;
pub mod version;

use std::path::Path;

use depfinder::util::fs::relative_path;

/// Path shown to the user: relative to `base` when below it.
pub(crate) fn display_path(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(_) => relative_path(base, path).display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
