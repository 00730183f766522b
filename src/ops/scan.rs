//! Solution discovery below a root directory.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::core::error::{FinderError, Result};
use crate::core::solution::{SolutionFile, DEFAULT_PROJECT_EXTENSIONS};
use crate::util::cancel::CancelToken;
use crate::util::fs::{has_extension, ExcludeSet};

/// Default extensions of solution descriptors.
pub const DEFAULT_SOLUTION_EXTENSIONS: &[&str] = &["sln"];

/// Directory names not descended into by default.
pub const DEFAULT_EXCLUDES: &[&str] = &[".git", "node_modules", "bin", "obj"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Options for scanning a tree.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extensions identifying solution files (case-insensitive, no dot)
    pub solution_extensions: Vec<String>,
    /// Extensions identifying project entries inside a solution
    pub project_extensions: Vec<String>,
    /// Glob patterns of directories to prune
    pub exclude: Vec<String>,
    /// Follow symbolic links while walking
    pub follow_links: bool,
    pub cancel: CancelToken,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            solution_extensions: owned(DEFAULT_SOLUTION_EXTENSIONS),
            project_extensions: owned(DEFAULT_PROJECT_EXTENSIONS),
            exclude: owned(DEFAULT_EXCLUDES),
            follow_links: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Check that `root` is an existing directory and return its canonical form.
pub(crate) fn check_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(FinderError::NotFound {
            path: root.to_path_buf(),
        });
    }
    root.canonicalize().map_err(|e| FinderError::io(root, e))
}

/// Find every solution file below `root`.
///
/// Fails with `NotFound` before yielding anything if `root` is missing or not
/// a directory. Each call walks the tree afresh.
pub fn find_solutions(root: &Path, opts: &ScanOptions) -> Result<SolutionScan> {
    let root = check_root(root)?;
    debug!("scanning {} for solutions", root.display());

    let exclude = ExcludeSet::new(&opts.exclude);
    let walk_root = root.clone();
    let walker = WalkDir::new(&root)
        .follow_links(opts.follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !exclude.is_excluded(&walk_root, entry.path())
        });

    Ok(SolutionScan {
        walker: Some(Box::new(walker)),
        extensions: opts.solution_extensions.clone(),
        cancel: opts.cancel.clone(),
    })
}

/// Find the solutions below `root` that list a project named `project`
/// (case-insensitive).
///
/// Solution files that cannot be parsed are reported as per-item errors.
pub fn find_solution_with_project(
    root: &Path,
    project: &str,
    opts: &ScanOptions,
) -> Result<impl Iterator<Item = Result<PathBuf>>> {
    let scan = find_solutions(root, opts)?;
    let project = project.to_string();
    let extensions = opts.project_extensions.clone();

    Ok(scan.filter_map(move |item| match item {
        Ok(path) => match SolutionFile::load(&path) {
            Ok(solution) if solution.contains_project(&project, &extensions) => Some(Ok(path)),
            Ok(_) => {
                debug!("{} does not list {}", path.display(), project);
                None
            }
            Err(e) => Some(Err(e)),
        },
        Err(e) => Some(Err(e)),
    }))
}

type Walker = Box<dyn Iterator<Item = walkdir::Result<walkdir::DirEntry>> + Send>;

/// Lazy stream of solution paths.
///
/// Unreadable directories are yielded as `Io` errors and the walk goes on.
/// Once the cancel token fires, a single `Cancelled` error is yielded and the
/// stream ends.
pub struct SolutionScan {
    walker: Option<Walker>,
    extensions: Vec<String>,
    cancel: CancelToken,
}

impl Iterator for SolutionScan {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let walker = self.walker.as_mut()?;
            if let Err(e) = self.cancel.check() {
                self.walker = None;
                return Some(Err(e));
            }

            match walker.next() {
                None => {
                    self.walker = None;
                    return None;
                }
                Some(Ok(entry)) => {
                    if entry.file_type().is_file()
                        && has_extension(entry.path(), &self.extensions)
                    {
                        return Some(Ok(entry.into_path()));
                    }
                }
                Some(Err(e)) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let message = e.to_string();
                    return Some(Err(FinderError::Io { path, message }));
                }
            }
        }
    }
}
