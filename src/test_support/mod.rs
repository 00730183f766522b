//! Test utilities for depfinder unit tests.
//!
//! Provides fixture trees written to temporary directories and indexers
//! with scripted behaviour.
//!
//! # Example
//!
//! ```rust,ignore
//! use depfinder::test_support::{ProjectFixture, SolutionFixture};
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! SolutionFixture::new("W1")
//!     .with_project(ProjectFixture::new("Core"))
//!     .with_project(ProjectFixture::new("App").with_project_ref("Core"))
//!     .write_to(&tmp.path().join("w1"))
//!     .unwrap();
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};

use crate::core::types::{DeclaredType, UsageSite};
use crate::index::{SymbolIndex, SymbolIndexer};

pub use fixtures::*;

/// Indexer with scripted results keyed by project file stem.
#[derive(Debug, Default)]
pub struct MockIndexer {
    declared: HashMap<String, Vec<DeclaredType>>,
    usages: HashMap<String, Vec<String>>,
    failing: Vec<String>,
    calls: Mutex<Vec<PathBuf>>,
}

impl MockIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Types declared by `project`.
    pub fn declare(mut self, project: &str, types: Vec<DeclaredType>) -> Self {
        self.declared.insert(project.to_string(), types);
        self
    }

    /// Type names `project` uses; one usage site per name, on consecutive lines.
    pub fn uses(mut self, project: &str, types: &[&str]) -> Self {
        self.usages.insert(
            project.to_string(),
            types.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Make indexing `project` fail.
    pub fn failing(mut self, project: &str) -> Self {
        self.failing.push(project.to_string());
        self
    }

    /// Project descriptors indexed so far.
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl SymbolIndexer for MockIndexer {
    fn index(&self, project_path: &Path) -> Result<SymbolIndex> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(project_path.to_path_buf());
        }
        let name = stem(project_path);
        if self.failing.contains(&name) {
            bail!("cannot index {name}");
        }

        let file = project_path.with_file_name("Usages.cs");
        let sites: Vec<_> = self
            .usages
            .get(&name)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, ty)| {
                Ok(UsageSite {
                    referenced_type: ty,
                    file: file.clone(),
                    line: i + 1,
                    column: 9,
                })
            })
            .collect();

        Ok(SymbolIndex {
            declared_types: self.declared.get(&name).cloned().unwrap_or_default(),
            usages: Box::new(sites.into_iter()),
        })
    }
}

/// Wraps an indexer and tracks how many sessions are alive.
#[derive(Debug)]
pub struct CountingIndexer<I> {
    inner: I,
    live: Arc<AtomicUsize>,
    opened: AtomicUsize,
}

impl<I: SymbolIndexer> CountingIndexer<I> {
    pub fn new(inner: I) -> Self {
        CountingIndexer {
            inner,
            live: Arc::new(AtomicUsize::new(0)),
            opened: AtomicUsize::new(0),
        }
    }

    /// Sessions opened and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Sessions opened in total.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

struct Session {
    inner: crate::index::UsageIter,
    live: Arc<AtomicUsize>,
}

impl Iterator for Session {
    type Item = Result<UsageSite>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<I: SymbolIndexer> SymbolIndexer for CountingIndexer<I> {
    fn index(&self, project_path: &Path) -> Result<SymbolIndex> {
        let index = self.inner.index(project_path)?;
        self.live.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(SymbolIndex {
            declared_types: index.declared_types,
            usages: Box::new(Session {
                inner: index.usages,
                live: Arc::clone(&self.live),
            }),
        })
    }
}

/// Assertion helpers for testing.
pub mod assertions {
    use crate::core::error::FinderError;

    /// Assert that a result is Ok and return the value.
    pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
        match result {
            Ok(v) => v,
            Err(e) => panic!("expected Ok, got Err: {:?}", e),
        }
    }

    /// Assert that a result is Err and return the error.
    pub fn assert_err<T: std::fmt::Debug, E>(result: Result<T, E>) -> E {
        match result {
            Ok(v) => panic!("expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    }

    /// Assert that an error is `NotFound`.
    pub fn assert_not_found(err: &FinderError) {
        assert!(
            matches!(err, FinderError::NotFound { .. }),
            "expected NotFound, got {:?}",
            err
        );
    }

    /// Assert that an error is `MalformedDescriptor`.
    pub fn assert_malformed(err: &FinderError) {
        assert!(
            matches!(err, FinderError::MalformedDescriptor { .. }),
            "expected MalformedDescriptor, got {:?}",
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TypeKind;
    use tempfile::TempDir;

    #[test]
    fn test_fixture_tree_layout() {
        let tmp = TempDir::new().unwrap();
        let sln = SolutionFixture::new("W1")
            .with_folder("Solution Items")
            .with_project(ProjectFixture::new("Core"))
            .with_project(ProjectFixture::new("App").with_project_ref("Core"))
            .write_to(tmp.path())
            .unwrap();

        assert!(sln.ends_with("W1.sln"));
        assert!(tmp.path().join("Core/Core.csproj").is_file());
        let app = std::fs::read_to_string(tmp.path().join("App/App.csproj")).unwrap();
        assert!(app.contains(r#"<ProjectReference Include="..\Core\Core.csproj" />"#));

        let content = std::fs::read_to_string(&sln).unwrap();
        assert!(content.contains(r#""App", "App\App.csproj""#));
        assert!(content.contains(crate::core::solution::SOLUTION_FOLDER_TYPE));
    }

    #[test]
    fn test_mock_indexer() {
        let indexer = MockIndexer::new()
            .declare("Core", vec![DeclaredType::new("Core.Widget", TypeKind::Class)])
            .uses("App", &["Widget", "Other"])
            .failing("Broken");

        let app = indexer.index(Path::new("/w/App/App.csproj")).unwrap();
        assert!(app.declared_types.is_empty());
        let lines: Vec<_> = app.usages.map(|u| u.unwrap().line).collect();
        assert_eq!(lines, vec![1, 2]);

        assert!(indexer.index(Path::new("/w/Broken/Broken.csproj")).is_err());
        assert_eq!(indexer.calls().len(), 2);
    }

    #[test]
    fn test_counting_indexer_tracks_sessions() {
        let indexer = CountingIndexer::new(MockIndexer::new().uses("App", &["Widget"]));

        let session = indexer.index(Path::new("/w/App/App.csproj")).unwrap();
        assert_eq!(indexer.live(), 1);
        drop(session);
        assert_eq!(indexer.live(), 0);
        assert_eq!(indexer.opened(), 1);
    }

    #[test]
    fn test_assertions() {
        use assertions::*;

        let ok_result: Result<i32, &str> = Ok(42);
        assert_eq!(assert_ok(ok_result), 42);

        let err_result: Result<i32, &str> = Err("error");
        assert_eq!(assert_err(err_result), "error");
    }
}
