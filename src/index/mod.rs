//! Source symbol indexing.
//!
//! Declared-type and usage-site enumeration is delegated to a
//! [`SymbolIndexer`]. The rest of the crate only sees it through the
//! [`TypeIndexer`] adapter, which maps indexer failures into
//! [`FinderError::Indexing`] and honours cancellation.

pub mod lexical;

use std::path::Path;

use crate::core::error::{FinderError, Result};
use crate::core::types::{DeclaredType, UsageSite};
use crate::util::cancel::CancelToken;

pub use lexical::LexicalIndexer;

/// Lazily produced usage sites of one indexer session.
pub type UsageIter = Box<dyn Iterator<Item = anyhow::Result<UsageSite>> + Send>;

/// Everything an indexer knows about one project.
pub struct SymbolIndex {
    pub declared_types: Vec<DeclaredType>,
    pub usages: UsageIter,
}

impl std::fmt::Debug for SymbolIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolIndex")
            .field("declared_types", &self.declared_types)
            .finish_non_exhaustive()
    }
}

/// External collaborator that extracts declared types and usage sites from
/// a project's sources.
pub trait SymbolIndexer: Send + Sync {
    /// Index the project whose descriptor is at `project_path`.
    fn index(&self, project_path: &Path) -> anyhow::Result<SymbolIndex>;
}

/// Adapter over a [`SymbolIndexer`].
#[derive(Clone, Copy)]
pub struct TypeIndexer<'a> {
    indexer: &'a dyn SymbolIndexer,
}

impl<'a> TypeIndexer<'a> {
    pub fn new(indexer: &'a dyn SymbolIndexer) -> Self {
        TypeIndexer { indexer }
    }

    fn open(&self, project_path: &Path) -> Result<SymbolIndex> {
        tracing::debug!("indexing {}", project_path.display());
        self.indexer
            .index(project_path)
            .map_err(|e| indexing_error(project_path, e))
    }

    /// Declared types of a project.
    pub fn declared_types(&self, project_path: &Path) -> Result<Vec<DeclaredType>> {
        // The usage iterator is dropped unread, closing the session.
        self.open(project_path).map(|index| index.declared_types)
    }

    /// Usage sites of a project, stopping once `cancel` fires.
    pub fn usages(&self, project_path: &Path, cancel: CancelToken) -> Result<Usages> {
        let index = self.open(project_path)?;
        Ok(Usages {
            project: project_path.to_path_buf(),
            inner: Some(index.usages),
            cancel,
        })
    }
}

/// Usage-site stream of one project with errors mapped into the finder taxonomy.
pub struct Usages {
    project: std::path::PathBuf,
    inner: Option<UsageIter>,
    cancel: CancelToken,
}

impl Iterator for Usages {
    type Item = Result<UsageSite>;

    fn next(&mut self) -> Option<Self::Item> {
        let inner = self.inner.as_mut()?;
        if let Err(e) = self.cancel.check() {
            self.inner = None;
            return Some(Err(e));
        }
        match inner.next() {
            Some(Ok(site)) => Some(Ok(site)),
            Some(Err(e)) => Some(Err(indexing_error(&self.project, e))),
            None => {
                self.inner = None;
                None
            }
        }
    }
}

fn indexing_error(project: &Path, err: anyhow::Error) -> FinderError {
    FinderError::Indexing {
        project: project.to_path_buf(),
        message: format!("{:#}", err),
    }
}
