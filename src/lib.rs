//! depfinder - cross-solution type reference finder
//!
//! This crate discovers solution files below a root directory, parses the
//! projects they list, builds a reference graph per solution and reports
//! every usage of a declared type by the projects that depend on its
//! declaring project.

pub mod core;
pub mod index;
pub mod ops;
pub mod resolver;
pub mod util;

/// Fixture trees and scripted indexers for unit tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    error::FinderError, project::Project, solution::SolutionFile, types::Reference,
    version::VersionIdentifier,
};
pub use index::{LexicalIndexer, SymbolIndexer};
pub use resolver::{find_all_references, FindOptions, ReferenceStream};
pub use util::context::GlobalContext;
