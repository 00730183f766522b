//! Core data structures for depfinder.
//!
//! This module contains the foundational types used throughout depfinder:
//! - Version identifiers with label-insensitive ordering
//! - Solution and project descriptors
//! - Declared types, usage sites and references
//! - The error taxonomy

pub mod error;
pub mod project;
pub mod solution;
pub mod types;
pub mod version;

pub use error::{FinderError, Result};
pub use project::{AssemblyInfo, PackageReference, Project, ProjectDetails, ProjectReference};
pub use solution::{SolutionEntry, SolutionFile};
pub use types::{DeclaredType, Reference, TypeDetails, TypeKind, UsageSite};
pub use version::VersionIdentifier;
