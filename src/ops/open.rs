//! Opening solutions and the projects they list.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use crate::core::error::{FinderError, Result};
use crate::core::project::Project;
use crate::core::solution::{SolutionEntry, SolutionFile, DEFAULT_PROJECT_EXTENSIONS};
use crate::core::types::TypeDetails;
use crate::index::{SymbolIndexer, TypeIndexer};
use crate::util::cancel::CancelToken;

/// Options for opening a solution.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Extensions of entries that are loaded as projects
    pub project_extensions: Vec<String>,
    pub cancel: CancelToken,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            project_extensions: DEFAULT_PROJECT_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cancel: CancelToken::new(),
        }
    }
}

/// An opened solution with every listed project loaded or failed.
#[derive(Debug)]
pub struct Solution {
    file: SolutionFile,
    units: Vec<(SolutionEntry, Result<Project>)>,
}

impl Solution {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// All solution entries, including folders and non-project items.
    pub fn entries(&self) -> &[SolutionEntry] {
        self.file.entries()
    }

    /// Project entries paired with their load result, in declaration order.
    pub fn units(&self) -> &[(SolutionEntry, Result<Project>)] {
        &self.units
    }

    /// Successfully loaded projects, in declaration order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.units.iter().filter_map(|(_, p)| p.as_ref().ok())
    }

    /// Projects that failed to load, in declaration order.
    pub fn failures(&self) -> impl Iterator<Item = &FinderError> {
        self.units.iter().filter_map(|(_, p)| p.as_ref().err())
    }

    /// Whether a project entry is named `name`, see [`SolutionEntry::is_named`].
    pub fn has_project(&self, name: &str) -> bool {
        self.units.iter().any(|(entry, _)| entry.is_named(name))
    }

    pub fn into_units(self) -> Vec<(SolutionEntry, Result<Project>)> {
        self.units
    }
}

/// Open a solution file and load every project it lists.
///
/// A missing file is `NotFound` and a structurally invalid one is
/// `MalformedDescriptor`. Per-project failures are kept alongside the loaded
/// projects rather than failing the solution.
pub fn open_solution(path: &Path, opts: &OpenOptions) -> Result<Solution> {
    opts.cancel.check()?;
    let file = SolutionFile::load(path)?;
    debug!(
        "opened {} ({} entries)",
        path.display(),
        file.entries().len()
    );

    let entries: Vec<SolutionEntry> = file.projects(&opts.project_extensions).cloned().collect();
    let solution_path = file.path().to_path_buf();

    let units = entries
        .into_par_iter()
        .map(|entry| {
            let project = Project::load(&entry.path, &solution_path);
            if let Err(e) = &project {
                debug!("failed to load {}: {}", entry.path.display(), e);
            }
            (entry, project)
        })
        .collect();

    Ok(Solution { file, units })
}

/// Types declared by a project, viewed in the context of `solution_path`.
pub fn get_project_types(
    project_path: &Path,
    solution_path: &Path,
    indexer: &dyn SymbolIndexer,
) -> Result<Vec<TypeDetails>> {
    if !project_path.is_file() {
        return Err(FinderError::NotFound {
            path: project_path.to_path_buf(),
        });
    }

    let types = TypeIndexer::new(indexer).declared_types(project_path)?;
    Ok(types
        .iter()
        .map(|t| {
            TypeDetails::new(
                t,
                project_path.to_path_buf(),
                PathBuf::from(solution_path),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{DeclaredType, TypeKind};
    use crate::test_support::assertions::{assert_malformed, assert_not_found};
    use crate::test_support::{MockIndexer, ProjectFixture, SolutionFixture};
    use tempfile::TempDir;

    #[test]
    fn test_open_solution_loads_projects_in_order() {
        let tmp = TempDir::new().unwrap();
        let sln = SolutionFixture::new("W1")
            .with_folder("Solution Items")
            .with_project(ProjectFixture::new("Core"))
            .with_missing_project("Gone")
            .with_project(
                ProjectFixture::new("App")
                    .with_project_ref("Core")
                    .with_property("OutputType", "Exe"),
            )
            .write_to(tmp.path())
            .unwrap();

        let solution = open_solution(&sln, &OpenOptions::default()).unwrap();
        assert_eq!(solution.entries().len(), 4);

        let names: Vec<_> = solution.projects().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Core", "App"]);
        assert!(solution.projects().all(|p| p.solution_path() == sln));

        let failures: Vec<_> = solution.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_not_found(failures[0]);

        assert!(solution.has_project("core"));
        assert!(solution.has_project("Gone"));
        assert!(!solution.has_project("Solution Items"));
    }

    #[test]
    fn test_open_solution_errors() {
        let tmp = TempDir::new().unwrap();
        let err = open_solution(&tmp.path().join("Missing.sln"), &OpenOptions::default())
            .unwrap_err();
        assert_not_found(&err);

        let bad = tmp.path().join("Bad.sln");
        std::fs::write(&bad, "EndProject\n").unwrap();
        let err = open_solution(&bad, &OpenOptions::default()).unwrap_err();
        assert_malformed(&err);
    }

    #[test]
    fn test_malformed_project_is_a_failure_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let sln = SolutionFixture::new("W1")
            .with_project(ProjectFixture::new("Core"))
            .write_to(tmp.path())
            .unwrap();
        std::fs::write(tmp.path().join("Core/Core.csproj"), "<Project><Oops></Project>").unwrap();

        let solution = open_solution(&sln, &OpenOptions::default()).unwrap();
        assert_eq!(solution.projects().count(), 0);
        let failures: Vec<_> = solution.failures().collect();
        assert_malformed(failures[0]);
    }

    #[test]
    fn test_open_after_cancel() {
        let tmp = TempDir::new().unwrap();
        let sln = SolutionFixture::new("W1").write_to(tmp.path()).unwrap();
        let opts = OpenOptions::default();
        opts.cancel.cancel();
        assert!(open_solution(&sln, &opts).unwrap_err().is_cancelled());
    }

    #[test]
    fn test_get_project_types() {
        let tmp = TempDir::new().unwrap();
        let sln = SolutionFixture::new("W1")
            .with_project(ProjectFixture::new("Core"))
            .write_to(tmp.path())
            .unwrap();
        let project = tmp.path().join("Core/Core.csproj");
        let indexer = MockIndexer::new().declare(
            "Core",
            vec![DeclaredType::new("Contoso.Core.Widget", TypeKind::Class)],
        );

        let types = get_project_types(&project, &sln, &indexer).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name, "Widget");
        assert_eq!(types[0].namespace.as_deref(), Some("Contoso.Core"));
        assert_eq!(types[0].solution, sln);

        let failing = MockIndexer::new().failing("Core");
        let err = get_project_types(&project, &sln, &failing).unwrap_err();
        assert!(matches!(err, FinderError::Indexing { .. }));

        let err = get_project_types(&tmp.path().join("Nope.csproj"), &sln, &indexer).unwrap_err();
        assert_not_found(&err);
    }
}
