//! Solution (`.sln`) descriptor parsing.
//!
//! A solution is a line-oriented text file. Only `Project(...)` entries and
//! their closing `EndProject` lines are structural; header lines, comments,
//! nested sections and the `Global` block are ignored.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::{FinderError, Result};
use crate::util::fs;

/// Type id Visual Studio uses for solution folders.
pub const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// Default extensions of project descriptors listed in a solution.
pub const DEFAULT_PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];

static PROJECT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^Project\(\s*"\{([0-9A-Fa-f-]+)\}"\s*\)\s*=\s*"([^"]*)"\s*,\s*"([^"]*)"\s*,\s*"\{([0-9A-Fa-f-]+)\}"\s*$"#,
    )
    .expect("project line pattern is valid")
});

/// One `Project(...)` entry of a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    /// Display name of the entry
    pub name: String,
    /// Path as written, with separators normalized to `/`
    pub relative_path: String,
    /// Path resolved against the solution directory
    pub path: PathBuf,
    /// Project type id (without braces)
    pub type_id: String,
    /// Project instance id (without braces)
    pub id: String,
}

impl SolutionEntry {
    /// Whether this entry is a solution folder rather than a project.
    pub fn is_folder(&self) -> bool {
        self.type_id.eq_ignore_ascii_case(SOLUTION_FOLDER_TYPE)
    }

    /// Whether this entry is called `name` (case-insensitive), by its display
    /// name or by the file stem of its descriptor.
    pub fn is_named(&self, name: &str) -> bool {
        crate::util::names_match(&self.name, name)
            || self
                .path
                .file_stem()
                .is_some_and(|stem| crate::util::names_match(&stem.to_string_lossy(), name))
    }

    /// Whether this entry points at a project descriptor with one of `extensions`.
    pub fn is_project(&self, extensions: &[String]) -> bool {
        !self.is_folder() && fs::has_extension(&self.path, extensions)
    }
}

/// A parsed solution descriptor.
#[derive(Debug, Clone)]
pub struct SolutionFile {
    path: PathBuf,
    entries: Vec<SolutionEntry>,
}

impl SolutionFile {
    /// Load and parse a solution file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(FinderError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| FinderError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse solution content. `path` locates the solution for resolving entries.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let dir = path.parent().unwrap_or(Path::new("."));
        let mut entries = Vec::new();
        let mut open: Option<usize> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim().trim_start_matches('\u{feff}');

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with("Project(") {
                if let Some(start) = open {
                    return Err(FinderError::malformed_at(
                        path,
                        line_no,
                        format!("project entry opened at line {} is not closed", start),
                    ));
                }
                let caps = PROJECT_LINE.captures(line).ok_or_else(|| {
                    FinderError::malformed_at(path, line_no, "invalid project entry")
                })?;

                let relative_path = caps[3].replace('\\', "/");
                if relative_path.is_empty() {
                    return Err(FinderError::malformed_at(
                        path,
                        line_no,
                        "project entry has an empty path",
                    ));
                }

                entries.push(SolutionEntry {
                    name: caps[2].to_string(),
                    path: fs::normalize_lexically(&dir.join(&relative_path)),
                    relative_path,
                    type_id: caps[1].to_uppercase(),
                    id: caps[4].to_uppercase(),
                });
                open = Some(line_no);
            } else if line == "EndProject" {
                if open.take().is_none() {
                    return Err(FinderError::malformed_at(
                        path,
                        line_no,
                        "`EndProject` without a matching project entry",
                    ));
                }
            }
        }

        if let Some(start) = open {
            return Err(FinderError::malformed_at(
                path,
                start,
                "project entry is not closed before end of file",
            ));
        }

        Ok(SolutionFile {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Path of the solution file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries, in declaration order.
    pub fn entries(&self) -> &[SolutionEntry] {
        &self.entries
    }

    /// Entries that are project descriptors with one of `extensions`.
    pub fn projects<'a>(
        &'a self,
        extensions: &'a [String],
    ) -> impl Iterator<Item = &'a SolutionEntry> + 'a {
        self.entries.iter().filter(move |e| e.is_project(extensions))
    }

    /// Whether any project entry is named `name`, see [`SolutionEntry::is_named`].
    pub fn contains_project(&self, name: &str, extensions: &[String]) -> bool {
        self.projects(extensions).any(|e| e.is_named(name))
    }
}
