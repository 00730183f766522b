//! Test fixtures for solution trees.
//!
//! Fixtures describe solutions and projects in memory and write them to a
//! real directory, usually a `tempfile::TempDir`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Type id of C# projects in solution files.
pub const CSHARP_PROJECT_TYPE: &str = "FAE04EC0-301F-11D3-BF4B-00C04F79EFBC";

/// Fixture for a project directory and its descriptor.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Project name, also the descriptor file stem.
    pub name: String,
    /// Directory relative to the solution directory.
    pub dir: PathBuf,
    /// `ProjectReference` includes, relative to the project directory.
    pub project_refs: Vec<String>,
    /// `PackageReference` name and version pairs.
    pub package_refs: Vec<(String, String)>,
    /// PropertyGroup entries.
    pub properties: Vec<(String, String)>,
    /// Source files (path relative to project dir -> content).
    pub sources: Vec<(PathBuf, String)>,
}

impl ProjectFixture {
    /// Create a project living in a directory named after it.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        ProjectFixture {
            dir: PathBuf::from(&name),
            name,
            project_refs: Vec::new(),
            package_refs: Vec::new(),
            properties: vec![("TargetFramework".into(), "net8.0".into())],
            sources: Vec::new(),
        }
    }

    /// Place the project in another directory.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Reference a sibling project by name, `..\Name\Name.csproj`.
    pub fn with_project_ref(mut self, name: &str) -> Self {
        self.project_refs.push(format!("..\\{name}\\{name}.csproj"));
        self
    }

    /// Reference a project by an explicit include path.
    pub fn with_project_include(mut self, include: impl Into<String>) -> Self {
        self.project_refs.push(include.into());
        self
    }

    /// Add a package reference.
    pub fn with_package_ref(mut self, name: &str, version: &str) -> Self {
        self.package_refs.push((name.into(), version.into()));
        self
    }

    /// Add a property.
    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// Add a source file.
    pub fn with_source(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.sources.push((path.into(), content.into()));
        self
    }

    /// Descriptor path relative to the solution, as a solution lists it.
    pub fn solution_relative_path(&self) -> String {
        self.dir
            .join(format!("{}.csproj", self.name))
            .to_string_lossy()
            .replace('/', "\\")
    }

    /// Render the project descriptor XML.
    pub fn descriptor(&self) -> String {
        let mut xml = String::from("<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n");
        for (key, value) in &self.properties {
            let _ = writeln!(xml, "    <{key}>{value}</{key}>");
        }
        xml.push_str("  </PropertyGroup>\n");

        if !self.project_refs.is_empty() || !self.package_refs.is_empty() {
            xml.push_str("  <ItemGroup>\n");
            for include in &self.project_refs {
                let _ = writeln!(xml, "    <ProjectReference Include=\"{include}\" />");
            }
            for (name, version) in &self.package_refs {
                let _ = writeln!(
                    xml,
                    "    <PackageReference Include=\"{name}\" Version=\"{version}\" />"
                );
            }
            xml.push_str("  </ItemGroup>\n");
        }

        xml.push_str("</Project>\n");
        xml
    }

    /// Write the project below `solution_dir`; returns the descriptor path.
    pub fn write_to(&self, solution_dir: &Path) -> std::io::Result<PathBuf> {
        let dir = solution_dir.join(&self.dir);
        std::fs::create_dir_all(&dir)?;

        let descriptor = dir.join(format!("{}.csproj", self.name));
        std::fs::write(&descriptor, self.descriptor())?;

        for (rel_path, content) in &self.sources {
            let full_path = dir.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }

        Ok(descriptor)
    }
}

/// Fixture for a solution file and its projects.
#[derive(Debug, Clone)]
pub struct SolutionFixture {
    /// Solution name, the `.sln` file stem.
    pub name: String,
    pub projects: Vec<ProjectFixture>,
    /// Solution folder names.
    pub folders: Vec<String>,
    /// Entries listed in the solution whose descriptors are not written.
    pub missing: Vec<String>,
}

impl SolutionFixture {
    pub fn new(name: impl Into<String>) -> Self {
        SolutionFixture {
            name: name.into(),
            projects: Vec::new(),
            folders: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Add a project.
    pub fn with_project(mut self, project: ProjectFixture) -> Self {
        self.projects.push(project);
        self
    }

    /// Add a solution folder entry.
    pub fn with_folder(mut self, name: impl Into<String>) -> Self {
        self.folders.push(name.into());
        self
    }

    /// List a project whose descriptor does not exist on disk.
    pub fn with_missing_project(mut self, name: impl Into<String>) -> Self {
        self.missing.push(name.into());
        self
    }

    /// Render the solution file.
    pub fn content(&self) -> String {
        let mut entries: Vec<(String, String, String)> = Vec::new();
        for folder in &self.folders {
            entries.push((
                crate::core::solution::SOLUTION_FOLDER_TYPE.to_string(),
                folder.clone(),
                folder.clone(),
            ));
        }
        for project in &self.projects {
            entries.push((
                CSHARP_PROJECT_TYPE.to_string(),
                project.name.clone(),
                project.solution_relative_path(),
            ));
        }
        for name in &self.missing {
            entries.push((
                CSHARP_PROJECT_TYPE.to_string(),
                name.clone(),
                format!("{name}\\{name}.csproj"),
            ));
        }
        solution_content(&entries)
    }

    /// Write the solution into `dir`; returns the `.sln` path.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        for project in &self.projects {
            project.write_to(dir)?;
        }
        let path = dir.join(format!("{}.sln", self.name));
        std::fs::write(&path, self.content())?;
        Ok(path)
    }
}

/// Render a solution file from `(type id, name, relative path)` entries.
pub fn solution_content(entries: &[(String, String, String)]) -> String {
    let mut sln = String::from(
        "\u{feff}\nMicrosoft Visual Studio Solution File, Format Version 12.00\n# Visual Studio Version 17\nVisualStudioVersion = 17.0.31903.59\n",
    );
    for (i, (type_id, name, path)) in entries.iter().enumerate() {
        let _ = writeln!(
            sln,
            "Project(\"{{{type_id}}}\") = \"{name}\", \"{path}\", \"{{{:08X}-0000-0000-0000-000000000000}}\"",
            i + 1
        );
        sln.push_str("EndProject\n");
    }
    sln.push_str("Global\n\tGlobalSection(SolutionConfigurationPlatforms) = preSolution\n\t\tDebug|Any CPU = Debug|Any CPU\n\tEndGlobalSection\nEndGlobal\n");
    sln
}

/// Common C# sources.
pub mod sources {
    /// A source declaring `class {name}` in `namespace`.
    pub fn class(namespace: &str, name: &str) -> String {
        format!("namespace {namespace}\n{{\n    public class {name}\n    {{\n    }}\n}}\n")
    }

    /// A source declaring `class {name}` that mentions each of `uses` on its own line.
    pub fn class_using(namespace: &str, name: &str, uses: &[&str]) -> String {
        let mut body = String::new();
        for (i, ty) in uses.iter().enumerate() {
            body.push_str(&format!("        private {ty} field{i};\n"));
        }
        format!(
            "using System;\n\nnamespace {namespace}\n{{\n    public class {name}\n    {{\n{body}    }}\n}}\n"
        )
    }
}
