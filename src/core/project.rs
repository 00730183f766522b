//! Project descriptor (MSBuild project XML) parsing.
//!
//! A project declares references to other projects, versioned package
//! references and a flat set of properties. Assembly metadata is read from
//! those properties lazily and memoized per `Project` instance.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::core::error::{FinderError, Result};
use crate::core::version::VersionIdentifier;
use crate::util::fs;

/// Identity of a project instance. The same descriptor listed by two
/// solutions yields two distinct instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectId {
    pub absolute_path: PathBuf,
    pub solution_path: PathBuf,
}

/// Kind of output a project produces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Library,
    Exe,
    WinExe,
    Module,
    Other(String),
}

impl OutputKind {
    fn from_property(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "library" => OutputKind::Library,
            "exe" => OutputKind::Exe,
            "winexe" => OutputKind::WinExe,
            "module" => OutputKind::Module,
            _ => OutputKind::Other(value.trim().to_string()),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Library => write!(f, "Library"),
            OutputKind::Exe => write!(f, "Exe"),
            OutputKind::WinExe => write!(f, "WinExe"),
            OutputKind::Module => write!(f, "Module"),
            OutputKind::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A `<ProjectReference>` to another project descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReference {
    /// File stem of the referenced descriptor
    pub name: String,
    /// Referenced descriptor, resolved against the referencing project's directory
    pub path: PathBuf,
}

/// A `<PackageReference>` to an external versioned package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReference {
    pub name: String,
    /// Version text as written (may be empty, a range or a property)
    pub requirement: String,
    /// Parsed version when the reference is pinned to a concrete version
    pub version: Option<VersionIdentifier>,
}

impl PackageReference {
    fn new(name: String, requirement: Option<String>, project: &Path) -> Self {
        let requirement = requirement.unwrap_or_default().trim().to_string();
        let version = if requirement.is_empty() {
            None
        } else {
            match VersionIdentifier::parse(&requirement) {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!(
                        "{}: package `{}` is not pinned to a concrete version: {}",
                        project.display(),
                        name,
                        e
                    );
                    None
                }
            }
        };

        PackageReference {
            name,
            requirement,
            version,
        }
    }
}

/// Case-insensitive property map from `<PropertyGroup>` elements.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    values: BTreeMap<String, String>,
}

impl PropertyMap {
    /// Look up a property by name (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// Insert unless the property is already set (first value wins).
    fn insert_first(&mut self, key: &str, value: String) {
        self.values.entry(key.to_ascii_lowercase()).or_insert(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Assembly metadata fields, each extracted on first access and memoized.
#[derive(Debug, Clone)]
pub struct AssemblyInfo {
    properties: Arc<PropertyMap>,
    company: OnceLock<Option<String>>,
    configuration: OnceLock<Option<String>>,
    copyright: OnceLock<Option<String>>,
    description: OnceLock<Option<String>>,
    file_version: OnceLock<Option<String>>,
    informational_version: OnceLock<Option<String>>,
    product: OnceLock<Option<String>>,
    title: OnceLock<Option<String>>,
    assembly_version: OnceLock<Option<String>>,
    neutral_language: OnceLock<Option<String>>,
    assembly_name: OnceLock<Option<String>>,
}

impl AssemblyInfo {
    fn new(properties: Arc<PropertyMap>) -> Self {
        AssemblyInfo {
            properties,
            company: OnceLock::new(),
            configuration: OnceLock::new(),
            copyright: OnceLock::new(),
            description: OnceLock::new(),
            file_version: OnceLock::new(),
            informational_version: OnceLock::new(),
            product: OnceLock::new(),
            title: OnceLock::new(),
            assembly_version: OnceLock::new(),
            neutral_language: OnceLock::new(),
            assembly_name: OnceLock::new(),
        }
    }

    fn field<'a>(&'a self, cell: &'a OnceLock<Option<String>>, key: &str) -> Option<&'a str> {
        cell.get_or_init(|| self.properties.get(key).map(str::to_string))
            .as_deref()
    }

    /// Company name for the assembly manifest.
    pub fn company(&self) -> Option<&str> {
        self.field(&self.company, "Company")
    }

    /// Build configuration, such as `Debug` or `Release`.
    pub fn configuration(&self) -> Option<&str> {
        self.field(&self.configuration, "Configuration")
    }

    pub fn copyright(&self) -> Option<&str> {
        self.field(&self.copyright, "Copyright")
    }

    pub fn description(&self) -> Option<&str> {
        self.field(&self.description, "Description")
    }

    /// Win32 file version; need not match the assembly version.
    pub fn file_version(&self) -> Option<&str> {
        self.field(&self.file_version, "FileVersion")
    }

    pub fn informational_version(&self) -> Option<&str> {
        self.field(&self.informational_version, "InformationalVersion")
    }

    pub fn product(&self) -> Option<&str> {
        self.field(&self.product, "Product")
    }

    pub fn title(&self) -> Option<&str> {
        self.field(&self.title, "AssemblyTitle")
    }

    pub fn assembly_version(&self) -> Option<&str> {
        self.field(&self.assembly_version, "AssemblyVersion")
    }

    /// Default culture of the assembly's resources.
    pub fn neutral_language(&self) -> Option<&str> {
        self.field(&self.neutral_language, "NeutralLanguage")
    }

    pub fn assembly_name(&self) -> Option<&str> {
        self.field(&self.assembly_name, "AssemblyName")
    }
}

/// A project (build unit) as listed by one solution.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    absolute_path: PathBuf,
    solution_path: PathBuf,
    target_framework: Option<String>,
    output_kind: OutputKind,
    project_references: Vec<ProjectReference>,
    package_references: Vec<PackageReference>,
    properties: Arc<PropertyMap>,
    assembly_info: AssemblyInfo,
}

impl Project {
    /// Load a project descriptor listed by `solution_path`.
    pub fn load(path: &Path, solution_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path, solution_path)
    }

    /// Parse project descriptor content located at `path`.
    pub fn parse(content: &str, path: &Path, solution_path: &Path) -> Result<Self> {
        let raw = RawProject::parse(content, path)?;
        let dir = path.parent().unwrap_or(Path::new("."));

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let project_references = raw
            .project_includes
            .iter()
            .map(|include| {
                let target = fs::normalize_lexically(&dir.join(include.replace('\\', "/")));
                ProjectReference {
                    name: target
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    path: target,
                }
            })
            .collect();

        let package_references = raw
            .packages
            .into_iter()
            .map(|(name, version)| PackageReference::new(name, version, path))
            .collect();

        let properties = Arc::new(raw.properties);
        let target_framework = properties
            .get("TargetFramework")
            .or_else(|| {
                properties
                    .get("TargetFrameworks")
                    .and_then(|s| s.split(';').map(str::trim).find(|s| !s.is_empty()))
            })
            .or_else(|| properties.get("TargetFrameworkVersion"))
            .map(str::to_string);
        let output_kind = properties
            .get("OutputType")
            .map(OutputKind::from_property)
            .unwrap_or_default();

        Ok(Project {
            name,
            absolute_path: path.to_path_buf(),
            solution_path: solution_path.to_path_buf(),
            target_framework,
            output_kind,
            project_references,
            package_references,
            assembly_info: AssemblyInfo::new(Arc::clone(&properties)),
            properties,
        })
    }

    pub fn id(&self) -> ProjectId {
        ProjectId {
            absolute_path: self.absolute_path.clone(),
            solution_path: self.solution_path.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }

    /// Directory containing the descriptor (the project's source root).
    pub fn dir(&self) -> &Path {
        self.absolute_path.parent().unwrap_or(Path::new("."))
    }

    pub fn solution_path(&self) -> &Path {
        &self.solution_path
    }

    pub fn target_framework(&self) -> Option<&str> {
        self.target_framework.as_deref()
    }

    pub fn output_kind(&self) -> &OutputKind {
        &self.output_kind
    }

    pub fn project_references(&self) -> &[ProjectReference] {
        &self.project_references
    }

    pub fn package_references(&self) -> &[PackageReference] {
        &self.package_references
    }

    /// The package reference named `name` (case-insensitive), if any.
    pub fn package_reference(&self, name: &str) -> Option<&PackageReference> {
        self.package_references
            .iter()
            .find(|p| crate::util::names_match(&p.name, name))
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn assembly_info(&self) -> &AssemblyInfo {
        &self.assembly_info
    }

    /// Serializable view of this project.
    pub fn details(&self) -> ProjectDetails {
        let info = &self.assembly_info;
        let owned = |s: Option<&str>| s.map(str::to_string);

        ProjectDetails {
            name: self.name.clone(),
            absolute_path: self.absolute_path.clone(),
            solution: self.solution_path.clone(),
            target_framework: self.target_framework.clone(),
            output_kind: self.output_kind.to_string(),
            project_references: self.project_references.clone(),
            package_references: self.package_references.clone(),
            company: owned(info.company()),
            description: owned(info.description()),
            product: owned(info.product()),
            title: owned(info.title()),
            file_version: owned(info.file_version()),
            informational_version: owned(info.informational_version()),
            assembly_version: owned(info.assembly_version()),
            neutral_language: owned(info.neutral_language()),
            assembly_name: owned(info.assembly_name()),
        }
    }
}

/// Presentation view of a project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetails {
    pub name: String,
    pub absolute_path: PathBuf,
    pub solution: PathBuf,
    pub target_framework: Option<String>,
    pub output_kind: String,
    pub project_references: Vec<ProjectReference>,
    pub package_references: Vec<PackageReference>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub product: Option<String>,
    pub title: Option<String>,
    pub file_version: Option<String>,
    pub informational_version: Option<String>,
    pub assembly_version: Option<String>,
    pub neutral_language: Option<String>,
    pub assembly_name: Option<String>,
}

/// Raw descriptor contents before path resolution.
#[derive(Debug, Default)]
struct RawProject {
    properties: PropertyMap,
    project_includes: Vec<String>,
    packages: Vec<(String, Option<String>)>,
}

impl RawProject {
    fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut raw = RawProject::default();
        let mut stack: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut saw_root = false;
        let mut pending_package: Option<(String, Option<String>)> = None;

        let xml_err = |e: &dyn fmt::Display, reader: &Reader<&[u8]>| {
            FinderError::malformed(
                path,
                format!("{} (at byte {})", e, reader.buffer_position()),
            )
        };

        loop {
            let event = reader.read_event().map_err(|e| xml_err(&e, &reader))?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    let name = local_name(e);

                    if !saw_root {
                        if name != "Project" {
                            return Err(FinderError::malformed(
                                path,
                                format!("expected <Project> root element, found <{}>", name),
                            ));
                        }
                        saw_root = true;
                    } else if stack.is_empty() {
                        return Err(FinderError::malformed(path, "multiple root elements"));
                    }

                    if stack.len() == 2 && stack[1] == "ItemGroup" {
                        match name.as_str() {
                            "ProjectReference" => {
                                if let Some(include) = attribute(e, "Include", path)? {
                                    raw.project_includes.push(include);
                                }
                            }
                            "PackageReference" => {
                                if let Some(include) = attribute(e, "Include", path)? {
                                    let version = attribute(e, "Version", path)?;
                                    if is_empty {
                                        raw.packages.push((include, version));
                                    } else {
                                        pending_package = Some((include, version));
                                    }
                                }
                            }
                            _ => {}
                        }
                    }

                    if !is_empty {
                        stack.push(name);
                        text.clear();
                    }
                }
                Event::Text(ref e) => {
                    let value = e.unescape().map_err(|err| xml_err(&err, &reader))?;
                    text.push_str(&value);
                }
                Event::CData(ref e) => {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
                Event::End(_) => {
                    let Some(closed) = stack.pop() else {
                        return Err(FinderError::malformed(path, "unbalanced closing tag"));
                    };

                    if stack.len() == 2 && stack[1] == "PropertyGroup" {
                        let value = text.trim();
                        if !value.is_empty() {
                            raw.properties.insert_first(&closed, value.to_string());
                        }
                    } else if closed == "Version"
                        && stack.last().is_some_and(|p| p == "PackageReference")
                    {
                        if let Some((_, version)) = pending_package.as_mut() {
                            if version.is_none() && !text.trim().is_empty() {
                                *version = Some(text.trim().to_string());
                            }
                        }
                    } else if closed == "PackageReference" && stack.len() == 2 {
                        if let Some(package) = pending_package.take() {
                            raw.packages.push(package);
                        }
                    }
                    text.clear();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(FinderError::malformed(path, "missing <Project> root element"));
        }
        if !stack.is_empty() {
            return Err(FinderError::malformed(
                path,
                format!("unexpected end of document inside <{}>", stack.join("><")),
            ));
        }

        Ok(raw)
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str, path: &Path) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| FinderError::malformed(path, err.to_string()))?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| FinderError::malformed(path, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
