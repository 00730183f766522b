//! Declared types, usage sites and the references built from them.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::project::ProjectDetails;
use crate::core::version::VersionIdentifier;

/// Kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    Delegate,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Delegate => "delegate",
        };
        f.write_str(s)
    }
}

/// A type declared in a project's sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeclaredType {
    /// Namespace-qualified name, e.g. `Contoso.Core.Widget`
    pub full_name: String,
    pub kind: TypeKind,
}

impl DeclaredType {
    pub fn new(full_name: impl Into<String>, kind: TypeKind) -> Self {
        DeclaredType {
            full_name: full_name.into(),
            kind,
        }
    }

    /// Name without its namespace.
    pub fn name(&self) -> &str {
        simple_name(&self.full_name)
    }

    /// Namespace part of the full name, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.full_name.rsplit_once('.').map(|(ns, _)| ns)
    }
}

/// A place in a source file that mentions a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSite {
    /// Type name as resolved by the indexer (qualified when known)
    pub referenced_type: String,
    pub file: PathBuf,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl fmt::Display for UsageSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Presentation view of a declared type.
#[derive(Debug, Clone, Serialize)]
pub struct TypeDetails {
    pub name: String,
    pub namespace: Option<String>,
    pub full_name: String,
    pub kind: TypeKind,
    pub project: PathBuf,
    pub solution: PathBuf,
}

impl TypeDetails {
    pub fn new(declared: &DeclaredType, project: PathBuf, solution: PathBuf) -> Self {
        TypeDetails {
            name: declared.name().to_string(),
            namespace: declared.namespace().map(str::to_string),
            full_name: declared.full_name.clone(),
            kind: declared.kind,
            project,
            solution,
        }
    }
}

/// One usage of the searched type by a consumer project.
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    /// Name of the project declaring the searched type
    pub source_project: String,
    /// The declaring project instance in this solution
    pub source_path: PathBuf,
    pub consumer: ProjectDetails,
    pub solution_path: PathBuf,
    pub class_name: String,
    pub location: UsageSite,
    /// Version the consumer pins for the source project, if it references it as a package
    pub source_version: Option<VersionIdentifier>,
}

/// Last dot-separated segment of a type name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// The searched type, resolved against the types its project declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeQuery {
    /// Fully qualified names the searched name stands for
    names: Vec<String>,
}

impl TypeQuery {
    /// Resolve `class_name` against `declared`.
    ///
    /// A qualified name resolves to itself. An unqualified one resolves to
    /// every declared type with that simple name. Names the project does not
    /// declare are kept as given.
    pub fn resolve(class_name: &str, declared: &[DeclaredType]) -> Self {
        let mut names: Vec<String> = if class_name.contains('.') {
            Vec::new()
        } else {
            declared
                .iter()
                .filter(|t| t.name() == class_name)
                .map(|t| t.full_name.clone())
                .collect()
        };
        if names.is_empty() {
            names.push(class_name.to_string());
        }
        names.dedup();
        TypeQuery { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Whether a usage naming `used` refers to the searched type.
    ///
    /// A qualified usage must equal a resolved name. An unqualified usage
    /// matches on the simple name, since its namespace comes from `using`
    /// directives the usage site does not carry.
    pub fn matches(&self, used: &str) -> bool {
        self.names.iter().any(|name| {
            used == name || (!used.contains('.') && used == simple_name(name))
        })
    }
}
