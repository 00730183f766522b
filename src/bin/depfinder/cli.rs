//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use depfinder::VersionIdentifier;

/// depfinder - find every use of a type across many solutions
#[derive(Parser)]
#[command(name = "depfinder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print results and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit JSON lines instead of human-readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List solution files below a directory
    Solutions(SolutionsArgs),

    /// List the projects of a solution
    Projects(ProjectsArgs),

    /// List the types a project declares
    Types(TypesArgs),

    /// Find every use of a type by projects that depend on its project
    References(ReferencesArgs),

    /// Parse, normalize and compare version identifiers
    Version(VersionArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct SolutionsArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Only list solutions containing a project with this name
    #[arg(short, long)]
    pub project: Option<String>,
}

#[derive(Args)]
pub struct ProjectsArgs {
    /// Solution file
    pub solution: PathBuf,
}

#[derive(Args)]
pub struct TypesArgs {
    /// Project descriptor
    pub project: PathBuf,

    /// Solution the project belongs to (found next to the project if omitted)
    #[arg(short, long)]
    pub solution: Option<PathBuf>,
}

#[derive(Args)]
pub struct ReferencesArgs {
    /// Directory to search
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Project declaring the type
    #[arg(short, long)]
    pub project: String,

    /// Type to look for, simple or namespace-qualified
    #[arg(short = 't', long = "type")]
    pub type_name: String,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Only report consumers pinning the project at this version or later
    #[arg(long)]
    pub min_version: Option<VersionIdentifier>,

    /// Only report consumers pinning the project at this version or earlier
    #[arg(long)]
    pub max_version: Option<VersionIdentifier>,
}

#[derive(Args)]
pub struct VersionArgs {
    /// Version to parse
    pub version: String,

    /// Version to compare against
    pub other: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
