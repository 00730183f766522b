//! Error taxonomy for discovery, parsing, indexing and reference search.
//!
//! Errors scoped to a single solution or project are reported as per-item
//! entries in the lazily produced sequences; errors about the root path or
//! the top-level arguments fail the whole call before anything is produced.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::Diagnostic;

/// Why an operation stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller signalled cancellation.
    Requested,
    /// The caller-supplied deadline expired.
    TimedOut,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => write!(f, "cancelled"),
            CancelReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Error raised while finding solutions, opening projects or resolving references.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum FinderError {
    #[error("path not found: {}", path.display())]
    #[diagnostic(
        code(depfinder::not_found),
        help("check that the path exists and is spelled correctly")
    )]
    NotFound { path: PathBuf },

    #[error("malformed descriptor {}: {message}", path.display())]
    #[diagnostic(code(depfinder::descriptor::malformed))]
    MalformedDescriptor {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("malformed version `{input}`: {message}")]
    #[diagnostic(
        code(depfinder::version::malformed),
        help("versions are 1 to 4 dot-separated numbers with an optional `-label`")
    )]
    MalformedVersion { input: String, message: String },

    #[error("failed to index project {}: {message}", project.display())]
    #[diagnostic(code(depfinder::index::failed))]
    Indexing { project: PathBuf, message: String },

    #[error("operation {reason}")]
    #[diagnostic(code(depfinder::cancelled))]
    Cancelled { reason: CancelReason },

    #[error("failed to read {}: {message}", path.display())]
    #[diagnostic(code(depfinder::io))]
    Io { path: PathBuf, message: String },

    #[error("invalid argument `{name}`: {message}")]
    #[diagnostic(code(depfinder::invalid_argument))]
    InvalidArgument { name: &'static str, message: String },
}

impl FinderError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        FinderError::MalformedDescriptor {
            path: path.into(),
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn malformed_at(
        path: impl Into<PathBuf>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        FinderError::MalformedDescriptor {
            path: path.into(),
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        FinderError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error ended the whole operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FinderError::Cancelled { .. })
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        let diag = match self {
            FinderError::NotFound { path } | FinderError::Io { path, .. } => diag.at(path, None),
            FinderError::MalformedDescriptor { path, line, .. } => diag
                .at(path, *line)
                .with_help("fix or remove the offending entry"),
            FinderError::Indexing { project, .. } => diag
                .at(project, None)
                .with_help("check that the project's sources are readable"),
            FinderError::Cancelled {
                reason: CancelReason::TimedOut,
            } => diag.with_help("raise the limit with `--timeout <SECS>`"),
            FinderError::MalformedVersion { .. }
            | FinderError::Cancelled { .. }
            | FinderError::InvalidArgument { .. } => diag,
        };

        match MietteDiagnostic::help(self) {
            Some(help) => diag.with_help(help.to_string()),
            None => diag,
        }
    }
}

/// Result type for depfinder operations.
pub type Result<T, E = FinderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_descriptor_diagnostic() {
        let err = FinderError::malformed_at("/repo/App.sln", 7, "unterminated project entry");
        let output = err.to_diagnostic().format(false);

        assert!(output.contains("malformed descriptor"));
        assert!(output.contains("/repo/App.sln"));
        assert!(output.contains("at line 7"));
        assert!(output.contains("help: fix or remove the offending entry"));
    }

    #[test]
    fn test_timeout_diagnostic_suggests_flag() {
        let err = FinderError::Cancelled {
            reason: CancelReason::TimedOut,
        };
        assert!(err.is_cancelled());
        assert_eq!(err.to_string(), "operation timed out");
        assert!(err.to_diagnostic().format(false).contains("--timeout"));
    }

    #[test]
    fn test_not_found_uses_miette_help() {
        let err = FinderError::NotFound {
            path: PathBuf::from("/missing"),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("--> /missing"));
        assert!(output.contains("spelled correctly"));
    }
}
