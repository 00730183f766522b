//! Terminal rendering of failures.
//!
//! A [`Diagnostic`] is what the CLI prints for a [`FinderError`]: the error
//! itself, the descriptor or project it concerns (with a line when the parser
//! knows one) and any hints on how to get past it.
//!
//! [`FinderError`]: crate::core::error::FinderError

use std::fmt;
use std::path::PathBuf;

pub mod suggestions {
    pub const QUALIFY_TYPE: &str =
        "no references found; `depfinder types <PROJECT>` lists the type names a project declares";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation stopped.
    Error,
    /// One item failed and the operation went on.
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Error, false) => "error",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
            (Severity::Warning, false) => "warning",
        }
    }
}

/// File a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    /// 1-based line inside `path`
    pub line: Option<usize>,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ", at line {}", line)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
    pub help: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            location: None,
            help: Vec::new(),
        }
    }

    /// Demote to a warning for per-item failures.
    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn at(mut self, path: impl Into<PathBuf>, line: Option<usize>) -> Self {
        self.location = Some(Location {
            path: path.into(),
            line,
        });
        self
    }

    /// Add a hint. Duplicate hints are kept once.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let help = help.into();
        if !self.help.contains(&help) {
            self.help.push(help);
        }
        self
    }

    /// Render for the terminal, one trailing newline per line.
    pub fn format(&self, color: bool) -> String {
        let mut out = format!("{}: {}\n", self.severity.label(color), self.message);
        if let Some(location) = &self.location {
            out.push_str(&format!("  --> {}\n", location));
        }
        let help = if color { "\x1b[1;32mhelp\x1b[0m" } else { "help" };
        for hint in &self.help {
            out.push_str(&format!("  {}: {}\n", help, hint));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
