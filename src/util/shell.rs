//! CLI output.
//!
//! Results (solution paths, projects, types, references) go to stdout, one per
//! line, or as JSON lines with `--json`. Status lines, per-item warnings and
//! the search spinner go to stderr so stdout can be piped.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::{json, Value};

use crate::core::error::FinderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Human,
    /// One JSON object per line on stdout, nothing else
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Results and failures only
    Quiet,
    #[default]
    Normal,
    /// Extra detail per result; the spinner is replaced by status lines
    Verbose,
}

/// Label printed in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Found,
    Finished,
    Searching,
    Info,
    Error,
}

impl Status {
    const WIDTH: usize = 12;

    fn label(self) -> (&'static str, &'static str) {
        match self {
            Status::Found => ("Found", "\x1b[1;32m"),
            Status::Finished => ("Finished", "\x1b[1;32m"),
            Status::Searching => ("Searching", "\x1b[1;36m"),
            Status::Info => ("Info", "\x1b[1;34m"),
            Status::Error => ("error", "\x1b[1;31m"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Shell {
    output: Output,
    verbosity: Verbosity,
    color: bool,
}

impl Shell {
    pub fn new(output: Output, verbosity: Verbosity, color: bool) -> Self {
        Shell {
            output,
            verbosity,
            color: color && output == Output::Human,
        }
    }

    /// Build from the global flags. `--json` wins over `--quiet`/`--verbose`;
    /// color needs a terminal on stderr.
    pub fn from_flags(quiet: bool, verbose: bool, no_color: bool, json: bool) -> Self {
        let output = if json { Output::Json } else { Output::Human };
        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Shell::new(output, verbosity, !no_color && io::stderr().is_terminal())
    }

    pub fn is_quiet(&self) -> bool {
        self.output == Output::Human && self.verbosity == Verbosity::Quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.output == Output::Human && self.verbosity == Verbosity::Verbose
    }

    pub fn is_json(&self) -> bool {
        self.output == Output::Json
    }

    pub fn use_color(&self) -> bool {
        self.color
    }

    /// `{status:>12} {msg}` on stderr. Quiet mode keeps errors only.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() || (self.is_quiet() && status != Status::Error) {
            return;
        }
        eprintln!("{} {}", self.status_column(status), msg);
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// A failure that ends the command.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            self.emit_json(&json!({ "reason": "error", "message": msg.to_string() }));
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// A failure of one solution, project or file; the command goes on.
    pub fn item_error(&self, err: &FinderError) {
        if self.is_json() {
            self.emit_json(&json!({ "reason": "item-error", "message": err.to_string() }));
        } else if !self.is_quiet() {
            eprint!("{}", err.to_diagnostic().as_warning().format(self.color));
        }
    }

    /// A result line. Ignored in JSON mode.
    pub fn result(&self, line: impl Display) {
        if !self.is_json() {
            println!("{}", line);
        }
    }

    /// `{"reason": reason, "data": record}` on stdout. Ignored in human mode.
    pub fn json_record<T: Serialize>(&self, reason: &str, record: &T) {
        if self.is_json() {
            let data = serde_json::to_value(record).unwrap_or(Value::Null);
            self.emit_json(&json!({ "reason": reason, "data": data }));
        }
    }

    fn emit_json(&self, value: &Value) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", value);
        let _ = out.flush();
    }

    fn status_column(&self, status: Status) -> String {
        let (text, code) = status.label();
        if self.color {
            format!("{}{:>width$}\x1b[0m", code, text, width = Status::WIDTH)
        } else {
            format!("{:>width$}", text, width = Status::WIDTH)
        }
    }

    /// Time an operation. Verbose mode announces it; the finish line prints
    /// unless quiet or JSON.
    pub fn span(self: &Arc<Self>, status: Status, msg: impl Display) -> Span {
        if self.is_verbose() {
            self.status(status, msg);
        }
        Span {
            shell: Arc::clone(self),
            start: Instant::now(),
            done: false,
        }
    }

    /// A spinner on stderr. Absent when quiet, verbose, JSON or off a terminal.
    pub fn spinner(&self, msg: impl Display) -> Spinner {
        let visible = self.verbosity == Verbosity::Normal
            && !self.is_json()
            && io::stderr().is_terminal();
        let bar = visible.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                bar.set_style(style);
            }
            bar.set_message(msg.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        Spinner { bar }
    }
}

pub struct Span {
    shell: Arc<Shell>,
    start: Instant,
    done: bool,
}

impl Span {
    pub fn finish_with_message(mut self, msg: impl Display) {
        self.done = true;
        let took = elapsed(self.start.elapsed());
        self.shell
            .status(Status::Finished, format!("{} in {}", msg, took));
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if !self.done {
            let took = elapsed(self.start.elapsed());
            self.shell.status(Status::Finished, format!("in {}", took));
        }
    }
}

pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn set_message(&self, msg: impl Display) {
        if let Some(bar) = &self.bar {
            bar.set_message(msg.to_string());
        }
    }

    /// Run `f` with the spinner hidden so its output does not tear.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.finish();
    }
}

fn elapsed(duration: Duration) -> String {
    match duration.as_millis() {
        ms if ms < 1000 => format!("{}ms", ms),
        ms if ms < 60_000 => format!("{:.2}s", duration.as_secs_f64()),
        _ => format!("{:.1}m", duration.as_secs_f64() / 60.0),
    }
}
