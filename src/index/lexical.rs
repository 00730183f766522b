//! Lexical source indexer for C#-family sources.
//!
//! This is the indexer bundled with the CLI. It does not parse syntax: it
//! blanks out comments and literals, finds type declarations with their
//! enclosing namespaces and types, and reports every identifier chain as a
//! usage site. Qualified chains yield one site per segment so that
//! `Contoso.Core.Widget.Create()` is seen as a use of `Contoso.Core.Widget`.

use std::collections::{HashSet, VecDeque};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::core::types::{DeclaredType, TypeKind, UsageSite};
use crate::index::{SymbolIndex, SymbolIndexer};
use crate::util::fs::has_extension;

/// Default extensions of source files.
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["cs"];

/// Default directory names skipped inside a project.
pub const DEFAULT_SKIP_DIRS: &[&str] = &["bin", "obj"];

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "record", "ref", "return", "sbyte", "sealed",
    "short", "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw",
    "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "var",
    "virtual", "void", "volatile", "while", "where", "async", "await", "get", "set", "init",
    "value", "yield", "partial", "nameof", "dynamic", "global", "when", "with", "required",
];

static NAMESPACE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnamespace\s+([A-Za-z_][\w.]*)\s*([;{])").expect("namespace pattern is valid")
});

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(class|struct|interface|enum|record)\s+(?:(?:class|struct)\s+)?([A-Za-z_]\w*)")
        .expect("type pattern is valid")
});

static DELEGATE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdelegate\s+[\w<>\[\],.?\s]+?\s+([A-Za-z_]\w*)\s*(?:<[^>]*>)?\s*\(")
        .expect("delegate pattern is valid")
});

static USING_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:global\s+)?using\s+(?:static\s+)?(?:[A-Za-z_]\w*\s*=\s*)?[\w.<>, ]+;")
        .expect("using pattern is valid")
});

static IDENT_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@?[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*").expect("identifier pattern is valid")
});

fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Indexer that reads sources from the directory containing the project descriptor.
#[derive(Debug, Clone)]
pub struct LexicalIndexer {
    source_extensions: Vec<String>,
    skip_dirs: Vec<String>,
}

impl Default for LexicalIndexer {
    fn default() -> Self {
        LexicalIndexer {
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LexicalIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source file extensions to index.
    pub fn with_source_extensions(mut self, extensions: Vec<String>) -> Self {
        self.source_extensions = extensions;
        self
    }

    /// Set directory names to skip.
    pub fn with_skip_dirs(mut self, dirs: Vec<String>) -> Self {
        self.skip_dirs = dirs;
        self
    }

    /// Source files below `dir`, sorted for deterministic output.
    fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !self
                    .skip_dirs
                    .iter()
                    .any(|d| entry.file_name().to_string_lossy().eq_ignore_ascii_case(d))
        });

        for entry in walker {
            let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
            if entry.file_type().is_file() && has_extension(entry.path(), &self.source_extensions) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

impl SymbolIndexer for LexicalIndexer {
    fn index(&self, project_path: &Path) -> Result<SymbolIndex> {
        let dir = project_path.parent().unwrap_or(Path::new("."));
        if !dir.is_dir() {
            bail!("project directory {} does not exist", dir.display());
        }

        let files = self.source_files(dir)?;

        let mut declared_types = Vec::new();
        for file in &files {
            let source = read_source(file)?;
            declared_types.extend(SourceText::new(&source).declarations().into_iter().map(|d| d.ty));
        }

        Ok(SymbolIndex {
            declared_types,
            usages: Box::new(UsageScan {
                files: files.into_iter(),
                pending: VecDeque::new(),
            }),
        })
    }
}

/// Reads one source file per refill, so only the current file is held.
struct UsageScan {
    files: std::vec::IntoIter<PathBuf>,
    pending: VecDeque<UsageSite>,
}

impl Iterator for UsageScan {
    type Item = Result<UsageSite>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(site) = self.pending.pop_front() {
                return Some(Ok(site));
            }
            let file = self.files.next()?;
            match read_source(&file) {
                Ok(source) => self.pending.extend(SourceText::new(&source).usages(&file)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Text of a source file without its byte order mark.
///
/// Files in a legacy code page are decoded lossily: each byte that is not
/// UTF-8 becomes one U+FFFD. Columns count characters, so a single-byte code
/// page keeps its columns.
fn read_source(file: &Path) -> Result<String> {
    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("{} is not UTF-8, decoding lossily", file.display());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };
    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

struct Declaration {
    ty: DeclaredType,
    /// Byte range of the declared name
    name: Range<usize>,
}

/// Source text with comments and literals blanked out.
///
/// `code` has the same byte offsets as `source`; columns are counted in
/// characters of `source`.
struct SourceText<'a> {
    source: &'a str,
    code: String,
    line_starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    fn new(source: &'a str) -> Self {
        let code = blank_non_code(source);
        let line_starts = std::iter::once(0)
            .chain(code.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        SourceText {
            source,
            code,
            line_starts,
        }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = self.source[self.line_starts[line]..offset].chars().count() + 1;
        (line + 1, column)
    }

    /// Namespace scopes as (body range, name).
    fn namespace_scopes(&self) -> Vec<(Range<usize>, String)> {
        NAMESPACE_DECL
            .captures_iter(&self.code)
            .filter_map(|caps| {
                let name = caps.get(1)?.as_str().to_string();
                let delim = caps.get(2)?;
                let body = if delim.as_str() == ";" {
                    delim.start()..self.code.len()
                } else {
                    delim.start()..block_end(&self.code, delim.start())
                };
                Some((body, name))
            })
            .collect()
    }

    fn declarations(&self) -> Vec<Declaration> {
        let mut found: Vec<(usize, Range<usize>, TypeKind, Range<usize>)> = Vec::new();

        for caps in TYPE_DECL.captures_iter(&self.code) {
            let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            if is_keyword(name.as_str()) {
                continue;
            }
            let kind = match keyword.as_str() {
                "class" => TypeKind::Class,
                "struct" => TypeKind::Struct,
                "interface" => TypeKind::Interface,
                "enum" => TypeKind::Enum,
                _ => TypeKind::Record,
            };
            let body = self.type_body(name.end());
            found.push((keyword.start(), name.range(), kind, body));
        }

        for caps in DELEGATE_DECL.captures_iter(&self.code) {
            let Some(name) = caps.get(1) else { continue };
            if is_keyword(name.as_str()) {
                continue;
            }
            let start = caps.get(0).map_or(name.start(), |m| m.start());
            found.push((start, name.range(), TypeKind::Delegate, name.end()..name.end()));
        }

        found.sort_by_key(|(start, ..)| *start);
        let namespaces = self.namespace_scopes();

        found
            .iter()
            .map(|(start, name, kind, _)| {
                let mut parts: Vec<(usize, &str)> = namespaces
                    .iter()
                    .filter(|(body, _)| body.contains(start))
                    .map(|(body, ns)| (body.start, ns.as_str()))
                    .collect();
                parts.extend(
                    found
                        .iter()
                        .filter(|(_, _, _, body)| body.contains(start))
                        .map(|(_, outer, _, body)| (body.start, &self.code[outer.clone()])),
                );
                parts.sort_by_key(|(at, _)| *at);

                let mut full_name: Vec<&str> = parts.into_iter().map(|(_, p)| p).collect();
                full_name.push(&self.code[name.clone()]);

                Declaration {
                    ty: DeclaredType::new(full_name.join("."), *kind),
                    name: name.clone(),
                }
            })
            .collect()
    }

    /// Body range of a type whose name ends at `from`; empty for `;`-terminated records.
    fn type_body(&self, from: usize) -> Range<usize> {
        let rest = &self.code[from..];
        match rest.find(['{', ';']) {
            Some(i) if rest.as_bytes()[i] == b'{' => {
                let open = from + i;
                open..block_end(&self.code, open)
            }
            _ => from..from,
        }
    }

    fn usages(&self, file: &Path) -> Vec<UsageSite> {
        let mut skipped: Vec<Range<usize>> = USING_DIRECTIVE
            .find_iter(&self.code)
            .map(|m| m.range())
            .collect();
        skipped.extend(
            NAMESPACE_DECL
                .captures_iter(&self.code)
                .filter_map(|c| c.get(1).map(|m| m.range())),
        );
        let declared_names: HashSet<usize> = self
            .declarations()
            .into_iter()
            .map(|d| d.name.start)
            .collect();

        let mut sites = Vec::new();
        for chain in IDENT_CHAIN.find_iter(&self.code) {
            if skipped.iter().any(|r| r.contains(&chain.start())) {
                continue;
            }
            let text = chain.as_str().trim_start_matches('@');
            let base = chain.end() - text.len();

            let mut offset = base;
            for (i, segment) in text.split('.').enumerate() {
                let segment_start = offset;
                offset += segment.len() + 1;

                if i == 0 && is_keyword(segment) && chain.as_str() == text {
                    continue;
                }
                if declared_names.contains(&segment_start) {
                    continue;
                }

                let (line, column) = self.position(segment_start);
                sites.push(UsageSite {
                    referenced_type: text[..segment_start - base + segment.len()].to_string(),
                    file: file.to_path_buf(),
                    line,
                    column,
                });
            }
        }
        sites
    }
}

/// Offset just past the brace that closes the block opened at `open`.
fn block_end(code: &str, open: usize) -> usize {
    let mut depth = 0usize;
    for (i, b) in code.bytes().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    code.len()
}

/// Replace comments, string and char literals with spaces, keeping newlines,
/// so offsets, lines and columns still line up with the original.
fn blank_non_code(source: &str) -> String {
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str { verbatim: bool },
        RawStr { quotes: usize },
        Char,
    }

    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut state = State::Code;
    let mut i = 0;

    // Blanks keep the UTF-8 width so byte offsets stay aligned with the source.
    let blank = |out: &mut String, c: char| {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    };

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match state {
            State::Code => match (c, next) {
                ('/', Some('/')) => {
                    state = State::LineComment;
                    blank(&mut out, c);
                }
                ('/', Some('*')) => {
                    state = State::BlockComment;
                    blank(&mut out, c);
                    blank(&mut out, '*');
                    i += 1;
                }
                ('"', _) => {
                    let quotes = chars[i..].iter().take_while(|&&q| q == '"').count();
                    if quotes >= 3 {
                        state = State::RawStr { quotes };
                        for _ in 0..quotes {
                            blank(&mut out, '"');
                        }
                        i += quotes;
                        continue;
                    }
                    let prev = |back: usize| i.checked_sub(back).map(|j| chars[j]);
                    let verbatim = prev(1) == Some('@')
                        || (prev(1) == Some('$') && prev(2) == Some('@'));
                    state = State::Str { verbatim };
                    blank(&mut out, c);
                }
                ('\'', _) => {
                    state = State::Char;
                    blank(&mut out, c);
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
                blank(&mut out, c);
            }
            State::BlockComment => {
                blank(&mut out, c);
                if c == '*' && next == Some('/') {
                    blank(&mut out, '/');
                    i += 1;
                    state = State::Code;
                }
            }
            State::Str { verbatim } => {
                blank(&mut out, c);
                if verbatim {
                    if c == '"' {
                        if next == Some('"') {
                            blank(&mut out, '"');
                            i += 1;
                        } else {
                            state = State::Code;
                        }
                    }
                } else if c == '\\' {
                    if let Some(escaped) = next {
                        blank(&mut out, escaped);
                        i += 1;
                    }
                } else if c == '"' || c == '\n' {
                    state = State::Code;
                }
            }
            State::RawStr { quotes } => {
                let run = chars[i..].iter().take_while(|&&q| q == '"').count();
                if run >= quotes {
                    for _ in 0..run {
                        blank(&mut out, '"');
                    }
                    i += run;
                    state = State::Code;
                    continue;
                }
                blank(&mut out, c);
            }
            State::Char => {
                blank(&mut out, c);
                if c == '\\' {
                    if let Some(escaped) = next {
                        blank(&mut out, escaped);
                        i += 1;
                    }
                } else if c == '\'' || c == '\n' {
                    state = State::Code;
                }
            }
        }
        i += 1;
    }

    out
}
