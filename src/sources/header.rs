//! Go file header reading.
//!
//! Only the package clause and import declarations are read. Scanning stops
//! at the first top-level declaration that is not an import.

use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;

/// Pseudo-package imported by files that use cgo.
pub const CGO_PSEUDO_IMPORT: &str = "C";

/// One import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    /// The quoted import path, unquoted
    pub path: String,
    /// Line number of the import spec (1-indexed)
    pub line: usize,
}

/// The parsed header of a Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoHeader {
    pub package: Option<String>,
    pub imports: Vec<Import>,
}

impl GoHeader {
    /// Whether the file crosses the cgo boundary.
    pub fn imports_c(&self) -> bool {
        self.imports.iter().any(|i| i.path == CGO_PSEUDO_IMPORT)
    }
}

/// Read the header of a Go file.
pub fn read_go_header(path: &Path) -> io::Result<GoHeader> {
    let content = fs::read_to_string(path)?;
    Ok(parse_go_header(&content))
}

/// Parse the header of Go source text.
pub fn parse_go_header(content: &str) -> GoHeader {
    lazy_static::lazy_static! {
        static ref PACKAGE_RE: Regex = Regex::new(r"^package\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    }

    let mut header = GoHeader::default();
    let mut in_comment = false;
    let mut in_block = false;

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    for (line_num, raw) in content.lines().enumerate() {
        let line_no = line_num + 1;
        let stripped = strip_comments(raw, &mut in_comment);
        let line = stripped.trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            in_block = !consume_block(line, line_no, &mut header.imports);
            continue;
        }

        if header.package.is_none() {
            match PACKAGE_RE.captures(line) {
                Some(caps) => {
                    header.package = Some(caps[1].to_string());
                    continue;
                }
                None => break,
            }
        }

        match import_body(line) {
            Some(body) => {
                if let Some(block) = body.strip_prefix('(') {
                    in_block = !consume_block(block, line_no, &mut header.imports);
                } else {
                    push_spec(body, line_no, &mut header.imports);
                }
            }
            None => break,
        }
    }

    header
}

/// Return the text following the `import` keyword, if the line starts with it.
fn import_body(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("import")?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c == '(' || c == '"' || c == '`' => Some(rest.trim_start()),
        _ => None,
    }
}

/// Consume specs inside an import block. Returns true once the block closes.
fn consume_block(text: &str, line: usize, imports: &mut Vec<Import>) -> bool {
    let (body, closed) = match text.find(')') {
        Some(idx) => (&text[..idx], true),
        None => (text, false),
    };
    for spec in body.split(';') {
        push_spec(spec, line, imports);
    }
    closed
}

/// Parse a single import spec: an optional name followed by a quoted path.
fn push_spec(spec: &str, line: usize, imports: &mut Vec<Import>) {
    lazy_static::lazy_static! {
        static ref SPEC_RE: Regex =
            Regex::new(r#"^(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?(?:"([^"]*)"|`([^`]*)`)"#).unwrap();
    }

    let spec = spec.trim();
    if spec.is_empty() {
        return;
    }
    if let Some(caps) = SPEC_RE.captures(spec) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            imports.push(Import {
                path: m.as_str().to_string(),
                line,
            });
        }
    }
}

/// Remove `//` and `/* */` comments from one line, tracking block comments
/// that span lines. String literals are left untouched.
fn strip_comments(line: &str, in_comment: &mut bool) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if *in_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_comment = false;
                out.push(' ');
            }
            continue;
        }
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' && q == '"' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_comment = true;
            }
            _ => out.push(c),
        }
    }

    out
}
