//! Source filtering.
//!
//! Splits the raw `-src` inputs of one package into Go sources and sources
//! in other languages, and flags Go files that cross the cgo boundary.
//! Classification by extension is pure; Go files additionally have their
//! header read so imports are known to the resolver.

mod header;

pub use header::{parse_go_header, read_go_header, GoHeader, Import, CGO_PSEUDO_IMPORT};

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{BuilderError, Result};

/// Language of a non-Go source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeLanguage {
    C,
    Cxx,
    ObjC,
    ObjCxx,
    Asm,
    Header,
    Syso,
}

impl NativeLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeLanguage::C => "c",
            NativeLanguage::Cxx => "c++",
            NativeLanguage::ObjC => "objc",
            NativeLanguage::ObjCxx => "objc++",
            NativeLanguage::Asm => "asm",
            NativeLanguage::Header => "header",
            NativeLanguage::Syso => "syso",
        }
    }
}

impl std::fmt::Display for NativeLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of a source file, decided once from its extension and header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Plain Go; handed to the analyzer.
    Compiled,
    /// Go that imports "C"; contributes imports but is not analyzed.
    ForeignBoundary,
    /// Anything the Go compiler does not read directly.
    Native(NativeLanguage),
}

/// Raised for a source whose extension is not recognized.
#[derive(Error, Debug)]
#[error("{}: don't know how to compile this kind of source", .path.display())]
pub struct ClassificationError {
    pub path: PathBuf,
}

/// A classified source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
    /// Imports declared in the file header (Go files only)
    pub imports: Vec<Import>,
}

impl SourceFile {
    pub fn is_go(&self) -> bool {
        matches!(self.kind, SourceKind::Compiled | SourceKind::ForeignBoundary)
    }
}

/// Sources of one package after filtering.
#[derive(Debug, Clone, Default)]
pub struct FilteredSources {
    /// Go sources, cgo or not, in input order
    pub go: Vec<SourceFile>,
    /// Native sources in input order
    pub other: Vec<SourceFile>,
}

impl FilteredSources {
    /// Go sources the analyzer can read directly.
    pub fn analyzable(&self) -> Vec<PathBuf> {
        self.go
            .iter()
            .filter(|s| s.kind == SourceKind::Compiled)
            .map(|s| s.path.clone())
            .collect()
    }

    /// Whether any Go source crosses the cgo boundary.
    pub fn has_foreign_boundary(&self) -> bool {
        self.go.iter().any(|s| s.kind == SourceKind::ForeignBoundary)
    }
}

/// Classify a path by extension. `None` means a Go source.
pub fn classify_extension(path: &Path) -> std::result::Result<Option<NativeLanguage>, ClassificationError> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let lang = match ext {
        "go" => return Ok(None),
        "c" => NativeLanguage::C,
        "cc" | "cpp" | "cxx" => NativeLanguage::Cxx,
        "m" => NativeLanguage::ObjC,
        "mm" => NativeLanguage::ObjCxx,
        "s" | "S" => NativeLanguage::Asm,
        "h" | "hh" | "hpp" | "hxx" => NativeLanguage::Header,
        "syso" => NativeLanguage::Syso,
        _ => {
            return Err(ClassificationError {
                path: path.to_path_buf(),
            })
        }
    };
    Ok(Some(lang))
}

/// Classify and split the raw sources of one package.
pub fn filter_sources(srcs: &[PathBuf]) -> Result<FilteredSources> {
    let mut filtered = FilteredSources::default();

    for src in srcs {
        match classify_extension(src)? {
            Some(lang) => filtered.other.push(SourceFile {
                path: src.clone(),
                kind: SourceKind::Native(lang),
                imports: Vec::new(),
            }),
            None => {
                let header = read_go_header(src).map_err(|e| BuilderError::io(src, e))?;
                if header.package.is_none() {
                    tracing::warn!(
                        file = %src.display(),
                        "no package clause found, imports not read"
                    );
                }
                let kind = if header.imports_c() {
                    SourceKind::ForeignBoundary
                } else {
                    SourceKind::Compiled
                };
                filtered.go.push(SourceFile {
                    path: src.clone(),
                    kind,
                    imports: header.imports,
                });
            }
        }
    }

    tracing::debug!(
        go = filtered.go.len(),
        other = filtered.other.len(),
        cgo = filtered.has_foreign_boundary(),
        "filtered sources"
    );

    Ok(filtered)
}
