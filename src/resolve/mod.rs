//! Import resolution.
//!
//! Computes the set of import paths a package's Go sources reference and
//! maps each one to the archive that satisfies it: a standard library
//! archive or a declared direct dependency. The result is written to an
//! import-config file the analyzer reads.

mod archive;
mod importcfg;
mod manifest;

pub use archive::Archive;
pub use importcfg::{render_importcfg, ImportConfigFile, StdlibLayout};
pub use manifest::StdlibManifest;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::path::PathBuf;

use thiserror::Error;

use crate::sources::{SourceFile, CGO_PSEUDO_IMPORT};

/// Imports cgo-generated code adds to a package.
pub const IMPLICIT_CGO_IMPORTS: &[&str] = &["runtime/cgo", "syscall", "unsafe"];

/// An import the declared dependencies do not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingImport {
    pub file: PathBuf,
    pub line: usize,
    pub import: String,
}

/// Errors raised while resolving imports.
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("{}", describe_missing(.missing, .known))]
    MissingDependencies {
        missing: Vec<MissingImport>,
        /// Import paths of the declared dependencies
        known: Vec<String>,
    },
    #[error(
        "dependency cycle detected between {package:?} and {import:?} in file {}",
        .file.display()
    )]
    Cycle {
        package: String,
        import: String,
        file: PathBuf,
    },
}

fn describe_missing(missing: &[MissingImport], known: &[String]) -> String {
    let mut buf = String::from("missing strict dependencies:\n");
    for dep in missing {
        let _ = writeln!(
            buf,
            "\t{}:{}: import of {:?}",
            dep.file.display(),
            dep.line,
            dep.import
        );
    }
    if known.is_empty() {
        buf.push_str("No dependencies were provided.\n");
    } else {
        buf.push_str("Known dependencies are:\n");
        for imp in known {
            let _ = writeln!(buf, "\t{}", imp);
        }
    }
    buf.push_str("Check that imports in Go sources match importpath attributes in deps.");
    buf
}

/// What an import resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Stdlib,
    Archive(Archive),
}

/// The resolved import closure of one package, keyed by import path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportClosure {
    imports: BTreeMap<String, ImportTarget>,
}

impl ImportClosure {
    pub fn get(&self, import_path: &str) -> Option<&ImportTarget> {
        self.imports.get(import_path)
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.imports.contains_key(import_path)
    }

    /// Import paths in sorted order.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.imports.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImportTarget)> {
        self.imports.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// Resolves the imports of a package's Go sources against its declared
/// dependencies and the standard library.
pub struct ImportResolver<'a> {
    archives: &'a [Archive],
    stdlib: &'a StdlibManifest,
    recompile_internal_deps: HashSet<String>,
    cgo_enabled: bool,
}

impl<'a> ImportResolver<'a> {
    pub fn new(archives: &'a [Archive], stdlib: &'a StdlibManifest) -> Self {
        Self {
            archives,
            stdlib,
            recompile_internal_deps: HashSet::new(),
            cgo_enabled: false,
        }
    }

    /// Import paths that must not be imported, because they are recompiled
    /// against the package being analyzed.
    pub fn recompile_internal_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recompile_internal_deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Whether cgo is active for this build.
    pub fn cgo_enabled(mut self, enabled: bool) -> Self {
        self.cgo_enabled = enabled;
        self
    }

    /// Resolve every import of `sources`. `package` names the package being
    /// analyzed, for error messages.
    pub fn resolve(
        &self,
        package: &str,
        sources: &[SourceFile],
    ) -> Result<ImportClosure, ResolutionError> {
        let mut by_import: HashMap<&str, &Archive> = HashMap::new();
        let mut by_alias: HashMap<&str, &Archive> = HashMap::new();
        for arc in self.archives {
            let mut paths = arc.import_paths();
            if let Some(primary) = paths.next() {
                by_import.insert(primary, arc);
            }
            for alias in paths {
                by_alias.insert(alias, arc);
            }
        }

        let mut imports = BTreeMap::new();
        let mut missing = Vec::new();
        let mut has_cgo = false;

        for src in sources.iter().filter(|s| s.is_go()) {
            for imp in &src.imports {
                let path = imp.path.as_str();
                if path == CGO_PSEUDO_IMPORT {
                    has_cgo = true;
                    continue;
                }
                if imports.contains_key(path) || is_relative(path) {
                    continue;
                }
                if self.recompile_internal_deps.contains(path) {
                    return Err(ResolutionError::Cycle {
                        package: package.to_string(),
                        import: path.to_string(),
                        file: src.path.clone(),
                    });
                }

                let target = if self.stdlib.contains(path) {
                    ImportTarget::Stdlib
                } else if let Some(arc) = by_import.get(path).or_else(|| by_alias.get(path)) {
                    ImportTarget::Archive((*arc).clone())
                } else {
                    missing.push(MissingImport {
                        file: src.path.clone(),
                        line: imp.line,
                        import: path.to_string(),
                    });
                    continue;
                };
                imports.insert(path.to_string(), target);
            }
        }

        if !missing.is_empty() {
            return Err(ResolutionError::MissingDependencies {
                missing,
                known: self.archives.iter().map(|a| a.import_path.clone()).collect(),
            });
        }

        if has_cgo && self.cgo_enabled {
            for imp in IMPLICIT_CGO_IMPORTS {
                imports.insert(imp.to_string(), ImportTarget::Stdlib);
            }
        }

        tracing::debug!(package, imports = imports.len(), "resolved import closure");

        Ok(ImportClosure { imports })
    }
}

/// Relative imports (`./x`, `../x`) are not resolved.
fn is_relative(path: &str) -> bool {
    path == "." || path == ".." || path.starts_with("./") || path.starts_with("../")
}
