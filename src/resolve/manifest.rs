//! Standard library package manifest.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{BuilderError, Result};

/// The set of import paths provided by the standard library.
#[derive(Debug, Clone, Default)]
pub struct StdlibManifest {
    packages: HashSet<String>,
}

impl StdlibManifest {
    /// Load a newline-separated manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BuilderError::io(path, e))?;
        Ok(Self::parse(&content))
    }

    /// Parse manifest content. Blank lines are ignored.
    pub fn parse(content: &str) -> Self {
        let packages = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { packages }
    }

    pub fn contains(&self, import_path: &str) -> bool {
        self.packages.contains(import_path)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StdlibManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().map(Into::into).collect(),
        }
    }
}
