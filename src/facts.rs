//! Upstream fact references.
//!
//! Each direct dependency may carry a facts file produced when that
//! dependency was analyzed. Facts are advisory: a missing file only
//! lowers the analyzer's precision, so it is skipped rather than fatal.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::resolve::Archive;

/// Analyzer flag introducing one fact reference.
pub const FACT_FLAG: &str = "-fact";

/// Fact references keyed by import path. Later declarations win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    facts: BTreeMap<String, PathBuf>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `-facts` declarations in order.
    pub fn from_archives<'a, I>(archives: I) -> Self
    where
        I: IntoIterator<Item = &'a Archive>,
    {
        let mut set = Self::new();
        for arc in archives {
            set.insert(&arc.import_path, &arc.file);
        }
        set
    }

    /// Add a fact reference, replacing any earlier one for the same import.
    pub fn insert(&mut self, import_path: &str, file: &Path) {
        if let Some(previous) = self.facts.insert(import_path.to_string(), file.to_path_buf()) {
            tracing::debug!(
                import_path,
                previous = %previous.display(),
                "fact reference redeclared"
            );
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Analyzer arguments for every fact file that exists, sorted by import
    /// path: `-fact importpath=file` pairs.
    pub fn analyzer_args(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut args = Vec::with_capacity(self.len() * 2);
        for (import_path, file) in &self.facts {
            if !file.exists() {
                tracing::warn!(
                    import_path = %import_path,
                    file = %file.display(),
                    "facts file not found, analyzing without it"
                );
                continue;
            }
            args.push(FACT_FLAG.to_string());
            args.push(format!("{}={}", import_path, file.display()));
        }
        args
    }
}
