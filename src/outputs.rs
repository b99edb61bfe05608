//! Declared outputs.
//!
//! The build graph expects every declared output to exist once the action
//! finishes, whatever the logical outcome. Creating the file is therefore
//! the first side effect of an action; reporting failure comes later.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{BuilderError, Result};

/// A declared output file. Exists (possibly empty) from construction on.
#[derive(Debug)]
pub struct DeclaredOutput {
    path: PathBuf,
}

impl DeclaredOutput {
    /// Create or truncate the output.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        File::create(&path).map_err(|e| BuilderError::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the output's content.
    pub fn write(&self, contents: &[u8]) -> Result<()> {
        fs::write(&self.path, contents).map_err(|e| BuilderError::io(&self.path, e))
    }

    /// Recreate the output empty if something removed it.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        tracing::debug!(path = %self.path.display(), "recreating missing output");
        File::create(&self.path)
            .map(|_| ())
            .map_err(|e| BuilderError::io(&self.path, e))
    }
}

/// The outputs of one `nogo` invocation.
#[derive(Debug)]
pub struct ActionOutputs {
    pub facts: DeclaredOutput,
    /// Present under the log-findings policy only
    pub log: Option<DeclaredOutput>,
}

impl ActionOutputs {
    pub fn create(facts: &Path, log: Option<&Path>) -> Result<Self> {
        let facts = DeclaredOutput::create(facts)?;
        let log = log.map(DeclaredOutput::create).transpose()?;
        Ok(Self { facts, log })
    }

    /// Make sure every output still exists.
    pub fn ensure_exist(&self) -> Result<()> {
        self.facts.ensure_exists()?;
        if let Some(log) = &self.log {
            log.ensure_exists()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_truncates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f.facts");
        std::fs::write(&path, b"stale").unwrap();

        let out = DeclaredOutput::create(&path).unwrap();
        assert_eq!(std::fs::read(out.path()).unwrap(), b"");

        out.write(b"fresh").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"fresh");
    }

    #[test]
    fn test_ensure_exists_recreates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("f.log");
        let out = DeclaredOutput::create(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        out.ensure_exists().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_action_outputs_without_log() {
        let temp = TempDir::new().unwrap();
        let facts = temp.path().join("f.facts");
        let outputs = ActionOutputs::create(&facts, None).unwrap();
        assert!(facts.exists());
        assert!(outputs.log.is_none());
    }

    #[test]
    fn test_create_in_missing_dir_fails() {
        let err = DeclaredOutput::create("/nonexistent/dir/f.facts").unwrap_err();
        assert!(err.to_string().starts_with("/nonexistent/dir/f.facts:"));
    }
}
