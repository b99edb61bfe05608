//! Scratch directory for one invocation.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{BuilderError, Result};

enum Handle {
    Scoped(TempDir),
    Kept(PathBuf),
}

/// Holds the parameter file and captured output of one analyzer run.
/// Removed on drop unless preserved.
pub struct WorkDir {
    handle: Handle,
}

impl WorkDir {
    pub fn create(preserve: bool) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("nogo_work-")
            .tempdir()
            .map_err(|e| BuilderError::io(std::env::temp_dir(), e))?;

        let handle = if preserve {
            let path = dir.keep();
            tracing::info!(path = %path.display(), "preserving work directory");
            Handle::Kept(path)
        } else {
            Handle::Scoped(dir)
        };
        Ok(Self { handle })
    }

    pub fn path(&self) -> &Path {
        match &self.handle {
            Handle::Scoped(dir) => dir.path(),
            Handle::Kept(path) => path.as_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop() {
        let work = WorkDir::create(false).unwrap();
        let path = work.path().to_path_buf();
        std::fs::write(path.join("nogo.param"), "x").unwrap();
        assert!(path.is_dir());

        drop(work);
        assert!(!path.exists());
    }

    #[test]
    fn test_preserved() {
        let work = WorkDir::create(true).unwrap();
        let path = work.path().to_path_buf();
        drop(work);

        assert!(path.is_dir());
        std::fs::remove_dir_all(&path).unwrap();
    }
}
