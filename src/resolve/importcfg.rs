//! Import-config file generation.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use super::{ImportClosure, ImportTarget};
use crate::error::{BuilderError, Result};

/// Where standard library archives live: `<goroot>/pkg/<install_suffix>/<import>.a`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StdlibLayout {
    pub goroot: PathBuf,
    pub install_suffix: String,
}

impl StdlibLayout {
    pub fn new(goroot: impl Into<PathBuf>, install_suffix: impl Into<String>) -> Self {
        Self {
            goroot: goroot.into(),
            install_suffix: install_suffix.into(),
        }
    }

    /// Location of the archive for a standard library import.
    pub fn archive_for(&self, import_path: &str) -> PathBuf {
        let mut dir = self.goroot.join("pkg");
        if !self.install_suffix.is_empty() {
            dir.push(&self.install_suffix);
        }
        dir.join(format!("{}.a", import_path))
    }
}

/// Render the import-config content for a closure, sorted by import path.
pub fn render_importcfg(closure: &ImportClosure, layout: &StdlibLayout) -> String {
    let mut buf = String::new();
    for (import_path, target) in closure.iter() {
        match target {
            ImportTarget::Stdlib => {
                let _ = writeln!(
                    buf,
                    "packagefile {}={}",
                    import_path,
                    layout.archive_for(import_path).display()
                );
            }
            ImportTarget::Archive(arc) => {
                if import_path != arc.package_path {
                    let _ = writeln!(buf, "importmap {}={}", import_path, arc.package_path);
                }
                let _ = writeln!(buf, "packagefile {}={}", arc.package_path, arc.file.display());
            }
        }
    }
    buf
}

enum Handle {
    Scoped(TempPath),
    Kept(PathBuf),
}

/// The import-config file of one invocation.
///
/// Created next to the primary output and removed when dropped, on every
/// exit path, unless it was preserved for debugging.
pub struct ImportConfigFile {
    handle: Handle,
}

impl ImportConfigFile {
    /// Write the import-config for `closure` into `dir`.
    pub fn write(
        closure: &ImportClosure,
        layout: &StdlibLayout,
        dir: &Path,
        preserve: bool,
    ) -> Result<Self> {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        let mut file = tempfile::Builder::new()
            .prefix("importcfg")
            .tempfile_in(dir)
            .map_err(|e| BuilderError::io(dir, e))?;
        file.write_all(render_importcfg(closure, layout).as_bytes())
            .map_err(|e| BuilderError::io(file.path(), e))?;

        let temp_path = file.into_temp_path();
        let handle = if preserve {
            let path = temp_path
                .keep()
                .map_err(|e| BuilderError::io(dir, e.error))?;
            tracing::info!(path = %path.display(), "preserving import config");
            Handle::Kept(path)
        } else {
            Handle::Scoped(temp_path)
        };
        Ok(Self { handle })
    }

    pub fn path(&self) -> &Path {
        match &self.handle {
            Handle::Scoped(p) => &**p,
            Handle::Kept(p) => p.as_path(),
        }
    }
}
