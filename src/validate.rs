//! Validation gate.
//!
//! Turns the findings log written by a `nogo` run into a pass/fail
//! decision. It runs as its own action so the facts-producing step can be
//! cached independently of failure reporting.

use std::fs;
use std::path::Path;

use crate::error::{BuilderError, Result};
use crate::outputs::DeclaredOutput;

/// Create `marker`, then fail if `log` is non-empty.
///
/// The marker is created before the log is read. If it were created only
/// on success, the build system would report missing outputs instead of
/// the findings.
pub fn run_validation(marker: &Path, log: &Path) -> Result<()> {
    DeclaredOutput::create(marker)?;

    let content = fs::read(log).map_err(|e| BuilderError::io(log, e))?;
    if content.is_empty() {
        tracing::debug!(log = %log.display(), "findings log is empty");
        return Ok(());
    }
    Err(BuilderError::Validation(content))
}
