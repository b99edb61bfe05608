//! Error types for the build action.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::ResolutionError;
use crate::sources::ClassificationError;

/// Everything that can make a `nogo` or `validate` invocation fail.
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Malformed or inconsistent flags. No outputs are attempted.
    #[error("{0}")]
    Argument(String),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// The analyzer could not be started or did not terminate normally.
    #[error("{0}")]
    Integration(String),
    /// The analyzer reported findings under the fail-on-findings policy.
    /// Holds the relativized analyzer output verbatim.
    #[error("{}", String::from_utf8_lossy(.0))]
    Findings(Vec<u8>),
    /// The findings log handed to the validation gate was not empty.
    #[error("\n{}", String::from_utf8_lossy(.0))]
    Validation(Vec<u8>),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuilderError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuilderError::Io {
            path: path.into(),
            source,
        }
    }

    /// Findings and validation failures are verdicts about the analyzed code,
    /// not malfunctions of the action. Returns the exact bytes to report for
    /// one, without any decoding, or `None` for any other error.
    pub fn verdict_bytes(&self) -> Option<Vec<u8>> {
        match self {
            BuilderError::Findings(output) => Some(output.clone()),
            BuilderError::Validation(log) => {
                let mut bytes = Vec::with_capacity(log.len() + 1);
                bytes.push(b'\n');
                bytes.extend_from_slice(log);
                Some(bytes)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BuilderError>;
