//! Path relativization of captured analyzer output.
//!
//! Absolute paths under a known root are rewritten relative to it so the
//! text is identical across machines and safe to cache.

use std::path::{Path, MAIN_SEPARATOR};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRelativizer {
    prefix: Option<String>,
}

impl PathRelativizer {
    /// Relativize against `root`.
    pub fn new(root: &Path) -> Self {
        let mut prefix = root.to_string_lossy().into_owned();
        if prefix.is_empty() {
            return Self::disabled();
        }
        if !prefix.ends_with(MAIN_SEPARATOR) {
            prefix.push(MAIN_SEPARATOR);
        }
        Self {
            prefix: Some(prefix),
        }
    }

    /// Relativize against the current working directory, or do nothing if
    /// it cannot be determined.
    pub fn from_current_dir() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::new(&dir),
            Err(_) => Self::disabled(),
        }
    }

    /// A relativizer that leaves text unchanged.
    pub fn disabled() -> Self {
        Self { prefix: None }
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.prefix {
            Some(prefix) => text.replace(prefix.as_str(), ""),
            None => text.to_string(),
        }
    }

    /// Relativize raw bytes. Bytes that are not UTF-8 pass through unchanged.
    pub fn apply_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        let Some(prefix) = &self.prefix else {
            return bytes.to_vec();
        };
        let needle = prefix.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut rest = bytes;
        while let Some(idx) = rest.windows(needle.len()).position(|w| w == needle) {
            out.extend_from_slice(&rest[..idx]);
            rest = &rest[idx + needle.len()..];
        }
        out.extend_from_slice(rest);
        out
    }
}
