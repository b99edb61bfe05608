//! Optional YAML configuration.
//!
//! Holds defaults for settings a build usually fixes once per toolchain
//! (policy, cgo, relativization root, SDK layout). Flags given on the
//! command line take precedence.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::Policy;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    /// "fail" or "log"
    #[serde(default)]
    pub policy: Option<Policy>,
    /// Keep scratch files for debugging
    #[serde(default)]
    pub preserve_workdir: Option<bool>,
    #[serde(default)]
    pub cgo_enabled: Option<bool>,
    /// Root that absolute paths in analyzer output are made relative to
    #[serde(default)]
    pub relativize_root: Option<PathBuf>,
    #[serde(default)]
    pub echo_output: Option<bool>,
    #[serde(default)]
    pub goroot: Option<PathBuf>,
    #[serde(default)]
    pub install_suffix: Option<String>,
}

impl BuilderConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. An empty document is the
    /// default configuration.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: BuilderConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }
}
