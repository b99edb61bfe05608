//! Analyzer invocation.
//!
//! Composes the analyzer command for one package, runs it to completion
//! with stdout and stderr captured together, and turns the outcome into a
//! result according to the findings policy in effect.
//!
//! # Outcomes
//!
//! - No analyzable sources: the facts output stays empty and the analyzer
//!   is never started.
//! - Abnormal termination (signal, crash) or a failure to start: always
//!   fatal, with the full command line and captured output in the error.
//! - Clean exit: decided by [`Policy`].

mod relativize;
mod workdir;

pub use relativize::PathRelativizer;
pub use workdir::WorkDir;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{BuilderError, Result};
use crate::facts::FactSet;
use crate::outputs::ActionOutputs;
use crate::params::{write_params_file, PARAM_FLAG_PREFIX};

const PARAMS_FILE_NAME: &str = "nogo.param";
const CAPTURE_FILE_NAME: &str = "nogo.out";

/// What to do when the analyzer exits cleanly with findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// Fail the action; the findings become its error text.
    #[serde(rename = "fail")]
    FailOnFindings,
    /// Succeed and write the findings to the log output for a later
    /// validation step.
    #[serde(rename = "log")]
    LogFindings,
}

impl Policy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Policy::FailOnFindings => "fail",
            Policy::LogFindings => "log",
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(Policy::FailOnFindings),
            "log" => Ok(Policy::LogFindings),
            _ => Err(format!("unknown policy: {} (want 'fail' or 'log')", s)),
        }
    }
}

/// How an analysis run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStatus {
    /// Nothing to analyze; the analyzer was not started.
    Skipped,
    /// The analyzer exited with status zero.
    Clean,
    /// The analyzer exited cleanly with a non-zero status and its output
    /// was logged.
    FindingsLogged,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    pub exit_code: Option<i32>,
    /// Relativized analyzer output, byte for byte
    pub output: Vec<u8>,
}

impl AnalysisResult {
    /// Result of a run where the analyzer was not started.
    pub fn skipped() -> Self {
        Self {
            status: AnalysisStatus::Skipped,
            exit_code: None,
            output: Vec::new(),
        }
    }
}

/// Inputs of one analyzer invocation.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    /// Import path of the package being analyzed
    pub package_path: &'a str,
    pub importcfg: &'a Path,
    pub facts: &'a FactSet,
    /// Go sources the analyzer reads
    pub sources: &'a [PathBuf],
}

/// Runs the analyzer executable under a findings policy.
pub struct AnalysisRunner {
    analyzer: PathBuf,
    policy: Policy,
    relativizer: PathRelativizer,
    echo_output: bool,
}

impl AnalysisRunner {
    pub fn new<P: AsRef<Path>>(analyzer: P, policy: Policy) -> Self {
        Self {
            analyzer: analyzer.as_ref().to_path_buf(),
            policy,
            relativizer: PathRelativizer::from_current_dir(),
            echo_output: false,
        }
    }

    /// Set the relativizer applied to captured output.
    pub fn relativizer(mut self, relativizer: PathRelativizer) -> Self {
        self.relativizer = relativizer;
        self
    }

    /// Echo output of clean runs to stderr under the fail-on-findings policy.
    pub fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }

    /// The full analyzer command line, executable first.
    pub fn compose_args(&self, request: &AnalysisRequest<'_>, out_facts: &Path) -> Vec<String> {
        let mut args = vec![self.analyzer.to_string_lossy().into_owned()];
        args.push("-p".to_string());
        args.push(request.package_path.to_string());
        args.push("-importcfg".to_string());
        args.push(request.importcfg.to_string_lossy().into_owned());
        args.extend(request.facts.analyzer_args());
        args.push("-x".to_string());
        args.push(out_facts.to_string_lossy().into_owned());
        args.extend(request.sources.iter().map(|s| s.to_string_lossy().into_owned()));
        args
    }

    /// Run the analyzer for `request`, writing into `outputs`.
    pub fn run(
        &self,
        request: &AnalysisRequest<'_>,
        work_dir: &WorkDir,
        outputs: &ActionOutputs,
    ) -> Result<AnalysisResult> {
        if request.sources.is_empty() {
            tracing::debug!(package = request.package_path, "no analyzable sources");
            outputs.facts.write(b"")?;
            return Ok(AnalysisResult::skipped());
        }

        let args = self.compose_args(request, outputs.facts.path());
        let command_line = args.join(" ");

        let params_path = work_dir.path().join(PARAMS_FILE_NAME);
        write_params_file(&params_path, &args[1..])?;

        let capture_path = work_dir.path().join(CAPTURE_FILE_NAME);
        let capture = File::create(&capture_path).map_err(|e| BuilderError::io(&capture_path, e))?;
        let capture_err = capture
            .try_clone()
            .map_err(|e| BuilderError::io(&capture_path, e))?;

        tracing::debug!(command = %command_line, "running analyzer");

        let status = Command::new(&self.analyzer)
            .arg(format!("{}{}", PARAM_FLAG_PREFIX, params_path.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::from(capture))
            .stderr(Stdio::from(capture_err))
            .status()
            .map_err(|e| {
                BuilderError::Integration(format!(
                    "error running analyzer {}: {}",
                    self.analyzer.display(),
                    e
                ))
            })?;

        let raw = std::fs::read(&capture_path).map_err(|e| BuilderError::io(&capture_path, e))?;
        let output = self.relativizer.apply_bytes(&raw);

        let Some(code) = status.code() else {
            return Err(BuilderError::Integration(format!(
                "analyzer command '{}' exited unexpectedly: {}\n{}",
                self.relativizer.apply(&command_line),
                describe_abnormal_exit(status),
                String::from_utf8_lossy(&output)
            )));
        };

        outputs.facts.ensure_exists()?;
        self.conclude(code, output, outputs)
    }

    /// Apply the policy to a clean exit.
    fn conclude(&self, code: i32, output: Vec<u8>, outputs: &ActionOutputs) -> Result<AnalysisResult> {
        match self.policy {
            Policy::FailOnFindings => {
                if code == 0 {
                    if self.echo_output && !output.is_empty() {
                        echo_to_stderr(&output);
                    }
                    return Ok(AnalysisResult {
                        status: AnalysisStatus::Clean,
                        exit_code: Some(code),
                        output,
                    });
                }
                if output.is_empty() {
                    return Err(BuilderError::Integration(format!(
                        "analyzer exited with status {} without reporting findings",
                        code
                    )));
                }
                Err(BuilderError::Findings(output))
            }
            Policy::LogFindings => {
                let log = outputs.log.as_ref().ok_or_else(|| {
                    BuilderError::Argument("the log policy requires a findings log output".to_string())
                })?;
                if code == 0 {
                    if !output.is_empty() {
                        tracing::debug!(
                            output = %String::from_utf8_lossy(&output),
                            "discarding output of clean run"
                        );
                    }
                    log.write(b"")?;
                    return Ok(AnalysisResult {
                        status: AnalysisStatus::Clean,
                        exit_code: Some(code),
                        output,
                    });
                }
                if output.is_empty() {
                    tracing::warn!(code, "analyzer exited non-zero without output");
                }
                log.write(&output)?;
                tracing::info!(
                    log = %log.path().display(),
                    "analyzer reported findings; facts still emitted"
                );
                Ok(AnalysisResult {
                    status: AnalysisStatus::FindingsLogged,
                    exit_code: Some(code),
                    output,
                })
            }
        }
    }
}

fn echo_to_stderr(output: &[u8]) {
    let mut stderr = std::io::stderr().lock();
    if let Err(e) = stderr.write_all(output).and_then(|()| stderr.flush()) {
        tracing::debug!(error = %e, "failed to echo analyzer output");
    }
}

#[cfg(unix)]
fn describe_abnormal_exit(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("terminated by signal {}", signal),
        None => status.to_string(),
    }
}

#[cfg(not(unix))]
fn describe_abnormal_exit(status: ExitStatus) -> String {
    status.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outputs(temp: &TempDir, with_log: bool) -> ActionOutputs {
        let log = temp.path().join("f.log");
        ActionOutputs::create(
            &temp.path().join("f.facts"),
            if with_log { Some(log.as_path()) } else { None },
        )
        .unwrap()
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("fail".parse::<Policy>().unwrap(), Policy::FailOnFindings);
        assert_eq!("LOG".parse::<Policy>().unwrap(), Policy::LogFindings);
        assert!("warn".parse::<Policy>().is_err());
        assert_eq!(Policy::LogFindings.to_string(), "log");
    }

    #[test]
    fn test_compose_args_order() {
        let temp = TempDir::new().unwrap();
        let fact = temp.path().join("dep.facts");
        std::fs::write(&fact, b"").unwrap();
        let mut facts = FactSet::new();
        facts.insert("example.com/dep", &fact);
        let sources = vec![PathBuf::from("a.go"), PathBuf::from("b.go")];
        let request = AnalysisRequest {
            package_path: "example.com/pkg",
            importcfg: Path::new("out/importcfg123"),
            facts: &facts,
            sources: &sources,
        };

        let runner = AnalysisRunner::new("bin/nogo", Policy::FailOnFindings);
        let args = runner.compose_args(&request, Path::new("out/f.facts"));

        assert_eq!(
            args,
            vec![
                "bin/nogo".to_string(),
                "-p".to_string(),
                "example.com/pkg".to_string(),
                "-importcfg".to_string(),
                "out/importcfg123".to_string(),
                "-fact".to_string(),
                format!("example.com/dep={}", fact.display()),
                "-x".to_string(),
                "out/f.facts".to_string(),
                "a.go".to_string(),
                "b.go".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_sources_skips_analyzer() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, false);
        let work = WorkDir::create(false).unwrap();
        let facts = FactSet::new();
        let request = AnalysisRequest {
            package_path: "example.com/pkg",
            importcfg: Path::new("unused"),
            facts: &facts,
            sources: &[],
        };

        let runner = AnalysisRunner::new("/nonexistent/analyzer", Policy::FailOnFindings);
        let result = runner.run(&request, &work, &outputs).unwrap();

        assert_eq!(result.status, AnalysisStatus::Skipped);
        assert_eq!(std::fs::read(outputs.facts.path()).unwrap(), b"");
        assert!(!work.path().join(PARAMS_FILE_NAME).exists());
    }

    #[test]
    fn test_fail_policy_findings_become_error() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, false);
        let runner = AnalysisRunner::new("nogo", Policy::FailOnFindings);

        let err = runner
            .conclude(1, b"a.go:1:1: bad\n".to_vec(), &outputs)
            .unwrap_err();
        assert!(matches!(err, BuilderError::Findings(_)));
        assert_eq!(err.to_string(), "a.go:1:1: bad\n");
    }

    #[test]
    fn test_fail_policy_silent_nonzero_is_integration_failure() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, false);
        let runner = AnalysisRunner::new("nogo", Policy::FailOnFindings);

        let err = runner.conclude(3, Vec::new(), &outputs).unwrap_err();
        assert!(matches!(err, BuilderError::Integration(_)));
    }

    #[test]
    fn test_fail_policy_clean_exit() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, false);
        let runner = AnalysisRunner::new("nogo", Policy::FailOnFindings);

        let result = runner.conclude(0, b"chatter".to_vec(), &outputs).unwrap();
        assert_eq!(result.status, AnalysisStatus::Clean);
    }

    #[test]
    fn test_log_policy_writes_findings() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, true);
        let runner = AnalysisRunner::new("nogo", Policy::LogFindings);

        let result = runner
            .conclude(1, b"a.go:1:1: bad\n".to_vec(), &outputs)
            .unwrap();
        assert_eq!(result.status, AnalysisStatus::FindingsLogged);
        let log = outputs.log.as_ref().unwrap();
        assert_eq!(std::fs::read_to_string(log.path()).unwrap(), "a.go:1:1: bad\n");
    }

    #[test]
    fn test_log_policy_writes_bytes_unchanged() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, true);
        let runner = AnalysisRunner::new("nogo", Policy::LogFindings);

        runner
            .conclude(1, b"a.go:1:1: caf\xe9\n".to_vec(), &outputs)
            .unwrap();
        let log = outputs.log.as_ref().unwrap();
        assert_eq!(std::fs::read(log.path()).unwrap(), b"a.go:1:1: caf\xe9\n");
    }

    #[test]
    fn test_log_policy_clean_exit_leaves_log_empty() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, true);
        let runner = AnalysisRunner::new("nogo", Policy::LogFindings);

        let result = runner.conclude(0, b"chatter".to_vec(), &outputs).unwrap();
        assert_eq!(result.status, AnalysisStatus::Clean);
        let log = outputs.log.as_ref().unwrap();
        assert_eq!(std::fs::read(log.path()).unwrap(), b"");
    }

    #[test]
    fn test_log_policy_requires_log_output() {
        let temp = TempDir::new().unwrap();
        let outputs = outputs(&temp, false);
        let runner = AnalysisRunner::new("nogo", Policy::LogFindings);

        let err = runner.conclude(1, b"x".to_vec(), &outputs).unwrap_err();
        assert!(matches!(err, BuilderError::Argument(_)));
    }
}
