//! The `nogo` build action.
//!
//! Runs the pipeline for one package: create the declared outputs, filter
//! sources, resolve imports, write the import-config file, then run the
//! analyzer. Temporary files live only as long as this call.

use std::path::{Path, PathBuf};

use crate::error::{BuilderError, Result};
use crate::facts::FactSet;
use crate::outputs::ActionOutputs;
use crate::resolve::{Archive, ImportConfigFile, ImportResolver, StdlibLayout, StdlibManifest};
use crate::runner::{
    AnalysisRequest, AnalysisResult, AnalysisRunner, PathRelativizer, Policy, WorkDir,
};
use crate::sources::filter_sources;

/// Fully resolved options of one `nogo` invocation.
#[derive(Debug, Clone)]
pub struct NogoOptions {
    pub sources: Vec<PathBuf>,
    pub archives: Vec<Archive>,
    pub facts: Vec<Archive>,
    /// Import path of the package, used as the analyzer's `-p`
    pub import_path: String,
    pub package_list: Option<PathBuf>,
    pub recompile_internal_deps: Vec<String>,
    /// Analyzer executable; `None` means only empty outputs are produced
    pub analyzer: Option<PathBuf>,
    pub out_facts: PathBuf,
    pub out_log: Option<PathBuf>,
    pub policy: Policy,
    pub cgo_enabled: bool,
    pub stdlib: StdlibLayout,
    pub preserve_workdir: bool,
    pub relativizer: PathRelativizer,
    pub echo_output: bool,
}

impl NogoOptions {
    /// Options with defaults for everything but the facts output.
    pub fn new(out_facts: impl Into<PathBuf>) -> Self {
        Self {
            sources: Vec::new(),
            archives: Vec::new(),
            facts: Vec::new(),
            import_path: String::new(),
            package_list: None,
            recompile_internal_deps: Vec::new(),
            analyzer: None,
            out_facts: out_facts.into(),
            out_log: None,
            policy: Policy::FailOnFindings,
            cgo_enabled: false,
            stdlib: StdlibLayout::default(),
            preserve_workdir: false,
            relativizer: PathRelativizer::from_current_dir(),
            echo_output: false,
        }
    }

    /// Check flag combinations before any output is touched.
    pub fn validate(&self) -> Result<()> {
        if self.out_facts.as_os_str().is_empty() {
            return Err(BuilderError::Argument("-out_facts must be set".to_string()));
        }
        if self.policy == Policy::LogFindings && self.out_log.is_none() {
            return Err(BuilderError::Argument(
                "-policy=log requires -out_log".to_string(),
            ));
        }
        Ok(())
    }
}

/// Run the action.
pub fn run_nogo(opts: &NogoOptions) -> Result<AnalysisResult> {
    opts.validate()?;

    let outputs = ActionOutputs::create(&opts.out_facts, opts.out_log.as_deref())?;

    let result = analyze(opts, &outputs);
    // Outputs must outlive any failure below.
    outputs.ensure_exist()?;
    result
}

fn analyze(opts: &NogoOptions, outputs: &ActionOutputs) -> Result<AnalysisResult> {
    let Some(analyzer) = &opts.analyzer else {
        tracing::debug!("no analyzer configured, emitting empty facts");
        return Ok(AnalysisResult::skipped());
    };

    let filtered = filter_sources(&opts.sources)?;

    let work_dir = WorkDir::create(opts.preserve_workdir)?;

    let manifest = match &opts.package_list {
        Some(path) => StdlibManifest::load(path)?,
        None => StdlibManifest::default(),
    };
    if manifest.is_empty() {
        tracing::debug!("empty standard library manifest, every import must be a declared dependency");
    } else {
        tracing::debug!(packages = manifest.len(), "loaded standard library manifest");
    }
    let closure = ImportResolver::new(&opts.archives, &manifest)
        .recompile_internal_deps(opts.recompile_internal_deps.iter().cloned())
        .cgo_enabled(opts.cgo_enabled)
        .resolve(&opts.import_path, &filtered.go)?;

    let importcfg = ImportConfigFile::write(
        &closure,
        &opts.stdlib,
        output_dir(&opts.out_facts),
        opts.preserve_workdir,
    )?;

    let facts = FactSet::from_archives(&opts.facts);
    tracing::debug!(facts = facts.len(), "collected dependency facts");
    let sources = filtered.analyzable();
    let request = AnalysisRequest {
        package_path: &opts.import_path,
        importcfg: importcfg.path(),
        facts: &facts,
        sources: &sources,
    };

    let runner = AnalysisRunner::new(analyzer, opts.policy)
        .relativizer(opts.relativizer.clone())
        .echo_output(opts.echo_output);
    let result = runner.run(&request, &work_dir, outputs)?;

    tracing::info!(
        package = %opts.import_path,
        status = ?result.status,
        policy = %opts.policy,
        "analysis finished"
    );
    Ok(result)
}

/// Directory the primary output lives in.
fn output_dir(out_facts: &Path) -> &Path {
    out_facts.parent().unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::AnalysisStatus;
    use tempfile::TempDir;

    #[test]
    fn test_no_analyzer_emits_empty_facts() {
        let temp = TempDir::new().unwrap();
        let out_facts = temp.path().join("f.facts");

        let result = run_nogo(&NogoOptions::new(&out_facts)).unwrap();

        assert_eq!(result.status, AnalysisStatus::Skipped);
        assert_eq!(std::fs::read(&out_facts).unwrap(), b"");
    }

    #[test]
    fn test_log_policy_without_log_is_argument_error() {
        let temp = TempDir::new().unwrap();
        let out_facts = temp.path().join("f.facts");
        let mut opts = NogoOptions::new(&out_facts);
        opts.policy = Policy::LogFindings;

        let err = run_nogo(&opts).unwrap_err();
        assert!(matches!(err, BuilderError::Argument(_)));
        assert!(!out_facts.exists());
    }

    #[test]
    fn test_outputs_exist_after_classification_error() {
        let temp = TempDir::new().unwrap();
        let out_facts = temp.path().join("f.facts");
        let out_log = temp.path().join("f.log");
        let mut opts = NogoOptions::new(&out_facts);
        opts.analyzer = Some(PathBuf::from("/nonexistent/nogo"));
        opts.policy = Policy::LogFindings;
        opts.out_log = Some(out_log.clone());
        opts.sources = vec![PathBuf::from("notes.txt")];

        let err = run_nogo(&opts).unwrap_err();
        assert!(matches!(err, BuilderError::Classification(_)));
        assert!(out_facts.exists());
        assert!(out_log.exists());
    }

    #[test]
    fn test_output_dir() {
        assert_eq!(output_dir(Path::new("out/f.facts")), Path::new("out"));
        assert_eq!(output_dir(Path::new("f.facts")), Path::new(""));
    }
}
