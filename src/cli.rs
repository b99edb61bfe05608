//! Command-line interface for nogo-builder.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::action::{self, NogoOptions};
use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::resolve::{Archive, StdlibLayout};
use crate::runner::{PathRelativizer, Policy};
use crate::validate;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Flags that build rules pass with a single dash, Go style.
const GO_STYLE_FLAGS: &[&str] = &[
    "src",
    "arc",
    "facts",
    "importpath",
    "p",
    "package_list",
    "recompile_internal_deps",
    "nogo",
    "out_facts",
    "out_log",
    "policy",
    "goroot",
    "installsuffix",
    "cgo",
    "root",
    "work",
    "v",
    "config",
    "log_level",
];

/// Build actions that run a static analyzer over one Go package.
///
/// `nogo` resolves the package's imports against its declared dependency
/// archives, runs the analyzer and writes its facts (and optionally a
/// findings log). `validate` fails the build when a findings log is not
/// empty.
#[derive(Parser)]
#[command(name = "nogo-builder")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log filter (e.g. warn, debug, nogo_builder=trace)
    #[arg(long = "log_level", global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze one package and write its facts
    Nogo(NogoArgs),
    /// Fail if a findings log is not empty
    #[command(visible_alias = "nogovalidation")]
    Validate(ValidateArgs),
}

/// Arguments for the nogo command.
#[derive(Parser, Debug)]
pub struct NogoArgs {
    /// Source file to filter and analyze
    #[arg(long = "src")]
    pub srcs: Vec<PathBuf>,

    /// Direct dependency: importpath[:alias...]=packagepath=file
    #[arg(long = "arc")]
    pub archives: Vec<Archive>,

    /// Dependency facts: importpath=packagepath=file
    #[arg(long = "facts")]
    pub facts: Vec<Archive>,

    /// Import path of the package being analyzed (display only)
    #[arg(long = "importpath", default_value = "")]
    pub importpath: String,

    /// Package path; used as import path when -importpath is absent
    #[arg(long = "p", default_value = "")]
    pub package_path: String,

    /// File listing the standard library's import paths
    #[arg(long = "package_list")]
    pub package_list: Option<PathBuf>,

    /// Import paths that must not be imported by this package
    #[arg(long = "recompile_internal_deps")]
    pub recompile_internal_deps: Vec<String>,

    /// Analyzer executable; empty produces an empty facts file
    #[arg(long = "nogo", default_value = "")]
    pub nogo: String,

    /// Facts output
    #[arg(long = "out_facts")]
    pub out_facts: PathBuf,

    /// Findings log output
    #[arg(long = "out_log")]
    pub out_log: Option<PathBuf>,

    /// Findings policy: fail or log
    #[arg(long = "policy")]
    pub policy: Option<Policy>,

    /// SDK root holding the standard library archives
    #[arg(long = "goroot", env = "GOROOT")]
    pub goroot: Option<PathBuf>,

    /// Subdirectory of <goroot>/pkg holding the standard library archives
    #[arg(long = "installsuffix")]
    pub installsuffix: Option<String>,

    /// Enable cgo (default: CGO_ENABLED=1 in the environment)
    #[arg(long = "cgo", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub cgo: Option<bool>,

    /// Root that analyzer output paths are made relative to
    #[arg(long = "root")]
    pub root: Option<PathBuf>,

    /// Keep the work directory and import config
    #[arg(long = "work", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub work: Option<bool>,

    /// Echo analyzer output and log at debug level
    #[arg(long = "v")]
    pub verbose: bool,

    /// YAML configuration file
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

/// Arguments for the validate command.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Marker file to create
    pub marker: PathBuf,

    /// Findings log to check
    pub log: PathBuf,
}

/// Rewrite single-dash flags to the double-dash form clap expects.
///
/// Only names in the known flag list are rewritten, so short options like
/// `-h` keep working. Everything after `--` is left alone.
pub fn normalize_flags(args: Vec<String>) -> Vec<String> {
    let mut normalized = Vec::with_capacity(args.len());
    let mut passthrough = false;
    for arg in args {
        if passthrough || arg == "--" {
            passthrough = true;
            normalized.push(arg);
            continue;
        }
        let rewrite = match arg.strip_prefix('-') {
            Some(rest) if !rest.starts_with('-') => {
                let name = rest.split('=').next().unwrap_or(rest);
                GO_STYLE_FLAGS.contains(&name)
            }
            _ => false,
        };
        if rewrite {
            normalized.push(format!("-{}", arg));
        } else {
            normalized.push(arg);
        }
    }
    normalized
}

/// Install the stderr tracing subscriber.
pub fn init_tracing(log_level: &str, verbose: bool) {
    let level = if verbose { "debug" } else { log_level };
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Merge flags, configuration file and environment into action options.
pub fn build_options(args: &NogoArgs, config: &BuilderConfig) -> NogoOptions {
    let mut opts = NogoOptions::new(&args.out_facts);

    opts.sources = args.srcs.clone();
    opts.archives = args.archives.clone();
    opts.facts = args.facts.clone();
    opts.import_path = if args.importpath.is_empty() {
        args.package_path.clone()
    } else {
        args.importpath.clone()
    };
    opts.package_list = args.package_list.clone();
    opts.recompile_internal_deps = args.recompile_internal_deps.clone();
    opts.analyzer = (!args.nogo.is_empty()).then(|| PathBuf::from(&args.nogo));
    opts.out_log = args
        .out_log
        .clone()
        .filter(|p| !p.as_os_str().is_empty());

    opts.policy = args.policy.or(config.policy).unwrap_or(if opts.out_log.is_some() {
        Policy::LogFindings
    } else {
        Policy::FailOnFindings
    });
    opts.cgo_enabled = args
        .cgo
        .or(config.cgo_enabled)
        .unwrap_or_else(cgo_enabled_from_env);

    let goroot = args
        .goroot
        .clone()
        .or_else(|| config.goroot.clone())
        .unwrap_or_default();
    let install_suffix = args
        .installsuffix
        .clone()
        .or_else(|| config.install_suffix.clone())
        .unwrap_or_default();
    opts.stdlib = StdlibLayout::new(goroot, install_suffix);

    opts.preserve_workdir = args.work.or(config.preserve_workdir).unwrap_or(false);
    opts.echo_output = args.verbose || config.echo_output.unwrap_or(false);
    opts.relativizer = match args.root.as_ref().or(config.relativize_root.as_ref()) {
        Some(root) => PathRelativizer::new(root),
        None => PathRelativizer::from_current_dir(),
    };
    opts
}

fn cgo_enabled_from_env() -> bool {
    std::env::var("CGO_ENABLED").map(|v| v == "1").unwrap_or(false)
}

/// Print an action error and map it to an exit code.
fn report_error(err: &BuilderError, relativizer: &PathRelativizer) -> i32 {
    if let Some(bytes) = err.verdict_bytes() {
        let mut stderr = std::io::stderr().lock();
        if let Err(e) = stderr.write_all(&bytes).and_then(|()| stderr.flush()) {
            tracing::warn!(error = %e, "failed to report findings");
        }
        return EXIT_FAILED;
    }
    eprintln!("Error: {}", relativizer.apply(&err.to_string()));
    EXIT_ERROR
}

/// Run the nogo command.
pub fn run_nogo(args: &NogoArgs) -> anyhow::Result<i32> {
    let config = match &args.config {
        Some(path) => BuilderConfig::parse_file(path)
            .with_context(|| format!("parsing config {}", path.display()))?,
        None => BuilderConfig::default(),
    };
    let opts = build_options(args, &config);

    match action::run_nogo(&opts) {
        Ok(_) => Ok(EXIT_SUCCESS),
        Err(e) => Ok(report_error(&e, &opts.relativizer)),
    }
}

/// Run the validate command.
pub fn run_validate(args: &ValidateArgs) -> anyhow::Result<i32> {
    match validate::run_validation(&args.marker, &args.log) {
        Ok(()) => Ok(EXIT_SUCCESS),
        Err(e) => Ok(report_error(&e, &PathRelativizer::from_current_dir())),
    }
}
