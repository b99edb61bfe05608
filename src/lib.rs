//! nogo-builder - build actions that run a Go static analyzer.
//!
//! A `nogo` invocation analyzes exactly one package. It produces the
//! package's facts for dependents and either fails on findings or writes
//! them to a log that a later `validate` invocation checks.
//!
//! # Architecture
//!
//! - `params`: parameter-file expansion and writing
//! - `sources`: classifies sources and reads Go import headers
//! - `resolve`: maps imports to archives and writes the import config
//! - `facts`: fact files of dependencies passed to the analyzer
//! - `outputs`: declared outputs that exist on every exit path
//! - `runner`: runs the analyzer under a findings policy
//! - `action`: the `nogo` pipeline end to end
//! - `validate`: the findings-log gate
//! - `config`: optional YAML defaults
//! - `cli`: flags, logging and exit codes

pub mod action;
pub mod cli;
pub mod config;
pub mod error;
pub mod facts;
pub mod outputs;
pub mod params;
pub mod resolve;
pub mod runner;
pub mod sources;
pub mod validate;

pub use action::{run_nogo, NogoOptions};
pub use config::BuilderConfig;
pub use error::{BuilderError, Result};
pub use facts::FactSet;
pub use outputs::{ActionOutputs, DeclaredOutput};
pub use resolve::{
    Archive, ImportClosure, ImportConfigFile, ImportResolver, ImportTarget, ResolutionError,
    StdlibLayout, StdlibManifest,
};
pub use runner::{
    AnalysisRequest, AnalysisResult, AnalysisRunner, AnalysisStatus, PathRelativizer, Policy,
    WorkDir,
};
pub use sources::{filter_sources, ClassificationError, FilteredSources, SourceFile, SourceKind};
pub use validate::run_validation;
