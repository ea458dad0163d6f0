//! Error types emitted by the Trailmap CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use trailmap_data::pipeline::{LayerJobError, PipelineError, RunLogError};
use trailmap_data::transport::ClientBuildError;

/// Errors emitted by the Trailmap CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A `--layer` value is not `<Name>=<datasetId>`.
    #[error("invalid --layer value {value:?}: {source}")]
    InvalidLayer {
        value: String,
        #[source]
        source: LayerJobError,
    },
    /// `--media-workers` was set to zero.
    #[error("--media-workers must be at least 1")]
    ZeroMediaWorkers,
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory { path: Utf8PathBuf },
    /// The output directory could not be inspected due to an IO error.
    #[error("failed to inspect output directory {path:?}: {source}")]
    InspectOutputDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An HTTP client could not be constructed.
    #[error(transparent)]
    HttpClient(#[from] ClientBuildError),
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Opening the run log failed.
    #[error(transparent)]
    RunLog(#[from] RunLogError),
    /// A layer failed to ingest.
    #[error(transparent)]
    Pipeline(#[from] Box<PipelineError>),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(Box::new(err))
    }
}
