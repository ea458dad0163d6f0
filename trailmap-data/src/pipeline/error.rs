use std::{error::Error as StdError, io};

use camino::Utf8PathBuf;
use thiserror::Error;
use trailmap_core::{DatasetIdError, LayerName, LayerNameError};

use crate::convert::ConversionError;
use crate::source::SourceError;
use crate::writer::WriteError;

/// Fatal failures that stop a pipeline run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The dataset could not be downloaded.
    #[error("layer {layer}: {source}")]
    Download {
        /// Layer being processed.
        layer: LayerName,
        /// Underlying failure.
        source: SourceError,
    },
    /// The payload could not be converted.
    #[error("layer {layer}: {source}")]
    Conversion {
        /// Layer being processed.
        layer: LayerName,
        /// Underlying failure.
        source: ConversionError,
    },
    /// The layer file could not be written.
    #[error("layer {layer}: {source}")]
    Write {
        /// Layer being processed.
        layer: LayerName,
        /// Underlying failure.
        source: WriteError,
    },
    /// Two jobs would write the same layer file.
    #[error("layers \"{first}\" and \"{second}\" would both be written to {stem}.geojson")]
    DuplicateLayer {
        /// Name of the earlier job.
        first: LayerName,
        /// Name of the later job.
        second: LayerName,
        /// Shared file stem.
        stem: String,
    },
    /// The run log could not be opened or updated.
    #[error(transparent)]
    RunLog(#[from] RunLogError),
    /// The tiling manifest could not be written.
    #[error("failed to write tiling manifest {path}: {source}")]
    Manifest {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}

/// Errors raised by the SQLite run log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunLogError {
    /// Opening or migrating the database failed.
    #[error("failed to initialise run log at {path}: {source}")]
    Initialise {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying SQLite failure.
        source: rusqlite::Error,
    },
    /// Inserting a row failed.
    #[error("failed to record layer run: {source}")]
    RecordSql {
        /// Underlying SQLite failure.
        source: rusqlite::Error,
    },
    /// A value could not be represented in SQLite.
    #[error("failed to prepare run metadata for persistence ({what}): {source}")]
    RecordValue {
        /// Description of the value that failed to convert.
        what: String,
        /// Underlying conversion error.
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Errors raised when parsing a `Name=datasetId` layer job.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum LayerJobError {
    /// The `=` separator was missing.
    #[error("layer job {0:?} must have the form <Name>=<datasetId>")]
    MissingSeparator(String),
    /// The layer name was invalid.
    #[error(transparent)]
    Name(#[from] LayerNameError),
    /// The dataset identifier was invalid.
    #[error(transparent)]
    Dataset(#[from] DatasetIdError),
}
