//! Error types produced while downloading datasets.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use trailmap_core::DatasetId;

use crate::transport::TransportError;

/// Errors produced while retrieving a dataset. All variants abort the layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    /// The request failed or returned a non-success status.
    #[error("failed to download dataset {dataset}: {source}")]
    Transport {
        /// Dataset being fetched.
        dataset: DatasetId,
        /// Underlying transport failure.
        source: TransportError,
    },
    /// The payload was not KML, typically an HTML sign-in or error page.
    #[error(
        "dataset {dataset} did not return KML (payload starts with {preview:?}); \
         make sure the map is shared publicly"
    )]
    NotKml {
        /// Dataset being fetched.
        dataset: DatasetId,
        /// Leading characters of the payload.
        preview: String,
    },
    /// Persisting the raw payload to scratch storage failed.
    #[error("failed to persist raw payload for {dataset} to {path}: {source}")]
    PersistRaw {
        /// Dataset being fetched.
        dataset: DatasetId,
        /// Scratch file location.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}
