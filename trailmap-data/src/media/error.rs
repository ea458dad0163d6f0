use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// Failure to localise one media asset. Logged and counted, never fatal.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediaAssetError {
    /// The asset could not be downloaded.
    #[error("failed to download media: {source}")]
    Transport {
        /// Underlying transport failure, naming the URL.
        source: TransportError,
    },
    /// The downloaded body could not be stored.
    #[error("failed to store media from {url} at {path}: {source}")]
    Persist {
        /// Remote URL.
        url: String,
        /// Local target path.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}
