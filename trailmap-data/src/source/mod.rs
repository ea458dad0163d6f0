//! Retrieval of published map datasets as raw KML payloads.
#![forbid(unsafe_code)]

mod error;
mod http;
mod ops;

pub use error::SourceError;
pub use http::{DEFAULT_ENDPOINT, HttpDatasetSource, HttpSourceConfig};
pub use ops::{RawDataset, SNIFF_WINDOW, fetch_dataset, looks_like_kml};

use async_trait::async_trait;
use trailmap_core::DatasetId;

use crate::transport::TransportError;

/// Supplies raw dataset payloads by identifier.
#[async_trait(?Send)]
pub trait DatasetSource {
    /// Human-readable location of `dataset`, used in logs.
    fn describe(&self, dataset: &DatasetId) -> String;
    /// Fetch the raw payload published for `dataset`.
    async fn fetch_raw(&self, dataset: &DatasetId) -> Result<Vec<u8>, TransportError>;
}
