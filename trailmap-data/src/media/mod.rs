//! Localisation of remote media referenced from feature properties.
//!
//! Each referenced URL is downloaded at most once per run and stored under a
//! content-addressed name, so later runs adopt the file instead of fetching
//! it again. Per-asset failures are logged and counted, never fatal.
#![forbid(unsafe_code)]

mod asset;
mod cache;
mod error;
mod fetch;
mod http;

pub use asset::{DEFAULT_EXTENSION, KNOWN_EXTENSIONS, MediaAsset, infer_extension, split_links};
pub use cache::{AssetOutcome, MediaCache};
pub use error::MediaAssetError;
pub use fetch::{
    DEFAULT_MEDIA_DIR, DEFAULT_MEDIA_PROPERTY, DEFAULT_MEDIA_WORKERS, MediaFetcher, MediaReport,
    MediaSettings,
};
pub use http::{HttpMediaConfig, HttpMediaTransport};

use async_trait::async_trait;

use crate::transport::TransportError;

/// Downloads a single media asset.
#[async_trait(?Send)]
pub trait MediaTransport {
    /// Fetch the body served at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

#[cfg(test)]
mod tests;
