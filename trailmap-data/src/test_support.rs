//! In-memory adapters and fixtures for exercising the pipeline without I/O.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::runtime::Builder;
use trailmap_core::DatasetId;

use crate::convert::{ConversionError, Converter};
use crate::media::MediaTransport;
use crate::source::{DatasetSource, RawDataset};
use crate::transport::TransportError;

/// Drive `future` to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be built.
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| panic!("failed to build Tokio runtime: {err}"))
        .block_on(future)
}

/// A minimal KML document accepted by the source sniffer.
#[must_use]
pub fn sample_kml() -> Vec<u8> {
    br#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><name>Sample</name></Document></kml>
"#
    .to_vec()
}

/// Serialise `features` as a converter-style feature collection.
#[must_use]
pub fn feature_collection(features: &[Value]) -> Vec<u8> {
    json!({"type": "FeatureCollection", "features": features})
        .to_string()
        .into_bytes()
}

/// A point feature with the given properties.
#[must_use]
pub fn point_feature(lon: f64, lat: f64, properties: &Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [lon, lat]},
        "properties": properties,
    })
}

/// Stub [`DatasetSource`] returning the same outcome for every dataset.
#[derive(Debug)]
pub struct StubDatasetSource {
    outcome: Result<Vec<u8>, TransportError>,
    calls: Cell<usize>,
}

impl StubDatasetSource {
    /// Serve `payload` for every request.
    #[must_use]
    pub const fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            outcome: Ok(payload),
            calls: Cell::new(0),
        }
    }

    /// Fail every request with `error`.
    #[must_use]
    pub const fn with_error(error: TransportError) -> Self {
        Self {
            outcome: Err(error),
            calls: Cell::new(0),
        }
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl DatasetSource for StubDatasetSource {
    fn describe(&self, dataset: &DatasetId) -> String {
        format!("stub://{dataset}")
    }

    async fn fetch_raw(&self, _dataset: &DatasetId) -> Result<Vec<u8>, TransportError> {
        self.calls.set(self.calls.get() + 1);
        self.outcome.clone()
    }
}

#[derive(Debug, Clone)]
enum StubConversion {
    Output(Vec<u8>),
    Failure { status: String, stderr: String },
}

/// Stub [`Converter`] producing canned output without spawning a process.
#[derive(Debug)]
pub struct StubConverter {
    conversion: StubConversion,
    calls: Cell<usize>,
}

impl StubConverter {
    /// Emit `output` verbatim for every input.
    #[must_use]
    pub const fn with_output(output: Vec<u8>) -> Self {
        Self {
            conversion: StubConversion::Output(output),
            calls: Cell::new(0),
        }
    }

    /// Fail every conversion as if the tool exited with `status`.
    #[must_use]
    pub fn failing(status: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            conversion: StubConversion::Failure {
                status: status.into(),
                stderr: stderr.into(),
            },
            calls: Cell::new(0),
        }
    }

    /// Number of conversions attempted so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl Converter for StubConverter {
    fn name(&self) -> &str {
        "stub-converter"
    }

    async fn convert(&self, _raw: &RawDataset) -> Result<Vec<u8>, ConversionError> {
        self.calls.set(self.calls.get() + 1);
        match &self.conversion {
            StubConversion::Output(bytes) => Ok(bytes.clone()),
            StubConversion::Failure { status, stderr } => Err(ConversionError::Failed {
                program: self.name().to_owned(),
                status: status.clone(),
                stderr: stderr.clone(),
            }),
        }
    }
}

/// Stub [`MediaTransport`] serving registered assets and counting requests.
///
/// Unregistered URLs answer with HTTP 404.
#[derive(Debug, Default)]
pub struct StubMediaTransport {
    responses: HashMap<String, Result<Vec<u8>, TransportError>>,
    calls: RefCell<BTreeMap<String, usize>>,
}

impl StubMediaTransport {
    /// Create a transport with no registered assets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `bytes` for `url`.
    #[must_use]
    pub fn with_asset(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), Ok(bytes.into()));
        self
    }

    /// Answer requests for `url` with HTTP `status`.
    #[must_use]
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        let key: String = url.into();
        let error = http_error(&key, status);
        self.responses.insert(key, Err(error));
        self
    }

    /// Number of requests issued for `url`.
    #[must_use]
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls.borrow().get(url).copied().unwrap_or_default()
    }

    /// Number of requests issued across all URLs.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.calls.borrow().values().sum()
    }
}

fn http_error(url: &str, status: u16) -> TransportError {
    TransportError::Http {
        url: url.to_owned(),
        status,
        message: format!("stub responded with {status}"),
    }
}

#[async_trait(?Send)]
impl MediaTransport for StubMediaTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        *self.calls.borrow_mut().entry(url.to_owned()).or_default() += 1;
        tokio::task::yield_now().await;
        self.responses
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(http_error(url, 404)))
    }
}
