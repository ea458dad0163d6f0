//! HTTP implementation of [`DatasetSource`] for the public map export endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use trailmap_core::DatasetId;
use url::Url;

use super::DatasetSource;
use crate::transport::{
    ClientBuildError, DEFAULT_USER_AGENT, TransportError, build_client, get_bytes,
};

/// Public KML export endpoint for published maps.
pub const DEFAULT_ENDPOINT: &str = "https://www.google.com/maps/d/kml";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default redirect budget.
const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Configuration for [`HttpDatasetSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Export endpoint; the dataset identifier is appended as a query parameter.
    pub endpoint: String,
    /// Overall request timeout.
    pub timeout: Duration,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpSourceConfig {
    /// Create a configuration targeting `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the redirect budget.
    #[must_use]
    pub const fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Downloads datasets from the public KML export endpoint.
#[derive(Debug)]
pub struct HttpDatasetSource {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpDatasetSource {
    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpSourceConfig) -> Result<Self, ClientBuildError> {
        let client = build_client(&config.user_agent, config.timeout, config.max_redirects)?;
        Ok(Self { client, config })
    }

    /// Build the export URL for `dataset`.
    ///
    /// Forces KML output so the endpoint does not return a zipped KMZ archive.
    pub fn dataset_url(&self, dataset: &DatasetId) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|err| TransportError::Network {
            url: self.config.endpoint.clone(),
            message: format!("invalid endpoint: {err}"),
        })?;
        url.query_pairs_mut()
            .append_pair("mid", dataset.as_str())
            .append_pair("forcekml", "1");
        Ok(url)
    }
}

#[async_trait(?Send)]
impl DatasetSource for HttpDatasetSource {
    fn describe(&self, dataset: &DatasetId) -> String {
        self.dataset_url(dataset)
            .map_or_else(|_| self.config.endpoint.clone(), String::from)
    }

    async fn fetch_raw(&self, dataset: &DatasetId) -> Result<Vec<u8>, TransportError> {
        let url = self.dataset_url(dataset)?;
        get_bytes(&self.client, url.as_str(), self.config.timeout).await
    }
}
