use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::MediaTransport;
use crate::transport::{
    ClientBuildError, DEFAULT_USER_AGENT, TransportError, build_client, get_bytes,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_REDIRECTS: usize = 3;

/// Configuration for [`HttpMediaTransport`].
#[derive(Debug, Clone)]
pub struct HttpMediaConfig {
    /// Overall request timeout.
    pub timeout: Duration,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpMediaConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpMediaConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches media over HTTP with a bounded timeout and redirect budget.
#[derive(Debug)]
pub struct HttpMediaTransport {
    client: Client,
    config: HttpMediaConfig,
}

impl HttpMediaTransport {
    /// Create a transport with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::with_config(HttpMediaConfig::default())
    }

    /// Create a transport with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpMediaConfig) -> Result<Self, ClientBuildError> {
        let client = build_client(&config.user_agent, config.timeout, config.max_redirects)?;
        Ok(Self { client, config })
    }
}

#[async_trait(?Send)]
impl MediaTransport for HttpMediaTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        get_bytes(&self.client, url, self.config.timeout).await
    }
}
