//! HTTP plumbing shared by the dataset source and the media fetcher.

use std::time::Duration;

use reqwest::{Client, redirect};
use thiserror::Error;

/// Default user agent sent with every outbound request.
pub const DEFAULT_USER_AGENT: &str = "trailmap/0.1";

/// Transport-level errors encountered while issuing HTTP requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportError {
    /// The server returned an HTTP error status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Fully qualified request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short error description.
        message: String,
    },
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Fully qualified request URL.
        url: String,
        /// Timeout applied to the request.
        timeout_secs: u64,
    },
    /// The request failed before a response was received.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Fully qualified request URL.
        url: String,
        /// Error reported by the transport.
        message: String,
    },
}

impl TransportError {
    /// URL of the failed request.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Http { url, .. } | Self::Timeout { url, .. } | Self::Network { url, .. } => url,
        }
    }
}

/// Failure to construct an HTTP client.
#[derive(Debug, Error)]
#[error("failed to build HTTP client: {source}")]
pub struct ClientBuildError {
    #[from]
    source: reqwest::Error,
}

/// Build a client with an overall timeout and a bounded redirect policy.
pub(crate) fn build_client(
    user_agent: &str,
    timeout: Duration,
    max_redirects: usize,
) -> Result<Client, ClientBuildError> {
    Ok(Client::builder()
        .user_agent(user_agent)
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(redirect::Policy::limited(max_redirects))
        .build()?)
}

/// Issue a GET request and collect the body, mapping failures onto [`TransportError`].
pub(crate) async fn get_bytes(
    client: &Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, TransportError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|err| convert_reqwest_error(&err, url, timeout))?
        .error_for_status()
        .map_err(|err| convert_reqwest_error(&err, url, timeout))?;
    let body = response
        .bytes()
        .await
        .map_err(|err| convert_reqwest_error(&err, url, timeout))?;
    Ok(body.to_vec())
}

/// Convert a reqwest error to a [`TransportError`].
pub(crate) fn convert_reqwest_error(
    error: &reqwest::Error,
    url: &str,
    timeout: Duration,
) -> TransportError {
    if error.is_timeout() {
        return TransportError::Timeout {
            url: url.to_owned(),
            timeout_secs: timeout.as_secs(),
        };
    }

    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let message = if error.is_redirect() {
        format!("too many redirects: {error}")
    } else {
        error.to_string()
    };
    TransportError::Network {
        url: url.to_owned(),
        message,
    }
}
