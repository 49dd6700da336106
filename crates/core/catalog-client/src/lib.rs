//! Typed HTTP client for the sqd-network dataset catalog API.
//!
//! The catalog exposes the dataset inventory and, per dataset, a head
//! block, source metadata and a streaming endpoint. Streaming requests
//! double as capability probes: a dataset that accepts a request for a
//! given table shape serves that capability.
//!
//! All requests go through the rate-limit retry layer in [`retry`].

pub mod retry;

use std::time::Duration;

use classifier::{CapabilityProber, QueryType};
use network_metadata::BlockNum;
use serde_json::json;
use url::Url;

pub use self::retry::RetryConfig;

/// Configuration for building a [`Client`].
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Config {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the [`Client`].
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<Client, BuildError> {
        let mut base_url = self.base_url;
        // Ensure that no path segments are dropped when joining on this URL.
        if !base_url.path().ends_with('/') {
            base_url = format!("{base_url}/")
                .parse()
                .map_err(BuildError::InvalidBaseUrl)?;
        }

        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(BuildError::HttpClientConstruction)?;

        Ok(Client {
            http,
            base_url,
            retry: self.retry,
        })
    }
}

/// HTTP client for the dataset catalog API.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryConfig,
}

impl Client {
    /// Get a reference to the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List every dataset the catalog serves.
    ///
    /// GETs from the catalog root.
    #[tracing::instrument(skip(self))]
    pub async fn datasets(&self) -> Result<Vec<RemoteDataset>, Error> {
        let url = self.base_url.clone();

        tracing::debug!("Sending list datasets request");
        let request = self.http.get(url.as_str());
        let response = retry::send_with_retry(request, &self.retry).await?;

        let status = response.status();
        tracing::debug!(status = %status, "Received catalog response");

        match status.as_u16() {
            200 => response.json().await.map_err(|err| Error::Decode {
                url: url.to_string(),
                source: err,
            }),
            _ => Err(unexpected_response(response).await),
        }
    }

    /// Get the head block of a dataset.
    ///
    /// GETs from `{dataset}/head`. Returns `None` if the dataset has no
    /// head yet (404).
    #[tracing::instrument(skip(self))]
    pub async fn head(&self, dataset: &str) -> Result<Option<BlockNum>, Error> {
        let url = self.join(&format!("{dataset}/head"))?;

        tracing::debug!("Sending head request");
        let request = self.http.get(url.as_str());
        let response = retry::send_with_retry(request, &self.retry).await?;

        let status = response.status();
        tracing::debug!(status = %status, "Received catalog response");

        match status.as_u16() {
            200 => {
                let head: HeadResponse = response.json().await.map_err(|err| Error::Decode {
                    url: url.to_string(),
                    source: err,
                })?;
                Ok(Some(head.number))
            }
            404 => {
                tracing::debug!("Dataset head not found");
                Ok(None)
            }
            _ => Err(unexpected_response(response).await),
        }
    }

    /// Get the source metadata of a dataset.
    ///
    /// GETs from `{dataset}/metadata`. Returns `None` if the catalog has
    /// no metadata for the dataset (404).
    #[tracing::instrument(skip(self))]
    pub async fn metadata(&self, dataset: &str) -> Result<Option<SourceMetadata>, Error> {
        let url = self.join(&format!("{dataset}/metadata"))?;

        tracing::debug!("Sending metadata request");
        let request = self.http.get(url.as_str());
        let response = retry::send_with_retry(request, &self.retry).await?;

        let status = response.status();
        tracing::debug!(status = %status, "Received catalog response");

        match status.as_u16() {
            200 => {
                let metadata = response.json().await.map_err(|err| Error::Decode {
                    url: url.to_string(),
                    source: err,
                })?;
                Ok(Some(metadata))
            }
            404 => {
                tracing::debug!("Dataset metadata not found");
                Ok(None)
            }
            _ => Err(unexpected_response(response).await),
        }
    }

    /// Check whether a dataset serves a capability under a query family.
    ///
    /// POSTs a single-block streaming request for the capability's table
    /// to `{dataset}/stream`. Acceptance (any 2xx) means the capability
    /// is served; any other response means it is not.
    #[tracing::instrument(skip(self))]
    pub async fn probe_capability(
        &self,
        dataset: &str,
        query: QueryType,
        capability: &str,
        reference: BlockNum,
    ) -> Result<bool, Error> {
        let url = self.join(&format!("{dataset}/stream"))?;

        let mut body = serde_json::Map::new();
        body.insert("type".to_string(), json!(query.as_str()));
        body.insert("fromBlock".to_string(), json!(reference));
        body.insert("toBlock".to_string(), json!(reference));
        body.insert(capability.to_string(), json!([{}]));

        tracing::debug!("Sending capability probe");
        let request = self.http.post(url.as_str()).json(&body);
        let response = retry::send_with_retry(request, &self.retry).await?;

        let status = response.status();
        tracing::debug!(status = %status, "Received probe response");

        Ok(status.is_success())
    }

    /// Get a capability prober bound to one dataset, for classification.
    pub fn prober<'a>(&'a self, dataset: &'a str) -> DatasetProber<'a> {
        DatasetProber {
            client: self,
            dataset,
        }
    }

    fn join(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(|err| Error::InvalidPath {
            path: path.to_string(),
            source: err,
        })
    }
}

/// Probes the capabilities of a single catalog dataset.
///
/// Created via [`Client::prober`].
#[derive(Debug, Clone, Copy)]
pub struct DatasetProber<'a> {
    client: &'a Client,
    dataset: &'a str,
}

impl CapabilityProber for DatasetProber<'_> {
    type Error = Error;

    async fn probe(
        &self,
        query: QueryType,
        capability: &'static str,
        reference: BlockNum,
    ) -> Result<bool, Error> {
        self.client
            .probe_capability(self.dataset, query, capability, reference)
            .await
    }
}

async fn unexpected_response(response: reqwest::Response) -> Error {
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("Failed to read response body"));
    Error::UnexpectedResponse {
        status: status.as_u16(),
        message,
    }
}

/// One entry of the catalog's dataset listing.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RemoteDataset {
    /// The dataset key, matching the keys of the metadata document.
    pub dataset: String,
}

/// Response from the `{dataset}/head` endpoint.
#[derive(Debug, serde::Deserialize)]
struct HeadResponse {
    number: BlockNum,
}

/// Source metadata the catalog holds for a dataset.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub start_block: Option<BlockNum>,
}

/// Errors that can occur when building a [`Client`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The base URL cannot be normalized to end with a slash
    #[error("invalid catalog base URL")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// Failed to construct HTTP client
    #[error("failed to construct HTTP client")]
    HttpClientConstruction(#[source] reqwest::Error),
}

/// Errors that can occur when talking to the catalog.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dataset key produced an invalid request path
    #[error("invalid catalog path '{path}'")]
    InvalidPath {
        path: String,
        source: url::ParseError,
    },

    /// Network or connection error
    #[error("network error connecting to {url}")]
    Network { url: String, source: reqwest::Error },

    /// The rate-limit retry budget was exhausted
    #[error("rate limited by the catalog after {attempts} attempts ({url}): {body}")]
    RateLimitExceeded {
        url: String,
        attempts: u32,
        body: String,
    },

    /// A request body could not be cloned for a retry
    #[error("request cannot be retried")]
    UncloneableRequest,

    /// A success response did not decode
    #[error("failed to decode catalog response from {url}")]
    Decode { url: String, source: reqwest::Error },

    /// Unexpected response from the catalog
    #[error("unexpected catalog response (status {status}): {message}")]
    UnexpectedResponse { status: u16, message: String },
}
