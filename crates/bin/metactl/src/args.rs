//! Shared command-line arguments for metactl commands.

use std::{path::PathBuf, time::Duration};

use catalog_client::{BuildError, Client, Config, RetryConfig};
use url::Url;

/// Global arguments shared across all commands that touch the metadata document.
///
/// Commands include these options by using `#[command(flatten)]` in their Args struct.
#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Path to the metadata document
    #[arg(long, env = "SQD_METADATA_PATH", default_value = "metadata.yml")]
    pub metadata: PathBuf,
}

/// Arguments shared across all commands that talk to the dataset catalog.
#[derive(Debug, clap::Args)]
pub struct CatalogArgs {
    /// The URL of the dataset catalog API
    #[arg(long, env = "SQD_CATALOG_URL", value_parser = clap::value_parser!(Url))]
    pub catalog_url: Url,

    /// Number of datasets classified concurrently
    #[arg(long, env = "SQD_BATCH_SIZE", default_value = "10")]
    pub batch_size: usize,

    /// Total attempts per request when rate limited, including the first
    #[arg(long, env = "SQD_MAX_RETRIES", default_value = "5")]
    pub max_retries: u32,

    /// Lower bound on the pause between rate-limited attempts, in milliseconds
    #[arg(long, env = "SQD_RETRY_MIN_DELAY_MS", default_value = "1000")]
    pub retry_min_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "SQD_REQUEST_TIMEOUT_SECS", default_value = "15")]
    pub request_timeout_secs: u64,
}

impl CatalogArgs {
    /// Create a catalog client from these arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn build_client(&self) -> Result<Client, BuildError> {
        Config::new(self.catalog_url.clone())
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
            .with_retry(RetryConfig {
                max_attempts: self.max_retries,
                min_delay: Duration::from_millis(self.retry_min_delay_ms),
            })
            .build()
    }
}
