//! Bounded, retried download of the source dataset.

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http_client::{self, RetryConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Source {url} answered with HTTP {status}")]
    Status { url: Url, status: u16 },
    #[error("Failed to reach {url}: {message}")]
    Transport { url: Url, message: String },
    #[error("Failed to read body from {url}: {source}")]
    Read {
        url: Url,
        source: std::io::Error,
    },
}

/// Download `url` into memory, retrying transport errors and 5xx responses.
pub fn fetch_bytes(url: &Url, retry: RetryConfig, max_bytes: usize) -> Result<Vec<u8>, FetchError> {
    let response = http_client::retry_with_backoff(
        retry,
        || http_client::agent().get(url.as_str()).call(),
        http_client::is_retryable,
    )
    .map_err(|err| match err {
        ureq::Error::Status(status, _) => FetchError::Status {
            url: url.clone(),
            status,
        },
        ureq::Error::Transport(transport) => FetchError::Transport {
            url: url.clone(),
            message: transport.to_string(),
        },
    })?;
    let bytes = http_client::read_response_bytes(response, max_bytes).map_err(|source| {
        FetchError::Read {
            url: url.clone(),
            source,
        }
    })?;
    debug!(url = %url, bytes = bytes.len(), "Downloaded source dataset");
    Ok(bytes)
}
