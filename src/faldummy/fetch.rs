use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Why a remote fetch failed, as reported by the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Retrieves the bytes behind a URL. One attempt, no retries.
pub trait HttpFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Blocking HTTP fetcher backed by `reqwest`.
///
/// No timeout is applied unless the caller asks for one.
pub struct BlockingFetcher {
    timeout: Option<Duration>,
}

impl Default for BlockingFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingFetcher {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn client(&self) -> reqwest::Result<reqwest::blocking::Client> {
        // reqwest's blocking client defaults to a 30s timeout; None disables it.
        reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
    }
}

impl HttpFetcher for BlockingFetcher {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        debug!(url, "fetching placeholder");
        let client = self.client().map_err(|e| TransportError::new(e.to_string()))?;
        let response = client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TransportError::new(e.to_string()))?;
        let body = response
            .bytes()
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_is_transport_error() {
        let fetcher = BlockingFetcher::new().with_timeout(Duration::from_secs(1));
        let err = fetcher.get("not a url").unwrap_err();
        assert!(!err.message.is_empty());
    }
}
