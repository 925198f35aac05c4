//! HTTP retrieval shared by the feed collector and the content fetcher.
//!
//! Both stages go through the [`Fetch`] trait so that tests can substitute
//! canned responses and simulated failures for real network access.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument};

/// Browser-like agent string; several feeds refuse default client agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Fetch a URL's body, bounded by a per-call timeout.
///
/// Implementations must treat non-2xx responses as errors.
pub trait Fetch {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;
}

/// [`Fetch`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let t0 = Instant::now();
        let wrap = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    source: e,
                }
            }
        };

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(wrap)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(wrap)?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body.to_vec())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`Fetch`] used by the stage and pipeline tests.

    use super::{Fetch, FetchError};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub enum Canned {
        Body(String),
        Timeout,
        Status(u16),
    }

    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        responses: HashMap<String, Canned>,
        pub requested: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, canned: Canned) -> Self {
            self.responses.insert(url.to_string(), canned);
            self
        }

        pub fn body(self, url: &str, body: impl Into<String>) -> Self {
            self.with(url, Canned::Body(body.into()))
        }
    }

    impl Fetch for FakeFetcher {
        async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            match self.responses.get(url) {
                Some(Canned::Body(body)) => Ok(body.as_bytes().to_vec()),
                Some(Canned::Timeout) => Err(FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                }),
                Some(Canned::Status(status)) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        let e = FetchError::Timeout {
            url: "https://example.com".to_string(),
            timeout: Duration::from_secs(15),
        };
        assert_eq!(e.to_string(), "request to https://example.com timed out after 15s");

        let e = FetchError::Status {
            url: "https://example.com/feed".to_string(),
            status: 503,
        };
        assert_eq!(e.to_string(), "https://example.com/feed returned HTTP 503");
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new().is_ok());
    }
}
