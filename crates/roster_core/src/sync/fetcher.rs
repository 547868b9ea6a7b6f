//! Remote fetch contract.
//!
//! Every failure (transport, non-200 status, empty body) is one generic
//! `FetchError` to callers; the variant only feeds diagnostics.

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues one GET and returns the raw body.
pub trait RemoteFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Generic "could not get data" failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    EmptyBody,
}

impl FetchError {
    /// Diagnostic detail for logs; never shown to users.
    pub fn detail(&self) -> String {
        match self {
            Self::Transport(message) => format!("transport: {message}"),
            Self::Status(status) => format!("status: {status}"),
            Self::EmptyBody => "empty body".to_string(),
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error getting data from URL")
    }
}

impl Error for FetchError {}

/// Blocking HTTP fetcher backed by `ureq`.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    pub fn new() -> Self {
        // Statuses are judged here, so ureq must not turn them into errors.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(FETCH_TIMEOUT))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let started_at = Instant::now();
        let result = self
            .agent
            .get(url)
            .call()
            .map_err(|err| FetchError::Transport(err.to_string()))
            .and_then(|mut response| {
                let status = response.status().as_u16();
                if status != 200 {
                    return Err(FetchError::Status(status));
                }
                response
                    .body_mut()
                    .read_to_vec()
                    .map_err(|err| FetchError::Transport(err.to_string()))
            })
            .and_then(|body| {
                if body.is_empty() {
                    Err(FetchError::EmptyBody)
                } else {
                    Ok(body)
                }
            });

        match &result {
            Ok(body) => info!(
                "event=remote_fetch module=sync status=ok bytes={} duration_ms={}",
                body.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=remote_fetch module=sync status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err.detail()
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchError, HttpFetcher, RemoteFetcher};

    #[test]
    fn every_variant_displays_the_same_message() {
        for err in [
            FetchError::Transport("refused".to_string()),
            FetchError::Status(404),
            FetchError::EmptyBody,
        ] {
            assert_eq!(err.to_string(), "Error getting data from URL");
        }
        assert_eq!(FetchError::Status(503).detail(), "status: 503");
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let fetcher = HttpFetcher::new();
        let err = fetcher
            .fetch("http://127.0.0.1:1/todos")
            .expect_err("nothing listens on port 1");
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
