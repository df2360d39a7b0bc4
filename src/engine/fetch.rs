//! HTTP fetch executor
//!
//! One GET per call under a hard deadline. Non-2xx responses are recorded
//! and dropped unread; 2xx bodies are read in full and, when they are
//! non-empty HTML, handed to the tag counter.

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::models::{FetchErrorKind, FetchResult};
use super::tags::count_tags;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("failed to read body: {0}")]
    BodyRead(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidUrl(_) => FetchErrorKind::InvalidUrl,
            FetchError::Timeout => FetchErrorKind::Timeout,
            FetchError::Transport(_) => FetchErrorKind::Transport,
            FetchError::BodyRead(_) => FetchErrorKind::BodyRead,
            FetchError::Internal(_) => FetchErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Executes a single fetch. Failures come back inside the result.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub connect_timeout: Duration,
    /// Deadline for the whole exchange, body included
    pub request_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_redirects: 10,
            user_agent: concat!("linkfetcher/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// reqwest-backed fetcher; the client (and its connection pool) is shared
/// by every worker.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| FetchError::Internal(e.to_string()))?;

        Ok(Self { client })
    }

    async fn try_fetch(&self, url: &str) -> Result<FetchResult> {
        let target = Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                target.scheme()
            )));
        }

        debug!(url, "Starting fetch");

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let mut result = FetchResult::with_status(url, status.as_u16());

        // Non-2xx bodies are never inspected; dropping the response releases it.
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "Non-success status, body skipped");
            return Ok(result);
        }

        result.meta.content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::BodyRead(e.to_string())
            }
        })?;

        result.meta.content_length = body.len();
        debug!(url, status = status.as_u16(), size = body.len(), "Fetch completed");

        if body.is_empty() || !result.meta.content_type.starts_with("text/html") {
            return Ok(result);
        }

        match count_tags(&body) {
            Ok(counts) => result.elements = counts.into_elements(),
            Err(e) => warn!(url, error = %e, "HTML parse error, reporting no tags"),
        }

        Ok(result)
    }
}

fn classify_send_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_builder() {
        FetchError::InvalidUrl(e.to_string())
    } else if e.is_redirect() {
        FetchError::Transport("too many redirects".to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        match self.try_fetch(url).await {
            Ok(result) => result,
            Err(e) => {
                debug!(url, error = %e, "Fetch failed");
                FetchResult::failed(url, &e)
            }
        }
    }
}
