//! Transport trait and in-memory implementation

use async_trait::async_trait;
use bytes::Bytes;
use hotpush_core::HcpError;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while fetching update files
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cannot build HTTP client: {0}")]
    ClientBuild(String),

    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    #[error("transfer cancelled")]
    Cancelled,
}

impl From<TransportError> for HcpError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Cancelled => HcpError::Cancelled,
            other => HcpError::ManifestFetch(other.to_string()),
        }
    }
}

/// Fetches remote update documents and files
///
/// Implementations perform one request per call and never retry; retry
/// policy belongs to whoever schedules checks.
#[async_trait]
pub trait AssetTransport: Send + Sync {
    /// Fetch the full body at `url`
    async fn fetch(&self, url: &Url) -> TransportResult<Bytes>;

    /// Fetch the body at `url`, failing with [`TransportError::TooLarge`]
    /// once it exceeds `limit` bytes
    ///
    /// The default implementation checks the length after a full fetch;
    /// streaming transports should stop reading at the limit instead.
    async fn fetch_limited(&self, url: &Url, limit: u64) -> TransportResult<Bytes> {
        let body = self.fetch(url).await?;
        if body.len() as u64 > limit {
            return Err(TransportError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }
        Ok(body)
    }
}

/// Transport serving fixed responses from memory
///
/// Unknown URLs answer with HTTP 404. Every request is recorded.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    routes: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`, replacing any previous body
    pub fn insert(&self, url: impl AsRef<str>, body: impl Into<Bytes>) {
        self.routes
            .lock()
            .insert(url.as_ref().to_string(), body.into());
    }

    /// Stop serving `url`
    pub fn remove(&self, url: impl AsRef<str>) {
        self.routes.lock().remove(url.as_ref());
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl AssetTransport for MemoryTransport {
    async fn fetch(&self, url: &Url) -> TransportResult<Bytes> {
        self.requests.lock().push(url.to_string());

        let body = self.routes.lock().get(url.as_str()).cloned();
        body.ok_or_else(|| TransportError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}
