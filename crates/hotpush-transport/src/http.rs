//! HTTP transport backed by reqwest

use crate::{AssetTransport, TransportError, TransportResult};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use hotpush_core::ClientSettings;
use std::time::Duration;
use url::Url;

/// Transport performing plain GET requests
///
/// One [`reqwest::Client`] is shared by all requests so connections are
/// pooled across the manifest and asset fetches of a check.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport with the timeouts and user agent from `settings`
    pub fn new(settings: &ClientSettings) -> TransportResult<Self> {
        let client = build_client(
            settings.request_timeout(),
            settings.connect_timeout(),
            &settings.user_agent,
        )?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Build the shared [`reqwest::Client`]
pub(crate) fn build_client(
    timeout: Duration,
    connect_timeout: Duration,
    user_agent: &str,
) -> TransportResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| TransportError::ClientBuild(e.to_string()))
}

#[async_trait]
impl AssetTransport for HttpTransport {
    async fn fetch(&self, url: &Url) -> TransportResult<Bytes> {
        self.get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| request_error(url, e))
    }

    async fn fetch_limited(&self, url: &Url, limit: u64) -> TransportResult<Bytes> {
        let mut response = self.get(url).await?;
        let too_large = || TransportError::TooLarge {
            url: url.to_string(),
            limit,
        };

        if response.content_length().is_some_and(|length| length > limit) {
            return Err(too_large());
        }

        let capacity = response.content_length().unwrap_or(limit).min(limit);
        let mut body = BytesMut::with_capacity(usize::try_from(capacity).unwrap_or(0));
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(url, e))? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

impl HttpTransport {
    /// Send a GET and reject non-success statuses
    async fn get(&self, url: &Url) -> TransportResult<reqwest::Response> {
        tracing::trace!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

fn request_error(url: &Url, err: reqwest::Error) -> TransportError {
    let reason = if err.is_timeout() {
        "timed out".to_string()
    } else {
        err.to_string()
    };
    TransportError::Request {
        url: url.to_string(),
        reason,
    }
}
