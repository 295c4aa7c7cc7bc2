//! hotpush-transport - Manifest and asset transport
//!
//! This crate provides:
//! - [`AssetTransport`] trait for fetching manifests and asset files
//! - [`HttpTransport`] implementation backed by `reqwest`
//! - [`MemoryTransport`] for hosts and tests that serve updates in-process
//! - [`UpdateEndpoint`] for resolving update, manifest and asset URLs

mod endpoint;
mod http;
mod transport;

pub use endpoint::UpdateEndpoint;
pub use http::HttpTransport;
pub use transport::{AssetTransport, MemoryTransport, TransportError, TransportResult};
pub use bytes::Bytes;
pub use url::Url;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AssetTransport, HttpTransport, MemoryTransport, TransportError, TransportResult,
        UpdateEndpoint, Url,
    };
}
