//! # hotpush
//!
//! Over-the-air hot code push for web application bundles embedded in a
//! host application.
//!
//! The host ships an initial bundle with the app. hotpush periodically asks
//! the server for a newer version, downloads only the files that changed into
//! a fresh version directory, and hands the new version to the host once it
//! is safe to switch.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hotpush::prelude::*;
//! use std::time::Duration;
//!
//! let settings = ClientSettings::new("/var/lib/myapp/hcp", "/opt/myapp/www");
//! let mut host = HotPushHost::new(settings, None)?;
//! host.init()?;
//!
//! let handle = host.check_for_updates();
//! if host.wait_for_check(handle).is_downloaded() {
//!     // reload the web view at a convenient moment, then
//!     host.on_reset()?;
//! }
//!
//! while let Some(event) = host.try_next_event() {
//!     println!("{event:?}");
//! }
//! host.shutdown(Duration::from_secs(5))?;
//! ```
//!
//! Hosts that already run Tokio use [`HcpClient`] directly with a
//! [`TaskSpawner`] for their runtime.
//!
//! ## Crate Structure
//!
//! This crate holds the engine and re-exports from:
//! - [`hotpush_core`] - errors, config record, settings, lifecycle, events
//! - [`hotpush_bundle`] - manifests, bundles and staging directories
//! - [`hotpush_transport`] - the transport trait and its HTTP implementation
//! - [`hotpush_runtime`] - owned runtime, task spawning and cancellation
//! - [`hotpush_logging`] - bridge from `tracing` to a host log sink

mod client;
mod host;
mod manager;

#[cfg(test)]
mod test_support;

pub use client::{CheckHandle, ClientEvents, HcpClient};
pub use host::HotPushHost;
pub use manager::{AssetBundleManager, DownloadPolicy, ManagerConfig, UpdateCheck};

// Re-export the building blocks
pub use hotpush_bundle::{AssetBundle, AssetEntry, AssetManifest, BundleError, ManifestDiff};
pub use hotpush_core::{
    CheckOutcome, ClientConfig, ClientEvent, ClientSettings, ClientState, ConfigStore,
    DownloadDecision, ERROR_PREFIX, HcpError, HcpResult, LogLevel,
};
pub use hotpush_logging::{LogSink, MemorySink, ReloadHandle, init_logging};
pub use hotpush_runtime::{AsyncRuntime, RuntimeConfig, ShutdownHandle, ShutdownSignal, TaskSpawner};
pub use hotpush_transport::{
    AssetTransport, HttpTransport, MemoryTransport, TransportError, UpdateEndpoint, Url,
};

pub use hotpush_bundle;
pub use hotpush_core;
pub use hotpush_logging;
pub use hotpush_runtime;
pub use hotpush_transport;

/// Prelude module for convenient imports
///
/// Use `use hotpush::prelude::*;` to import the types a host needs.
pub mod prelude {
    pub use crate::{
        AssetTransport, CheckHandle, CheckOutcome, ClientEvent, ClientEvents, ClientSettings,
        HcpClient, HcpError, HcpResult, HotPushHost, LogLevel, LogSink, TaskSpawner,
    };
}
