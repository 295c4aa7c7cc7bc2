//! Asset bundle format for hotpush
//!
//! This crate provides the on-disk side of hot code push: the manifest wire
//! model, immutable [`AssetBundle`]s, and the [`StagingDirectory`] writer that
//! makes a new version discoverable only once it is complete.
//!
//! # Versions directory
//!
//! ```text
//! versions/
//! ├── 2/
//! │   ├── manifest.json
//! │   ├── app.js              # downloaded
//! │   └── vendor.js           # linked from the reference bundle
//! └── .staging-3-<uuid>/      # in-flight download, never adopted
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hotpush_bundle::{AssetBundle, AssetManifest};
//!
//! let current = AssetBundle::load("www")?;
//! let remote = AssetManifest::from_json(br#"{"version": "2", "manifest": []}"#)?;
//! let diff = remote.diff_against(current.manifest());
//! println!("{} to download, {} reused", diff.download.len(), diff.reused.len());
//! # Ok::<(), hotpush_bundle::BundleError>(())
//! ```

mod bundle;
mod error;
mod manifest;
mod staging;

pub mod hash;

pub use bundle::AssetBundle;
pub use error::BundleError;
pub use hash::{compute_sha256, format_sha256, verify_sha256};
pub use manifest::{AssetEntry, AssetManifest, ManifestDiff};
pub use staging::{StagingDirectory, is_staging_name, remove_leftover_staging};

/// Result type for bundle operations.
pub type BundleResult<T> = Result<T, BundleError>;

/// Manifest format written by this crate.
pub const MANIFEST_FORMAT: &str = "web-program-pre1";

/// Default manifest file name within a bundle directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Name prefix of in-flight download directories.
pub const STAGING_PREFIX: &str = ".staging-";
