//! Error types for the hot code push client

use thiserror::Error;

/// Result type alias for client operations
pub type HcpResult<T> = Result<T, HcpError>;

/// Error type for client, manager and configuration operations
///
/// Every variant carries owned strings only, so errors can be cloned into
/// check outcomes and compared in tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HcpError {
    /// The durable configuration file could not be read or written
    #[error("config I/O error on {path}: {reason}")]
    ConfigIo { path: String, reason: String },

    /// The remote manifest could not be retrieved
    #[error("failed to fetch manifest: {0}")]
    ManifestFetch(String),

    /// A manifest (local or remote) is missing or malformed
    #[error("invalid manifest: {0}")]
    ManifestParse(String),

    /// A downloaded asset did not match its declared hash or size
    #[error("asset verification failed for {path}: {reason}")]
    AssetVerification { path: String, reason: String },

    /// The versions directory could not be created
    #[error("cannot create versions directory {path}: {reason}")]
    StorageInit { path: String, reason: String },

    /// The current bundle has no root URL to check against
    #[error("checkForUpdates requires a rootURL to be configured")]
    MissingRootUrl,

    /// The remote version is on the durable blacklist
    #[error("Skipping downloading blacklisted version: {0}")]
    BlacklistedVersion(String),

    /// The remote version declares a different compatibility version
    #[error(
        "Skipping downloading incompatible version {version}: compatibility version {remote} differs from {current}"
    )]
    IncompatibleVersion {
        version: String,
        current: String,
        remote: String,
    },

    /// A check was requested while another one is still running
    #[error("an update check is already in progress")]
    CheckInProgress,

    /// The client is not in a valid state for the requested operation
    #[error("invalid client state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// The check was abandoned before it finished
    #[error("update check cancelled")]
    Cancelled,

    /// Async runtime error
    #[error("runtime error: {0}")]
    RuntimeError(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl HcpError {
    /// Returns a stable numeric code for this error kind
    pub fn error_code(&self) -> u32 {
        match self {
            HcpError::ConfigIo { .. } => 1,
            HcpError::ManifestFetch(_) => 2,
            HcpError::ManifestParse(_) => 3,
            HcpError::AssetVerification { .. } => 4,
            HcpError::StorageInit { .. } => 5,
            HcpError::MissingRootUrl => 6,
            HcpError::BlacklistedVersion(_) => 7,
            HcpError::IncompatibleVersion { .. } => 8,
            HcpError::CheckInProgress => 9,
            HcpError::InvalidState { .. } => 10,
            HcpError::Cancelled => 11,
            HcpError::RuntimeError(_) => 12,
            HcpError::Internal(_) => 13,
        }
    }

    /// Whether this error aborts startup when raised during `init`
    ///
    /// Everything else is reported to the host and leaves the served bundle
    /// untouched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HcpError::ConfigIo { .. } | HcpError::StorageInit { .. }
        )
    }

    /// Build a [`HcpError::ConfigIo`] from a path and any displayable cause
    pub fn config_io(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        HcpError::ConfigIo {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`HcpError::StorageInit`] from a path and any displayable cause
    pub fn storage_init(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        HcpError::StorageInit {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
