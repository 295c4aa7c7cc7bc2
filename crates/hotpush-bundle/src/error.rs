//! Error types for bundle operations.

use hotpush_core::HcpError;
use thiserror::Error;

/// Errors that can occur during bundle operations.
#[derive(Debug, Error)]
pub enum BundleError {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest validation error.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Checksum mismatch.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Downloaded size differs from the declared size.
    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    /// Missing required file in bundle.
    #[error("Missing required file: {0}")]
    MissingFile(String),
}

impl From<BundleError> for HcpError {
    fn from(err: BundleError) -> Self {
        match err {
            BundleError::ChecksumMismatch {
                ref path,
                ref expected,
                ref actual,
            } => HcpError::AssetVerification {
                path: path.clone(),
                reason: format!("expected {expected}, got {actual}"),
            },
            BundleError::SizeMismatch {
                ref path,
                expected,
                actual,
            } => HcpError::AssetVerification {
                path: path.clone(),
                reason: format!("expected {expected} bytes, got {actual}"),
            },
            BundleError::InvalidManifest(_) | BundleError::Json(_) | BundleError::MissingFile(_) => {
                HcpError::ManifestParse(err.to_string())
            }
            BundleError::Io(e) => HcpError::Internal(e.to_string()),
        }
    }
}
