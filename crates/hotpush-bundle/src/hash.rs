//! SHA256 helpers for asset verification.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute SHA256 hash of data and return as hex string.
pub fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute SHA256 hash of data in manifest form (`sha256:<hex>`).
pub fn format_sha256(data: &[u8]) -> String {
    format!("{PREFIX}{}", compute_sha256(data))
}

/// Verify SHA256 checksum of data.
pub fn verify_sha256(data: &[u8], expected: &str) -> bool {
    let expected_hex = expected.strip_prefix(PREFIX).unwrap_or(expected);
    compute_sha256(data).eq_ignore_ascii_case(expected_hex)
}

pub(crate) fn has_sha256_prefix(hash: &str) -> bool {
    hash.strip_prefix(PREFIX)
        .is_some_and(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
