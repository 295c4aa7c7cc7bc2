//! Manifest schema for asset bundles.
//!
//! A manifest lists one version of the web application and the hash of every
//! file it serves. Two manifests are compared by path and hash to find the
//! files a new version actually needs to transfer.

use crate::hash::{format_sha256, has_sha256_prefix, verify_sha256};
use crate::{BundleError, BundleResult, MANIFEST_FILE, MANIFEST_FORMAT};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Manifest of one bundle version.
///
/// This corresponds to the manifest file in a bundle directory and to the
/// document served under the update path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifest {
    /// Document format tag (e.g., "web-program-pre1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Opaque version identifier, compared by equality only.
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Root URL updates are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_url: Option<String>,

    /// Versions with different compatibility tags cannot replace each other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_version: Option<String>,

    /// Asset entries in serving order.
    #[serde(default, rename = "manifest")]
    pub entries: Vec<AssetEntry>,
}

/// One file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Path relative to the bundle directory.
    pub path: String,

    /// URL relative to the update path; defaults to `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Content hash (`sha256:<hex>`).
    pub hash: String,

    /// Size in bytes.
    pub size: u64,
}

/// Partition of a new manifest relative to a reference manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    /// Entries whose path and hash match the reference; linked, not fetched.
    pub reused: Vec<AssetEntry>,
    /// Entries that are new or changed.
    pub download: Vec<AssetEntry>,
    /// Reference paths the new manifest no longer lists.
    pub removed: Vec<String>,
}

impl ManifestDiff {
    /// Total bytes that have to be transferred.
    pub fn download_bytes(&self) -> u64 {
        self.download.iter().map(|e| e.size).sum()
    }

    /// True if nothing needs to be transferred.
    pub fn is_download_free(&self) -> bool {
        self.download.is_empty()
    }
}

impl AssetEntry {
    /// Create an entry describing the given contents.
    pub fn for_contents(path: impl Into<String>, contents: &[u8]) -> Self {
        Self {
            path: path.into(),
            url: None,
            hash: format_sha256(contents),
            size: contents.len() as u64,
        }
    }

    /// Set an explicit download URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// URL to fetch this entry from, relative to the update path.
    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.path)
    }

    /// Check downloaded contents against the declared size and hash.
    pub fn verify(&self, contents: &[u8]) -> BundleResult<()> {
        let actual = contents.len() as u64;
        if actual != self.size {
            return Err(BundleError::SizeMismatch {
                path: self.path.clone(),
                expected: self.size,
                actual,
            });
        }

        if !verify_sha256(contents, &self.hash) {
            return Err(BundleError::ChecksumMismatch {
                path: self.path.clone(),
                expected: self.hash.clone(),
                actual: format_sha256(contents),
            });
        }

        Ok(())
    }
}

impl AssetManifest {
    /// Create a new manifest with no entries.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            format: Some(MANIFEST_FORMAT.to_string()),
            version: version.into(),
            app_id: None,
            root_url: None,
            compatibility_version: None,
            entries: Vec::new(),
        }
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    pub fn with_compatibility_version(mut self, compatibility_version: impl Into<String>) -> Self {
        self.compatibility_version = Some(compatibility_version.into());
        self
    }

    /// Append an entry.
    pub fn add_entry(&mut self, entry: AssetEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Append an entry describing the given contents.
    pub fn with_asset(mut self, path: impl Into<String>, contents: &[u8]) -> Self {
        self.entries.push(AssetEntry::for_contents(path, contents));
        self
    }

    /// Look up an entry by path.
    pub fn entry(&self, path: &str) -> Option<&AssetEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Validate the manifest.
    pub fn validate(&self) -> BundleResult<()> {
        validate_version(&self.version)?;

        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            validate_asset_path(&entry.path)?;

            if !has_sha256_prefix(&entry.hash) {
                return Err(BundleError::InvalidManifest(format!(
                    "asset {}: hash must start with 'sha256:'",
                    entry.path
                )));
            }

            if !seen.insert(entry.path.as_str()) {
                return Err(BundleError::InvalidManifest(format!(
                    "duplicate asset path: {}",
                    entry.path
                )));
            }
        }

        Ok(())
    }

    /// Compute what has to be fetched to turn `reference` into this manifest.
    pub fn diff_against(&self, reference: &AssetManifest) -> ManifestDiff {
        let reference_hashes: HashMap<&str, &str> = reference
            .entries
            .iter()
            .map(|e| (e.path.as_str(), e.hash.as_str()))
            .collect();

        let mut diff = ManifestDiff::default();
        for entry in &self.entries {
            match reference_hashes.get(entry.path.as_str()) {
                Some(hash) if *hash == entry.hash => diff.reused.push(entry.clone()),
                _ => diff.download.push(entry.clone()),
            }
        }

        let current: HashSet<&str> = self.entries.iter().map(|e| e.path.as_str()).collect();
        diff.removed = reference
            .entries
            .iter()
            .filter(|e| !current.contains(e.path.as_str()))
            .map(|e| e.path.clone())
            .collect();

        diff
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> BundleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a manifest from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> BundleResult<Self> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }
}

/// A version must be usable as a single directory name.
fn validate_version(version: &str) -> BundleResult<()> {
    if version.is_empty() {
        return Err(BundleError::InvalidManifest(
            "version is required".to_string(),
        ));
    }

    if version.starts_with('.') || version.contains(['/', '\\']) || version.contains('\0') {
        return Err(BundleError::InvalidManifest(format!(
            "version {version:?} cannot be used as a directory name"
        )));
    }

    Ok(())
}

fn validate_asset_path(path: &str) -> BundleResult<()> {
    let invalid = |reason: &str| {
        Err(BundleError::InvalidManifest(format!(
            "asset path {path:?}: {reason}"
        )))
    };

    if path.is_empty() {
        return invalid("path is required");
    }
    if path.starts_with('/') || path.contains('\\') || path.contains(':') {
        return invalid("must be a relative path");
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return invalid("must be normalized and stay inside the bundle");
    }
    if path == MANIFEST_FILE {
        return invalid("collides with the manifest file");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use test_case::test_case;

    fn manifest_v1() -> AssetManifest {
        AssetManifest::new("1")
            .with_app_id("app")
            .with_root_url("https://example.com/")
            .with_asset("app.js", b"app v1")
            .with_asset("vendor.js", b"vendor")
    }

    #[test]
    fn AssetManifest___from_json___parses_wire_format() {
        let json = r#"{
            "format": "web-program-pre1",
            "version": "2",
            "appId": "app",
            "rootUrl": "https://example.com/",
            "compatibilityVersion": "c1",
            "manifest": [
                {"path": "app.js", "url": "/app.js?abc", "hash": "sha256:00ff", "size": 12}
            ]
        }"#;

        let manifest = AssetManifest::from_json(json.as_bytes()).unwrap();

        assert_eq!(manifest.version, "2");
        assert_eq!(manifest.app_id.as_deref(), Some("app"));
        assert_eq!(manifest.compatibility_version.as_deref(), Some("c1"));
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].url(), "/app.js?abc");
        assert_eq!(manifest.entries[0].size, 12);
    }

    #[test]
    fn AssetManifest___from_json___optional_fields_default() {
        let manifest = AssetManifest::from_json(br#"{"version": "5"}"#).unwrap();

        assert!(manifest.app_id.is_none());
        assert!(manifest.root_url.is_none());
        assert!(manifest.format.is_none());
        assert!(manifest.entries.is_empty());
    }

    #[test]
    fn AssetManifest___from_json___missing_version_is_json_error() {
        let result = AssetManifest::from_json(br#"{"manifest": []}"#);

        assert!(matches!(result, Err(BundleError::Json(_))));
    }

    #[test]
    fn AssetManifest___to_json___uses_wire_names() {
        let json = manifest_v1().with_compatibility_version("c1").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["appId"], "app");
        assert_eq!(value["rootUrl"], "https://example.com/");
        assert_eq!(value["compatibilityVersion"], "c1");
        assert_eq!(value["manifest"][0]["path"], "app.js");
        assert!(value["manifest"][0].get("url").is_none());
    }

    #[test_case("" ; "empty")]
    #[test_case(".hidden" ; "leading dot")]
    #[test_case(".." ; "parent")]
    #[test_case("a/b" ; "slash")]
    #[test_case("a\\b" ; "backslash")]
    fn AssetManifest___validate___rejects_bad_version(version: &str) {
        let manifest = AssetManifest::new(version);

        assert!(matches!(
            manifest.validate(),
            Err(BundleError::InvalidManifest(_))
        ));
    }

    #[test_case("" ; "empty")]
    #[test_case("/etc/passwd" ; "absolute")]
    #[test_case("../escape.js" ; "parent traversal")]
    #[test_case("a/../b.js" ; "inner traversal")]
    #[test_case("a//b.js" ; "empty segment")]
    #[test_case("./a.js" ; "dot segment")]
    #[test_case("c:\\win.js" ; "windows path")]
    #[test_case("manifest.json" ; "manifest file")]
    fn AssetManifest___validate___rejects_unsafe_path(path: &str) {
        let mut manifest = AssetManifest::new("1");
        manifest.add_entry(AssetEntry::for_contents(path, b"x"));

        assert!(matches!(
            manifest.validate(),
            Err(BundleError::InvalidManifest(_))
        ));
    }

    #[test]
    fn AssetManifest___validate___rejects_non_sha256_hash() {
        let mut manifest = AssetManifest::new("1");
        manifest.add_entry(AssetEntry {
            path: "a.js".to_string(),
            url: None,
            hash: "md5:abc".to_string(),
            size: 1,
        });

        let err = manifest.validate().unwrap_err();

        assert!(err.to_string().contains("sha256"));
    }

    #[test]
    fn AssetManifest___validate___rejects_duplicate_paths() {
        let manifest = AssetManifest::new("1")
            .with_asset("a.js", b"one")
            .with_asset("a.js", b"two");

        let err = manifest.validate().unwrap_err();

        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn AssetManifest___validate___accepts_nested_paths() {
        let manifest = AssetManifest::new("1").with_asset("packages/ui/button.css", b"x");

        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn AssetManifest___diff_against___partitions_entries() {
        let v2 = AssetManifest::new("2")
            .with_asset("app.js", b"app v2")
            .with_asset("vendor.js", b"vendor")
            .with_asset("new.css", b"css");

        let diff = v2.diff_against(&manifest_v1());

        let reused: Vec<_> = diff.reused.iter().map(|e| e.path.as_str()).collect();
        let download: Vec<_> = diff.download.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(reused, vec!["vendor.js"]);
        assert_eq!(download, vec!["app.js", "new.css"]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.download_bytes(), 9);
    }

    #[test]
    fn AssetManifest___diff_against___reports_removed_paths() {
        let v2 = AssetManifest::new("2").with_asset("vendor.js", b"vendor");

        let diff = v2.diff_against(&manifest_v1());

        assert_eq!(diff.removed, vec!["app.js".to_string()]);
        assert!(diff.is_download_free());
    }

    #[test]
    fn AssetManifest___diff_against___same_hash_different_path_is_downloaded() {
        let v2 = AssetManifest::new("2").with_asset("renamed.js", b"vendor");

        let diff = v2.diff_against(&manifest_v1());

        assert_eq!(diff.download.len(), 1);
        assert!(diff.reused.is_empty());
    }

    #[test]
    fn AssetEntry___verify___accepts_matching_contents() {
        let entry = AssetEntry::for_contents("a.js", b"hello");

        assert!(entry.verify(b"hello").is_ok());
    }

    #[test]
    fn AssetEntry___verify___size_mismatch() {
        let entry = AssetEntry::for_contents("a.js", b"hello");

        let err = entry.verify(b"hello!").unwrap_err();

        assert!(matches!(
            err,
            BundleError::SizeMismatch {
                expected: 5,
                actual: 6,
                ..
            }
        ));
    }

    #[test]
    fn AssetEntry___verify___hash_mismatch() {
        let entry = AssetEntry::for_contents("a.js", b"hello");

        let err = entry.verify(b"jello").unwrap_err();

        assert!(matches!(err, BundleError::ChecksumMismatch { ref path, .. } if path == "a.js"));
    }

    #[test]
    fn AssetEntry___url___defaults_to_path() {
        let entry = AssetEntry::for_contents("a.js", b"x");

        assert_eq!(entry.url(), "a.js");
        assert_eq!(entry.with_url("/a.js?h").url(), "/a.js?h");
    }
}
