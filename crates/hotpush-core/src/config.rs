//! Durable configuration record
//!
//! [`ClientConfig`] is the only durable state of the client. It is never
//! patched in place by callers: each state-affecting event derives the next
//! record with one of the `with_*` transitions and hands it to
//! [`ConfigStore::save`], which replaces the file atomically.

use crate::{HcpError, HcpResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// The persisted configuration record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// App id of the bundle that is currently served
    pub app_id: Option<String>,

    /// Root URL of the bundle that is currently served
    pub root_url_string: Option<String>,

    /// Compatibility tag of the bundle that is currently served
    pub compatibility_version: Option<String>,

    /// Versions that must never be downloaded or adopted
    pub blacklisted_versions: BTreeSet<String>,

    /// Last version that finished downloading
    pub last_downloaded_version: Option<String>,

    /// Version of the bundled initial directory seen at the last startup
    pub last_seen_initial_version: Option<String>,

    /// Last version the host confirmed as started successfully
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_known_good_version: Option<String>,
}

impl ClientConfig {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror the identity of the bundle that became current
    pub fn with_bundle_identity(
        mut self,
        app_id: Option<String>,
        root_url_string: Option<String>,
        compatibility_version: Option<String>,
    ) -> Self {
        self.app_id = app_id;
        self.root_url_string = root_url_string;
        self.compatibility_version = compatibility_version;
        self
    }

    /// Record a version that finished downloading
    pub fn with_last_downloaded(mut self, version: impl Into<String>) -> Self {
        self.last_downloaded_version = Some(version.into());
        self
    }

    /// Add a version to the blacklist
    pub fn with_blacklisted(mut self, version: impl Into<String>) -> Self {
        self.blacklisted_versions.insert(version.into());
        self
    }

    /// Record the last version known to start successfully
    pub fn with_last_known_good(mut self, version: impl Into<String>) -> Self {
        self.last_known_good_version = Some(version.into());
        self
    }

    /// Record the bundled initial version seen at startup
    pub fn with_last_seen_initial(mut self, version: impl Into<String>) -> Self {
        self.last_seen_initial_version = Some(version.into());
        self
    }

    /// Check whether a version is blacklisted
    pub fn is_blacklisted(&self, version: &str) -> bool {
        self.blacklisted_versions.contains(version)
    }

    /// Parse a record from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Serialize the record as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Reads and atomically rewrites the configuration file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a store for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether the configuration file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the record, creating the file with defaults if it is absent
    ///
    /// Returns the record and whether the file had to be created.
    pub fn load_or_create(&self) -> HcpResult<(ClientConfig, bool)> {
        let created = if self.exists() {
            false
        } else {
            self.save(&ClientConfig::default())?;
            true
        };
        Ok((self.load()?, created))
    }

    /// Load the record from disk
    pub fn load(&self) -> HcpResult<ClientConfig> {
        let bytes = fs::read(&self.path).map_err(|e| HcpError::config_io(&self.path, e))?;
        ClientConfig::from_json(&bytes).map_err(|e| HcpError::config_io(&self.path, e))
    }

    /// Replace the record on disk
    ///
    /// The record is written to a sibling temp file, flushed, and renamed over
    /// the target so readers never observe a partially written file.
    pub fn save(&self, config: &ClientConfig) -> HcpResult<()> {
        let json = config
            .to_json()
            .map_err(|e| HcpError::config_io(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HcpError::config_io(&self.path, e))?;
        }

        let tmp_path = self.tmp_path();
        {
            let mut file =
                File::create(&tmp_path).map_err(|e| HcpError::config_io(&tmp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| HcpError::config_io(&tmp_path, e))?;
            file.sync_all()
                .map_err(|e| HcpError::config_io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| HcpError::config_io(&self.path, e))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
