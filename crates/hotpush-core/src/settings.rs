//! Host-provided settings

use crate::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings supplied by the host when constructing a client
///
/// Paths are owned by the host: the client never decides where the initial
/// bundle or its data directory live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Directory holding the config file and the versions directory
    #[serde(default)]
    pub data_dir: PathBuf,

    /// Read-only directory with the bundle shipped at install time
    #[serde(default)]
    pub initial_bundle_dir: PathBuf,

    /// File name of the durable configuration record
    #[serde(default = "default_config_file_name")]
    pub config_file_name: String,

    /// Name of the directory holding downloaded versions
    #[serde(default = "default_versions_dir_name")]
    pub versions_dir_name: String,

    /// Sub-path resolved against the bundle's root URL to reach updates
    #[serde(default = "default_update_path")]
    pub update_path: String,

    /// File name of the manifest, both remotely and inside bundle directories
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,

    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_config_file_name() -> String {
    "autoupdate.json".to_string()
}

fn default_versions_dir_name() -> String {
    "versions".to_string()
}

fn default_update_path() -> String {
    "__cordova/".to_string()
}

fn default_manifest_name() -> String {
    "manifest.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_connect_timeout() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("hotpush/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            initial_bundle_dir: PathBuf::new(),
            config_file_name: default_config_file_name(),
            versions_dir_name: default_versions_dir_name(),
            update_path: default_update_path(),
            manifest_name: default_manifest_name(),
            log_level: default_log_level(),
            request_timeout_ms: default_request_timeout(),
            connect_timeout_ms: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientSettings {
    /// Create settings for the given data and initial bundle directories
    pub fn new(data_dir: impl Into<PathBuf>, initial_bundle_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            initial_bundle_dir: initial_bundle_dir.into(),
            ..Self::default()
        }
    }

    /// Create settings from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Set the update sub-path
    pub fn with_update_path(mut self, update_path: impl Into<String>) -> Self {
        self.update_path = update_path.into();
        self
    }

    /// Set the manifest file name
    pub fn with_manifest_name(mut self, manifest_name: impl Into<String>) -> Self {
        self.manifest_name = manifest_name.into();
        self
    }

    /// Set the log level
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level.to_string().to_ascii_lowercase();
        self
    }

    /// Path of the durable configuration file
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(&self.config_file_name)
    }

    /// Path of the versions directory
    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join(&self.versions_dir_name)
    }

    /// Directory of the bundled initial version
    pub fn initial_bundle_dir(&self) -> &Path {
        &self.initial_bundle_dir
    }

    /// Parsed log level, falling back to `Info` for unknown names
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
