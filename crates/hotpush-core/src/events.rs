//! Host-facing notifications and check results

use crate::HcpError;
use serde::{Deserialize, Serialize};

/// Prefix of every error message forwarded to the host
pub const ERROR_PREFIX: &str = "[autoupdate] ";

/// Notification delivered to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// A version finished downloading and is waiting for `on_reset`
    NewVersionReady { version: String },
    /// Something went wrong; the served bundle is unaffected
    Error { message: String },
}

impl ClientEvent {
    /// Build an error notification from its cause
    pub fn error(cause: &HcpError) -> Self {
        ClientEvent::Error {
            message: format!("{ERROR_PREFIX}{cause}"),
        }
    }

    pub fn new_version_ready(version: impl Into<String>) -> Self {
        ClientEvent::NewVersionReady {
            version: version.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ClientEvent::Error { .. })
    }
}

/// Result of evaluating a remote manifest before any transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadDecision {
    Accept,
    AlreadyCurrent,
    AlreadyPending,
    Blacklisted,
    Incompatible,
}

impl DownloadDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, DownloadDecision::Accept)
    }

    /// Short reason used in logs
    pub fn reason(&self) -> &'static str {
        match self {
            DownloadDecision::Accept => "accepted",
            DownloadDecision::AlreadyCurrent => "already current",
            DownloadDecision::AlreadyPending => "already pending",
            DownloadDecision::Blacklisted => "blacklisted",
            DownloadDecision::Incompatible => "incompatible",
        }
    }
}

impl std::fmt::Display for DownloadDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Final result of one update check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The remote version equals the reference bundle
    UpToDate { version: String },
    /// The remote version was rejected before any transfer
    Skipped {
        version: String,
        decision: DownloadDecision,
    },
    /// A new version was materialized and is now pending
    Downloaded { version: String },
    /// The check failed; reference state is unchanged
    Failed(HcpError),
}

impl CheckOutcome {
    pub fn is_downloaded(&self) -> bool {
        matches!(self, CheckOutcome::Downloaded { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckOutcome::Failed(_))
    }

    /// Remote version the check saw, if it got that far
    pub fn version(&self) -> Option<&str> {
        match self {
            CheckOutcome::UpToDate { version }
            | CheckOutcome::Skipped { version, .. }
            | CheckOutcome::Downloaded { version } => Some(version),
            CheckOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&HcpError> {
        match self {
            CheckOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}
