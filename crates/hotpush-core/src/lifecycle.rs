//! Client state machine

use serde::{Deserialize, Serialize};

/// States of the hot code push client
///
/// State transitions:
/// ```text
/// Uninitialized → Ready → Checking → Downloading
///                   ↑         │            │
///                   └─────────┴────────────┘ (check finished, any outcome)
/// ```
///
/// Promotion of a pending bundle (`on_reset`) happens in `Ready` and does not
/// change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientState {
    /// `init` has not completed yet
    #[default]
    Uninitialized,
    /// Serving the current bundle, no check running
    Ready,
    /// Fetching and evaluating the remote manifest
    Checking,
    /// Transferring assets of an accepted version
    Downloading,
}

impl ClientState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: ClientState) -> bool {
        use ClientState::*;
        matches!(
            (self, target),
            (Uninitialized, Ready)
                | (Ready, Checking)
                | (Checking, Downloading)
                | (Checking, Ready)
                | (Downloading, Ready)
        )
    }

    /// Check if host commands are accepted in this state
    pub fn is_initialized(&self) -> bool {
        !matches!(self, ClientState::Uninitialized)
    }

    /// Check if an update check is running
    pub fn is_checking(&self) -> bool {
        matches!(self, ClientState::Checking | ClientState::Downloading)
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            ClientState::Uninitialized => "Client has not been initialized",
            ClientState::Ready => "Client is serving the current bundle",
            ClientState::Checking => "Client is checking for a new version",
            ClientState::Downloading => "Client is downloading a new version",
        }
    }
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientState::Uninitialized => write!(f, "Uninitialized"),
            ClientState::Ready => write!(f, "Ready"),
            ClientState::Checking => write!(f, "Checking"),
            ClientState::Downloading => write!(f, "Downloading"),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle/lifecycle_tests.rs"]
mod lifecycle_tests;
