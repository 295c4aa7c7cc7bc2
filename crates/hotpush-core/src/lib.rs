//! hotpush-core - Core types, durable configuration and lifecycle states
//!
//! This crate provides the foundational types shared by the hotpush engine:
//! - [`HcpError`] for the error taxonomy of an update client
//! - [`ClientState`] for the client state machine
//! - [`ClientConfig`] and [`ConfigStore`] for the durable configuration record
//! - [`ClientSettings`] for host-provided paths and transport settings
//! - [`ClientEvent`] and [`CheckOutcome`] for host-facing notifications

mod config;
mod error;
mod events;
mod lifecycle;
mod settings;

pub use config::{ClientConfig, ConfigStore};
pub use error::{HcpError, HcpResult};
pub use events::{CheckOutcome, ClientEvent, DownloadDecision, ERROR_PREFIX};
pub use lifecycle::ClientState;
pub use settings::ClientSettings;

/// Log levels understood by host log sinks
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }

    /// Parse a level name as used in settings files (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "off" | "none" => Some(LogLevel::Off),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CheckOutcome, ClientConfig, ClientEvent, ClientSettings, ClientState, ConfigStore,
        DownloadDecision, HcpError, HcpResult, LogLevel,
    };
}
