//! Subscriber installation and dynamic level reloading

use crate::layer::HostLoggingLayer;
use crate::sink::{LogFilter, LogSink};
use hotpush_core::LogLevel;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::Registry;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;

/// Handle for changing the log level after installation
///
/// Updates both the subscriber-wide level filter, so disabled call sites stay
/// cheap, and the [`LogFilter`] the sink is guarded by.
#[derive(Clone)]
pub struct ReloadHandle {
    handle: reload::Handle<LevelFilter, Registry>,
    filter: LogFilter,
}

impl ReloadHandle {
    /// Reload the filter to use a new log level
    pub fn reload_level(&self, level: LogLevel) -> Result<(), String> {
        self.handle
            .reload(convert_level_to_filter(level))
            .map_err(|e| format!("Failed to reload filter: {e}"))?;
        self.filter.set_level(level);
        Ok(())
    }

    pub fn level(&self) -> LogLevel {
        self.filter.level()
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }
}

impl std::fmt::Debug for ReloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadHandle")
            .field("level", &self.level())
            .finish()
    }
}

/// Build a subscriber forwarding to `sink`, without installing it
pub fn logging_subscriber(
    sink: Arc<dyn LogSink>,
    level: LogLevel,
) -> (impl Subscriber + Send + Sync, ReloadHandle) {
    let filter = LogFilter::new(sink, level);
    let (level_layer, handle) = reload::Layer::new(convert_level_to_filter(level));

    let subscriber = tracing_subscriber::registry()
        .with(level_layer)
        .with(HostLoggingLayer::new(filter.clone()));

    (subscriber, ReloadHandle { handle, filter })
}

/// Install a subscriber forwarding to `sink` as the global default
///
/// If a global subscriber is already set, it stays in place and the returned
/// handle only controls the (unused) new filter.
pub fn init_logging(sink: Arc<dyn LogSink>, level: LogLevel) -> ReloadHandle {
    let (subscriber, handle) = logging_subscriber(sink, level);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("global subscriber already set, keeping it");
    }

    handle
}

/// Convert LogLevel to tracing LevelFilter
fn convert_level_to_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}

#[cfg(test)]
#[path = "reload/reload_tests.rs"]
mod reload_tests;
