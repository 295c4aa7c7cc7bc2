//! Host log sinks and level filtering

use hotpush_core::LogLevel;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Destination for log records, implemented by the host
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, target: &str, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(LogLevel, &str, &str) + Send + Sync,
{
    fn log(&self, level: LogLevel, target: &str, message: &str) {
        self(level, target, message)
    }
}

/// A sink paired with a level that can change at runtime
///
/// Clones share both the sink and the level.
#[derive(Clone)]
pub struct LogFilter {
    sink: Arc<dyn LogSink>,
    level: Arc<AtomicU8>,
}

impl LogFilter {
    pub fn new(sink: Arc<dyn LogSink>, level: LogLevel) -> Self {
        Self {
            sink,
            level: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::SeqCst))
    }

    /// Check if a record at `level` would reach the sink
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Forward a record to the sink if its level is enabled
    pub fn log(&self, level: LogLevel, target: &str, message: &str) {
        if self.is_enabled(level) {
            self.sink.log(level, target, message);
        }
    }
}

impl std::fmt::Debug for LogFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogFilter")
            .field("level", &self.level())
            .finish_non_exhaustive()
    }
}

/// One record captured by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

/// Sink keeping every record in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Messages of all records, in order
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, target: &str, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            target: target.to_string(),
            message: message.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "sink/sink_tests.rs"]
mod sink_tests;
