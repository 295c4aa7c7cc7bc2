//! hotpush-logging - Tracing bridge to host log sinks
//!
//! Components never own a logger. Each one receives a [`tracing::Span`] from
//! [`component_span`] at construction and logs inside it; the host decides
//! where the events go by installing a [`HostLoggingLayer`] over its
//! [`LogSink`].
//!
//! This crate provides:
//! - [`LogSink`] trait implemented by hosts (closures work too)
//! - [`LogFilter`] runtime-adjustable level shared by layer and host
//! - [`HostLoggingLayer`] tracing layer forwarding events to a sink
//! - [`ReloadHandle`] and [`init_logging`] for installing the subscriber

mod layer;
mod reload;
mod sink;

pub use hotpush_core::LogLevel;
pub use layer::{HostLoggingLayer, component_span};
pub use reload::{ReloadHandle, init_logging, logging_subscriber};
pub use sink::{LogFilter, LogRecord, LogSink, MemorySink};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        HostLoggingLayer, LogFilter, LogLevel, LogSink, MemorySink, ReloadHandle, component_span,
        init_logging,
    };
}
