//! Tracing layer that forwards to a host sink

use crate::sink::LogFilter;
use hotpush_core::LogLevel;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Level, Span, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const COMPONENT_FIELD: &str = "component";

/// Create the span a component logs inside
///
/// Events recorded within it reach the sink prefixed with `[name] `. The span
/// is created at ERROR level so it stays enabled whenever any event is.
pub fn component_span(name: &'static str) -> Span {
    tracing::error_span!("hotpush", component = name)
}

/// Component name stored in span extensions
struct Component(String);

/// Tracing layer that forwards log events to a [`LogFilter`]
pub struct HostLoggingLayer {
    filter: LogFilter,
}

impl HostLoggingLayer {
    pub fn new(filter: LogFilter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    fn convert_level(level: &Level) -> LogLevel {
        match *level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

impl<S> Layer<S> for HostLoggingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = ComponentVisitor::default();
        attrs.record(&mut visitor);

        if let (Some(component), Some(span)) = (visitor.name, ctx.span(id)) {
            span.extensions_mut().insert(Component(component));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Self::convert_level(metadata.level());

        if !self.filter.is_enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.finish();

        let component = ctx.event_scope(event).and_then(|scope| {
            scope
                .into_iter()
                .find_map(|span| span.extensions().get::<Component>().map(|c| c.0.clone()))
        });

        match component {
            Some(name) => {
                self.filter
                    .log(level, metadata.target(), &format!("[{name}] {message}"))
            }
            None => self.filter.log(level, metadata.target(), &message),
        }
    }

    fn enabled(&self, metadata: &tracing::Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        metadata.is_span() || self.filter.is_enabled(Self::convert_level(metadata.level()))
    }
}

/// Collects the message and renders other fields as `key=value`
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn finish(self) -> String {
        let mut out = self.message.unwrap_or_default();
        for field in self.fields {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&field);
        }
        out
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }
}

/// Picks the component name out of a span's attributes
#[derive(Default)]
struct ComponentVisitor {
    name: Option<String>,
}

impl Visit for ComponentVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == COMPONENT_FIELD {
            self.name = Some(format!("{value:?}"));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == COMPONENT_FIELD {
            self.name = Some(value.to_string());
        }
    }
}
