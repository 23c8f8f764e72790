//! Telemetry configuration.

use crate::telemetry::{MessagingOperation, MessagingTelemetry};
use std::fmt;
use std::sync::Arc;
use tracelink::propagation::TraceContextPropagator;
use tracelink::Tracer;

/// Produces span names from a destination and the instrumented operation.
pub type SpanNamer = Box<dyn Fn(&str, MessagingOperation) -> String + Send + Sync>;

pub(crate) fn default_span_name(destination: &str, operation: MessagingOperation) -> String {
    format!("{destination} {operation}")
}

/// A builder of [`MessagingTelemetry`].
///
/// All configuration is captured at [`build`](Self::build) time; the
/// resulting telemetry is immutable and shareable across producer and
/// consumer threads.
pub struct MessagingTelemetryBuilder {
    tracer: Arc<dyn Tracer>,
    emit_receive_spans: bool,
    captured_headers: Vec<String>,
    span_namer: SpanNamer,
}

impl fmt::Debug for MessagingTelemetryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingTelemetryBuilder")
            .field("emit_receive_spans", &self.emit_receive_spans)
            .field("captured_headers", &self.captured_headers)
            .finish()
    }
}

impl MessagingTelemetryBuilder {
    pub(crate) fn new(tracer: Arc<dyn Tracer>) -> Self {
        MessagingTelemetryBuilder {
            tracer,
            emit_receive_spans: false,
            captured_headers: Vec::new(),
            span_namer: Box::new(default_span_name),
        }
    }

    /// Configures whether message reception is recorded as its own span.
    ///
    /// Disabled by default: processing spans are parented directly on the
    /// context extracted from the carrier, so the trace reads
    /// `publish -> process`. When enabled, a dedicated `receive` span is
    /// inserted between the two and the processing span parents on it
    /// instead.
    pub fn with_receive_spans(mut self, enabled: bool) -> Self {
        self.emit_receive_spans = enabled;
        self
    }

    /// Configures the message headers that will be captured as span
    /// attributes, under `messaging.header.<name>`.
    pub fn with_captured_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.captured_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Overrides how spans are named. The default is
    /// `"{destination} {operation}"`.
    pub fn with_span_namer<F>(mut self, namer: F) -> Self
    where
        F: Fn(&str, MessagingOperation) -> String + Send + Sync + 'static,
    {
        self.span_namer = Box::new(namer);
        self
    }

    /// Returns a new [`MessagingTelemetry`] with the settings of this
    /// builder.
    pub fn build(self) -> MessagingTelemetry {
        MessagingTelemetry::new(
            self.tracer,
            TraceContextPropagator::new(),
            self.emit_receive_spans,
            self.captured_headers,
            self.span_namer,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_is_destination_and_operation() {
        assert_eq!(
            default_span_name("orders", MessagingOperation::Publish),
            "orders publish"
        );
        assert_eq!(
            default_span_name("orders", MessagingOperation::Process),
            "orders process"
        );
    }
}
