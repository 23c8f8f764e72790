//! # Span model
//!
//! A span is a single timed unit of work within a trace. Spans here carry
//! exactly what the propagation layer needs to correlate work across an
//! asynchronous boundary: an identity ([`TraceContext`]), the parent linkage,
//! a kind, a name and attributes. Creating spans is the job of a [`Tracer`]
//! implementation supplied by the hosting tracing runtime; what happens to a
//! finished span is the job of its [`SpanSink`].

use crate::common::KeyValue;
use crate::context::TraceContext;
use crate::ident::SpanId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// The relationship between the span and the operation it describes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpanKind {
    /// Synchronous outbound call.
    Client,
    /// Synchronous inbound call handler.
    Server,
    /// Message sent to a broker or queue.
    Producer,
    /// Message received from a broker or queue.
    Consumer,
    /// In-process work, the default.
    Internal,
}

/// Everything recorded about a finished span.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// The span's propagatable identity.
    pub context: TraceContext,
    /// Span parent id, [`SpanId::INVALID`] for root spans.
    pub parent_span_id: SpanId,
    /// Span kind.
    pub kind: SpanKind,
    /// Span name.
    pub name: Cow<'static, str>,
    /// Span start time.
    pub start_time: SystemTime,
    /// Span end time.
    pub end_time: SystemTime,
    /// Span attributes, in recording order.
    pub attributes: Vec<KeyValue>,
}

impl SpanData {
    /// Returns the attribute value recorded for `key`, if any.
    pub fn attribute(&self, key: &str) -> Option<&crate::common::Value> {
        self.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| &kv.value)
    }
}

/// Parameters for starting a new [`Span`] through a [`Tracer`].
#[derive(Clone, Debug, Default)]
pub struct SpanBuilder {
    /// The span name.
    pub name: Cow<'static, str>,
    /// The span kind, [`SpanKind::Internal`] unless set.
    pub kind: Option<SpanKind>,
    /// The parent context, if the span continues an existing trace.
    pub parent: Option<TraceContext>,
    /// Attributes known at start time.
    pub attributes: Vec<KeyValue>,
}

impl SpanBuilder {
    /// Create a builder for a span with the given name.
    pub fn from_name(name: impl Into<Cow<'static, str>>) -> Self {
        SpanBuilder {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Assign the span kind.
    pub fn with_kind(self, kind: SpanKind) -> Self {
        SpanBuilder {
            kind: Some(kind),
            ..self
        }
    }

    /// Assign the parent context. An invalid parent is equivalent to no
    /// parent: the new span starts a fresh trace.
    pub fn with_parent(self, parent: TraceContext) -> Self {
        SpanBuilder {
            parent: Some(parent),
            ..self
        }
    }

    /// Assign attributes known at start time.
    pub fn with_attributes<I>(self, attributes: I) -> Self
    where
        I: IntoIterator<Item = KeyValue>,
    {
        SpanBuilder {
            attributes: attributes.into_iter().collect(),
            ..self
        }
    }
}

/// Receives spans once they end.
///
/// In production this seam is where a tracing runtime's processing pipeline
/// attaches; the `testing` feature's in-memory recorder implements it for
/// assertions.
pub trait SpanSink: Send + Sync + fmt::Debug {
    /// Called exactly once per span, when it ends.
    fn on_end(&self, span: SpanData);
}

/// An active span handle.
///
/// The span records into its sink when [`end`](Span::end) is called, or on
/// drop if it was never ended explicitly. Ending twice is a no-op.
#[derive(Debug)]
pub struct Span {
    context: TraceContext,
    data: Option<SpanData>,
    sink: Option<Arc<dyn SpanSink>>,
}

impl Span {
    /// Create a recording span. Used by [`Tracer`] implementations.
    pub fn new(data: SpanData, sink: Arc<dyn SpanSink>) -> Self {
        Span {
            context: data.context.clone(),
            data: Some(data),
            sink: Some(sink),
        }
    }

    /// Create a non-recording span carrying only a context.
    pub fn non_recording(context: TraceContext) -> Self {
        Span {
            context,
            data: None,
            sink: None,
        }
    }

    /// The span's propagatable identity.
    ///
    /// Remains available after the span has ended, so a finished span can
    /// still parent follow-up work.
    pub fn context(&self) -> &TraceContext {
        &self.context
    }

    /// Returns `true` if this span is recorded when it ends.
    pub fn is_recording(&self) -> bool {
        self.data.is_some()
    }

    /// Record an attribute on the span. No-op after the span has ended.
    pub fn set_attribute(&mut self, attribute: KeyValue) {
        if let Some(data) = &mut self.data {
            data.attributes.push(attribute);
        }
    }

    /// End the span, reporting it to the sink.
    pub fn end(&mut self) {
        self.end_with_timestamp(SystemTime::now());
    }

    /// End the span with an explicit end timestamp.
    pub fn end_with_timestamp(&mut self, end_time: SystemTime) {
        if let Some(mut data) = self.data.take() {
            data.end_time = end_time;
            if let Some(sink) = &self.sink {
                sink.on_end(data);
            }
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.end();
    }
}

/// The span factory capability.
///
/// Instrumentation layers create spans through this trait only; the
/// implementation belongs to the hosting tracing runtime. Implementations
/// must be shareable across producer and consumer threads.
pub trait Tracer: Send + Sync {
    /// Start a span from the given builder.
    ///
    /// A valid `parent` in the builder must become the new span's parent:
    /// the span inherits the parent's trace identity and records the
    /// parent's span id. Without a valid parent the span starts a new trace.
    fn start(&self, builder: SpanBuilder) -> Span;
}

/// A [`Tracer`] that records nothing.
///
/// Spans it creates carry the invalid context and are never reported
/// anywhere, which makes instrumented code runnable with tracing disabled.
#[derive(Clone, Debug, Default)]
pub struct NoopTracer {
    _private: (),
}

impl NoopTracer {
    /// Create a new no-op tracer.
    pub fn new() -> Self {
        NoopTracer { _private: () }
    }
}

impl Tracer for NoopTracer {
    fn start(&self, _builder: SpanBuilder) -> Span {
        Span::non_recording(TraceContext::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{TraceFlags, TraceId};
    use crate::state::TraceState;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CountingSink(Mutex<Vec<SpanData>>);

    impl SpanSink for CountingSink {
        fn on_end(&self, span: SpanData) {
            self.0.lock().unwrap().push(span);
        }
    }

    fn span_data(name: &'static str) -> SpanData {
        SpanData {
            context: TraceContext::new(
                TraceId::from(1),
                SpanId::from(2),
                TraceFlags::SAMPLED,
                false,
                TraceState::NONE,
            ),
            parent_span_id: SpanId::INVALID,
            kind: SpanKind::Internal,
            name: name.into(),
            start_time: SystemTime::now(),
            end_time: SystemTime::UNIX_EPOCH,
            attributes: Vec::new(),
        }
    }

    #[test]
    fn end_reports_once() {
        let sink = Arc::new(CountingSink::default());
        let mut span = Span::new(span_data("work"), sink.clone());

        span.set_attribute(KeyValue::new("attempt", 1i64));
        span.end();
        span.end();
        drop(span);

        let finished = sink.0.lock().unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].name, "work");
        assert_eq!(
            finished[0].attribute("attempt"),
            Some(&crate::common::Value::I64(1))
        );
    }

    #[test]
    fn drop_ends_span() {
        let sink = Arc::new(CountingSink::default());
        {
            let _span = Span::new(span_data("implicit"), sink.clone());
        }
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn attributes_frozen_after_end() {
        let sink = Arc::new(CountingSink::default());
        let mut span = Span::new(span_data("late"), sink.clone());
        span.end();
        span.set_attribute(KeyValue::new("ignored", true));

        let finished = sink.0.lock().unwrap();
        assert!(finished[0].attributes.is_empty());
    }

    #[test]
    fn noop_tracer_spans_are_invisible() {
        let tracer = NoopTracer::new();
        let span = tracer.start(SpanBuilder::from_name("nothing"));
        assert!(!span.is_recording());
        assert!(!span.context().is_valid());
    }

    #[test]
    fn context_outlives_end() {
        let sink = Arc::new(CountingSink::default());
        let mut span = Span::new(span_data("parent"), sink);
        span.end();
        assert!(span.context().is_valid());
    }
}
