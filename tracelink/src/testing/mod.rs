//! In-memory test instrumentation.
//!
//! This module is for testing and debugging: a [`RecordingTracer`] creates
//! real, correctly parented spans without any backing runtime, and an
//! [`InMemorySpanRecorder`] collects them for assertions. Only available
//! with the `testing` feature.

use crate::context::TraceContext;
use crate::id_generator::{IdGenerator, RandomIdGenerator};
use crate::ident::{SpanId, TraceFlags};
use crate::span::{Span, SpanBuilder, SpanData, SpanKind, SpanSink, Tracer};
use crate::state::TraceState;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// A span sink that stores finished spans in memory.
///
/// Clones share storage, so a test can keep one handle while handing
/// another to a [`RecordingTracer`].
///
/// # Example
/// ```
/// use tracelink::testing::{InMemorySpanRecorder, RecordingTracer};
/// use tracelink::{SpanBuilder, Tracer};
///
/// let recorder = InMemorySpanRecorder::new();
/// let tracer = RecordingTracer::new(recorder.clone());
///
/// tracer.start(SpanBuilder::from_name("say hello")).end();
///
/// let spans = recorder.finished_spans();
/// assert_eq!(spans.len(), 1);
/// assert_eq!(spans[0].name, "say hello");
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemorySpanRecorder {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemorySpanRecorder {
    /// Create a new, empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the finished spans, in end order.
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .unwrap_or_default()
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        let _ = self.spans.lock().map(|mut spans| spans.clear());
    }
}

impl SpanSink for InMemorySpanRecorder {
    fn on_end(&self, span: SpanData) {
        let _ = self.spans.lock().map(|mut spans| spans.push(span));
    }
}

/// A [`Tracer`] that records every span into an [`InMemorySpanRecorder`].
///
/// Root spans are started sampled, children inherit their parent's flags
/// and vendor state, mirroring how a production tracer derives contexts.
#[derive(Clone, Debug)]
pub struct RecordingTracer {
    sink: Arc<InMemorySpanRecorder>,
    ids: Arc<dyn IdGenerator>,
}

impl RecordingTracer {
    /// Create a tracer recording into `recorder`, with random ids.
    pub fn new(recorder: InMemorySpanRecorder) -> Self {
        Self::with_id_generator(recorder, RandomIdGenerator::default())
    }

    /// Create a tracer with a custom id generator, e.g.
    /// [`SequentialIdGenerator`](crate::SequentialIdGenerator) for
    /// predictable ids.
    pub fn with_id_generator(
        recorder: InMemorySpanRecorder,
        id_generator: impl IdGenerator + 'static,
    ) -> Self {
        RecordingTracer {
            sink: Arc::new(recorder),
            ids: Arc::new(id_generator),
        }
    }
}

impl Tracer for RecordingTracer {
    fn start(&self, builder: SpanBuilder) -> Span {
        let parent = builder.parent.as_ref().filter(|p| p.is_valid());
        let (context, parent_span_id) = match parent {
            Some(parent) => (parent.child(self.ids.new_span_id()), parent.span_id()),
            None => (
                TraceContext::new(
                    self.ids.new_trace_id(),
                    self.ids.new_span_id(),
                    TraceFlags::SAMPLED,
                    false,
                    TraceState::NONE,
                ),
                SpanId::INVALID,
            ),
        };

        let start_time = SystemTime::now();
        let data = SpanData {
            context,
            parent_span_id,
            kind: builder.kind.unwrap_or(SpanKind::Internal),
            name: builder.name,
            start_time,
            end_time: start_time,
            attributes: builder.attributes,
        };
        Span::new(data, self.sink.clone())
    }
}
