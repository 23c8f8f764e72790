//! Producer/consumer span correlation.

use crate::attributes::{
    MESSAGING_CLIENT_ID, MESSAGING_CONSUMER_GROUP, MESSAGING_DESTINATION_NAME,
    MESSAGING_DESTINATION_PARTITION_ID, MESSAGING_HEADER_PREFIX, MESSAGING_MESSAGE_BODY_SIZE,
    MESSAGING_MESSAGE_OFFSET, MESSAGING_OPERATION, MESSAGING_SYSTEM,
};
use crate::config::{MessagingTelemetryBuilder, SpanNamer};
use crate::getter::MessageAttributesGetter;
use std::fmt;
use std::sync::Arc;
use tracelink::propagation::{Extractor, Injector, TraceContextPropagator};
use tracelink::{KeyValue, Span, SpanBuilder, SpanKind, TraceContext, Tracer};

/// The instrumented messaging operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessagingOperation {
    /// A message is handed to the broker.
    Publish,
    /// A message arrives from the broker.
    Receive,
    /// A received message is being handled.
    Process,
}

impl MessagingOperation {
    /// The operation name as recorded in `messaging.operation`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagingOperation::Publish => "publish",
            MessagingOperation::Receive => "receive",
            MessagingOperation::Process => "process",
        }
    }
}

impl fmt::Display for MessagingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrumentation entry points for a message-based transport.
///
/// One instance covers both directions of a transport: [`start_publish`]
/// wraps handing a message to the broker, [`start_process`] wraps handling
/// a received one. The instance decides uniformly, per its configuration,
/// whether reception emits its own span (see
/// [`MessagingTelemetryBuilder::with_receive_spans`]).
///
/// Context travels through the message's own headers, so correlation works
/// across any number of hops: a publish performed while a processing span
/// is in flight parents on that span, and the next hop's carrier encodes
/// the processing span's id.
///
/// [`start_publish`]: MessagingTelemetry::start_publish
/// [`start_process`]: MessagingTelemetry::start_process
pub struct MessagingTelemetry {
    tracer: Arc<dyn Tracer>,
    propagator: TraceContextPropagator,
    emit_receive_spans: bool,
    captured_headers: Vec<String>,
    span_namer: SpanNamer,
}

impl fmt::Debug for MessagingTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingTelemetry")
            .field("emit_receive_spans", &self.emit_receive_spans)
            .field("captured_headers", &self.captured_headers)
            .finish()
    }
}

impl MessagingTelemetry {
    pub(crate) fn new(
        tracer: Arc<dyn Tracer>,
        propagator: TraceContextPropagator,
        emit_receive_spans: bool,
        captured_headers: Vec<String>,
        span_namer: SpanNamer,
    ) -> Self {
        MessagingTelemetry {
            tracer,
            propagator,
            emit_receive_spans,
            captured_headers,
            span_namer,
        }
    }

    /// Returns a new builder using the given span factory.
    pub fn builder(tracer: impl Tracer + 'static) -> MessagingTelemetryBuilder {
        MessagingTelemetryBuilder::new(Arc::new(tracer))
    }

    /// Starts the producer span for `message` and injects its context into
    /// the message's headers.
    ///
    /// The outbound message is its own carrier: its [`Injector`] impl
    /// decides where the `traceparent` entry lands. The span is parented on
    /// `parent` when one is supplied, so a message produced while
    /// processing another continues the same trace. The caller sends the
    /// message and ends the returned span once the send is acknowledged;
    /// the injection itself performs no I/O.
    pub fn start_publish<M, G>(
        &self,
        getter: &G,
        message: &mut M,
        parent: Option<&TraceContext>,
    ) -> Span
    where
        M: Injector,
        G: MessageAttributesGetter<M>,
    {
        let operation = MessagingOperation::Publish;
        let name = (self.span_namer)(getter.destination(message), operation);
        let mut builder = SpanBuilder::from_name(name)
            .with_kind(SpanKind::Producer)
            .with_attributes(self.message_attributes(getter, message, operation));
        if let Some(parent) = parent {
            builder = builder.with_parent(parent.clone());
        }

        let span = self.tracer.start(builder);
        self.propagator.inject(span.context(), message);
        span
    }

    /// Starts the consumer span for a received `message`.
    ///
    /// The remote context is extracted from the message's own headers via
    /// its [`Extractor`] impl; extraction never fails, a message without a
    /// usable `traceparent` simply starts a new trace. With receive spans
    /// enabled, an already-ended `receive` span is recorded and the
    /// processing span parents on it; otherwise the processing span parents
    /// directly on the extracted context. The caller ends the returned span
    /// when handling completes.
    pub fn start_process<M, G>(&self, getter: &G, message: &M) -> Span
    where
        M: Extractor,
        G: MessageAttributesGetter<M>,
    {
        let remote = self.propagator.extract(message);

        let parent = if self.emit_receive_spans {
            let operation = MessagingOperation::Receive;
            let mut receive = self.tracer.start(
                SpanBuilder::from_name((self.span_namer)(getter.destination(message), operation))
                    .with_kind(SpanKind::Consumer)
                    .with_parent(remote)
                    .with_attributes(self.message_attributes(getter, message, operation)),
            );
            receive.end();
            receive.context().clone()
        } else {
            remote
        };

        let operation = MessagingOperation::Process;
        self.tracer.start(
            SpanBuilder::from_name((self.span_namer)(getter.destination(message), operation))
                .with_kind(SpanKind::Consumer)
                .with_parent(parent)
                .with_attributes(self.message_attributes(getter, message, operation)),
        )
    }

    fn message_attributes<M, G>(
        &self,
        getter: &G,
        message: &M,
        operation: MessagingOperation,
    ) -> Vec<KeyValue>
    where
        G: MessageAttributesGetter<M>,
    {
        let mut attributes = vec![
            KeyValue::new(MESSAGING_SYSTEM, getter.system()),
            KeyValue::new(
                MESSAGING_DESTINATION_NAME,
                getter.destination(message).to_string(),
            ),
            KeyValue::new(MESSAGING_OPERATION, operation.as_str()),
        ];
        if let Some(size) = getter.body_size(message) {
            attributes.push(KeyValue::new(MESSAGING_MESSAGE_BODY_SIZE, size));
        }
        if let Some(partition) = getter.partition_id(message) {
            attributes.push(KeyValue::new(MESSAGING_DESTINATION_PARTITION_ID, partition));
        }
        if let Some(offset) = getter.offset(message) {
            attributes.push(KeyValue::new(MESSAGING_MESSAGE_OFFSET, offset));
        }
        if let Some(client_id) = getter.client_id() {
            attributes.push(KeyValue::new(MESSAGING_CLIENT_ID, client_id));
        }
        if operation != MessagingOperation::Publish {
            if let Some(group) = getter.consumer_group() {
                attributes.push(KeyValue::new(MESSAGING_CONSUMER_GROUP, group));
            }
        }
        for header in &self.captured_headers {
            let values = getter.header_values(message, header);
            if !values.is_empty() {
                attributes.push(KeyValue::new(
                    format!("{MESSAGING_HEADER_PREFIX}{header}"),
                    values,
                ));
            }
        }
        attributes
    }
}
