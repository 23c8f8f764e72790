use crate::ident::{SpanId, TraceFlags, TraceId};
use crate::state::TraceState;

/// The immutable, propagatable identity of a span.
///
/// A `TraceContext` is what crosses process boundaries: it is serialized
/// into a carrier on the producing side and reconstructed on the consuming
/// side, where it parents the span that represents processing the message.
/// Contexts are never mutated once created; starting a new span derives a
/// fresh context via [`TraceContext::child`].
///
/// This representation conforms to the [W3C TraceContext specification].
///
/// [W3C TraceContext specification]: https://www.w3.org/TR/trace-context
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TraceContext {
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: TraceFlags,
    is_remote: bool,
    trace_state: TraceState,
}

impl TraceContext {
    /// The invalid (root) context.
    ///
    /// This is what extraction degrades to when a carrier holds no usable
    /// `traceparent`: spans parented on it start a new trace.
    pub const NONE: TraceContext = TraceContext {
        trace_id: TraceId::INVALID,
        span_id: SpanId::INVALID,
        trace_flags: TraceFlags::NOT_SAMPLED,
        is_remote: false,
        trace_state: TraceState::NONE,
    };

    /// Construct a new `TraceContext`.
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: TraceFlags,
        is_remote: bool,
        trace_state: TraceState,
    ) -> Self {
        TraceContext {
            trace_id,
            span_id,
            trace_flags,
            is_remote,
            trace_state,
        }
    }

    /// Derive the context for a new local span within the same trace.
    ///
    /// The trace identity, flags and vendor state are inherited; only the
    /// span id changes. The derived context is local even when `self` was
    /// reconstructed from a carrier.
    pub fn child(&self, span_id: SpanId) -> Self {
        TraceContext {
            trace_id: self.trace_id,
            span_id,
            trace_flags: self.trace_flags,
            is_remote: false,
            trace_state: self.trace_state.clone(),
        }
    }

    /// The [`TraceId`] for this context.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The [`SpanId`] for this context.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// Returns details about the trace.
    ///
    /// Unlike `TraceState` values, these are present in all traces. The
    /// current version of the wire format only supports a single flag,
    /// [`TraceFlags::SAMPLED`].
    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// Returns `true` if this context has a valid (non-zero) `trace_id`
    /// and a valid (non-zero) `span_id`.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }

    /// Returns `true` if the context was reconstructed from a carrier
    /// rather than created in this process.
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    /// Returns `true` if the `sampled` trace flag is set.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }

    /// A reference to the context's [`TraceState`].
    pub fn trace_state(&self) -> &TraceState {
        &self.trace_state
    }
}
