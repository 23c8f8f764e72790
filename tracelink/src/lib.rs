//! Trace-context propagation for asynchronous message paths.
//!
//! `tracelink` implements the small, sharp contract that keeps traces
//! connected across broker-shaped boundaries: a producer serializes the
//! active span's identity into the outbound message's headers, a consumer
//! reconstructs it and parents its processing span on it, and the resulting
//! spans form one causally linked trace even though no single process
//! observes the whole chain.
//!
//! The crate provides:
//!
//! * The trace data model: [`TraceId`], [`SpanId`], [`TraceFlags`],
//!   [`TraceState`] and the propagatable [`TraceContext`].
//! * The carrier capability ([`propagation::Injector`] /
//!   [`propagation::Extractor`]) a transport exposes over its headers, and
//!   the W3C [`propagation::TraceContextPropagator`] that reads and writes
//!   the `traceparent` / `tracestate` entries through it.
//! * The span model ([`Span`], [`SpanData`], [`SpanBuilder`], [`SpanKind`])
//!   and the [`Tracer`] seam a hosting tracing runtime implements.
//!
//! Extraction never fails the caller: a missing or malformed carrier
//! degrades to the invalid root context, because observability must never
//! break the primary data path.
//!
//! ## Getting Started
//!
//! ```
//! use std::collections::HashMap;
//! use tracelink::propagation::TraceContextPropagator;
//! use tracelink::{SpanId, TraceContext, TraceFlags, TraceId, TraceState};
//!
//! let propagator = TraceContextPropagator::new();
//!
//! // producer side: serialize the sending span's context into the headers
//! let cx = TraceContext::new(
//!     TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128),
//!     SpanId::from(0x00f0_67aa_0ba9_02b7u64),
//!     TraceFlags::SAMPLED,
//!     false,
//!     TraceState::NONE,
//! );
//! let mut headers: HashMap<String, String> = HashMap::new();
//! propagator.inject(&cx, &mut headers);
//!
//! // consumer side: reconstruct it and parent the processing span on it
//! let remote = propagator.extract(&headers);
//! assert_eq!(remote.trace_id(), cx.trace_id());
//! assert_eq!(remote.span_id(), cx.span_id());
//! assert!(remote.is_remote());
//! ```
//!
//! ## Feature Flags
//!
//! * `internal-logs`: report malformed carriers through
//!   [`tracing`](https://crates.io/crates/tracing) (enabled by default).
//! * `testing`: in-memory [`testing::RecordingTracer`] and
//!   [`testing::InMemorySpanRecorder`] for asserting on span shapes.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(
    docsrs,
    feature(doc_cfg, doc_auto_cfg),
    deny(rustdoc::broken_intra_doc_links)
)]

mod common;
mod context;
mod id_generator;
mod ident;
mod internal_logging;
pub mod propagation;
mod span;
mod state;

#[cfg(feature = "testing")]
pub mod testing;

pub use common::{Key, KeyValue, Value};
pub use context::TraceContext;
#[cfg(feature = "testing")]
pub use id_generator::SequentialIdGenerator;
pub use id_generator::{IdGenerator, RandomIdGenerator};
pub use ident::{ParseIdError, SpanId, TraceFlags, TraceId};
pub use span::{NoopTracer, Span, SpanBuilder, SpanData, SpanKind, SpanSink, Tracer};
pub use state::{TraceState, TraceStateError};

#[doc(hidden)]
#[cfg(feature = "internal-logs")]
pub mod _private {
    pub use tracing::{debug, warn};
}
