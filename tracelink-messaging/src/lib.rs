//! Producer/consumer span correlation for message-based transports.
//!
//! This crate turns the `tracelink` propagation core into ready-to-wire
//! instrumentation for a messaging library: a [`MessagingTelemetry`] built
//! once per transport wraps every publish and every message handling in
//! spans, carries the trace identity through the message's own headers, and
//! keeps the resulting trace connected across any number of
//! producer/consumer hops.
//!
//! The transport adapter supplies two things:
//!
//! * a [`MessageAttributesGetter`] implementation over its message type, so
//!   spans carry the messaging attributes the transport can provide, and
//! * carrier access, by implementing the `tracelink` injector/extractor
//!   traits over its header map (the `HashMap<String, String>` impls cover
//!   the common case).
//!
//! ## Getting Started
//!
//! ```
//! use std::collections::HashMap;
//! use tracelink::propagation::{Extractor, Injector};
//! use tracelink::testing::{InMemorySpanRecorder, RecordingTracer};
//! use tracelink_messaging::{MessageAttributesGetter, MessagingTelemetry};
//!
//! struct Letter {
//!     queue: String,
//!     headers: HashMap<String, String>,
//! }
//!
//! // the message is its own carrier
//! impl Injector for Letter {
//!     fn set(&mut self, key: &str, value: String) {
//!         self.headers.insert(key.to_string(), value);
//!     }
//! }
//!
//! impl Extractor for Letter {
//!     fn get(&self, key: &str) -> Option<&str> {
//!         self.headers.get(key).map(|v| v.as_str())
//!     }
//!
//!     fn keys(&self) -> Vec<&str> {
//!         self.headers.keys().map(|k| k.as_str()).collect()
//!     }
//! }
//!
//! struct LetterGetter;
//!
//! impl MessageAttributesGetter<Letter> for LetterGetter {
//!     fn system(&self) -> &'static str {
//!         "postbox"
//!     }
//!
//!     fn destination<'a>(&self, message: &'a Letter) -> &'a str {
//!         &message.queue
//!     }
//! }
//!
//! let recorder = InMemorySpanRecorder::new();
//! let telemetry = MessagingTelemetry::builder(RecordingTracer::new(recorder.clone())).build();
//!
//! let mut letter = Letter {
//!     queue: "greetings".to_string(),
//!     headers: HashMap::new(),
//! };
//!
//! // producer side
//! let mut publish = telemetry.start_publish(&LetterGetter, &mut letter, None);
//! publish.end();
//!
//! // consumer side, possibly another process entirely
//! let mut process = telemetry.start_process(&LetterGetter, &letter);
//! process.end();
//!
//! let spans = recorder.finished_spans();
//! assert_eq!(spans[1].name, "greetings process");
//! assert_eq!(spans[1].parent_span_id, spans[0].context.span_id());
//! ```
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

pub mod attributes;
mod config;
mod getter;
mod telemetry;

pub use config::{MessagingTelemetryBuilder, SpanNamer};
pub use getter::MessageAttributesGetter;
pub use telemetry::{MessagingOperation, MessagingTelemetry};
