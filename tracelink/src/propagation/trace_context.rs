//! # W3C Trace Context codec
//!
//! Serializes a [`TraceContext`] into a carrier before a message is sent and
//! reconstructs it from the carrier on the receiving side.

use crate::context::TraceContext;
use crate::ident::{SpanId, TraceFlags, TraceId};
use crate::propagation::{Extractor, Injector};
use crate::state::TraceState;
use crate::{tracelink_debug, tracelink_warn};
use std::str::FromStr;
use thiserror::Error;

const SUPPORTED_VERSION: u8 = 0;
const MAX_VERSION: u8 = 254;
const TRACEPARENT_HEADER: &str = "traceparent";
const TRACESTATE_HEADER: &str = "tracestate";

const TRACE_CONTEXT_HEADER_FIELDS: [&str; 2] = [TRACEPARENT_HEADER, TRACESTATE_HEADER];

/// Reasons a carrier can fail to yield a usable trace context.
///
/// None of these surface as failures to the message-processing application:
/// [`TraceContextPropagator::extract`] degrades every one of them to the
/// root context, because observability must never break the primary data
/// path. The taxonomy exists for [`try_extract`] callers and for the
/// internal log events emitted when a carrier is malformed.
///
/// [`try_extract`]: TraceContextPropagator::try_extract
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    /// The carrier holds no `traceparent` entry at all.
    #[error("carrier has no traceparent entry")]
    MissingTraceparent,

    /// The `traceparent` value does not match the fixed-width field format,
    /// or encodes an all-zero trace or span id.
    #[error("malformed traceparent: {0}")]
    MalformedTraceparent(&'static str),

    /// The version byte is outside the range this decoder understands.
    #[error("unsupported traceparent version {0:#04x}")]
    UnsupportedVersion(u8),

    /// The `tracestate` value contains a malformed list member. Never fails
    /// an extraction on its own; the field is discarded instead.
    #[error("malformed tracestate: {0}")]
    MalformedTracestate(String),
}

/// Propagates [`TraceContext`]s in [W3C TraceContext] format under the
/// `traceparent` and `tracestate` carrier entries.
///
/// The `traceparent` entry identifies the sending span in a common format,
/// understood by all vendors:
///
/// `traceparent: 00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01`
///
/// It has four fixed-width, lowercase hex fields:
///
///    - version
///    - trace-id
///    - parent-id
///    - trace-flags
///
/// The `tracestate` entry carries additional vendor-specific trace
/// identification information across different distributed tracing systems:
///
/// `tracestate: vendorname1=opaqueValue1,vendorname2=opaqueValue2`
///
/// See the [w3c trace-context docs] for more details.
///
/// [w3c trace-context docs]: https://w3c.github.io/trace-context/
/// [W3C TraceContext]: https://www.w3.org/TR/trace-context/
#[derive(Clone, Debug, Default)]
pub struct TraceContextPropagator {
    _private: (),
}

fn hex_byte(value: &str) -> Option<u8> {
    if value.len() != 2 || value.bytes().any(|b| b.is_ascii_uppercase()) {
        return None;
    }
    u8::from_str_radix(value, 16).ok()
}

impl TraceContextPropagator {
    /// Create a new `TraceContextPropagator`.
    pub fn new() -> Self {
        TraceContextPropagator { _private: () }
    }

    /// The carrier keys this propagator reads and writes.
    pub fn fields(&self) -> impl Iterator<Item = &'static str> {
        TRACE_CONTEXT_HEADER_FIELDS.into_iter()
    }

    /// Encodes the given context into the carrier.
    ///
    /// Writes `traceparent`, plus `tracestate` when the context carries a
    /// non-empty vendor state. Unrelated carrier entries are never touched,
    /// and an invalid context writes nothing at all, so injection with no
    /// active span is a no-op.
    pub fn inject(&self, cx: &TraceContext, injector: &mut dyn Injector) {
        if !cx.is_valid() {
            return;
        }
        let header_value = format!(
            "{:02x}-{}-{}-{:02x}",
            SUPPORTED_VERSION,
            cx.trace_id(),
            cx.span_id(),
            cx.trace_flags() & TraceFlags::SAMPLED
        );
        injector.set(TRACEPARENT_HEADER, header_value);
        if !cx.trace_state().is_empty() {
            injector.set(TRACESTATE_HEADER, cx.trace_state().header());
        }
    }

    /// Reconstructs a context from the carrier, degrading softly.
    ///
    /// Returns [`TraceContext::NONE`] when the carrier holds no
    /// `traceparent`, the value is malformed, the version is unsupported, or
    /// the encoded ids are all-zero. Extraction is a pure read: calling it
    /// twice on the same carrier yields equal contexts and creates no span.
    /// Malformed carriers are reported through the internal logs once per
    /// extraction.
    pub fn extract(&self, extractor: &dyn Extractor) -> TraceContext {
        match self.try_extract(extractor) {
            Ok(cx) => cx,
            Err(ExtractError::MissingTraceparent) => TraceContext::NONE,
            Err(err) => {
                tracelink_warn!(
                    name: "TraceContextPropagator.Extract.Invalid",
                    reason = format!("{err}").as_str(),
                );
                TraceContext::NONE
            }
        }
    }

    /// Reconstructs a context from the carrier, reporting why it failed.
    ///
    /// Most callers want [`extract`]; this variant exists for integrations
    /// that track how often carriers arrive unusable.
    ///
    /// [`extract`]: TraceContextPropagator::extract
    pub fn try_extract(&self, extractor: &dyn Extractor) -> Result<TraceContext, ExtractError> {
        let header_value = extractor
            .get(TRACEPARENT_HEADER)
            .ok_or(ExtractError::MissingTraceparent)?
            .trim();

        let parts = header_value.split('-').collect::<Vec<&str>>();
        if parts.len() < 4 {
            return Err(ExtractError::MalformedTraceparent("too few fields"));
        }

        let version =
            hex_byte(parts[0]).ok_or(ExtractError::MalformedTraceparent("version field"))?;
        if version > MAX_VERSION {
            return Err(ExtractError::UnsupportedVersion(version));
        }
        // version 0 defines exactly four fields; later versions may append more
        if version == SUPPORTED_VERSION && parts.len() != 4 {
            return Err(ExtractError::MalformedTraceparent("trailing fields"));
        }

        let trace_id = TraceId::from_hex(parts[1])
            .map_err(|_| ExtractError::MalformedTraceparent("trace-id field"))?;
        let span_id = SpanId::from_hex(parts[2])
            .map_err(|_| ExtractError::MalformedTraceparent("parent-id field"))?;

        let flags =
            hex_byte(parts[3]).ok_or(ExtractError::MalformedTraceparent("trace-flags field"))?;
        if version == SUPPORTED_VERSION && flags > 2 {
            return Err(ExtractError::MalformedTraceparent("trace-flags field"));
        }

        // clear all flags other than the supported sampling bit
        let trace_flags = TraceFlags::new(flags) & TraceFlags::SAMPLED;

        let trace_state = self.extract_trace_state(extractor);

        let cx = TraceContext::new(trace_id, span_id, trace_flags, true, trace_state);
        if !cx.is_valid() {
            return Err(ExtractError::MalformedTraceparent("all-zero ids"));
        }

        Ok(cx)
    }

    /// Best-effort `tracestate` parse. A header containing any malformed
    /// list member is discarded as a whole; the loss never invalidates an
    /// otherwise usable `traceparent`.
    fn extract_trace_state(&self, extractor: &dyn Extractor) -> TraceState {
        let Some(value) = extractor.get(TRACESTATE_HEADER) else {
            return TraceState::NONE;
        };
        match TraceState::from_str(value) {
            Ok(state) => state,
            Err(err) => {
                let err = ExtractError::MalformedTracestate(err.to_string());
                tracelink_debug!(
                    name: "TraceContextPropagator.Extract.TraceStateDropped",
                    reason = format!("{err}").as_str(),
                );
                TraceState::NONE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn carrier(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rustfmt::skip]
    fn extract_data() -> Vec<(&'static str, &'static str, TraceContext)> {
        vec![
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::default(), true, TraceState::from_str("foo=bar").unwrap())),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap())),
            ("02-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap())),
            ("02-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-09", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap())),
            ("02-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-08", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::default(), true, TraceState::from_str("foo=bar").unwrap())),
            ("02-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-09-XYZxsf09", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap())),
        ]
    }

    #[rustfmt::skip]
    fn extract_data_invalid() -> Vec<(&'static str, &'static str)> {
        vec![
            ("0000-00000000000000000000000000000000-0000000000000000-01", "wrong version length"),
            ("00-ab00000000000000000000000000000000-cd00000000000000-01", "wrong trace ID length"),
            ("00-ab000000000000000000000000000000-cd0000000000000000-01", "wrong span ID length"),
            ("00-ab000000000000000000000000000000-cd00000000000000-0100", "wrong trace flag length"),
            ("qw-00000000000000000000000000000000-0000000000000000-01",   "bogus version"),
            ("00-qw000000000000000000000000000000-cd00000000000000-01",   "bogus trace ID"),
            ("00-ab000000000000000000000000000000-qw00000000000000-01",   "bogus span ID"),
            ("00-ab000000000000000000000000000000-cd00000000000000-qw",   "bogus trace flag"),
            ("A0-00000000000000000000000000000000-0000000000000000-01",   "upper case version"),
            ("00-AB000000000000000000000000000000-cd00000000000000-01",   "upper case trace ID"),
            ("00-ab000000000000000000000000000000-CD00000000000000-01",   "upper case span ID"),
            ("00-ab000000000000000000000000000000-cd00000000000000-A1",   "upper case trace flag"),
            ("00-00000000000000000000000000000000-0000000000000000-01",   "zero trace ID and span ID"),
            ("00-ab000000000000000000000000000000-cd00000000000000-09",   "trace-flag unused bits set"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",      "missing options"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-",     "empty options"),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-x", "extra field for version 0"),
            ("ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",   "forbidden version 255"),
            ("",                                                          "empty header"),
            ("00",                                                        "lone version"),
        ]
    }

    #[rustfmt::skip]
    fn inject_data() -> Vec<(&'static str, &'static str, TraceContext)> {
        vec![
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::SAMPLED, true, TraceState::from_str("foo=bar").unwrap())),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::default(), true, TraceState::from_str("foo=bar").unwrap())),
            ("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01", "foo=bar", TraceContext::new(TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128), SpanId::from(0x00f0_67aa_0ba9_02b7u64), TraceFlags::new(0xff), true, TraceState::from_str("foo=bar").unwrap())),
        ]
    }

    #[test]
    fn extract_w3c() {
        let propagator = TraceContextPropagator::new();

        for (trace_parent, trace_state, expected) in extract_data() {
            let carrier = carrier(&[
                (TRACEPARENT_HEADER, trace_parent),
                (TRACESTATE_HEADER, trace_state),
            ]);
            assert_eq!(propagator.extract(&carrier), expected, "{trace_parent}");
        }
    }

    #[test]
    fn extract_w3c_reject_invalid() {
        let propagator = TraceContextPropagator::new();

        for (invalid_header, reason) in extract_data_invalid() {
            let carrier = carrier(&[(TRACEPARENT_HEADER, invalid_header)]);
            assert_eq!(propagator.extract(&carrier), TraceContext::NONE, "{reason}");
            assert!(propagator.try_extract(&carrier).is_err(), "{reason}");
        }
    }

    #[test]
    fn extract_missing_key_is_root() {
        let propagator = TraceContextPropagator::new();
        let empty: HashMap<String, String> = HashMap::new();

        assert_eq!(propagator.extract(&empty), TraceContext::NONE);
        assert_eq!(
            propagator.try_extract(&empty),
            Err(ExtractError::MissingTraceparent)
        );
    }

    #[test]
    fn extract_error_taxonomy() {
        let propagator = TraceContextPropagator::new();

        let malformed = carrier(&[(TRACEPARENT_HEADER, "not-a-traceparent")]);
        assert!(matches!(
            propagator.try_extract(&malformed),
            Err(ExtractError::MalformedTraceparent(_))
        ));

        let future = carrier(&[(
            TRACEPARENT_HEADER,
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )]);
        assert_eq!(
            propagator.try_extract(&future),
            Err(ExtractError::UnsupportedVersion(0xff))
        );
    }

    #[test]
    fn malformed_tracestate_does_not_invalidate_traceparent() {
        let propagator = TraceContextPropagator::new();
        let carrier = carrier(&[
            (
                TRACEPARENT_HEADER,
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            ),
            (TRACESTATE_HEADER, "ok=fine,broken"),
        ]);

        let cx = propagator.extract(&carrier);
        assert!(cx.is_valid());
        assert!(cx.is_sampled());
        // the whole field is dropped once any member is malformed
        assert!(cx.trace_state().is_empty());
    }

    #[test]
    fn valid_tracestate_ignored_when_traceparent_invalid() {
        let propagator = TraceContextPropagator::new();
        let carrier = carrier(&[
            (TRACEPARENT_HEADER, "00-bad-bad-01"),
            (TRACESTATE_HEADER, "foo=bar"),
        ]);

        let cx = propagator.extract(&carrier);
        assert_eq!(cx, TraceContext::NONE);
        assert!(cx.trace_state().is_empty());
    }

    #[test]
    fn extract_is_idempotent() {
        let propagator = TraceContextPropagator::new();
        let carrier = carrier(&[
            (
                TRACEPARENT_HEADER,
                "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            ),
            (TRACESTATE_HEADER, "foo=bar"),
        ]);

        let first = propagator.extract(&carrier);
        let second = propagator.extract(&carrier);
        assert_eq!(first, second);
    }

    #[test]
    fn inject_w3c() {
        let propagator = TraceContextPropagator::new();

        for (expected_parent, expected_state, cx) in inject_data() {
            let mut injector: HashMap<String, String> = HashMap::new();
            propagator.inject(&cx, &mut injector);

            assert_eq!(
                Extractor::get(&injector, TRACEPARENT_HEADER),
                Some(expected_parent)
            );
            assert_eq!(
                Extractor::get(&injector, TRACESTATE_HEADER),
                Some(expected_state)
            );
        }
    }

    #[test]
    fn inject_invalid_context_writes_nothing() {
        let propagator = TraceContextPropagator::new();
        let mut injector: HashMap<String, String> = HashMap::new();

        propagator.inject(&TraceContext::NONE, &mut injector);
        assert!(injector.is_empty());
    }

    #[test]
    fn inject_skips_empty_tracestate() {
        let propagator = TraceContextPropagator::new();
        let cx = TraceContext::new(
            TraceId::from(0xau128),
            SpanId::from(0xbu64),
            TraceFlags::SAMPLED,
            false,
            TraceState::NONE,
        );

        let mut injector: HashMap<String, String> = HashMap::new();
        propagator.inject(&cx, &mut injector);

        assert!(Extractor::get(&injector, TRACEPARENT_HEADER).is_some());
        assert_eq!(Extractor::get(&injector, TRACESTATE_HEADER), None);
    }

    #[test]
    fn inject_preserves_unrelated_keys() {
        let propagator = TraceContextPropagator::new();
        let mut injector: HashMap<String, String> = HashMap::new();
        Injector::set(&mut injector, "content-type", "text/plain".to_string());

        let cx = TraceContext::new(
            TraceId::from(0xau128),
            SpanId::from(0xbu64),
            TraceFlags::SAMPLED,
            false,
            TraceState::NONE,
        );
        propagator.inject(&cx, &mut injector);

        assert_eq!(
            Extractor::get(&injector, "content-type"),
            Some("text/plain")
        );
    }

    #[test]
    fn round_trip_law() {
        let propagator = TraceContextPropagator::new();
        let original = TraceContext::new(
            TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128),
            SpanId::from(0x00f0_67aa_0ba9_02b7u64),
            TraceFlags::SAMPLED,
            true,
            TraceState::from_str("congo=t61rcWkgMzE,rojo=00f067aa0ba902b7").unwrap(),
        );

        let mut wire: HashMap<String, String> = HashMap::new();
        propagator.inject(&original, &mut wire);
        let extracted = propagator.extract(&wire);

        assert_eq!(extracted, original);
    }

    #[test]
    fn fields_lists_both_headers() {
        let propagator = TraceContextPropagator::new();
        let fields: Vec<_> = propagator.fields().collect();
        assert_eq!(fields, vec![TRACEPARENT_HEADER, TRACESTATE_HEADER]);
    }
}
