//! # Carrier propagation interface
//!
//! Cross-process trace continuity relies on writing context data into the
//! messages an application exchanges and reading it back on the far side.
//! The [`Injector`] and [`Extractor`] traits are the capability a transport
//! must expose for that to happen: an ordered string key-value view over an
//! outbound or inbound message's headers.
//!
//! Carrier keys are case-sensitive. Each carrier is exclusively owned by the
//! message being sent or processed, so implementations need no internal
//! synchronization; injection and extraction are synchronous and perform no
//! I/O.
//!
//! The [`TraceContextPropagator`] reads and writes the W3C `traceparent` /
//! `tracestate` entries through these traits.

use std::collections::HashMap;

mod trace_context;

pub use trace_context::{ExtractError, TraceContextPropagator};

/// Injector provides an interface for adding entries to an outbound carrier.
pub trait Injector {
    /// Add a key and value to the carrier.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading entries of an inbound carrier.
pub trait Extractor {
    /// Get a value for a key from the carrier.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys present in the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(key).map(|v| v.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_map_carrier() {
        let mut carrier = HashMap::new();
        Injector::set(&mut carrier, "traceparent", "value".to_string());

        assert_eq!(Extractor::get(&carrier, "traceparent"), Some("value"));
        // carrier keys are case-sensitive
        assert_eq!(Extractor::get(&carrier, "TRACEPARENT"), None);
    }

    #[test]
    fn hash_map_keys() {
        let mut carrier = HashMap::new();
        Injector::set(&mut carrier, "one", "1".to_string());
        Injector::set(&mut carrier, "two", "2".to_string());

        let keys = Extractor::keys(&carrier);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"one"));
        assert!(keys.contains(&"two"));
    }
}
