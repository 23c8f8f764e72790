use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned by [`TraceState`] operations.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum TraceStateError {
    /// The key does not satisfy the [W3C key grammar].
    ///
    /// [W3C key grammar]: https://www.w3.org/TR/trace-context/#key
    #[error("{0:?} is not a valid tracestate key")]
    Key(String),

    /// The value does not satisfy the [W3C value grammar].
    ///
    /// [W3C value grammar]: https://www.w3.org/TR/trace-context/#value
    #[error("{0:?} is not a valid tracestate value")]
    Value(String),

    /// A list member is missing its `=` separator.
    #[error("{0:?} is not a valid tracestate list member")]
    Entry(String),
}

/// Vendor-specific trace configuration, carried as an ordered list of
/// key-value pairs so multiple tracing systems can participate in the same
/// trace.
///
/// Values are treated as opaque. See the [W3C specification] for details on
/// this field.
///
/// [W3C specification]: https://www.w3.org/TR/trace-context/#tracestate-header
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TraceState(Option<Vec<(String, String)>>);

impl TraceState {
    /// The empty `TraceState`, as a constant.
    pub const NONE: TraceState = TraceState(None);

    fn valid_key(key: &str) -> bool {
        if key.is_empty() || key.len() > 256 {
            return false;
        }

        let simple = |b: u8| {
            b.is_ascii_lowercase()
                || b.is_ascii_digit()
                || b == b'_'
                || b == b'-'
                || b == b'*'
                || b == b'/'
        };
        match key.as_bytes().iter().position(|&b| b == b'@') {
            // tenant@system keys: tenant up to 241 chars, system up to 14
            Some(at) => {
                let (tenant, system) = (&key.as_bytes()[..at], &key.as_bytes()[at + 1..]);
                !tenant.is_empty()
                    && tenant.len() <= 241
                    && !system.is_empty()
                    && system.len() <= 14
                    && tenant.iter().all(|&b| simple(b))
                    && system.iter().all(|&b| simple(b))
                    && (tenant[0].is_ascii_lowercase() || tenant[0].is_ascii_digit())
                    && (system[0].is_ascii_lowercase() || system[0].is_ascii_digit())
            }
            None => {
                key.bytes().all(simple)
                    && (key.as_bytes()[0].is_ascii_lowercase() || key.as_bytes()[0].is_ascii_digit())
            }
        }
    }

    fn valid_value(value: &str) -> bool {
        value.len() <= 256
            && value
                .bytes()
                .all(|b| (0x20..=0x7e).contains(&b) && b != b',' && b != b'=')
    }

    /// Creates a new `TraceState` from the given ordered key-value collection.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracelink::TraceState;
    ///
    /// let kvs = vec![("foo", "bar"), ("apple", "banana")];
    /// let trace_state = TraceState::from_key_value(kvs).unwrap();
    ///
    /// assert_eq!(trace_state.header(), "foo=bar,apple=banana");
    /// ```
    pub fn from_key_value<T, K, V>(entries: T) -> Result<Self, TraceStateError>
    where
        T: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: ToString,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| {
                let (key, value) = (key.to_string(), value.to_string());
                if !TraceState::valid_key(&key) {
                    return Err(TraceStateError::Key(key));
                }
                if !TraceState::valid_value(&value) {
                    return Err(TraceStateError::Value(value));
                }
                Ok((key, value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            Ok(TraceState(None))
        } else {
            Ok(TraceState(Some(entries)))
        }
    }

    /// Returns `true` if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Retrieves the value for a given key, if it exists.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.as_ref().and_then(|kvs| {
            kvs.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        })
    }

    /// Returns a new `TraceState` with the given entry prepended.
    ///
    /// If the key already exists its old entry is removed, per the
    /// [mutation rules]. The original state is left untouched.
    ///
    /// [mutation rules]: https://www.w3.org/TR/trace-context/#mutating-the-tracestate-field
    pub fn insert<K, V>(&self, key: K, value: V) -> Result<TraceState, TraceStateError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (key, value) = (key.into(), value.into());
        if !TraceState::valid_key(&key) {
            return Err(TraceStateError::Key(key));
        }
        if !TraceState::valid_value(&value) {
            return Err(TraceStateError::Value(value));
        }

        let mut entries = self.0.clone().unwrap_or_default();
        entries.retain(|(k, _)| *k != key);
        entries.insert(0, (key, value));
        Ok(TraceState(Some(entries)))
    }

    /// Serializes the entries as a `tracestate` header value, each key and
    /// value joined by `=` and entries separated by `,`.
    pub fn header(&self) -> String {
        self.0
            .as_ref()
            .map(|kvs| {
                kvs.iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default()
    }
}

impl FromStr for TraceState {
    type Err = TraceStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();
        for member in s.split_terminator(',') {
            let member = member.trim();
            match member.split_once('=') {
                Some((key, value)) => entries.push((key, value)),
                None => return Err(TraceStateError::Entry(member.to_string())),
            }
        }
        TraceState::from_key_value(entries)
    }
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}
