use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use thiserror::Error;

/// Error returned when parsing a fixed-width hex identifier fails.
///
/// The wire format mandates exact-width, lowercase hex fields, so parsing
/// is stricter than a plain radix conversion.
#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseIdError {
    /// The input is not exactly the required number of digits.
    #[error("identifier must be exactly {0} hex digits")]
    Width(usize),

    /// The input contains a character outside `[0-9a-f]`.
    #[error("identifier contains a non-lowercase-hex character")]
    Digit,
}

fn parse_lower_hex(hex: &str, width: usize) -> Result<u128, ParseIdError> {
    if hex.len() != width {
        return Err(ParseIdError::Width(width));
    }
    if !hex
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(ParseIdError::Digit);
    }
    u128::from_str_radix(hex, 16).map_err(|_| ParseIdError::Digit)
}

/// Flags propagated alongside a trace identity.
///
/// The current version of the wire format only defines a single flag, the
/// [`TraceFlags::SAMPLED`] bit. See the W3C TraceContext specification's
/// [trace-flags] section for details.
///
/// [trace-flags]: https://www.w3.org/TR/trace-context/#trace-flags
#[derive(Clone, Debug, Default, PartialEq, Eq, Copy, Hash)]
pub struct TraceFlags(u8);

impl TraceFlags {
    /// Trace flags with the `sampled` flag set to `0`.
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);

    /// Trace flags with the `sampled` flag set to `1`.
    ///
    /// Spans that are not sampled will be ignored by most tracing tools.
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    /// Construct new trace flags from a raw byte.
    pub const fn new(flags: u8) -> Self {
        TraceFlags(flags)
    }

    /// Returns `true` if the `sampled` flag is set.
    pub fn is_sampled(&self) -> bool {
        (*self & TraceFlags::SAMPLED) == TraceFlags::SAMPLED
    }

    /// Returns a copy of the current flags with the `sampled` flag updated.
    pub fn with_sampled(&self, sampled: bool) -> Self {
        if sampled {
            *self | TraceFlags::SAMPLED
        } else {
            *self & !TraceFlags::SAMPLED
        }
    }

    /// Returns the flags as a `u8`.
    pub fn to_u8(self) -> u8 {
        self.0
    }
}

impl BitAnd for TraceFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for TraceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl Not for TraceFlags {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl fmt::LowerHex for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A 16-byte value which identifies a given trace.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Invalid trace id.
    pub const INVALID: TraceId = TraceId(0);

    /// The wire encoding width in hex digits.
    pub const HEX_WIDTH: usize = 32;

    /// Create a trace id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(u128::from_be_bytes(bytes))
    }

    /// Return the representation of this trace id as a byte array.
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Parses a trace id from its 32-digit lowercase hex encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracelink::TraceId;
    ///
    /// assert!(TraceId::from_hex("58406520a006649127e371903a2de979").is_ok());
    ///
    /// // only the exact wire width is accepted
    /// assert!(TraceId::from_hex("42").is_err());
    /// assert!(TraceId::from_hex("58406520A006649127E371903A2DE979").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        parse_lower_hex(hex, Self::HEX_WIDTH).map(TraceId)
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        TraceId(value)
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:032x}", self.0))
    }
}

impl fmt::LowerHex for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// An 8-byte value which identifies a given span.
///
/// The id is valid if it contains at least one non-zero byte.
#[derive(Clone, PartialEq, Eq, Copy, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Invalid span id.
    pub const INVALID: SpanId = SpanId(0);

    /// The wire encoding width in hex digits.
    pub const HEX_WIDTH: usize = 16;

    /// Create a span id from its representation as a byte array.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(u64::from_be_bytes(bytes))
    }

    /// Return the representation of this span id as a byte array.
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Parses a span id from its 16-digit lowercase hex encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use tracelink::SpanId;
    ///
    /// assert!(SpanId::from_hex("58406520a0066491").is_ok());
    /// assert!(SpanId::from_hex("not_hex_not_hex_").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, ParseIdError> {
        parse_lower_hex(hex, Self::HEX_WIDTH).map(|id| SpanId(id as u64))
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        SpanId(value)
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("{:016x}", self.0))
    }
}

impl fmt::LowerHex for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_hex_round_trip() {
        let id = TraceId::from(0x4bf9_2f35_77b3_4da6_a3ce_929d_0e0e_4736u128);
        assert_eq!(id.to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(TraceId::from_hex(&id.to_string()), Ok(id));
    }

    #[test]
    fn span_id_hex_round_trip() {
        let id = SpanId::from(0x00f0_67aa_0ba9_02b7u64);
        assert_eq!(id.to_string(), "00f067aa0ba902b7");
        assert_eq!(SpanId::from_hex(&id.to_string()), Ok(id));
    }

    #[test]
    fn strict_widths() {
        assert_eq!(
            TraceId::from_hex("4bf92f3577b34da6"),
            Err(ParseIdError::Width(32))
        );
        assert_eq!(SpanId::from_hex(""), Err(ParseIdError::Width(16)));
        assert_eq!(
            SpanId::from_hex("00F067AA0BA902B7"),
            Err(ParseIdError::Digit)
        );
        assert_eq!(
            TraceId::from_hex("qw000000000000000000000000000000"),
            Err(ParseIdError::Digit)
        );
    }

    #[test]
    fn zero_ids_parse_but_are_invalid() {
        let trace_id = TraceId::from_hex("00000000000000000000000000000000").unwrap();
        let span_id = SpanId::from_hex("0000000000000000").unwrap();
        assert_eq!(trace_id, TraceId::INVALID);
        assert_eq!(span_id, SpanId::INVALID);
    }

    #[test]
    fn sampled_flag() {
        assert!(TraceFlags::SAMPLED.is_sampled());
        assert!(!TraceFlags::NOT_SAMPLED.is_sampled());
        assert!(TraceFlags::new(0xff).is_sampled());
        assert!(!TraceFlags::SAMPLED.with_sampled(false).is_sampled());
        assert_eq!(format!("{:02x}", TraceFlags::SAMPLED), "01");
    }
}
