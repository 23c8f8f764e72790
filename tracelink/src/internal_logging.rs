#![allow(unused_macros)]
//! Internal diagnostics for the propagation layer itself.
//!
//! These macros are intended to be used **internally within tracelink code**
//! or by custom carrier/tracer integrations. They are not designed for
//! general application logging. Emission goes through `tracing` when the
//! `internal-logs` feature is enabled and compiles away entirely otherwise.
//!
//! When running tests with `--nocapture`, these macros print their output to
//! stdout, which is useful for debugging test failures.

/// Macro for logging warning messages, e.g. a carrier whose `traceparent`
/// entry could not be parsed.
///
/// # Fields:
/// - `name`: The operation or action being logged.
/// - Additional optional key-value pairs can be passed as attributes.
///
/// # Example:
/// ```rust
/// use tracelink::tracelink_warn;
/// tracelink_warn!(name: "Extract.Malformed", reason = "field width");
/// ```
#[macro_export]
macro_rules! tracelink_warn {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            print!("tracelink_warn: name={}\n", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name,
                            target: env!("CARGO_PKG_NAME"),
                            name = $name,
                            $($key = $value),+,
                    )
        }

        #[cfg(test)]
        {
            print!("tracelink_warn: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            print!("\n");
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Macro for logging debug messages, e.g. degraded `tracestate` handling.
///
/// # Fields:
/// - `name`: The operation or action being logged.
/// - Additional optional key-value pairs can be passed as attributes.
///
/// # Example:
/// ```rust
/// use tracelink::tracelink_debug;
/// tracelink_debug!(name: "Extract.TraceStateDropped", entries = 3);
/// ```
#[macro_export]
macro_rules! tracelink_debug {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            print!("tracelink_debug: name={}\n", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name;
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name,
                            target: env!("CARGO_PKG_NAME"),
                            name = $name,
                            $($key = $value),+,
                    )
        }

        #[cfg(test)]
        {
            print!("tracelink_debug: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            print!("\n");
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+);
        }
    };
}
