//! Messaging attribute keys.
//!
//! The subset of the messaging semantic conventions this instrumentation
//! records. Keys without a value for a given message are simply not
//! recorded.

use tracelink::Key;

/// The messaging system, e.g. `"kafka"`.
pub const MESSAGING_SYSTEM: Key = Key::from_static_str("messaging.system");

/// The destination (topic, queue) the message was sent to or read from.
pub const MESSAGING_DESTINATION_NAME: Key = Key::from_static_str("messaging.destination.name");

/// The instrumented operation: `publish`, `receive` or `process`.
pub const MESSAGING_OPERATION: Key = Key::from_static_str("messaging.operation");

/// Size of the message payload in bytes.
pub const MESSAGING_MESSAGE_BODY_SIZE: Key = Key::from_static_str("messaging.message.body.size");

/// Identifier of the destination partition the message was routed to.
pub const MESSAGING_DESTINATION_PARTITION_ID: Key =
    Key::from_static_str("messaging.destination.partition.id");

/// Position of the message within its partition or log.
pub const MESSAGING_MESSAGE_OFFSET: Key = Key::from_static_str("messaging.message.offset");

/// Client id of the producer or consumer that handled the message.
pub const MESSAGING_CLIENT_ID: Key = Key::from_static_str("messaging.client.id");

/// Consumer group the receiving client belongs to.
pub const MESSAGING_CONSUMER_GROUP: Key = Key::from_static_str("messaging.consumer.group");

/// Prefix for captured message headers; the header name is appended verbatim
/// and the values are recorded as a string array.
pub const MESSAGING_HEADER_PREFIX: &str = "messaging.header.";
