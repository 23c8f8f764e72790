//! The per-transport attribute extraction capability.

/// Reads attribute values out of a transport's message type.
///
/// One implementation exists per supported messaging library, selected at
/// composition time when the telemetry is built; the instrumentation itself
/// never inspects messages directly. Every accessor except [`system`] and
/// [`destination`] is optional — transports without a concept of, say,
/// partitions just keep the default.
///
/// [`system`]: MessageAttributesGetter::system
/// [`destination`]: MessageAttributesGetter::destination
pub trait MessageAttributesGetter<M> {
    /// The messaging system name, e.g. `"kafka"`.
    fn system(&self) -> &'static str;

    /// The destination the message is published to or consumed from.
    fn destination<'a>(&self, message: &'a M) -> &'a str;

    /// Size of the message payload in bytes.
    fn body_size(&self, _message: &M) -> Option<i64> {
        None
    }

    /// Identifier of the partition the message was routed to.
    fn partition_id(&self, _message: &M) -> Option<String> {
        None
    }

    /// Position of the message within its partition or log.
    fn offset(&self, _message: &M) -> Option<i64> {
        None
    }

    /// Client id of the producer or consumer handling the message.
    fn client_id(&self) -> Option<String> {
        None
    }

    /// Consumer group of the receiving client. Only recorded on consumer
    /// spans.
    fn consumer_group(&self) -> Option<String> {
        None
    }

    /// All values of the named message header, for header capture.
    fn header_values(&self, _message: &M, _name: &str) -> Vec<String> {
        Vec::new()
    }
}
