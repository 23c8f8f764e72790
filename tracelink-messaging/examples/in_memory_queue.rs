//! A producer thread and a consumer thread connected by a channel.
//!
//! The trace identity travels inside each message's headers, so the
//! consumer's processing spans come out parented on the matching publish
//! spans even though the two sides share no state besides the channel.
//!
//! Run with `cargo run --example in_memory_queue`.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::thread;
use tracelink::propagation::{Extractor, Injector};
use tracelink::testing::{InMemorySpanRecorder, RecordingTracer};
use tracelink_messaging::{MessageAttributesGetter, MessagingTelemetry};

struct QueueMessage {
    topic: String,
    payload: String,
    headers: HashMap<String, String>,
}

impl Injector for QueueMessage {
    fn set(&mut self, key: &str, value: String) {
        self.headers.insert(key.to_string(), value);
    }
}

impl Extractor for QueueMessage {
    fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(|k| k.as_str()).collect()
    }
}

struct QueueGetter;

impl MessageAttributesGetter<QueueMessage> for QueueGetter {
    fn system(&self) -> &'static str {
        "channel"
    }

    fn destination<'a>(&self, message: &'a QueueMessage) -> &'a str {
        &message.topic
    }

    fn body_size(&self, message: &QueueMessage) -> Option<i64> {
        Some(message.payload.len() as i64)
    }
}

fn main() {
    let recorder = InMemorySpanRecorder::new();
    let telemetry = Arc::new(
        MessagingTelemetry::builder(RecordingTracer::new(recorder.clone())).build(),
    );

    let (tx, rx) = mpsc::channel::<QueueMessage>();

    let producer = {
        let telemetry = telemetry.clone();
        thread::spawn(move || {
            for greeting in ["hello", "bonjour", "hallo"] {
                let mut message = QueueMessage {
                    topic: "greetings".to_string(),
                    payload: greeting.to_string(),
                    headers: HashMap::new(),
                };
                let mut span = telemetry.start_publish(&QueueGetter, &mut message, None);
                tx.send(message).expect("consumer hung up");
                span.end();
            }
        })
    };

    let consumer = {
        let telemetry = telemetry.clone();
        thread::spawn(move || {
            while let Ok(message) = rx.recv() {
                let mut span = telemetry.start_process(&QueueGetter, &message);
                println!("handled {:?} from {}", message.payload, message.topic);
                span.end();
            }
        })
    };

    producer.join().expect("producer panicked");
    consumer.join().expect("consumer panicked");

    println!("\nrecorded spans:");
    for span in recorder.finished_spans() {
        println!(
            "  {:<22} {:?} trace={} span={} parent={}",
            span.name,
            span.kind,
            span.context.trace_id(),
            span.context.span_id(),
            span.parent_span_id,
        );
    }
}
