//! Decode-and-enqueue, shared by every message source.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use beltline_core::decode::decode;
use beltline_core::ingest::IngestSender;

use crate::topic::TopicFilter;

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Decoded and queued for the next tick.
    Enqueued { body_no: i32 },
    /// Topic outside the subscription prefix; not decoded.
    Filtered,
    /// Decode failed; logged and discarded.
    Rejected,
}

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    enqueued: AtomicU64,
    filtered: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time copy of the ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounts {
    pub received: u64,
    pub enqueued: u64,
    pub filtered: u64,
    pub rejected: u64,
}

/// Filters, decodes, and enqueues inbound messages.
///
/// Cheap to clone; clones share counters and feed the same queue.
#[derive(Debug, Clone)]
pub struct Ingestor {
    filter: TopicFilter,
    sender: IngestSender,
    counters: Arc<Counters>,
}

impl Ingestor {
    pub fn new(filter: TopicFilter, sender: IngestSender) -> Self {
        Self {
            filter,
            sender,
            counters: Arc::default(),
        }
    }

    /// Handle one message. Never panics and never blocks.
    pub fn handle(&self, topic: &str, payload: &[u8]) -> IngestOutcome {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        if !self.filter.matches(topic) {
            self.counters.filtered.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(topic, "topic outside filter, skipping");
            return IngestOutcome::Filtered;
        }

        match decode(payload) {
            Ok(event) => {
                tracing::info!(
                    topic,
                    body_no = event.body_no,
                    car_family = %event.car_family,
                    katashiki = %event.katashiki,
                    color = %event.color_ext_code,
                    "vehicle event received"
                );
                let body_no = event.body_no;
                self.sender.enqueue(event);
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                IngestOutcome::Enqueued { body_no }
            }
            Err(err) => {
                tracing::error!(topic, reason = %err.kind, raw = %err.raw, "rejected vehicle event");
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                IngestOutcome::Rejected
            }
        }
    }

    pub fn counts(&self) -> IngestCounts {
        IngestCounts {
            received: self.counters.received.load(Ordering::Relaxed),
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            filtered: self.counters.filtered.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
        }
    }

    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    /// Whether the simulation side has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.sender.is_disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltline_core::ingest;

    const GOOD: &[u8] = br#"{"bodyNo":"37365","colorExtCode":" 1k6","carFamily":"x94W"}"#;

    fn ingestor() -> (Ingestor, ingest::IngestReceiver) {
        let (tx, rx) = ingest::channel();
        (Ingestor::new(TopicFilter::new("IOT252/#"), tx), rx)
    }

    #[test]
    fn good_message_is_enqueued() {
        let (ing, mut rx) = ingestor();
        assert_eq!(
            ing.handle("IOT252/line1", GOOD),
            IngestOutcome::Enqueued { body_no: 37365 }
        );
        let events = rx.drain_all();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].color_ext_code, "1K6");
    }

    #[test]
    fn foreign_topic_is_filtered_before_decode() {
        let (ing, rx) = ingestor();
        assert_eq!(ing.handle("other/line1", GOOD), IngestOutcome::Filtered);
        assert!(rx.is_empty());
    }

    #[test]
    fn bad_payload_is_rejected_not_enqueued() {
        let (ing, rx) = ingestor();
        assert_eq!(ing.handle("IOT252/x", b"not json"), IngestOutcome::Rejected);
        assert_eq!(ing.handle("IOT252/x", b""), IngestOutcome::Rejected);
        assert!(rx.is_empty());
    }

    #[test]
    fn counters_are_shared_between_clones() {
        let (ing, _rx) = ingestor();
        let other = ing.clone();
        ing.handle("IOT252/a", GOOD);
        other.handle("IOT252/a", b"{}");
        other.handle("elsewhere", GOOD);

        assert_eq!(
            ing.counts(),
            IngestCounts {
                received: 3,
                enqueued: 1,
                filtered: 1,
                rejected: 1,
            }
        );
    }

    #[test]
    fn dropped_receiver_is_reported() {
        let (ing, rx) = ingestor();
        drop(rx);
        assert!(ing.is_disconnected());
        // Still handled without panicking.
        assert!(matches!(ing.handle("IOT252/a", GOOD), IngestOutcome::Enqueued { .. }));
    }
}
