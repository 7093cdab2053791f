//! Ingestion queue between the message-bus callback context and the
//! simulation tick.
//!
//! Any number of [`IngestSender`] clones may enqueue concurrently from
//! arbitrary threads; the single [`IngestReceiver`] drains everything that is
//! pending once per tick. The queue is an unbounded channel, so a producer
//! never waits on the consumer, and each event is handed to exactly one
//! drain.

use crate::decode::VehicleEvent;

/// Create a connected sender/receiver pair.
pub fn channel() -> (IngestSender, IngestReceiver) {
    let (tx, rx) = flume::unbounded();
    (
        IngestSender { tx },
        IngestReceiver {
            rx,
            total_drained: 0,
        },
    )
}

// ---------------------------------------------------------------------------
// Producer side
// ---------------------------------------------------------------------------

/// Producer handle. Cheap to clone; one per callback context is fine.
#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: flume::Sender<VehicleEvent>,
}

impl IngestSender {
    /// Queue an event for the next tick. Never blocks and never fails; if
    /// the simulation side has shut down the event is dropped.
    pub fn enqueue(&self, event: VehicleEvent) {
        if let Err(err) = self.tx.send(event) {
            let event = err.into_inner();
            tracing::debug!(
                body_no = event.body_no,
                "ingest receiver dropped, discarding event"
            );
        }
    }

    /// Whether the receiving side is gone.
    pub fn is_disconnected(&self) -> bool {
        self.tx.is_disconnected()
    }
}

// ---------------------------------------------------------------------------
// Consumer side
// ---------------------------------------------------------------------------

/// Consumer handle. Not `Clone`: there is exactly one drain per queue.
#[derive(Debug)]
pub struct IngestReceiver {
    rx: flume::Receiver<VehicleEvent>,
    total_drained: u64,
}

impl IngestReceiver {
    /// Remove and return every event queued at the time of the call, in FIFO
    /// order. Events that land while the drain is running wait for the next
    /// tick, so a busy producer cannot stretch a single tick.
    pub fn drain_all(&mut self) -> Vec<VehicleEvent> {
        let pending = self.rx.len();
        let events: Vec<VehicleEvent> = self.rx.try_iter().take(pending).collect();
        self.total_drained += events.len() as u64;
        events
    }

    /// Number of events waiting to be drained.
    pub fn pending_count(&self) -> usize {
        self.rx.len()
    }

    /// Whether no events are waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Total events handed out by [`drain_all`](Self::drain_all) so far.
    pub fn total_drained(&self) -> u64 {
        self.total_drained
    }
}

// ===========================================================================
// Tests
// ===========================================================================
