//! Line events with a pre-allocated ring buffer.
//!
//! The engine records what happened to each car during a tick (spawn,
//! station change, halt, retirement). The presentation layer drains the log
//! once per frame to play cues, sounds, and HUD updates. The log is bounded:
//! when full, the oldest events are dropped and counted.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventLog::suppress`]. Suppressed
//! events are never recorded.

use crate::fixed::{Fixed64, Ticks};
use crate::id::{ArchetypeId, CarId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A line event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    CarSpawned {
        car: CarId,
        body_no: i32,
        archetype: ArchetypeId,
        progress: Fixed64,
        tick: Ticks,
    },
    StationChanged {
        car: CarId,
        from: usize,
        to: usize,
        /// Presentation cue to play once on the new station asset.
        cue: Option<String>,
        tick: Ticks,
    },
    CarHalted {
        car: CarId,
        tick: Ticks,
    },
    CarRetired {
        car: CarId,
        body_no: i32,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CarSpawned,
    StationChanged,
    CarHalted,
    CarRetired,
}

const EVENT_KIND_COUNT: usize = 4;

impl LineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LineEvent::CarSpawned { .. } => EventKind::CarSpawned,
            LineEvent::StationChanged { .. } => EventKind::StationChanged,
            LineEvent::CarHalted { .. } => EventKind::CarHalted,
            LineEvent::CarRetired { .. } => EventKind::CarRetired,
        }
    }

    pub fn car(&self) -> CarId {
        match self {
            LineEvent::CarSpawned { car, .. }
            | LineEvent::StationChanged { car, .. }
            | LineEvent::CarHalted { car, .. }
            | LineEvent::CarRetired { car, .. } => *car,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            LineEvent::CarSpawned { tick, .. }
            | LineEvent::StationChanged { tick, .. }
            | LineEvent::CarHalted { tick, .. }
            | LineEvent::CarRetired { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer -- pre-allocated ring buffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<LineEvent>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
    /// Events overwritten before anyone read them.
    dropped: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
            dropped: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: LineEvent) {
        if self.len == self.capacity() {
            self.dropped += 1;
        } else {
            self.len += 1;
        }
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    fn oldest(&self) -> usize {
        if self.len < self.capacity() {
            (self.head + self.capacity() - self.len) % self.capacity()
        } else {
            // head points to the next write position, which is the oldest entry
            self.head
        }
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        EventBufferIter {
            buffer: self,
            index: self.oldest(),
            remaining: self.len,
        }
    }

    /// Remove and return every stored event, oldest first.
    pub fn drain(&mut self) -> Vec<LineEvent> {
        let capacity = self.capacity();
        let start = self.oldest();
        let drained = (0..self.len)
            .filter_map(|i| self.events[(start + i) % capacity].take())
            .collect();
        self.head = 0;
        self.len = 0;
        drained
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over events in an [`EventBuffer`], from oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a LineEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Event buffer plus per-kind suppression flags and counters.
#[derive(Debug)]
pub struct EventLog {
    buffer: EventBuffer,
    suppressed: [bool; EVENT_KIND_COUNT],
    emitted: [u64; EVENT_KIND_COUNT],
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: EventBuffer::new(capacity),
            suppressed: [false; EVENT_KIND_COUNT],
            emitted: [0; EVENT_KIND_COUNT],
        }
    }

    /// Stop recording an event kind. Already-buffered events stay.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Record an event. No-ops if its kind is suppressed.
    pub fn emit(&mut self, event: LineEvent) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        self.emitted[idx] += 1;
        self.buffer.push(event);
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<LineEvent> {
        self.buffer.drain()
    }

    pub fn iter(&self) -> EventBufferIter<'_> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Total events of one kind recorded since creation.
    pub fn total_emitted(&self, kind: EventKind) -> u64 {
        self.emitted[kind.index()]
    }

    pub fn dropped_count(&self) -> u64 {
        self.buffer.dropped_count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(1024)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
