//! Simulation state and per-step results.

use crate::fixed::{Fixed64, Ticks};

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable line state owned by the engine. Operator controls (pause, belt
/// stop, speed) live here rather than in process-wide globals.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Incremented by 1 for each simulation step.
    pub tick: Ticks,
    /// Operator pause.
    pub paused: bool,
    /// External belt-stop signal.
    pub belt_stop: bool,
    /// Belt speed in metres per second.
    pub speed: Fixed64,
}

impl SimState {
    pub fn new(speed: Fixed64) -> Self {
        Self {
            tick: 0,
            paused: false,
            belt_stop: false,
            speed,
        }
    }

    /// Advancement is skipped while paused or belt-stopped. Spawning is not.
    pub fn is_halted(&self) -> bool {
        self.paused || self.belt_stop
    }
}

// ---------------------------------------------------------------------------
// Step result
// ---------------------------------------------------------------------------

/// What a single [`LineEngine::step`](crate::engine::LineEngine::step) did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepResult {
    /// Events drained from the ingestion queue (one car each).
    pub spawned: usize,
    /// Whether the advance phase ran (false while halted).
    pub advanced: bool,
    /// Cars that reached the exit this step.
    pub halted: usize,
    pub retired: usize,
    pub station_changes: usize,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of line state for replay comparison.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_i32(&mut self, v: i32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
