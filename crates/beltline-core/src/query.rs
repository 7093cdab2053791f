//! Read-only query API for inspecting line state.
//!
//! Snapshot types are owned copies, so the renderer and HUD never hold
//! references into engine storage.

use std::fmt;

use crate::asset::StationAsset;
use crate::belt::CarPhase;
use crate::classify::Palette;
use crate::fixed::Ticks;
use crate::id::{ArchetypeId, CarId};

// ---------------------------------------------------------------------------
// Car snapshot
// ---------------------------------------------------------------------------

/// Everything the renderer needs to draw one car this frame.
#[derive(Debug, Clone)]
pub struct CarSnapshot {
    pub id: CarId,
    pub body_no: i32,
    pub archetype: ArchetypeId,
    pub phase: CarPhase,
    /// Fraction of belt length. Negative while queued before the entry.
    pub progress: f64,
    pub station: usize,
    pub palette: Palette,
    /// The active station asset with colors already applied.
    pub visual: Option<StationAsset>,
}

// ---------------------------------------------------------------------------
// Line stats
// ---------------------------------------------------------------------------

/// Summary of the most recently ingested event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastIngest {
    pub body_no: i32,
    pub archetype: String,
    pub color_code: String,
}

impl fmt::Display for LastIngest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.body_no, self.archetype, self.color_code)
    }
}

/// Counters for the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStats {
    pub tick: Ticks,
    /// Events drained from the ingestion queue since start.
    pub ingested: u64,
    pub retired: u64,
    pub active: usize,
    pub paused: bool,
    pub belt_stop: bool,
    pub last: Option<LastIngest>,
}

impl fmt::Display for LineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cars:{}  In:{}  Last:", self.active, self.ingested)?;
        match &self.last {
            Some(last) => write!(f, "{last}"),
            None => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_format() {
        let mut stats = LineStats {
            tick: 10,
            ingested: 3,
            retired: 1,
            active: 2,
            paused: false,
            belt_stop: false,
            last: None,
        };
        assert_eq!(stats.to_string(), "Cars:2  In:3  Last:-");

        stats.last = Some(LastIngest {
            body_no: 37365,
            archetype: "x94W".into(),
            color_code: "1K6".into(),
        });
        assert_eq!(stats.to_string(), "Cars:2  In:3  Last:37365/x94W/1K6");
    }
}
