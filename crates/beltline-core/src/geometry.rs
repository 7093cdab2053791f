//! Mapping from belt progress to world space.

/// A straight belt between two world-space points.
///
/// Progress in `0..=1` interpolates between `start` and `end`. Negative
/// progress extends back past `start` along the belt direction, so queued
/// cars line up behind the entry instead of piling onto it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BeltGeometry {
    pub start: [f32; 3],
    pub end: [f32; 3],
}

impl Default for BeltGeometry {
    fn default() -> Self {
        Self {
            start: [-40.0, 0.0, 0.0],
            end: [40.0, 0.0, 0.0],
        }
    }
}

impl BeltGeometry {
    pub fn length(&self) -> f32 {
        let [dx, dy, dz] = self.delta();
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Unit vector from start to end, or zero for a degenerate belt.
    pub fn direction(&self) -> [f32; 3] {
        let len = self.length();
        if len <= f32::EPSILON {
            return [0.0; 3];
        }
        self.delta().map(|d| d / len)
    }

    /// World-space point for a progress value. Progress above 1 clamps to
    /// `end`.
    pub fn point_at(&self, progress: f64) -> [f32; 3] {
        let t = (progress as f32).min(1.0);
        let delta = self.delta();
        std::array::from_fn(|i| self.start[i] + delta[i] * t)
    }

    fn delta(&self) -> [f32; 3] {
        std::array::from_fn(|i| self.end[i] - self.start[i])
    }
}
