//! The belt: an ordered list of cars and the spacing-constrained advance.
//!
//! Progress is a fraction of belt length. `0` is the entry point, `1` the
//! exit. Cars spawned behind a queue start at negative progress and walk
//! into the belt as the cars ahead of them move on.
//!
//! Order is arrival order, which is also physical order: index 0 is the car
//! furthest along. After every advance, each car sits at least
//! `min_gap_m / length_m` behind its predecessor, so no car ever overtakes
//! another and retirement from the head is strictly FIFO.

use std::collections::VecDeque;

use slotmap::SlotMap;

use crate::asset::StationAsset;
use crate::classify::{Classification, Palette};
use crate::fixed::{Fixed64, checked_div_64, try_f64_to_fixed64};
use crate::id::{ArchetypeId, CarId};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Physical belt parameters, in metres and metres per second.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BeltParams {
    pub length_m: f64,
    pub speed_mps: f64,
    /// Minimum distance kept between consecutive cars while moving.
    pub min_gap_m: f64,
    /// Distance behind the last car (or the entry point) at which new cars
    /// are spawned.
    pub spawn_gap_m: f64,
}

impl Default for BeltParams {
    fn default() -> Self {
        Self {
            length_m: 80.0,
            speed_mps: 0.3,
            min_gap_m: 0.5,
            spawn_gap_m: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BeltError {
    #[error("belt length must be positive and finite, got {0}")]
    NonPositiveLength(f64),
    #[error("belt speed must be non-negative and finite, got {0}")]
    InvalidSpeed(f64),
    #[error("gap '{name}' must be non-negative and finite, got {value}")]
    InvalidGap { name: &'static str, value: f64 },
    #[error("spawn gap {spawn_gap_m} m is smaller than minimum gap {min_gap_m} m")]
    SpawnGapBelowMinGap { spawn_gap_m: f64, min_gap_m: f64 },
    #[error("station thresholds must be finite and strictly ascending: {0:?}")]
    InvalidThresholds(Vec<f64>),
}

impl BeltParams {
    pub fn validate(&self) -> Result<(), BeltError> {
        if !(self.length_m.is_finite() && self.length_m > 0.0) {
            return Err(BeltError::NonPositiveLength(self.length_m));
        }
        if !(self.speed_mps.is_finite() && self.speed_mps >= 0.0) {
            return Err(BeltError::InvalidSpeed(self.speed_mps));
        }
        for (name, value) in [("min_gap_m", self.min_gap_m), ("spawn_gap_m", self.spawn_gap_m)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BeltError::InvalidGap { name, value });
            }
        }
        if self.spawn_gap_m < self.min_gap_m {
            return Err(BeltError::SpawnGapBelowMinGap {
                spawn_gap_m: self.spawn_gap_m,
                min_gap_m: self.min_gap_m,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

/// Station boundaries, in metres from the belt entry.
///
/// A car's station index is the number of thresholds its position strictly
/// exceeds, clamped to the last asset in its visual set.
#[derive(Debug, Clone, PartialEq)]
pub struct StationLayout {
    thresholds: Vec<Fixed64>,
}

impl StationLayout {
    pub fn new(thresholds_m: &[f64]) -> Result<Self, BeltError> {
        let invalid = || BeltError::InvalidThresholds(thresholds_m.to_vec());
        let thresholds = thresholds_m
            .iter()
            .map(|&m| try_f64_to_fixed64(m).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()?;
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid());
        }
        Ok(Self { thresholds })
    }

    /// Station index for a position, given how many stations the car has.
    pub fn station_for(&self, position_m: Fixed64, station_count: usize) -> usize {
        let crossed = self.thresholds.iter().filter(|&&t| position_m > t).count();
        crossed.min(station_count.saturating_sub(1))
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Car
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CarPhase {
    /// Queued at or before the entry point (`progress <= 0`).
    Entering,
    Moving,
    /// Reached the exit; retired on the next pass.
    Halted,
}

/// One tracked car. Owned exclusively by the [`Belt`].
#[derive(Debug, Clone)]
pub struct Car {
    pub body_no: i32,
    pub archetype: ArchetypeId,
    pub palette: Palette,
    /// Station assets, colored at spawn and never recolored.
    pub visuals: Vec<StationAsset>,
    pub station: usize,
    pub progress: Fixed64,
    pub halted: bool,
}

impl Car {
    pub fn phase(&self) -> CarPhase {
        if self.halted {
            CarPhase::Halted
        } else if self.progress <= Fixed64::ZERO {
            CarPhase::Entering
        } else {
            CarPhase::Moving
        }
    }

    /// The asset currently shown for this car.
    pub fn active_visual(&self) -> Option<&StationAsset> {
        self.visuals.get(self.station)
    }
}

/// A car that moved to a different station this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationChange {
    pub car: CarId,
    pub from: usize,
    pub to: usize,
    /// One-shot presentation cue of the new station asset, if it has one.
    pub cue: Option<String>,
}

// ---------------------------------------------------------------------------
// Belt
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Belt {
    cars: SlotMap<CarId, Car>,
    /// Arrival order; front is the lead car.
    order: VecDeque<CarId>,
    layout: StationLayout,
    length_m: Fixed64,
    min_gap_t: Fixed64,
    spawn_gap_t: Fixed64,
}

impl Belt {
    pub fn new(params: &BeltParams, layout: StationLayout) -> Result<Self, BeltError> {
        params.validate()?;
        let length_m = try_f64_to_fixed64(params.length_m)
            .filter(|l| *l > Fixed64::ZERO)
            .ok_or(BeltError::NonPositiveLength(params.length_m))?;
        let fraction = |name: &'static str, value: f64| {
            try_f64_to_fixed64(value)
                .and_then(|m| checked_div_64(m, length_m))
                .ok_or(BeltError::InvalidGap { name, value })
        };
        Ok(Self {
            cars: SlotMap::with_key(),
            order: VecDeque::new(),
            layout,
            length_m,
            min_gap_t: fraction("min_gap_m", params.min_gap_m)?,
            spawn_gap_t: fraction("spawn_gap_m", params.spawn_gap_m)?,
        })
    }

    /// Progress a car spawned right now would start at.
    ///
    /// `min(last - spawn_gap, -spawn_gap)` behind an occupied belt, `0` on an
    /// empty one. The first term keeps a queue of pending cars spaced out;
    /// the second keeps new cars off the belt while the last car is still
    /// near the entry.
    pub fn spawn_progress(&self) -> Fixed64 {
        match self.order.back().and_then(|id| self.cars.get(*id)) {
            Some(last) => (last.progress - self.spawn_gap_t).min(-self.spawn_gap_t),
            None => Fixed64::ZERO,
        }
    }

    /// Append a car at the tail from a classification result.
    pub fn spawn(&mut self, body_no: i32, classification: Classification) -> CarId {
        let car = Car {
            body_no,
            archetype: classification.archetype,
            palette: classification.palette,
            visuals: classification.visuals,
            station: 0,
            progress: self.spawn_progress(),
            halted: false,
        };
        let id = self.cars.insert(car);
        self.order.push_back(id);
        id
    }

    /// Progress fraction covered in `dt_secs` at `speed_mps`. Zero for
    /// negative or non-finite inputs.
    pub fn progress_delta(&self, speed_mps: Fixed64, dt_secs: Fixed64) -> Fixed64 {
        if speed_mps <= Fixed64::ZERO || dt_secs <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        speed_mps
            .checked_mul(dt_secs)
            .and_then(|m| checked_div_64(m, self.length_m))
            .unwrap_or(Fixed64::ONE)
    }

    /// Advance every unhalted car by `delta`, clamping each one to
    /// `min(1, predecessor - min_gap)`. Returns the cars that reached the
    /// exit during this call.
    pub fn advance(&mut self, delta: Fixed64) -> Vec<CarId> {
        let mut newly_halted = Vec::new();
        let mut ahead: Option<Fixed64> = None;

        for &id in &self.order {
            let Some(car) = self.cars.get_mut(id) else {
                continue;
            };
            if !car.halted {
                let mut t = car.progress.saturating_add(delta);
                if let Some(limit) = ahead {
                    t = t.min(limit - self.min_gap_t);
                }
                if t >= Fixed64::ONE {
                    t = Fixed64::ONE;
                    car.halted = true;
                    newly_halted.push(id);
                }
                car.progress = t;
            }
            ahead = Some(car.progress);
        }
        newly_halted
    }

    /// Remove cars from the head while the head has reached the exit.
    pub fn retire(&mut self) -> Vec<(CarId, Car)> {
        let mut retired = Vec::new();
        while let Some(&head) = self.order.front() {
            match self.cars.get(head) {
                Some(car) if car.progress >= Fixed64::ONE => {}
                Some(_) => break,
                None => {
                    self.order.pop_front();
                    continue;
                }
            }
            self.order.pop_front();
            if let Some(car) = self.cars.remove(head) {
                retired.push((head, car));
            }
        }
        retired
    }

    /// Recompute each car's station from its position.
    pub fn update_stations(&mut self) -> Vec<StationChange> {
        let mut changes = Vec::new();
        for &id in &self.order {
            let Some(car) = self.cars.get_mut(id) else {
                continue;
            };
            let position_m = car.progress.saturating_mul(self.length_m);
            let station = self.layout.station_for(position_m, car.visuals.len());
            if station != car.station {
                changes.push(StationChange {
                    car: id,
                    from: car.station,
                    to: station,
                    cue: car.visuals.get(station).and_then(|v| v.cue.clone()),
                });
                car.station = station;
            }
        }
        changes
    }

    /// Cars in physical order, lead car first.
    pub fn iter(&self) -> impl Iterator<Item = (CarId, &Car)> {
        self.order
            .iter()
            .filter_map(|&id| self.cars.get(id).map(|car| (id, car)))
    }

    pub fn get(&self, id: CarId) -> Option<&Car> {
        self.cars.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn length_m(&self) -> Fixed64 {
        self.length_m
    }

    pub fn min_gap_fraction(&self) -> Fixed64 {
        self.min_gap_t
    }

    pub fn spawn_gap_fraction(&self) -> Fixed64 {
        self.spawn_gap_t
    }
}

// ===========================================================================
// Tests
// ===========================================================================
