//! The line engine: owns the belt and orchestrates the tick pipeline.
//!
//! # Architecture
//!
//! The `LineEngine` owns:
//! - A [`Belt`] (ordered cars, spacing-constrained advance)
//! - A [`Classifier`] (archetype and paint rules, read-only)
//! - The consumer end of the ingestion queue
//! - A [`SimState`] (tick counter, pause and belt-stop flags, speed)
//! - An [`EventLog`] of line events for the presentation layer
//!
//! Nothing in here is shared across threads. The only cross-thread hand-off
//! is the [`IngestReceiver`], which is drained once per step.

use crate::belt::{Belt, BeltError, BeltParams, StationLayout};
use crate::classify::Classifier;
use crate::decode::VehicleEvent;
use crate::event::{EventLog, LineEvent};
use crate::fixed::{Fixed64, Ticks, fixed64_to_f64, try_f64_to_fixed64};
use crate::id::CarId;
use crate::ingest::IngestReceiver;
use crate::query::{CarSnapshot, LastIngest, LineStats};
use crate::sim::{SimState, StateHash, StepResult};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct LineEngine {
    belt: Belt,
    classifier: Classifier,
    ingest: IngestReceiver,
    pub sim_state: SimState,
    events: EventLog,

    ingested: u64,
    retired: u64,
    last: Option<LastIngest>,
    last_state_hash: u64,
}

impl LineEngine {
    pub fn new(
        params: &BeltParams,
        layout: StationLayout,
        classifier: Classifier,
        ingest: IngestReceiver,
    ) -> Result<Self, BeltError> {
        let belt = Belt::new(params, layout)?;
        let speed = try_f64_to_fixed64(params.speed_mps).ok_or(BeltError::InvalidSpeed(params.speed_mps))?;
        Ok(Self {
            belt,
            classifier,
            ingest,
            sim_state: SimState::new(speed),
            events: EventLog::default(),
            ingested: 0,
            retired: 0,
            last: None,
            last_state_hash: 0,
        })
    }

    /// Replace the event log, e.g. to change its capacity.
    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = events;
        self
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    /// Pause advancement. New cars keep spawning.
    pub fn pause(&mut self) {
        self.sim_state.paused = true;
    }

    pub fn resume(&mut self) {
        self.sim_state.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.sim_state.paused = !self.sim_state.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.sim_state.paused
    }

    /// External belt-stop signal. Halts advancement like pause does.
    pub fn set_belt_stop(&mut self, stopped: bool) {
        self.sim_state.belt_stop = stopped;
    }

    pub fn set_speed(&mut self, speed_mps: f64) -> Result<(), BeltError> {
        let speed = try_f64_to_fixed64(speed_mps)
            .filter(|s| *s >= Fixed64::ZERO)
            .ok_or(BeltError::InvalidSpeed(speed_mps))?;
        self.sim_state.speed = speed;
        Ok(())
    }

    pub fn speed_mps(&self) -> f64 {
        fixed64_to_f64(self.sim_state.speed)
    }

    // -----------------------------------------------------------------------
    // Step
    // -----------------------------------------------------------------------

    /// Run one tick covering `dt_secs` of wall time.
    ///
    /// A negative or non-finite `dt_secs` is treated as zero: cars still
    /// spawn and stations still update, but nothing moves.
    pub fn step(&mut self, dt_secs: f64) -> StepResult {
        let dt = match try_f64_to_fixed64(dt_secs) {
            Some(dt) if dt >= Fixed64::ZERO => dt,
            _ => {
                tracing::warn!(dt_secs, "invalid frame time, treating as zero");
                Fixed64::ZERO
            }
        };

        let mut result = StepResult::default();

        // Phase 1: Ingest -- runs even while halted.
        self.phase_ingest(&mut result);

        // Phase 2: Advance -- skipped while paused or belt-stopped.
        if !self.sim_state.is_halted() {
            self.phase_advance(dt, &mut result);
        }

        // Phase 3: Retire finished cars from the head.
        self.phase_retire(&mut result);

        // Phase 4: Stations -- runs even while halted.
        self.phase_stations(&mut result);

        // Phase 5: Bookkeeping.
        self.phase_bookkeeping();

        result
    }

    /// Classify an event and put its car on the belt immediately, bypassing
    /// the ingestion queue.
    pub fn spawn_event(&mut self, event: &VehicleEvent) -> CarId {
        let classification = self.classifier.classify(event);
        let archetype = classification.archetype;
        if !classification.color_mapped {
            tracing::debug!(
                body_no = event.body_no,
                color = %event.color_ext_code,
                "unmapped paint code, using fallback color"
            );
        }

        let id = self.belt.spawn(event.body_no, classification);
        let progress = self.belt.get(id).map(|c| c.progress).unwrap_or(Fixed64::ZERO);
        tracing::debug!(
            body_no = event.body_no,
            archetype = self.classifier.archetype_name(archetype),
            progress = fixed64_to_f64(progress),
            "car spawned"
        );

        self.ingested += 1;
        self.last = Some(LastIngest {
            body_no: event.body_no,
            archetype: self.classifier.archetype_name(archetype).to_string(),
            color_code: event.color_ext_code.clone(),
        });
        self.events.emit(LineEvent::CarSpawned {
            car: id,
            body_no: event.body_no,
            archetype,
            progress,
            tick: self.sim_state.tick,
        });
        id
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn phase_ingest(&mut self, result: &mut StepResult) {
        for event in self.ingest.drain_all() {
            self.spawn_event(&event);
            result.spawned += 1;
        }
    }

    fn phase_advance(&mut self, dt: Fixed64, result: &mut StepResult) {
        result.advanced = true;
        let delta = self.belt.progress_delta(self.sim_state.speed, dt);
        if delta == Fixed64::ZERO {
            return;
        }
        let tick = self.sim_state.tick;
        for car in self.belt.advance(delta) {
            result.halted += 1;
            self.events.emit(LineEvent::CarHalted { car, tick });
        }
    }

    fn phase_retire(&mut self, result: &mut StepResult) {
        let tick = self.sim_state.tick;
        for (id, car) in self.belt.retire() {
            tracing::debug!(body_no = car.body_no, "car retired");
            self.retired += 1;
            result.retired += 1;
            self.events.emit(LineEvent::CarRetired {
                car: id,
                body_no: car.body_no,
                tick,
            });
        }
    }

    fn phase_stations(&mut self, result: &mut StepResult) {
        let tick = self.sim_state.tick;
        for change in self.belt.update_stations() {
            tracing::debug!(
                from = change.from,
                to = change.to,
                cue = change.cue.as_deref(),
                "station changed"
            );
            result.station_changes += 1;
            self.events.emit(LineEvent::StationChanged {
                car: change.car,
                from: change.from,
                to: change.to,
                cue: change.cue,
                tick,
            });
        }
    }

    fn phase_bookkeeping(&mut self) {
        self.sim_state.tick += 1;
        self.last_state_hash = self.compute_state_hash();
    }

    fn compute_state_hash(&self) -> u64 {
        let mut hasher = StateHash::new();
        hasher.write_u64(self.sim_state.tick);
        hasher.write_fixed64(self.sim_state.speed);
        for (_, car) in self.belt.iter() {
            hasher.write_i32(car.body_no);
            hasher.write_fixed64(car.progress);
            hasher.write_u64(car.station as u64);
            hasher.write(&[car.halted as u8]);
        }
        hasher.finish()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Most recently computed state hash (0 before the first step).
    pub fn state_hash(&self) -> u64 {
        self.last_state_hash
    }

    pub fn tick(&self) -> Ticks {
        self.sim_state.tick
    }

    pub fn car_count(&self) -> usize {
        self.belt.len()
    }

    pub fn belt(&self) -> &Belt {
        &self.belt
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Per-car render data, lead car first.
    pub fn snapshot_cars(&self) -> Vec<CarSnapshot> {
        self.belt
            .iter()
            .map(|(id, car)| CarSnapshot {
                id,
                body_no: car.body_no,
                archetype: car.archetype,
                phase: car.phase(),
                progress: fixed64_to_f64(car.progress),
                station: car.station,
                palette: car.palette,
                visual: car.active_visual().cloned(),
            })
            .collect()
    }

    pub fn stats(&self) -> LineStats {
        LineStats {
            tick: self.sim_state.tick,
            ingested: self.ingested,
            retired: self.retired,
            active: self.belt.len(),
            paused: self.sim_state.paused,
            belt_stop: self.sim_state.belt_stop,
            last: self.last.clone(),
        }
    }

    /// Take every line event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LineEvent> {
        self.events.drain()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belt::CarPhase;
    use crate::event::EventKind;
    use crate::paint::Color;
    use crate::test_utils::*;

    // -----------------------------------------------------------------------
    // Ingest
    // -----------------------------------------------------------------------

    #[test]
    fn queued_event_spawns_on_next_step() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        assert_eq!(engine.car_count(), 0);

        let result = engine.step(0.0);
        assert_eq!(result.spawned, 1);
        assert_eq!(engine.car_count(), 1);

        let cars = engine.snapshot_cars();
        assert_eq!(cars[0].body_no, 1);
        assert_eq!(cars[0].progress, 0.0);
        assert_eq!(cars[0].station, 0);
        assert_eq!(cars[0].palette.body, Color::BLACK);
    }

    #[test]
    fn stats_track_last_ingest() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(10, "x94W", "209"));
        tx.enqueue(vehicle(11, "x00W", "040"));
        engine.step(0.0);

        let stats = engine.stats();
        assert_eq!(stats.ingested, 2);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.last.unwrap().to_string(), "11/x00W/040");
    }

    #[test]
    fn spawn_event_bypasses_queue() {
        let (mut engine, _tx) = test_engine();
        let id = engine.spawn_event(&vehicle(5, "x94W", "1K6"));
        assert_eq!(engine.belt().get(id).unwrap().body_no, 5);
        assert_eq!(engine.stats().ingested, 1);
    }

    // -----------------------------------------------------------------------
    // Advance and halt
    // -----------------------------------------------------------------------

    #[test]
    fn step_advances_by_speed_over_length() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        engine.step(0.0);
        // 0.3 m/s for 8 s over 80 m.
        engine.step(8.0);
        let progress = engine.snapshot_cars()[0].progress;
        assert!((progress - 0.03).abs() < 1e-6, "progress {progress}");
    }

    #[test]
    fn paused_engine_spawns_but_does_not_advance() {
        let (mut engine, tx) = test_engine();
        engine.pause();
        tx.enqueue(vehicle(1, "x94W", "209"));
        tx.enqueue(vehicle(2, "x94W", "209"));

        let result = engine.step(1.0);
        assert!(!result.advanced);
        let before: Vec<f64> = engine.snapshot_cars().iter().map(|c| c.progress).collect();
        assert_eq!(before, vec![0.0, -0.125]);

        for _ in 0..10 {
            engine.step(1.0);
        }
        let after: Vec<f64> = engine.snapshot_cars().iter().map(|c| c.progress).collect();
        assert_eq!(after, before);

        engine.resume();
        assert!(engine.step(1.0).advanced);
        assert!(engine.snapshot_cars()[0].progress > 0.0);
    }

    #[test]
    fn belt_stop_halts_like_pause() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        engine.set_belt_stop(true);
        engine.step(5.0);
        assert_eq!(engine.snapshot_cars()[0].progress, 0.0);

        engine.set_belt_stop(false);
        engine.step(5.0);
        assert!(engine.snapshot_cars()[0].progress > 0.0);
    }

    #[test]
    fn toggle_pause_flips_state() {
        let (mut engine, _tx) = test_engine();
        engine.toggle_pause();
        assert!(engine.is_paused());
        engine.toggle_pause();
        assert!(!engine.is_paused());
    }

    #[test]
    fn invalid_dt_moves_nothing() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        engine.step(f64::NAN);
        engine.step(-3.0);
        assert_eq!(engine.car_count(), 1);
        assert_eq!(engine.snapshot_cars()[0].progress, 0.0);
    }

    #[test]
    fn set_speed_rejects_negative() {
        let (mut engine, _tx) = test_engine();
        assert!(engine.set_speed(-1.0).is_err());
        assert!(engine.set_speed(f64::INFINITY).is_err());
        engine.set_speed(2.0).unwrap();
        assert_eq!(engine.speed_mps(), 2.0);
    }

    // -----------------------------------------------------------------------
    // Retirement and events
    // -----------------------------------------------------------------------

    #[test]
    fn car_runs_full_belt_and_retires() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        engine.step(0.0);

        // 80 m at 0.3 m/s is under 267 s.
        let mut retired = 0;
        for _ in 0..300 {
            retired += engine.step(1.0).retired;
        }
        assert_eq!(retired, 1);
        assert_eq!(engine.car_count(), 0);
        assert_eq!(engine.stats().retired, 1);

        let events = engine.drain_events();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.first(), Some(&EventKind::CarSpawned));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::StationChanged).count(),
            3
        );
        assert_eq!(&kinds[kinds.len() - 2..], &[EventKind::CarHalted, EventKind::CarRetired]);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn station_changes_carry_cues() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        engine.step(0.0);
        engine.set_speed(1.0).unwrap();
        engine.step(15.0);

        let cues: Vec<Option<String>> = engine
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                LineEvent::StationChanged { cue, .. } => Some(cue),
                _ => None,
            })
            .collect();
        assert_eq!(cues, vec![Some("kaput_open".to_string())]);
        assert_eq!(engine.snapshot_cars()[0].station, 1);
        assert_eq!(engine.snapshot_cars()[0].phase, CarPhase::Moving);
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    #[test]
    fn identical_inputs_give_identical_hashes() {
        let run = || {
            let (mut engine, tx) = test_engine();
            for b in 0..5 {
                tx.enqueue(vehicle(b, "x94W", "209"));
            }
            for _ in 0..100 {
                engine.step(0.5);
            }
            engine.state_hash()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn hash_changes_as_cars_move() {
        let (mut engine, tx) = test_engine();
        tx.enqueue(vehicle(1, "x94W", "209"));
        engine.step(1.0);
        let a = engine.state_hash();
        engine.step(1.0);
        assert_ne!(a, engine.state_hash());
    }
}
