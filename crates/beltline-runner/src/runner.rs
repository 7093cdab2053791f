//! Fixed-rate tick loop.
//!
//! Each tick steps the engine by a constant `1 / tick_hz` seconds. In real
//! time mode the loop sleeps to hold that rate; when it falls more than a
//! tick behind it resets its schedule instead of bursting to catch up.

use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use beltline_bus::{IngestCounts, Ingestor, Subscriber};
use beltline_core::engine::LineEngine;
use beltline_core::event::LineEvent;
use beltline_core::geometry::BeltGeometry;

use crate::error::RunnerError;
use crate::replay::ReplayReport;

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

/// Where inbound messages come from.
#[derive(Debug)]
pub enum Feed {
    Mqtt(Subscriber),
    Replay(JoinHandle<Result<ReplayReport, RunnerError>>),
    /// Nothing feeds the queue (tests, or events enqueued up front).
    Idle,
}

impl Feed {
    fn is_finished(&self) -> bool {
        match self {
            Feed::Mqtt(sub) => sub.is_finished(),
            Feed::Replay(handle) => handle.is_finished(),
            Feed::Idle => true,
        }
    }

    /// Whether the line should stop once the belt empties after this feed
    /// has finished.
    fn ends_when_drained(&self) -> bool {
        !matches!(self, Feed::Mqtt(_))
    }

    fn close(self) -> Result<(), RunnerError> {
        match self {
            Feed::Mqtt(sub) => Ok(sub.shutdown()?),
            Feed::Replay(handle) => {
                let report = handle.join().map_err(|_| RunnerError::ReplayPanicked)??;
                tracing::info!(
                    lines = report.lines,
                    enqueued = report.enqueued,
                    rejected = report.rejected,
                    "replay finished"
                );
                Ok(())
            }
            Feed::Idle => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    pub tick_hz: f64,
    pub max_ticks: Option<u64>,
    /// Sleep to hold `tick_hz`; otherwise run ticks back to back.
    pub realtime: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            max_ticks: None,
            realtime: true,
        }
    }
}

/// Totals at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub ingested: u64,
    pub retired: u64,
    pub active: usize,
    pub counts: IngestCounts,
}

#[derive(Debug)]
pub struct LineRunner {
    engine: LineEngine,
    geometry: BeltGeometry,
    feed: Feed,
    ingestor: Ingestor,
    options: RunOptions,
}

impl LineRunner {
    pub fn new(
        engine: LineEngine,
        geometry: BeltGeometry,
        feed: Feed,
        ingestor: Ingestor,
        options: RunOptions,
    ) -> Result<Self, RunnerError> {
        if !(options.tick_hz.is_finite() && options.tick_hz > 0.0) {
            return Err(RunnerError::TickRate(options.tick_hz));
        }
        Ok(Self {
            engine,
            geometry,
            feed,
            ingestor,
            options,
        })
    }

    pub fn engine(&self) -> &LineEngine {
        &self.engine
    }

    /// Tick until the tick limit, until a finite feed is done and the belt
    /// is empty, or until the subscriber dies.
    pub fn run(mut self) -> Result<RunSummary, RunnerError> {
        let dt = 1.0 / self.options.tick_hz;
        let period = Duration::from_secs_f64(dt);
        let status_every = (self.options.tick_hz.round() as u64).max(1);

        let started = Instant::now();
        let mut deadline = started;
        let mut last_status = (started, 0u64);
        let mut ticks = 0u64;

        loop {
            if self.options.max_ticks.is_some_and(|max| ticks >= max) {
                tracing::info!(ticks, "tick limit reached");
                break;
            }

            let feed_done = self.feed.is_finished();
            if feed_done && !self.feed.ends_when_drained() {
                tracing::warn!("subscriber stopped, halting line");
                break;
            }

            self.engine.step(dt);
            ticks += 1;
            for event in self.engine.drain_events() {
                log_line_event(&event);
            }

            if ticks % status_every == 0 {
                let now = Instant::now();
                let elapsed = now.duration_since(last_status.0).as_secs_f64();
                let tps = if elapsed > 0.0 {
                    (ticks - last_status.1) as f64 / elapsed
                } else {
                    0.0
                };
                self.log_status(tps);
                last_status = (now, ticks);
            }

            if feed_done && self.engine.car_count() == 0 {
                tracing::info!(ticks, "feed finished and belt empty");
                break;
            }

            if self.options.realtime {
                deadline += period;
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                } else if now - deadline > period {
                    deadline = now;
                }
            }
        }

        let stats = self.engine.stats();
        let summary = RunSummary {
            ticks,
            ingested: stats.ingested,
            retired: stats.retired,
            active: stats.active,
            counts: self.ingestor.counts(),
        };
        self.feed.close()?;
        Ok(summary)
    }

    fn log_status(&self, tps: f64) {
        let stats = self.engine.stats();
        let lead = self
            .engine
            .snapshot_cars()
            .first()
            .map(|car| self.geometry.point_at(car.progress));
        match lead {
            Some([x, y, z]) => tracing::info!(
                paused = stats.paused,
                belt_stop = stats.belt_stop,
                "{stats}  tps:{tps:.1}  lead:({x:.2}, {y:.2}, {z:.2})"
            ),
            None => tracing::info!(
                paused = stats.paused,
                belt_stop = stats.belt_stop,
                "{stats}  tps:{tps:.1}"
            ),
        }
    }
}

fn log_line_event(event: &LineEvent) {
    match event {
        LineEvent::StationChanged { from, to, cue: Some(cue), .. } => {
            tracing::debug!(from, to, cue = %cue, "play cue");
        }
        LineEvent::CarRetired { body_no, tick, .. } => {
            tracing::debug!(body_no, tick, "car left the line");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltline_bus::TopicFilter;
    use beltline_core::belt::BeltParams;
    use beltline_core::test_utils::{test_engine_with, vehicle};

    fn fast(max_ticks: Option<u64>) -> RunOptions {
        RunOptions {
            tick_hz: 10.0,
            max_ticks,
            realtime: false,
        }
    }

    fn quick_belt() -> BeltParams {
        BeltParams {
            speed_mps: 40.0,
            ..BeltParams::default()
        }
    }

    fn runner(options: RunOptions) -> (LineRunner, Ingestor) {
        let (engine, tx) = test_engine_with(quick_belt());
        let ingestor = Ingestor::new(TopicFilter::new("#"), tx);
        let runner = LineRunner::new(
            engine,
            BeltGeometry::default(),
            Feed::Idle,
            ingestor.clone(),
            options,
        )
        .unwrap();
        (runner, ingestor)
    }

    #[test]
    fn rejects_bad_tick_rate() {
        for hz in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let (engine, tx) = test_engine_with(quick_belt());
            let ingestor = Ingestor::new(TopicFilter::new("#"), tx);
            let options = RunOptions {
                tick_hz: hz,
                ..fast(None)
            };
            assert!(matches!(
                LineRunner::new(engine, BeltGeometry::default(), Feed::Idle, ingestor, options),
                Err(RunnerError::TickRate(_))
            ));
        }
    }

    #[test]
    fn idle_feed_with_empty_belt_stops_after_one_tick() {
        let (runner, _ingestor) = runner(fast(None));
        let summary = runner.run().unwrap();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.ingested, 0);
    }

    #[test]
    fn runs_until_every_car_retires() {
        let (runner, ingestor) = runner(fast(Some(1_000)));
        for body_no in 1..=3 {
            let payload = format!(r#"{{"bodyNo":{body_no},"colorExtCode":"209","carFamily":"x94W"}}"#);
            ingestor.handle("IOT252/line", payload.as_bytes());
        }

        let summary = runner.run().unwrap();
        assert_eq!(summary.ingested, 3);
        assert_eq!(summary.retired, 3);
        assert_eq!(summary.active, 0);
        assert_eq!(summary.counts.enqueued, 3);
        assert!(summary.ticks < 1_000);
    }

    #[test]
    fn tick_limit_stops_a_busy_line() {
        let (mut runner, _ingestor) = runner(fast(Some(5)));
        runner.engine.pause();
        runner.engine.spawn_event(&vehicle(1, "x94W", "209"));

        let summary = runner.run().unwrap();
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.active, 1);
    }
}
