//! Beltline Runner -- headless driver for the conveyor line.
//!
//! Loads the line configuration, wires a message feed (live MQTT or file
//! replay) into the engine's ingestion queue, and steps the engine at a fixed
//! rate, logging a status line once per simulated second.

pub mod cli;
pub mod error;
pub mod replay;
pub mod runner;

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use beltline_bus::{Ingestor, Subscriber, TopicFilter};
use beltline_core::ingest;
use beltline_data::load_config;

pub use cli::Cli;
pub use error::RunnerError;
pub use runner::{Feed, LineRunner, RunOptions, RunSummary};

/// Run the line as described by the command line.
pub fn run(cli: Cli) -> Result<RunSummary, RunnerError> {
    let config = load_config(&cli.config)?;

    let (tx, rx) = ingest::channel();
    let mut engine = config.build_engine(rx)?;
    if let Some(speed) = cli.speed {
        engine.set_speed(speed)?;
    }
    if cli.paused {
        engine.pause();
    }

    let (feed, ingestor) = match &cli.replay {
        Some(path) => {
            let file = File::open(path).map_err(|source| RunnerError::ReplayOpen {
                file: path.clone(),
                source,
            })?;
            let ingestor = Ingestor::new(TopicFilter::new("#"), tx);
            tracing::info!(file = %path.display(), "replaying messages");
            let handle = replay::spawn_replay(
                BufReader::new(file),
                ingestor.clone(),
                Duration::from_millis(cli.replay_interval_ms),
            )?;
            (Feed::Replay(handle), ingestor)
        }
        None => {
            let bus = config.bus()?;
            let ingestor = Ingestor::new(TopicFilter::new(&bus.topic), tx);
            let subscriber = Subscriber::spawn(bus, ingestor.clone())?;
            (Feed::Mqtt(subscriber), ingestor)
        }
    };

    let options = RunOptions {
        tick_hz: cli.tick_hz,
        max_ticks: cli.ticks,
        realtime: !cli.fast,
    };
    let summary = LineRunner::new(engine, config.geometry, feed, ingestor, options)?.run()?;
    tracing::info!(
        ticks = summary.ticks,
        ingested = summary.ingested,
        retired = summary.retired,
        active = summary.active,
        rejected = summary.counts.rejected,
        "line stopped"
    );
    Ok(summary)
}
