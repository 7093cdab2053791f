//! File replay: each non-empty line is handed to the ingestor as one
//! message, exactly as if it had arrived from the broker.

use std::io::BufRead;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use beltline_bus::{IngestOutcome, Ingestor};

use crate::error::RunnerError;

/// Topic replayed messages are tagged with.
pub const REPLAY_TOPIC: &str = "replay";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub lines: u64,
    pub enqueued: u64,
    pub rejected: u64,
}

/// Feed every non-empty line through `ingestor`, sleeping `interval` after
/// each one.
pub fn replay_lines(
    reader: impl BufRead,
    ingestor: &Ingestor,
    interval: Duration,
) -> Result<ReplayReport, RunnerError> {
    let mut report = ReplayReport::default();
    for line in reader.lines() {
        let line = line.map_err(RunnerError::ReplayRead)?;
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;
        match ingestor.handle(REPLAY_TOPIC, line.as_bytes()) {
            IngestOutcome::Enqueued { .. } => report.enqueued += 1,
            IngestOutcome::Rejected => report.rejected += 1,
            IngestOutcome::Filtered => {}
        }
        if ingestor.is_disconnected() {
            tracing::warn!("simulation receiver gone, stopping replay");
            break;
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    Ok(report)
}

/// Run [`replay_lines`] on a named thread.
pub fn spawn_replay<R>(
    reader: R,
    ingestor: Ingestor,
    interval: Duration,
) -> Result<JoinHandle<Result<ReplayReport, RunnerError>>, RunnerError>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("beltline-replay".into())
        .spawn(move || replay_lines(reader, &ingestor, interval))
        .map_err(RunnerError::Spawn)
}
