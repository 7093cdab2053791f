//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "beltline")]
#[command(version)]
#[command(about = "Headless conveyor line driven by vehicle production events")]
#[command(long_about = None)]
pub struct Cli {
    /// Line configuration file (.toml, .ron or .json)
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60.0)]
    pub tick_hz: f64,

    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Feed messages from a file, one payload per line, instead of MQTT
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Delay between replayed messages, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub replay_interval_ms: u64,

    /// Start with the belt paused
    #[arg(long)]
    pub paused: bool,

    /// Override the configured belt speed (m/s)
    #[arg(long)]
    pub speed: Option<f64>,

    /// Run ticks back to back instead of in real time
    #[arg(long)]
    pub fast: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["beltline", "--config", "line.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("line.toml"));
        assert_eq!(cli.tick_hz, 60.0);
        assert!(cli.ticks.is_none());
        assert!(cli.replay.is_none());
        assert!(!cli.paused);
        assert!(!cli.fast);
    }

    #[test]
    fn replay_options() {
        let cli = Cli::try_parse_from([
            "beltline",
            "-c",
            "line.ron",
            "--replay",
            "events.jsonl",
            "--replay-interval-ms",
            "250",
            "--ticks",
            "600",
            "--paused",
            "--fast",
        ])
        .unwrap();
        assert_eq!(cli.replay, Some(PathBuf::from("events.jsonl")));
        assert_eq!(cli.replay_interval_ms, 250);
        assert_eq!(cli.ticks, Some(600));
        assert!(cli.paused);
        assert!(cli.fast);
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["beltline"]).is_err());
    }
}
