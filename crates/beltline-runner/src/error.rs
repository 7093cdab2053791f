use std::path::PathBuf;

use beltline_bus::BusError;
use beltline_core::belt::BeltError;
use beltline_data::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("invalid speed override: {0}")]
    Speed(#[from] BeltError),

    #[error("tick rate must be positive and finite, got {0}")]
    TickRate(f64),

    #[error("cannot open replay file {file}: {source}")]
    ReplayOpen {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("replay read failed: {0}")]
    ReplayRead(#[source] std::io::Error),

    #[error("failed to spawn replay thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("replay thread panicked")]
    ReplayPanicked,
}
