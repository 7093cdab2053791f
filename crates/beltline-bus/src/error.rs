/// Errors on the bus side. None of these reach the simulation; the
/// subscriber logs them and stops.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("invalid bus configuration: {0}")]
    Config(String),

    /// The broker was unreachable or the connection dropped.
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: rumqttc::ConnectionError,
    },

    #[error("subscribe to '{topic}' failed: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: rumqttc::ClientError,
    },

    /// The simulation side dropped its receiver.
    #[error("ingest channel closed")]
    ChannelClosed,

    #[error("failed to spawn subscriber thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("subscriber thread panicked")]
    ThreadPanicked,
}
