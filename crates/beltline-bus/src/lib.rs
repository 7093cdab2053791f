//! Beltline Bus -- the message-bus side of the ingestion boundary.
//!
//! Everything in this crate runs in the bus callback context. It selects
//! messages by topic, decodes them, logs rejects, and hands accepted events
//! to the simulation through [`beltline_core::ingest::IngestSender`]. It
//! never touches car state.
//!
//! - [`topic::TopicFilter`] -- fixed-prefix topic selection.
//! - [`ingestor::Ingestor`] -- decode, count, log, enqueue. Shared by the MQTT
//!   subscriber and file replay.
//! - [`subscriber::Subscriber`] -- MQTT connection on a dedicated thread.

pub mod config;
pub mod error;
pub mod ingestor;
pub mod subscriber;
pub mod topic;

pub use config::BusConfig;
pub use error::BusError;
pub use ingestor::{IngestCounts, IngestOutcome, Ingestor};
pub use subscriber::Subscriber;
pub use topic::TopicFilter;
