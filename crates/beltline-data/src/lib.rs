//! Beltline Data -- line configuration files.
//!
//! A single file (RON, TOML or JSON, chosen by extension) describes the bus
//! connection, belt parameters, station boundaries, paint table and vehicle
//! archetypes. [`load_config`] reads and validates it; [`LineConfig`] then
//! builds the core objects.

pub mod loader;
pub mod schema;

pub use loader::{ConfigError, Format, detect_format, load_config, parse_config};
pub use schema::LineConfig;
