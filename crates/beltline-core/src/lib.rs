//! Beltline Core -- event ingestion and conveyor-belt simulation for a
//! vehicle production line.
//!
//! Production events arrive as loosely formatted JSON messages, are decoded
//! into strict [`decode::VehicleEvent`] records, handed across threads through
//! the [`ingest`] queue, classified into a paint-resolved visual set, and then
//! tracked as cars moving along a one-dimensional belt.
//!
//! # Tick Pipeline
//!
//! Each call to [`engine::LineEngine::step`] runs the following phases:
//!
//! 1. **Ingest** -- Drain the ingestion queue, classify each event, spawn a car
//!    at the tail of the belt. Runs even while the line is halted.
//! 2. **Advance** -- Move every car forward, clamping each one behind its
//!    predecessor by the minimum gap. Skipped while paused or belt-stopped.
//! 3. **Retire** -- Remove finished cars from the head of the belt.
//! 4. **Stations** -- Recompute each car's station and swap its active asset.
//! 5. **Bookkeeping** -- Increment the tick counter and compute the state hash.
//!
//! # Key Types
//!
//! - [`engine::LineEngine`] -- Owns the belt and orchestrates the pipeline.
//! - [`belt::Belt`] -- Ordered cars plus the spacing-constrained advance logic.
//! - [`classify::Classifier`] -- Declarative archetype and paint-target rules.
//! - [`ingest::IngestSender`] / [`ingest::IngestReceiver`] -- The only
//!   shared-state boundary between the bus and the simulation.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic progress.
//! - [`event::EventBuffer`] -- Ring buffer of line events for presentation.

pub mod asset;
pub mod belt;
pub mod classify;
pub mod decode;
pub mod engine;
pub mod event;
pub mod fixed;
pub mod geometry;
pub mod id;
pub mod ingest;
pub mod paint;
pub mod query;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
