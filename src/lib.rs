//! Observatory - live GPU and host telemetry client
//!
//! Connects to a telemetry producer over WebSocket (or a local synthetic
//! generator), keeps the connection alive with automatic reconnection, drops
//! repeated frames, and folds every accepted snapshot into bounded chart
//! history and fleet-wide aggregates.

pub mod aggregate;
pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod history;
pub mod logging;
pub mod preferences;
pub mod stream;
pub mod synthetic;
pub mod telemetry;
