//! Synthetic telemetry for offline and test use
//!
//! [`SyntheticGenerator`] materializes a fleet once and then only redraws
//! volatile readings, so series keyed by device id keep accumulating instead
//! of starting over with every snapshot. [`SyntheticConnector`] plugs the
//! generator into the connection manager in place of a live producer.

mod connector;
mod generator;

pub use connector::{SyntheticConnector, SYNTHETIC_ENDPOINT};
pub use generator::{SyntheticGenerator, DEFAULT_DEVICE_COUNT};
