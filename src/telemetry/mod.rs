//! Telemetry wire model
//!
//! Snapshots arrive from the producer as JSON text frames with camelCase keys.
//! Every numeric reading is optional: producers omit fields their backend
//! cannot sample and some send explicit `null`s.

mod types;

pub use types::*;
