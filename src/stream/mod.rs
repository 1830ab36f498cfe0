//! Live telemetry stream
//!
//! This module owns the single logical connection to the producer: the
//! connection status state machine, the reconnect timer, the transport seam
//! ([`Connector`]) and the raw-frame deduplicator that sits in front of the
//! engine.

mod dedup;
mod endpoint;
mod error;
mod manager;
mod state;
mod transport;

pub use dedup::*;
pub use endpoint::*;
pub use error::*;
pub use manager::*;
pub use state::*;
pub use transport::*;
