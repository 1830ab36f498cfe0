//! Connector that streams generated snapshots

use super::SyntheticGenerator;
use crate::stream::{Connector, FrameStream, StreamError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Pseudo endpoint reported for synthetic connections.
pub const SYNTHETIC_ENDPOINT: &str = "synthetic://generator";

/// Replaces the live producer with a [`SyntheticGenerator`] ticking on a
/// fixed cadence.
///
/// The generator is shared across connections, so a reconnect continues the
/// same fleet rather than materializing a new one.
#[derive(Clone)]
pub struct SyntheticConnector {
    generator: Arc<Mutex<SyntheticGenerator>>,
    device_count: usize,
    interval: Duration,
}

impl SyntheticConnector {
    pub fn new(generator: SyntheticGenerator, device_count: usize, interval: Duration) -> Self {
        Self {
            generator: Arc::new(Mutex::new(generator)),
            device_count,
            interval,
        }
    }

    /// Build from configuration, honoring an optional fixed seed.
    pub fn from_config(config: &crate::config::SyntheticConfig) -> Self {
        let generator = match config.seed {
            Some(seed) => SyntheticGenerator::with_seed(seed),
            None => SyntheticGenerator::new(),
        };
        Self::new(generator, config.device_count, config.interval())
    }
}

#[async_trait]
impl Connector for SyntheticConnector {
    async fn connect(&self, _endpoint: &str) -> Result<FrameStream, StreamError> {
        let generator = Arc::clone(&self.generator);
        let device_count = self.device_count;
        let interval = self.interval;

        let frames = async_stream::stream! {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let snapshot = {
                    let mut generator = generator
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    generator.next_snapshot(device_count)
                };
                yield snapshot
                    .to_frame()
                    .map_err(|e| StreamError::Encode(e.to_string()));
            }
        };

        Ok(Box::pin(frames))
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
