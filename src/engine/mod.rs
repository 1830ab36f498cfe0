//! Telemetry engine
//!
//! Plain state owner that folds accepted frames into the history store and
//! the fleet aggregate. Observers subscribe to an [`EngineView`] published
//! after every accepted snapshot; nothing here knows how the view is drawn.

mod view;

pub use view::{EngineView, IngestStats};

use crate::aggregate::{AggregateComputer, FleetAggregate};
use crate::history::{HistoryStore, SeriesKey};
use crate::stream::PayloadDeduplicator;
use crate::telemetry::TelemetrySnapshot;
use std::sync::Arc;
use tokio::sync::watch;

/// What happened to one raw frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Parsed and folded into history and aggregates
    Accepted,
    /// Identical to the previous frame; nothing changed
    Duplicate,
    /// Failed to parse; nothing changed
    Malformed(String),
}

/// Owns dedup, history, aggregates and the latest accepted snapshot.
pub struct TelemetryEngine {
    dedup: PayloadDeduplicator,
    history: HistoryStore,
    aggregates: AggregateComputer,
    latest: Option<Arc<TelemetrySnapshot>>,
    stats: IngestStats,
    view: watch::Sender<Arc<EngineView>>,
    log_frames: bool,
}

impl TelemetryEngine {
    pub fn new() -> Self {
        Self::with_history(HistoryStore::new())
    }

    pub fn with_history(history: HistoryStore) -> Self {
        let (view, _) = watch::channel(Arc::new(EngineView::default()));
        Self {
            dedup: PayloadDeduplicator::new(),
            history,
            aggregates: AggregateComputer::new(),
            latest: None,
            stats: IngestStats::default(),
            view,
            log_frames: false,
        }
    }

    /// Trace every admitted raw frame.
    pub fn with_frame_logging(mut self, enabled: bool) -> Self {
        self.log_frames = enabled;
        self
    }

    /// Subscribe to views published after each accepted snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EngineView>> {
        self.view.subscribe()
    }

    /// Handle one raw text frame from the producer.
    ///
    /// Duplicates are dropped before parsing. Malformed frames are logged and
    /// dropped; neither touches history, aggregates or observers.
    pub fn ingest_frame(&mut self, raw: &str) -> FrameOutcome {
        if !self.dedup.admit(raw) {
            self.stats.duplicates += 1;
            metrics::counter!("observatory_frames_total", "outcome" => "duplicate").increment(1);
            tracing::trace!("Dropped duplicate frame");
            return FrameOutcome::Duplicate;
        }

        if self.log_frames {
            tracing::trace!(frame = raw, "Received frame");
        }

        match TelemetrySnapshot::from_frame(raw) {
            Ok(snapshot) => {
                self.apply(snapshot);
                FrameOutcome::Accepted
            }
            Err(e) => {
                self.stats.malformed += 1;
                metrics::counter!("observatory_frames_total", "outcome" => "malformed").increment(1);
                tracing::warn!(error = %e, bytes = raw.len(), "Failed to parse telemetry payload");
                FrameOutcome::Malformed(e.to_string())
            }
        }
    }

    /// Fold a parsed snapshot into history and aggregates and notify
    /// observers.
    pub fn apply(&mut self, snapshot: TelemetrySnapshot) {
        self.history.update(&snapshot);
        let aggregate = self.aggregates.recompute(&snapshot);
        self.stats.accepted += 1;
        metrics::counter!("observatory_frames_total", "outcome" => "accepted").increment(1);

        tracing::debug!(
            timestamp = %snapshot.timestamp,
            gpus = aggregate.gpu_count,
            avg_utilization = aggregate.average_utilization,
            "Accepted snapshot"
        );

        self.latest = Some(Arc::new(snapshot));
        self.publish();
    }

    fn publish(&self) {
        let view = EngineView {
            latest: self.latest.clone(),
            aggregate: self.aggregates.current(),
            history: self.history.export(),
            stats: self.stats,
        };
        // Replace even without subscribers so late subscribers see it
        self.view.send_replace(Arc::new(view));
    }

    pub fn latest(&self) -> Option<&TelemetrySnapshot> {
        self.latest.as_deref()
    }

    pub fn aggregate(&self) -> FleetAggregate {
        self.aggregates.current()
    }

    /// Samples for `key`, empty when unknown.
    pub fn series(&self, key: SeriesKey) -> Vec<f64> {
        self.history.series(key)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}

impl Default for TelemetryEngine {
    fn default() -> Self {
        Self::new()
    }
}
