//! Raw-frame deduplication.

/// Drops a frame that is byte-identical to the one before it.
///
/// Comparison happens on the raw text, before parsing, so heartbeat frames
/// carrying unchanged content never reach the history or aggregates. The
/// remembered frame is updated for every admitted frame, malformed or not.
#[derive(Debug, Default)]
pub struct PayloadDeduplicator {
    last_frame: Option<String>,
}

impl PayloadDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `raw` equals the previously admitted frame.
    pub fn is_duplicate(&self, raw: &str) -> bool {
        self.last_frame.as_deref() == Some(raw)
    }

    /// Admit `raw` if it carries new content. Returns false for duplicates.
    pub fn admit(&mut self, raw: &str) -> bool {
        if self.is_duplicate(raw) {
            return false;
        }
        self.last_frame = Some(raw.to_owned());
        true
    }

    /// Forget the remembered frame.
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}
