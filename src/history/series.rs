//! Fixed-capacity ring buffer of numeric samples

use std::collections::VecDeque;

/// Bounded FIFO of samples for one (entity, metric) pair.
///
/// Insertion order is the only order; once full, every push evicts the
/// oldest sample.
#[derive(Debug, Clone)]
pub struct HistorySeries {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistorySeries {
    /// Creates an empty series holding at most `capacity` samples
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest if at capacity
    pub fn push(&mut self, sample: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Returns all samples in insertion order (oldest first)
    pub fn get_all(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of samples currently stored
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the series is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
