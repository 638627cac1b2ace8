// SampleBuffer - bounded, ordered capture buffer
//
// Append-only ring over normalized samples: once capacity is exceeded
// the oldest sample evicts first. Owned exclusively by the active
// session; cleared at session start and frozen into the outcome at
// completion.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::signal::Sample;

/// Export form of a captured sample: timestamp rounded to integer
/// milliseconds for the downstream analysis payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub timestamp: i64,
}

impl From<&Sample> for SamplePoint {
    fn from(sample: &Sample) -> Self {
        Self {
            ax: sample.ax,
            ay: sample.ay,
            az: sample.az,
            timestamp: sample.timestamp.round() as i64,
        }
    }
}

/// Bounded ordered sequence of normalized samples (ring semantics).
#[derive(Debug)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SampleBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, evicting the oldest once capacity is exceeded.
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the most recent sample, if any.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.samples.back().map(|s| s.timestamp)
    }

    /// Freeze the contents into the export form, oldest first.
    pub fn export(&self) -> Vec<SamplePoint> {
        self.samples.iter().map(SamplePoint::from).collect()
    }

    /// Discard all samples for a fresh session.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
