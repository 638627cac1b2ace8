// TimestampNormalizer - duplicate sensor timestamp repair
//
// Mobile motion APIs commonly deliver several readings under one coarse
// timestamp tick. Downstream rate/interval math needs unique, ordered
// timestamps, so readings that share a timestamp are held back and
// linearly redistributed across the gap to the next distinct timestamp,
// preserving arrival order.

use serde::{Deserialize, Serialize};

use crate::sensor::RawMotionEvent;

/// One accelerometer reading with a unique, time-ordered timestamp.
///
/// `az` is the chest-normal axis used for beat detection; `timestamp`
/// is monotonic device time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    pub timestamp: f64,
}

impl From<RawMotionEvent> for Sample {
    fn from(event: RawMotionEvent) -> Self {
        Self {
            ax: event.ax,
            ay: event.ay,
            az: event.az,
            timestamp: event.timestamp,
        }
    }
}

/// Streaming stage that guarantees strictly increasing output timestamps.
///
/// Events arriving with a timestamp equal to the last distinct one are
/// buffered; when the next distinct timestamp arrives the buffered group
/// is interpolated strictly between the two and flushed in arrival
/// order. A deterministic transform: it never errors and never drops a
/// sample.
#[derive(Debug, Default)]
pub struct TimestampNormalizer {
    last_unique_timestamp: Option<f64>,
    pending: Vec<RawMotionEvent>,
}

impl TimestampNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw event; returns the samples released by it, in order.
    ///
    /// The very first event seeds the normalizer and is emitted
    /// uncorrected. An event repeating the last distinct timestamp is
    /// held back and emits nothing yet; a new distinct timestamp first
    /// releases any held group with interpolated timestamps, then the
    /// event itself.
    pub fn push(&mut self, event: RawMotionEvent) -> Vec<Sample> {
        let last = match self.last_unique_timestamp {
            None => {
                self.last_unique_timestamp = Some(event.timestamp);
                return vec![Sample::from(event)];
            }
            Some(last) => last,
        };

        if event.timestamp == last {
            self.pending.push(event);
            return Vec::new();
        }

        let mut emitted = Vec::with_capacity(self.pending.len() + 1);
        if !self.pending.is_empty() {
            let span = event.timestamp - last;
            let n = self.pending.len();
            for (i, held) in self.pending.drain(..).enumerate() {
                let corrected = last + span * (i + 1) as f64 / (n + 1) as f64;
                emitted.push(Sample {
                    ax: held.ax,
                    ay: held.ay,
                    az: held.az,
                    timestamp: corrected,
                });
            }
        }
        self.last_unique_timestamp = Some(event.timestamp);
        emitted.push(Sample::from(event));
        emitted
    }

    /// Release any held duplicate group at session teardown.
    ///
    /// A group still pending at the end of a capture has no next
    /// distinct timestamp to interpolate toward; entries are emitted at
    /// 1 ms spacing past the last distinct timestamp so the capture
    /// never silently loses trailing samples. Ordering stays strictly
    /// increasing.
    pub fn flush(&mut self) -> Vec<Sample> {
        let last = match self.last_unique_timestamp {
            Some(last) => last,
            None => return Vec::new(),
        };

        let mut emitted = Vec::with_capacity(self.pending.len());
        for (i, held) in self.pending.drain(..).enumerate() {
            let corrected = last + (i + 1) as f64;
            emitted.push(Sample {
                ax: held.ax,
                ay: held.ay,
                az: held.az,
                timestamp: corrected,
            });
        }
        if let Some(tail) = emitted.last() {
            self.last_unique_timestamp = Some(tail.timestamp);
        }
        emitted
    }

    /// Number of events currently held awaiting a distinct timestamp.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Reset to the pristine state for a fresh session.
    pub fn reset(&mut self) {
        self.last_unique_timestamp = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp: f64) -> RawMotionEvent {
        RawMotionEvent {
            ax: 0.1,
            ay: 0.2,
            az: 9.8,
            timestamp,
        }
    }

    fn feed(normalizer: &mut TimestampNormalizer, timestamps: &[f64]) -> Vec<Sample> {
        let mut out = Vec::new();
        for &t in timestamps {
            out.extend(normalizer.push(event(t)));
        }
        out
    }

    #[test]
    fn test_unique_input_passes_through_unchanged() {
        let mut normalizer = TimestampNormalizer::new();
        let input = [0.0, 10.0, 20.0, 30.0, 40.0];
        let out = feed(&mut normalizer, &input);

        assert_eq!(out.len(), input.len());
        for (sample, &t) in out.iter().zip(input.iter()) {
            assert_eq!(sample.timestamp, t);
        }
    }

    #[test]
    fn test_duplicates_interpolate_across_gap() {
        let mut normalizer = TimestampNormalizer::new();
        // Three samples share t=100, next distinct at t=140
        let out = feed(&mut normalizer, &[100.0, 100.0, 100.0, 100.0, 140.0]);

        assert_eq!(out.len(), 5);
        // k = 3 held samples over span 40: corrected at 110, 120, 130
        assert_eq!(out[0].timestamp, 100.0);
        assert_eq!(out[1].timestamp, 110.0);
        assert_eq!(out[2].timestamp, 120.0);
        assert_eq!(out[3].timestamp, 130.0);
        assert_eq!(out[4].timestamp, 140.0);
    }

    #[test]
    fn test_output_strictly_increasing_with_duplicates() {
        let mut normalizer = TimestampNormalizer::new();
        let input = [
            0.0, 10.0, 10.0, 10.0, 20.0, 20.0, 30.0, 40.0, 40.0, 50.0,
        ];
        let out = feed(&mut normalizer, &input);

        assert_eq!(out.len(), input.len());
        for pair in out.windows(2) {
            assert!(
                pair[1].timestamp > pair[0].timestamp,
                "timestamps must be strictly increasing: {} then {}",
                pair[0].timestamp,
                pair[1].timestamp
            );
        }
    }

    #[test]
    fn test_corrected_timestamps_stay_inside_gap() {
        let mut normalizer = TimestampNormalizer::new();
        let out = feed(&mut normalizer, &[100.0, 100.0, 100.0, 200.0]);

        for sample in &out[1..out.len() - 1] {
            assert!(sample.timestamp > 100.0 && sample.timestamp < 200.0);
        }
    }

    #[test]
    fn test_duplicates_emit_in_arrival_order() {
        let mut normalizer = TimestampNormalizer::new();
        normalizer.push(event(10.0));
        let mut first = event(10.0);
        first.az = 1.0;
        let mut second = event(10.0);
        second.az = 2.0;
        normalizer.push(first);
        normalizer.push(second);

        let out = normalizer.push(event(40.0));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].az, 1.0);
        assert_eq!(out[1].az, 2.0);
        assert_eq!(out[2].az, 9.8);
    }

    #[test]
    fn test_first_event_seeds_without_correction() {
        let mut normalizer = TimestampNormalizer::new();
        let out = normalizer.push(event(0.0));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].timestamp, 0.0);
        assert_eq!(normalizer.pending_len(), 0);
    }

    #[test]
    fn test_flush_releases_pending_in_order() {
        let mut normalizer = TimestampNormalizer::new();
        feed(&mut normalizer, &[100.0, 100.0, 100.0]);
        assert_eq!(normalizer.pending_len(), 2);

        let out = normalizer.flush();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, 101.0);
        assert_eq!(out[1].timestamp, 102.0);
        assert_eq!(normalizer.pending_len(), 0);
    }

    #[test]
    fn test_flush_on_empty_pending_is_noop() {
        let mut normalizer = TimestampNormalizer::new();
        feed(&mut normalizer, &[100.0, 110.0]);
        assert!(normalizer.flush().is_empty());
    }

    #[test]
    fn test_reset_clears_state() {
        let mut normalizer = TimestampNormalizer::new();
        feed(&mut normalizer, &[100.0, 100.0]);
        normalizer.reset();

        assert_eq!(normalizer.pending_len(), 0);
        // First event after reset seeds again even at a repeated value
        let out = normalizer.push(event(100.0));
        assert_eq!(out.len(), 1);
    }
}
