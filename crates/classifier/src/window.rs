//! Fixed-capacity window of samples with overlap-aware rollover.

use std::fmt;

use contracts::{Sample, WindowConfig, WindowLayout};
use ringbuf::{traits::*, HeapRb};

/// Sliding window over one stream
///
/// Holds at most `length` samples. When a window closes, [`rollover`]
/// keeps the newest `retain` samples as the seed of the next window.
///
/// [`rollover`]: WindowBuffer::rollover
pub struct WindowBuffer {
    samples: HeapRb<Sample>,
    length: usize,
    retain: usize,
    segments: usize,
    /// Samples carried over from the previous window
    carried: usize,
}

impl fmt::Debug for WindowBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowBuffer")
            .field("len", &self.samples.occupied_len())
            .field("length", &self.length)
            .field("retain", &self.retain)
            .field("segments", &self.segments)
            .finish()
    }
}

impl WindowBuffer {
    /// Create an empty window
    ///
    /// A zero length is raised to one sample and `retain` is capped so each
    /// window needs at least two new samples; validated configs never hit
    /// either case.
    pub fn new(config: &WindowConfig) -> Self {
        let length = config.length.max(1);
        Self {
            samples: HeapRb::new(length),
            length,
            retain: config.retain.min(length.saturating_sub(2)),
            segments: config.segments.max(1),
            carried: 0,
        }
    }

    /// Append one sample
    ///
    /// Callers check [`is_full`](Self::is_full) first. Pushing into a full
    /// window drops its oldest sample so the length never exceeds `W`.
    #[inline]
    pub fn push(&mut self, sample: Sample) {
        if self.samples.push_overwrite(sample).is_some() {
            self.carried = self.carried.saturating_sub(1);
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Window capacity (`W`)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.length
    }

    pub fn layout(&self) -> WindowLayout {
        WindowLayout::new(self.segments, self.length / self.segments)
    }

    /// Samples in chronological order
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Samples pushed since the last rollover
    pub fn fresh(&self) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter().skip(self.carried)
    }

    /// Timestamp of the newest sample
    pub fn newest_timestamp(&self) -> Option<f64> {
        self.samples.iter().last().map(|s| s.timestamp)
    }

    /// Keep the newest `retain` samples and discard the rest
    pub fn rollover(&mut self) {
        let discard = self.len().saturating_sub(self.retain);
        for _ in 0..discard {
            let _ = self.samples.try_pop();
        }
        self.carried = self.len();
    }
}
