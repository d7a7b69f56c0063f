//! Backpressure configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub use contracts::DropPolicy;
use contracts::IngestionSettings;

/// Backpressure configuration
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    pub channel_capacity: usize,

    /// What to drop when the channel is full
    pub drop_policy: DropPolicy,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1000,
            drop_policy: DropPolicy::DropOldest,
        }
    }
}

impl BackpressureConfig {
    pub fn new(channel_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            channel_capacity,
            drop_policy,
        }
    }
}

impl From<&IngestionSettings> for BackpressureConfig {
    fn from(settings: &IngestionSettings) -> Self {
        Self::new(settings.channel_capacity, settings.drop_policy)
    }
}

/// Ingestion counters shared by every source
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    pub samples_received: AtomicU64,
    pub samples_dropped: AtomicU64,
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.samples_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`IngestionMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_received: u64,
    pub samples_dropped: u64,
    pub queue_len: usize,
}
