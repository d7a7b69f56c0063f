//! Bridges a [`SampleSource`] callback onto the shared sample channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::{DropPolicy, Sample, SampleCallback, SampleSource, StreamId};
use tracing::{debug, trace};

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::StreamSample;

/// Adapter owning one registered source
pub struct SourceAdapter {
    source: Box<dyn SampleSource>,
    config: BackpressureConfig,
    listening: Arc<AtomicBool>,
}

impl SourceAdapter {
    pub fn new(source: Box<dyn SampleSource>, config: BackpressureConfig) -> Self {
        Self {
            source,
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stream_id(&self) -> &StreamId {
        self.source.stream_id()
    }

    /// Start forwarding the source's samples
    ///
    /// `rx` is a handle on the same channel, used to evict the oldest queued
    /// sample under [`DropPolicy::DropOldest`].
    pub fn start(
        &self,
        tx: Sender<StreamSample>,
        rx: Receiver<StreamSample>,
        metrics: Arc<IngestionMetrics>,
    ) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let drop_policy = self.config.drop_policy;
        let listening = self.listening.clone();
        debug!(stream_id = %self.stream_id(), "starting source adapter");

        let callback: SampleCallback = Arc::new(move |stream_id: StreamId, sample: Sample| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            metrics.record_received();
            send_sample(
                &tx,
                &rx,
                StreamSample { stream_id, sample },
                &metrics,
                drop_policy,
            );
        });

        self.source.listen(callback);
    }

    pub fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(stream_id = %self.stream_id(), "stopping source adapter");
            self.source.stop();
        }
    }

    /// Started and the source still produces samples
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed) && self.source.is_listening()
    }
}

/// Send one sample, applying the drop policy when the channel is full
pub(crate) fn send_sample(
    tx: &Sender<StreamSample>,
    rx: &Receiver<StreamSample>,
    item: StreamSample,
    metrics: &IngestionMetrics,
    drop_policy: DropPolicy,
) {
    let item = match tx.try_send(item) {
        Ok(()) => {
            metrics.update_queue_len(tx.len());
            return;
        }
        Err(TrySendError::Full(item)) => item,
        Err(TrySendError::Closed(item)) => {
            tracing::warn!(stream_id = %item.stream_id, "sample channel closed");
            return;
        }
    };

    metrics.record_dropped();
    metrics::counter!(
        "activity_monitor_ingestion_dropped_total",
        "stream" => item.stream_id.to_string()
    )
    .increment(1);

    match drop_policy {
        DropPolicy::DropNewest => {
            trace!(stream_id = %item.stream_id, "sample dropped (newest)");
        }
        DropPolicy::DropOldest => {
            let _ = rx.try_recv();
            trace!(stream_id = %item.stream_id, "sample dropped (oldest)");
            if tx.try_send(item).is_err() {
                trace!("channel still full after eviction");
            }
        }
    }
    metrics.update_queue_len(tx.len());
}
