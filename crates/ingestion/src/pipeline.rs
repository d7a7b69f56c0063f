//! Ingestion pipeline main entry

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{SampleSource, StreamId};
use tracing::{debug, info, instrument};

use crate::adapter::SourceAdapter;
use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::StreamSample;

/// Ingestion pipeline
///
/// Owns one adapter per stream and merges their samples into a single
/// bounded channel.
pub struct IngestionPipeline {
    adapters: HashMap<StreamId, SourceAdapter>,

    metrics: Arc<IngestionMetrics>,

    /// Shared by all adapters
    tx: Sender<StreamSample>,

    /// Handed out once to the consumer
    rx: Option<Receiver<StreamSample>>,

    /// Kept for drop-oldest eviction
    evict_rx: Receiver<StreamSample>,

    config: BackpressureConfig,
}

impl IngestionPipeline {
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            evict_rx: rx.clone(),
            rx: Some(rx),
            config,
        }
    }

    /// Register the source of one stream
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source),
        fields(stream_id = %source.stream_id())
    )]
    pub fn register_source(&mut self, source: Box<dyn SampleSource>) -> Result<()> {
        let stream_id = source.stream_id().clone();
        if self.adapters.contains_key(&stream_id) {
            return Err(IngestionError::DuplicateStream {
                stream_id: stream_id.to_string(),
            });
        }
        let adapter = SourceAdapter::new(source, self.config.clone());
        debug!(stream_id = %stream_id, "registered sample source");
        self.adapters.insert(stream_id, adapter);
        Ok(())
    }

    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all sample sources");
        for adapter in self.adapters.values() {
            adapter.start(self.tx.clone(), self.evict_rx.clone(), self.metrics.clone());
        }
    }

    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all sample sources");
        for adapter in self.adapters.values() {
            adapter.stop();
        }
    }

    /// Sample stream receiver
    ///
    /// Can only be taken once.
    pub fn take_receiver(&mut self) -> Option<Receiver<StreamSample>> {
        self.rx.take()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = &StreamId> {
        self.adapters.keys()
    }

    pub fn is_listening(&self, stream_id: &str) -> bool {
        self.adapters
            .get(stream_id)
            .map(SourceAdapter::is_listening)
            .unwrap_or(false)
    }

    /// No source produces samples anymore
    pub fn all_finished(&self) -> bool {
        self.adapters.values().all(|adapter| !adapter.is_listening())
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
