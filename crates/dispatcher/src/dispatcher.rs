//! Dispatcher - main loop fanning results out to sinks

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{ClassificationResult, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builds a [`Dispatcher`] from sink configurations
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<ClassificationResult>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<ClassificationResult>) -> Self {
        Self { config, input_rx }
    }

    /// Create every sink and start its worker
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config)?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    fn initialize_handles(config: &DispatcherConfig) -> Result<Vec<SinkHandle>, DispatcherError> {
        config.sinks.iter().map(create_sink_handle).collect()
    }
}

#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Fans classification results out to sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<ClassificationResult>,
}

impl Dispatcher {
    /// Dispatcher over prebuilt handles
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<ClassificationResult>,
    ) -> Self {
        Self { handles, input_rx }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Consume results until the input closes, then shut every sink down
    ///
    /// Returns the final metrics of each sink.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "dispatcher started");

        let mut result_count: u64 = 0;

        while let Some(result) = self.input_rx.recv().await {
            result_count += 1;
            self.dispatch(&result);

            if result_count.is_multiple_of(100) {
                debug!(results = result_count, "dispatcher progress");
            }
        }

        info!(results = result_count, "dispatcher input closed, shutting down");

        let mut final_metrics = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            let name = handle.name().to_string();
            let metrics = handle.metrics().clone();
            handle.shutdown().await;
            final_metrics.push((name, metrics.snapshot()));
        }

        info!("dispatcher shutdown complete");
        final_metrics
    }

    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }

    fn dispatch(&self, result: &ClassificationResult) {
        for handle in &self.handles {
            handle.try_send(result.clone());
        }
    }
}

/// Dispatcher for the given sink configurations
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<ClassificationResult>,
) -> Result<Dispatcher, DispatcherError> {
    DispatcherBuilder::new(DispatcherConfig { sinks: sink_configs }, input_rx).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10),
        ];

        let dispatcher = Dispatcher::with_handles(handles, input_rx);
        assert_eq!(dispatcher.sink_count(), 2);
        let handle = dispatcher.spawn();

        for i in 0..5 {
            input_tx.send(result("respeck", i)).await.unwrap();
        }
        drop(input_tx);

        let metrics = handle.await.unwrap();
        assert_eq!(metrics.len(), 2);
        for (_, snapshot) in metrics {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.dropped_count, 0);
        }
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let (input_tx, input_rx) = mpsc::channel(10);

        let configs = vec![
            SinkConfig {
                name: "console".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "jsonl".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 50,
                params: HashMap::from([(
                    "path".to_string(),
                    dir.path().display().to_string(),
                )]),
            },
        ];

        let dispatcher = create_dispatcher(configs, input_rx).unwrap();
        let handle = dispatcher.spawn();

        input_tx.send(result("respeck", 0)).await.unwrap();
        input_tx.send(result("thingy", 0)).await.unwrap();
        drop(input_tx);
        handle.await.unwrap();

        assert!(dir.path().join("respeck.jsonl").exists());
        assert!(dir.path().join("thingy.jsonl").exists());
    }

    #[tokio::test]
    async fn test_file_sink_without_path_fails() {
        let (_tx, input_rx) = mpsc::channel(1);
        let configs = vec![SinkConfig {
            name: "jsonl".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 10,
            params: HashMap::new(),
        }];
        let err = create_dispatcher(configs, input_rx).err();
        assert!(matches!(err, Some(DispatcherError::SinkCreation { .. })));
    }
}
