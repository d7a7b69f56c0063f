//! Pipeline orchestrator - wires sources, engines and sinks together.
//!
//! Samples from every stream arrive on one channel and are processed on a
//! single task; each stream keeps its own engine.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use classifier::SessionSet;
use contracts::{ClassificationResult, MonitorConfig, SampleSource, StreamConfig};
use inference::{load_engine, ModelSlot};
use ingestion::{
    BackpressureConfig, IngestionPipeline, MockSampleSource, MockSourceConfig, MotionProfile,
    ReplayConfig, ReplaySource, ScriptStep, StreamSample,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Recorded input
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub config: MonitorConfig,

    /// Replay a recording; mock sources otherwise
    pub replay: Option<ReplayOptions>,

    pub speed: f64,

    pub loop_playback: bool,

    /// Pace sources at their sample rate
    pub realtime: bool,

    /// Stop after this many results
    pub max_results: Option<u64>,

    pub timeout: Option<Duration>,

    /// Result channel size
    pub buffer_size: usize,

    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    /// Run until the sources finish, a limit is hit or every stream aborts
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let config = &self.options.config;

        if let Some(port) = self.options.metrics_port {
            observability::init_metrics_only(port)?;
        }

        // Engines
        let mut sessions = build_sessions(config)?;

        // Sources
        let mut ingestion =
            IngestionPipeline::with_config(BackpressureConfig::from(&config.ingestion));
        for (index, stream) in config.streams.iter().enumerate() {
            match self.build_source(stream, index) {
                Ok(source) => ingestion
                    .register_source(source)
                    .with_context(|| format!("Failed to register stream '{}'", stream.id))?,
                Err(e) => warn!(stream_id = %stream.id, error = %e, "No source for stream"),
            }
        }
        if ingestion.source_count() == 0 {
            return Err(CliError::no_sources("every stream failed to open its source").into());
        }
        let active_streams = ingestion.source_count();

        // Dispatcher
        let (result_tx, result_rx) =
            mpsc::channel::<ClassificationResult>(self.options.buffer_size.max(1));
        if config.sinks.is_empty() {
            warn!("No sinks configured - results will only be counted");
        }
        let dispatcher = dispatcher::create_dispatcher(config.sinks.clone(), result_rx)
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        // Run
        let samples = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;
        ingestion.start_all();
        info!(
            streams = active_streams,
            max_results = ?self.options.max_results,
            replay = self.options.replay.is_some(),
            "Pipeline running"
        );

        let mut stats = PipelineStats {
            active_streams,
            ..Default::default()
        };
        let deadline = self
            .options
            .timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);
        let mut idle_check = tokio::time::interval(Duration::from_millis(50));
        let mut aborted: HashSet<String> = HashSet::new();

        loop {
            tokio::select! {
                received = samples.recv() => {
                    let Ok(item) = received else {
                        debug!("Sample channel closed");
                        break;
                    };
                    let flow = self
                        .process(&mut sessions, item, &result_tx, &mut stats, &mut aborted)
                        .await;
                    if flow.is_break() {
                        break;
                    }
                }
                _ = idle_check.tick() => {
                    observability::record_queue_depth(samples.len());
                    if ingestion.all_finished() && samples.is_empty() {
                        info!("All sources finished");
                        break;
                    }
                }
                _ = sleep_until(deadline) => {
                    warn!(timeout_secs = ?self.options.timeout.map(|t| t.as_secs()), "Pipeline timed out");
                    break;
                }
            }
        }

        // Shutdown
        info!("Shutting down pipeline...");
        ingestion.stop_all();
        stats.samples_dropped = ingestion.metrics().snapshot().samples_dropped;
        drop(result_tx);

        match tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await {
            Ok(Ok(sinks)) => stats.sinks = sinks,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!("Dispatcher did not drain in time"),
        }

        stats.duration = start_time.elapsed();
        stats.aborted_streams = aborted.into_iter().collect();
        stats.aborted_streams.sort();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            results = stats.results,
            "Pipeline shutdown complete"
        );

        if !stats.aborted_streams.is_empty() && stats.aborted_streams.len() == active_streams {
            return Err(CliError::AllStreamsAborted {
                streams: stats.aborted_streams.join(", "),
            }
            .into());
        }
        Ok(stats)
    }

    /// Feed one sample to its engine and forward any result
    async fn process(
        &self,
        sessions: &mut SessionSet<ModelSlot>,
        item: StreamSample,
        result_tx: &mpsc::Sender<ClassificationResult>,
        stats: &mut PipelineStats,
        aborted: &mut HashSet<String>,
    ) -> std::ops::ControlFlow<()> {
        use std::ops::ControlFlow;

        stats.samples_processed += 1;
        observability::record_sample_received(&item.stream_id);

        if aborted.contains(item.stream_id.as_str()) {
            stats.samples_rejected += 1;
            return ControlFlow::Continue(());
        }

        match sessions.submit(&item.stream_id, item.sample) {
            Ok(Some(result)) => {
                stats.results += 1;
                observability::record_result(&result);
                stats.classification.update(&result);
                info!(
                    stream_id = %result.stream_id,
                    window = result.window_index,
                    steps = ?result.step_count,
                    "{}",
                    result.display_text()
                );

                let sent = result_tx.send(result).await.is_ok();
                observability::record_result_dispatched(sent);
                if !sent {
                    warn!("Dispatcher channel closed");
                    return ControlFlow::Break(());
                }

                if let Some(max) = self.options.max_results {
                    if stats.results >= max {
                        info!(results = stats.results, "Reached max results limit");
                        return ControlFlow::Break(());
                    }
                }
            }
            Ok(None) => {}
            Err(e) if e.is_inference() => {
                stats.inference_failures += 1;
                stats.classification.record_failure(&item.stream_id);
                let limit_reached = sessions
                    .get(&item.stream_id)
                    .is_some_and(|engine| engine.failure_limit_reached());
                if limit_reached {
                    error!(
                        stream_id = %item.stream_id,
                        error = %e,
                        "Too many consecutive inference failures, aborting stream"
                    );
                    sessions.remove(&item.stream_id);
                    aborted.insert(item.stream_id.to_string());
                    if sessions.is_empty() {
                        return ControlFlow::Break(());
                    }
                }
            }
            Err(e) => {
                stats.samples_rejected += 1;
                debug!(stream_id = %item.stream_id, kind = e.kind(), error = %e, "Sample rejected");
            }
        }
        ControlFlow::Continue(())
    }

    fn build_source(&self, stream: &StreamConfig, index: usize) -> Result<Box<dyn SampleSource>> {
        match &self.options.replay {
            Some(replay) => {
                let source = ReplaySource::load(
                    &replay.path,
                    stream.id.clone(),
                    ReplayConfig {
                        speed_multiplier: self.options.speed,
                        loop_playback: self.options.loop_playback,
                        realtime: self.options.realtime,
                    },
                )?;
                info!(
                    stream_id = %stream.id,
                    samples = source.len(),
                    duration_secs = source.duration(),
                    "Replaying recording"
                );
                Ok(Box::new(source))
            }
            None => {
                info!(stream_id = %stream.id, sensor = stream.sensor.as_str(), "Generating mock samples");
                Ok(Box::new(MockSampleSource::new(
                    stream.id.clone(),
                    MockSourceConfig {
                        sample_rate_hz: stream.sample_rate_hz,
                        script: mock_script(index),
                        realtime: self.options.realtime,
                        speed_multiplier: self.options.speed,
                        loop_script: self.options.loop_playback,
                        ..Default::default()
                    },
                )))
            }
        }
    }
}

/// One engine per stream, each holding its model in a slot
///
/// A stream whose model fails to load keeps an empty slot: its windows report
/// the model unavailable until the stream hits its failure limit.
fn build_sessions(config: &MonitorConfig) -> Result<SessionSet<ModelSlot>> {
    let mut loaded = 0;
    let sessions = SessionSet::from_config(config, |stream| {
        let mut slot = ModelSlot::empty();
        match load_engine(&config.model, &config.pipeline_for(stream)) {
            Ok(engine) => {
                slot.install(engine);
                loaded += 1;
            }
            Err(e) => error!(stream_id = %stream.id, error = %e, "Model not loaded for stream"),
        }
        Ok(slot)
    })
    .context("Failed to build classification engines")?;

    if loaded == 0 {
        return Err(CliError::model_unavailable(format!(
            "no stream could load the {:?} model",
            config.model.kind
        ))
        .into());
    }
    info!(
        streams = sessions.len(),
        loaded,
        model = ?config.model.kind,
        "Classification engines ready"
    );
    Ok(sessions)
}

/// Every motion profile for 10 s, rotated so streams differ
fn mock_script(index: usize) -> Vec<ScriptStep> {
    let mut profiles = MotionProfile::ALL.to_vec();
    let len = profiles.len();
    profiles.rotate_left(index % len);
    profiles
        .into_iter()
        .map(|profile| ScriptStep::new(profile, 10.0))
        .collect()
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
