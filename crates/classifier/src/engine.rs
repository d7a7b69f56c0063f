//! Per-stream classification engine.

use std::fmt;
use std::time::Instant;

use contracts::{
    ClassificationResult, ContractError, IconTag, InferenceEngine, InferenceError,
    LabelDistribution, PipelineConfig, Sample, StepMode, StreamId, TopClass,
};
use tracing::instrument;

use crate::refine::PostClassifier;
use crate::step_counter::StepCounter;
use crate::window::WindowBuffer;

/// Window buffer, model, refinement and step counter of one stream
///
/// Single writer: all calls come from the stream's worker. Two streams use
/// two engines and share nothing.
pub struct ClassificationEngine<E> {
    stream_id: StreamId,
    config: PipelineConfig,
    buffer: WindowBuffer,
    refiner: PostClassifier,
    steps: StepCounter,
    model: E,
    window_index: u64,
    consecutive_failures: u32,
    last_timestamp: Option<f64>,
}

impl<E: InferenceEngine> fmt::Debug for ClassificationEngine<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationEngine")
            .field("stream_id", &self.stream_id)
            .field("model", &self.model.name())
            .field("buffer", &self.buffer)
            .field("window_index", &self.window_index)
            .field("consecutive_failures", &self.consecutive_failures)
            .field("step_count", &self.steps.step_count())
            .finish()
    }
}

impl<E: InferenceEngine> ClassificationEngine<E> {
    pub fn new(stream_id: impl Into<StreamId>, config: PipelineConfig, model: E) -> Self {
        Self {
            stream_id: stream_id.into(),
            buffer: WindowBuffer::new(&config.window),
            refiner: PostClassifier::from_pipeline(&config),
            steps: StepCounter::new(config.steps.clone()),
            config,
            model,
            window_index: 0,
            consecutive_failures: 0,
            last_timestamp: None,
        }
    }

    /// Push one sample, evaluating the window once it is full
    ///
    /// Returns `Ok(Some(_))` on an evaluation boundary. After a failed
    /// evaluation the full window is kept and retried before the next sample
    /// is buffered; while the retry keeps failing, incoming samples are not
    /// buffered.
    #[instrument(
        level = "trace",
        name = "classification_engine_submit",
        skip(self, sample),
        fields(stream_id = %self.stream_id, timestamp = sample.timestamp)
    )]
    pub fn submit(&mut self, sample: Sample) -> Result<Option<ClassificationResult>, ContractError> {
        self.check_order(&sample)?;

        if self.buffer.is_full() {
            tracing::debug!(
                stream_id = %self.stream_id,
                failures = self.consecutive_failures,
                "retrying pending window"
            );
            let result = self.evaluate()?;
            self.accept(sample);
            return Ok(Some(result));
        }

        self.accept(sample);
        if self.buffer.is_full() {
            self.evaluate().map(Some)
        } else {
            Ok(None)
        }
    }

    fn check_order(&self, sample: &Sample) -> Result<(), ContractError> {
        if !self.config.engine.reject_out_of_order {
            return Ok(());
        }
        match self.last_timestamp {
            Some(last) if sample.timestamp < last => {
                metrics::counter!(
                    "activity_monitor_out_of_order_total",
                    "stream" => self.stream_id.to_string()
                )
                .increment(1);
                Err(ContractError::OutOfOrderSample {
                    stream_id: self.stream_id.clone(),
                    timestamp: sample.timestamp,
                    last_timestamp: last,
                })
            }
            _ => Ok(()),
        }
    }

    fn accept(&mut self, sample: Sample) {
        self.last_timestamp = Some(sample.timestamp);
        self.buffer.push(sample);
        metrics::counter!(
            "activity_monitor_samples_total",
            "stream" => self.stream_id.to_string()
        )
        .increment(1);
    }

    /// Run the model on the full window, refine and roll over
    ///
    /// The window is left untouched on failure.
    #[instrument(
        level = "debug",
        name = "classification_engine_evaluate",
        skip(self),
        fields(stream_id = %self.stream_id, window_index = self.window_index)
    )]
    fn evaluate(&mut self) -> Result<ClassificationResult, ContractError> {
        let window = self.buffer.snapshot();
        let layout = self.buffer.layout();

        let started = Instant::now();
        let outcome = self.model.run(&window, layout);
        metrics::histogram!("activity_monitor_inference_latency_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let (distribution, top_class) = match outcome
            .map_err(ContractError::from)
            .and_then(|distribution| {
                let top = select_top_class(&distribution)?;
                Ok((distribution, top))
            }) {
            Ok(ok) => ok,
            Err(err) => return Err(self.record_failure(err)),
        };

        let refined = self.refiner.refine(&window, top_class);
        let step_count = self.count_steps(top_class);

        let result = ClassificationResult {
            stream_id: self.stream_id.clone(),
            window_index: self.window_index,
            timestamp: self.buffer.newest_timestamp().unwrap_or_default(),
            top_class,
            refined,
            icon: IconTag::for_top_class(top_class),
            distribution,
            step_count,
        };

        self.buffer.rollover();
        self.window_index += 1;
        self.consecutive_failures = 0;

        metrics::counter!(
            "activity_monitor_windows_total",
            "stream" => self.stream_id.to_string(),
            "top_class" => top_class.key()
        )
        .increment(1);
        metrics::counter!(
            "activity_monitor_refined_total",
            "stream" => self.stream_id.to_string(),
            "label" => refined.text()
        )
        .increment(1);
        tracing::debug!(
            stream_id = %self.stream_id,
            window_index = result.window_index,
            top_class = top_class.key(),
            refined = refined.text(),
            "window classified"
        );

        Ok(result)
    }

    /// Feed the window's new samples to the step counter for locomotion
    /// classes
    fn count_steps(&mut self, top_class: TopClass) -> Option<u64> {
        let mode = top_class.class().and_then(StepMode::for_class)?;
        for sample in self.buffer.fresh() {
            self.steps.update(&sample.accel, mode);
        }
        let total = self.steps.step_count();
        metrics::gauge!(
            "activity_monitor_step_count",
            "stream" => self.stream_id.to_string()
        )
        .set(total as f64);
        Some(total)
    }

    fn record_failure(&mut self, err: ContractError) -> ContractError {
        self.consecutive_failures += 1;
        metrics::counter!(
            "activity_monitor_inference_errors_total",
            "stream" => self.stream_id.to_string(),
            "kind" => err.kind()
        )
        .increment(1);
        tracing::warn!(
            stream_id = %self.stream_id,
            model = self.model.name(),
            failures = self.consecutive_failures,
            error = %err,
            "inference failed, window kept for retry"
        );
        err
    }

    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Inference failures since the last successful window
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether failures reached `engine.max_consecutive_failures`
    pub fn failure_limit_reached(&self) -> bool {
        self.consecutive_failures >= self.config.engine.max_consecutive_failures
    }

    /// Windows evaluated successfully
    pub fn windows_evaluated(&self) -> u64 {
        self.window_index
    }

    pub fn step_count(&self) -> u64 {
        self.steps.step_count()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn model(&self) -> &E {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut E {
        &mut self.model
    }
}

/// Argmax of a model output, lowest index on ties
pub fn select_top_class(distribution: &LabelDistribution) -> Result<TopClass, ContractError> {
    if distribution.is_empty() {
        return Err(InferenceError::shape_mismatch("5 scores", "0 scores").into());
    }
    distribution
        .top_class()
        .ok_or(ContractError::InvalidDistribution {
            len: distribution.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ActivityClass, RefinedLabel, Vector3, WindowConfig, WindowLayout};
    use std::collections::VecDeque;

    /// Replays queued outputs, then repeats the last one
    struct Queued {
        outputs: VecDeque<Result<LabelDistribution, InferenceError>>,
        last: Result<LabelDistribution, InferenceError>,
        calls: usize,
        seen: Vec<(usize, WindowLayout)>,
    }

    impl Queued {
        fn always(class: ActivityClass) -> Self {
            Self::script(vec![Ok(one_hot(class))])
        }

        fn script(outputs: Vec<Result<LabelDistribution, InferenceError>>) -> Self {
            let last = outputs
                .last()
                .cloned()
                .unwrap_or(Err(InferenceError::Unavailable));
            Self {
                outputs: outputs.into(),
                last,
                calls: 0,
                seen: Vec::new(),
            }
        }
    }

    impl InferenceEngine for Queued {
        fn name(&self) -> &str {
            "queued"
        }

        fn run(
            &mut self,
            window: &[Sample],
            layout: WindowLayout,
        ) -> Result<LabelDistribution, InferenceError> {
            self.calls += 1;
            self.seen.push((window.len(), layout));
            self.outputs.pop_front().unwrap_or_else(|| self.last.clone())
        }
    }

    fn one_hot(class: ActivityClass) -> LabelDistribution {
        let mut scores = [0.0; 5];
        scores[class.index()] = 1.0;
        LabelDistribution::from(scores)
    }

    fn upright(i: usize) -> Sample {
        Sample::new(
            i as f64 * 0.04,
            Vector3::new(0.0, 0.0, 9.8),
            Vector3::default(),
        )
    }

    fn feed<E: InferenceEngine>(
        engine: &mut ClassificationEngine<E>,
        range: std::ops::Range<usize>,
        make: impl Fn(usize) -> Sample,
    ) -> Vec<ClassificationResult> {
        range
            .filter_map(|i| engine.submit(make(i)).unwrap())
            .collect()
    }

    #[test]
    fn test_evaluates_every_stride() {
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            Queued::always(ActivityClass::Falling),
        );

        for i in 0..49 {
            assert!(engine.submit(upright(i)).unwrap().is_none());
        }
        let first = engine.submit(upright(49)).unwrap().unwrap();
        assert_eq!(first.window_index, 0);
        assert_eq!(first.refined, RefinedLabel::Falling);
        assert!((first.timestamp - 49.0 * 0.04).abs() < 1e-12);
        assert_eq!(engine.buffered(), 25);

        let later = feed(&mut engine, 50..150, upright);
        assert_eq!(later.len(), 4);
        assert_eq!(later[0].window_index, 1);
        assert_eq!(engine.windows_evaluated(), 5);
        assert!(engine
            .model()
            .seen
            .iter()
            .all(|(len, layout)| *len == 50 && *layout == WindowLayout::new(2, 25)));
    }

    #[test]
    fn test_flat_window_layout() {
        let mut config = PipelineConfig::default();
        config.window = WindowConfig {
            length: 50,
            retain: 25,
            segments: 1,
        };
        let mut engine =
            ClassificationEngine::new("respeck", config, Queued::always(ActivityClass::Falling));
        feed(&mut engine, 0..50, upright);
        assert_eq!(engine.model().seen[0].1, WindowLayout::new(1, 50));
    }

    #[test]
    fn test_failure_keeps_window_and_retries() {
        let model = Queued::script(vec![
            Err(InferenceError::Unavailable),
            Err(InferenceError::Unavailable),
            Ok(one_hot(ActivityClass::Falling)),
        ]);
        let mut engine = ClassificationEngine::new("respeck", PipelineConfig::default(), model);
        feed(&mut engine, 0..49, upright);

        let err = engine.submit(upright(49)).unwrap_err();
        assert!(matches!(
            err,
            ContractError::Inference(InferenceError::Unavailable)
        ));
        assert_eq!(engine.buffered(), 50);
        assert_eq!(engine.consecutive_failures(), 1);

        // retry fails again, sample 50 is not buffered
        assert!(engine.submit(upright(50)).is_err());
        assert_eq!(engine.consecutive_failures(), 2);
        assert_eq!(engine.buffered(), 50);

        // retry succeeds: same window, then the new sample joins the next one
        let result = engine.submit(upright(51)).unwrap().unwrap();
        assert_eq!(result.window_index, 0);
        assert!((result.timestamp - 49.0 * 0.04).abs() < 1e-12);
        assert_eq!(engine.consecutive_failures(), 0);
        assert_eq!(engine.buffered(), 26);
        assert_eq!(engine.model().calls, 3);
    }

    #[test]
    fn test_retry_on_dense_flat_window_does_not_lag() {
        let mut config = PipelineConfig::default();
        // retain is capped at 48 so every window needs two new samples
        config.window = WindowConfig {
            length: 50,
            retain: 49,
            segments: 1,
        };
        let model = Queued::script(vec![
            Err(InferenceError::Unavailable),
            Ok(one_hot(ActivityClass::Falling)),
        ]);
        let mut engine = ClassificationEngine::new("respeck", config, model);
        feed(&mut engine, 0..49, upright);
        assert!(engine.submit(upright(49)).is_err());

        let retried = engine.submit(upright(50)).unwrap().unwrap();
        assert_eq!(retried.window_index, 0);
        assert_eq!(engine.buffered(), 49);

        // the next window closes on the sample that fills it
        let next = engine.submit(upright(51)).unwrap().unwrap();
        assert_eq!(next.window_index, 1);
        assert!((next.timestamp - 51.0 * 0.04).abs() < 1e-12);
        assert_eq!(engine.buffered(), 48);
        assert_eq!(engine.model().calls, 3);
    }

    #[test]
    fn test_failure_limit() {
        let mut config = PipelineConfig::default();
        config.engine.max_consecutive_failures = 2;
        let model = Queued::script(vec![Err(InferenceError::shape_mismatch("2x25x6", "1x50x6"))]);
        let mut engine = ClassificationEngine::new("respeck", config, model);
        feed_errors(&mut engine, 0..49);
        assert!(engine.submit(upright(49)).is_err());
        assert!(!engine.failure_limit_reached());
        assert!(engine.submit(upright(50)).is_err());
        assert!(engine.failure_limit_reached());
    }

    fn feed_errors<E: InferenceEngine>(
        engine: &mut ClassificationEngine<E>,
        range: std::ops::Range<usize>,
    ) {
        for i in range {
            assert!(engine.submit(upright(i)).unwrap().is_none());
        }
    }

    #[test]
    fn test_out_of_order_rejected_when_enabled() {
        let mut config = PipelineConfig::default();
        config.engine.reject_out_of_order = true;
        let mut engine =
            ClassificationEngine::new("respeck", config, Queued::always(ActivityClass::Falling));
        engine.submit(upright(5)).unwrap();
        let err = engine.submit(upright(3)).unwrap_err();
        assert!(matches!(err, ContractError::OutOfOrderSample { .. }));
        assert_eq!(engine.buffered(), 1);

        // equal timestamps are accepted
        assert!(engine.submit(upright(5)).is_ok());

        let mut lenient = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            Queued::always(ActivityClass::Falling),
        );
        lenient.submit(upright(5)).unwrap();
        assert!(lenient.submit(upright(3)).is_ok());
    }

    #[test]
    fn test_argmax_tie_and_unknown_index() {
        let tie = LabelDistribution::from([0.3, 0.3, 0.2, 0.1, 0.1]);
        assert_eq!(
            select_top_class(&tie).unwrap(),
            TopClass::Known(ActivityClass::Falling)
        );

        let wide = LabelDistribution::new(vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.5]);
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            Queued::script(vec![Ok(wide)]),
        );
        let result = feed(&mut engine, 0..50, upright).remove(0);
        assert_eq!(result.top_class, TopClass::Unknown(5));
        assert_eq!(result.refined, RefinedLabel::GeneralMovement);
        assert_eq!(result.display_text(), "General Movement");

        assert!(matches!(
            select_top_class(&LabelDistribution::default()),
            Err(ContractError::Inference(InferenceError::ShapeMismatch { .. }))
        ));
        assert!(matches!(
            select_top_class(&LabelDistribution::new(vec![f64::NAN; 5])),
            Err(ContractError::InvalidDistribution { len: 5 })
        ));
    }

    #[test]
    fn test_steps_counted_on_fresh_samples_only() {
        // magnitude alternates 10, 8.5: one step per drop
        let stepping = |i: usize| {
            let z = if i % 2 == 0 { 10.0 } else { 8.5 };
            Sample::new(i as f64 * 0.04, Vector3::new(0.0, 0.0, z), Vector3::default())
        };
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            Queued::always(ActivityClass::Walking),
        );

        let results = feed(&mut engine, 0..75, stepping);
        assert_eq!(results.len(), 2);
        // first window: 25 drops among samples 0..50
        assert_eq!(results[0].step_count, Some(25));
        // second window: only samples 50..75 are new, 12 drops (51, 53, .., 73)
        assert_eq!(results[1].step_count, Some(37));
        assert_eq!(engine.step_count(), 37);
    }

    #[test]
    fn test_steps_persist_across_non_locomotion_windows() {
        let stepping = |i: usize| {
            let z = if i % 2 == 0 { 10.0 } else { 8.5 };
            Sample::new(i as f64 * 0.04, Vector3::new(0.0, 0.0, z), Vector3::default())
        };
        let model = Queued::script(vec![
            Ok(one_hot(ActivityClass::Walking)),
            Ok(one_hot(ActivityClass::SittingStanding)),
            Ok(one_hot(ActivityClass::Running)),
        ]);
        let mut engine = ClassificationEngine::new("respeck", PipelineConfig::default(), model);
        let results = feed(&mut engine, 0..100, stepping);
        assert_eq!(results[0].step_count, Some(25));
        assert_eq!(results[1].step_count, None);
        // running threshold 10 is never exceeded by a 1.5 drop
        assert_eq!(results[2].step_count, Some(25));
    }

    #[test]
    fn test_gravity_aligned_window() {
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            Queued::always(ActivityClass::SittingStanding),
        );
        let result = feed(&mut engine, 0..50, upright).remove(0);
        // thetaZ is 0, on the edge of the backward band
        assert_eq!(result.refined, RefinedLabel::DeskWork);
        assert_eq!(result.icon, IconTag::Sitting);
        assert_eq!(result.step_count, None);
    }
}
