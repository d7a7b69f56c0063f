//! Runs a model and the post-classifier over labelled windows

use classifier::{select_top_class, PostClassifier};
use contracts::{InferenceEngine, PipelineConfig, WindowLayout};
use tracing::{debug, info, instrument, warn};

use crate::confusion::ConfusionMatrix;
use crate::dataset::WindowSet;
use crate::error::{EvaluationError, Result};
use crate::labels::expected_refined;
use crate::report::EvaluationReport;

/// Evaluates one engine with one pipeline configuration
pub struct Evaluator<E> {
    engine: E,
    layout: WindowLayout,
    post: PostClassifier,
}

impl<E: InferenceEngine> Evaluator<E> {
    pub fn new(engine: E, pipeline: &PipelineConfig) -> Self {
        Self {
            engine,
            layout: pipeline.window.layout(),
            post: PostClassifier::from_pipeline(pipeline),
        }
    }

    /// Window length the engine expects
    pub fn window_length(&self) -> usize {
        self.layout.window_length()
    }

    /// Evaluate every window of `set`
    ///
    /// Inference errors abort the run: a model that cannot score the data
    /// set has no meaningful report.
    #[instrument(
        name = "evaluation_run",
        skip(self, set),
        fields(engine = self.engine.name(), windows = set.len())
    )]
    pub fn evaluate(&mut self, set: &WindowSet) -> Result<EvaluationReport> {
        if set.is_empty() {
            return Err(EvaluationError::NoWindows {
                length: self.window_length(),
            });
        }

        let mut report = EvaluationReport {
            engine: self.engine.name().to_string(),
            windows: set.len(),
            recordings: set.recordings,
            movement_rows: set.movement_rows,
            unknown_activities: set.unknown_activities.clone(),
            skipped_windows: set.skipped_windows,
            confusion: ConfusionMatrix::new(),
            ..Default::default()
        };

        for window in &set.windows {
            if window.samples.len() != self.window_length() {
                warn!(
                    recording_id = %window.recording_id,
                    len = window.samples.len(),
                    "window length does not match layout"
                );
            }
            let distribution = self.engine.run(&window.samples, self.layout)?;
            let top = select_top_class(&distribution)?;
            report.confusion.record(window.class, top);

            if let Some(expected) = expected_refined(&window.activity) {
                let refined = self.post.refine(&window.samples, top);
                let agreement = report.refined.entry(window.activity.clone()).or_default();
                agreement.total += 1;
                if refined == expected {
                    agreement.matched += 1;
                }
                debug!(
                    activity = %window.activity,
                    refined = %refined,
                    "window refined"
                );
            }
        }

        info!(
            accuracy = report.accuracy(),
            refined = report.refined_overall().rate(),
            "evaluation finished"
        );
        Ok(report)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{build_windows, LabelledRow};
    use contracts::{ActivityClass, InferenceError};
    use inference::{ScriptedEngine, StubEngine};

    /// Upright rows (gravity along -Y) of one activity
    fn rows(recording: &str, activity: &str, n: usize) -> Vec<LabelledRow> {
        (0..n)
            .map(|i| LabelledRow {
                recording_id: recording.to_string(),
                activity_type: activity.to_string(),
                timestamp: Some(i as f64 * 0.04),
                accel_x: 0.0,
                accel_y: -1.0,
                accel_z: 0.0,
                gyro_x: 0.0,
                gyro_y: 0.0,
                gyro_z: 0.0,
            })
            .collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let set = build_windows(&rows("r1", "Standing", 100), 50, 25);
        let engine = ScriptedEngine::constant(ActivityClass::SittingStanding);
        let mut evaluator = Evaluator::new(engine, &PipelineConfig::default());

        let report = evaluator.evaluate(&set).unwrap();
        assert_eq!(report.windows, 3);
        assert_eq!(report.accuracy(), 1.0);
        assert_eq!(
            report
                .confusion
                .count(ActivityClass::SittingStanding, ActivityClass::SittingStanding),
            3
        );
        // still and upright: gyro mean 0 is inside the band, below the
        // standing threshold
        let standing = report.refined["Standing"];
        assert_eq!(standing.total, 3);
        assert_eq!(standing.matched, 0);
        assert_eq!(evaluator.engine().calls(), 3);
    }

    #[test]
    fn test_wrong_predictions_reported() {
        let mut data = rows("r1", "Running", 50);
        data.extend(rows("r2", "Sitting", 50));
        let set = build_windows(&data, 50, 25);

        let mut evaluator = Evaluator::new(
            ScriptedEngine::constant(ActivityClass::SittingStanding),
            &PipelineConfig::default(),
        );
        let report = evaluator.evaluate(&set).unwrap();
        assert_eq!(report.accuracy(), 0.5);
        assert_eq!(report.refined["Sitting"].matched, 1);
        assert!(!report.refined.contains_key("Running"));

        let text = report.to_string();
        assert!(text.contains("Running ........... Accuracy: 0.00"));
        let json = report.to_json();
        assert_eq!(json["windows"], 2);
        assert_eq!(json["classes"][4]["support"], 1);
    }

    #[test]
    fn test_inference_error_aborts() {
        let set = build_windows(&rows("r1", "Sitting", 50), 50, 25);
        let mut evaluator = Evaluator::new(
            ScriptedEngine::failing(InferenceError::Unavailable),
            &PipelineConfig::default(),
        );
        assert!(matches!(
            evaluator.evaluate(&set),
            Err(EvaluationError::Inference(InferenceError::Unavailable))
        ));
    }

    #[test]
    fn test_empty_set() {
        let mut evaluator = Evaluator::new(StubEngine::default(), &PipelineConfig::default());
        assert!(matches!(
            evaluator.evaluate(&WindowSet::default()),
            Err(EvaluationError::NoWindows { length: 50 })
        ));
    }
}
