//! Rule-based stand-in for a trained model.
//!
//! Scores a window from its accelerometer energy and orientation. Good
//! enough to drive the pipeline without a model file; not a classifier to
//! rely on.

use contracts::{
    ActivityClass, InferenceEngine, InferenceError, LabelDistribution, Sample, WindowLayout,
};

/// Thresholds of the stub heuristic
///
/// Ratios are relative to the window's mean acceleration magnitude, so the
/// rules work for readings in g or in m/s².
#[derive(Debug, Clone, PartialEq)]
pub struct StubThresholds {
    /// Peak / mean magnitude at or above which the window is a fall
    pub impact_ratio: f64,
    /// Coefficient of variation of the magnitude for running
    pub running_variation: f64,
    /// Coefficient of variation of the magnitude for walking
    pub walking_variation: f64,
    /// Inclination from the Z axis (degrees) below which, or above
    /// `180 - lying_angle`, the wearer is lying
    pub lying_angle: f64,
    /// Score given to the winning class
    pub confidence: f64,
}

impl Default for StubThresholds {
    fn default() -> Self {
        Self {
            impact_ratio: 3.0,
            running_variation: 0.45,
            walking_variation: 0.08,
            lying_angle: 45.0,
            confidence: 0.8,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubEngine {
    thresholds: StubThresholds,
}

impl StubEngine {
    pub fn new(thresholds: StubThresholds) -> Self {
        Self { thresholds }
    }

    /// Class the heuristic picks for a window
    pub fn guess(&self, window: &[Sample]) -> ActivityClass {
        let magnitudes: Vec<f64> = window.iter().map(|s| s.accel.magnitude()).collect();
        let n = magnitudes.len() as f64;
        let mean = magnitudes.iter().sum::<f64>() / n;
        if !(mean.is_finite() && mean > 0.0) {
            return ActivityClass::SittingStanding;
        }

        let peak = magnitudes.iter().copied().fold(0.0, f64::max);
        let variance = magnitudes.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / n;
        let variation = variance.sqrt() / mean;

        let t = &self.thresholds;
        if peak / mean >= t.impact_ratio {
            return ActivityClass::Falling;
        }
        if variation >= t.running_variation {
            return ActivityClass::Running;
        }
        if variation >= t.walking_variation {
            return ActivityClass::Walking;
        }

        let z = window.iter().map(|s| s.accel.z).sum::<f64>() / n;
        let x = window.iter().map(|s| s.accel.x).sum::<f64>() / n;
        let y = window.iter().map(|s| s.accel.y).sum::<f64>() / n;
        let norm = (x * x + y * y + z * z).sqrt();
        if norm == 0.0 {
            return ActivityClass::SittingStanding;
        }
        let theta = (z / norm).clamp(-1.0, 1.0).acos().to_degrees();
        if theta < t.lying_angle || theta > 180.0 - t.lying_angle {
            ActivityClass::LyingDown
        } else {
            ActivityClass::SittingStanding
        }
    }
}

impl InferenceEngine for StubEngine {
    fn name(&self) -> &str {
        "stub"
    }

    fn run(
        &mut self,
        window: &[Sample],
        layout: WindowLayout,
    ) -> Result<LabelDistribution, InferenceError> {
        if window.is_empty() || window.len() != layout.window_length() {
            return Err(InferenceError::shape_mismatch(
                format!("{} samples", layout.window_length()),
                format!("{} samples", window.len()),
            ));
        }

        let winner = self.guess(window);
        let rest = (1.0 - self.thresholds.confidence) / (ActivityClass::COUNT - 1) as f64;
        let scores = ActivityClass::ALL.map(|class| {
            if class == winner {
                self.thresholds.confidence
            } else {
                rest
            }
        });
        Ok(LabelDistribution::from(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{TopClass, Vector3};

    fn window(accel: impl Fn(usize) -> Vector3) -> Vec<Sample> {
        (0..50)
            .map(|i| Sample::new(i as f64 * 0.04, accel(i), Vector3::default()))
            .collect()
    }

    fn top(window: &[Sample]) -> ActivityClass {
        let dist = StubEngine::default()
            .run(window, WindowLayout::new(2, 25))
            .unwrap();
        match dist.top_class() {
            Some(TopClass::Known(class)) => class,
            other => panic!("unexpected top class {other:?}"),
        }
    }

    #[test]
    fn test_postures() {
        assert_eq!(
            top(&window(|_| Vector3::new(0.0, 1.0, 0.05))),
            ActivityClass::SittingStanding
        );
        assert_eq!(
            top(&window(|_| Vector3::new(0.0, 0.1, 1.0))),
            ActivityClass::LyingDown
        );
    }

    #[test]
    fn test_motion() {
        let walking = window(|i| Vector3::new(0.0, 1.0 + 0.2 * ((i % 4) as f64 - 1.5), 0.0));
        assert_eq!(top(&walking), ActivityClass::Walking);

        let running = window(|i| Vector3::new(0.0, if i % 2 == 0 { 1.8 } else { 0.3 }, 0.0));
        assert_eq!(top(&running), ActivityClass::Running);

        let fall = window(|i| Vector3::new(0.0, if i == 25 { 6.0 } else { 1.0 }, 0.0));
        assert_eq!(top(&fall), ActivityClass::Falling);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let mut engine = StubEngine::default();
        assert!(matches!(
            engine.run(&window(|_| Vector3::new(0.0, 1.0, 0.0)), WindowLayout::new(1, 40)),
            Err(InferenceError::ShapeMismatch { .. })
        ));
    }
}
