//! Rule-based refinement of the model's top class.
//!
//! Every rule works on the whole window (both segments in split mode) and is
//! total: degenerate statistics fall through to a fixed default label.

use contracts::{
    ActivityClass, LyingConfig, PipelineConfig, RefinedLabel, Sample, SittingConfig, TopClass,
    WalkingConfig, ACCEL_X, ACCEL_Z, GYRO_Y,
};
use serde::Serialize;

use crate::signal;

/// Statistics behind a sitting/standing decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PostureStats {
    pub std_x: f64,
    pub std_z: f64,
    /// Mean gyroY inside the noise band
    pub gyro_y: Option<f64>,
    /// Trunk inclination (degrees), `None` for a zero gravity estimate
    pub theta_z: Option<f64>,
}

impl PostureStats {
    pub fn compute(window: &[Sample], config: &SittingConfig) -> Self {
        Self {
            std_x: signal::population_std(window, ACCEL_X),
            std_z: signal::population_std(window, ACCEL_Z),
            gyro_y: signal::band_mean(
                window,
                GYRO_Y,
                config.gyro_band_low,
                config.gyro_band_high,
            ),
            theta_z: signal::inclination_deg(&signal::mean_accel(window)),
        }
    }
}

/// Refines a top class into a posture or motion label
#[derive(Debug, Clone, Default)]
pub struct PostClassifier {
    sitting: SittingConfig,
    lying: LyingConfig,
    walking: WalkingConfig,
}

impl PostClassifier {
    pub fn new(sitting: SittingConfig, lying: LyingConfig, walking: WalkingConfig) -> Self {
        Self {
            sitting,
            lying,
            walking,
        }
    }

    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self::new(
            config.sitting.clone(),
            config.lying.clone(),
            config.walking.clone(),
        )
    }

    /// Refined label for `window` given its top class
    pub fn refine(&self, window: &[Sample], top: TopClass) -> RefinedLabel {
        match top {
            TopClass::Known(ActivityClass::Falling) => RefinedLabel::Falling,
            TopClass::Known(ActivityClass::SittingStanding) => {
                classify_posture(&self.sitting, &PostureStats::compute(window, &self.sitting))
            }
            TopClass::Known(ActivityClass::LyingDown) => classify_lying(
                &self.lying,
                signal::inclination_deg(&signal::mean_accel(window)),
            ),
            TopClass::Known(ActivityClass::Walking) => {
                classify_walking(&self.walking, walking_trend(&self.walking, window))
            }
            TopClass::Known(ActivityClass::Running) => RefinedLabel::Running,
            TopClass::Unknown(_) => RefinedLabel::GeneralMovement,
        }
    }
}

/// Sitting/standing decision
///
/// Checked in order: variance, upright band, backward band, forward band.
/// Inclinations on a band edge, at 0 or 180, or undefined are desk work.
pub fn classify_posture(config: &SittingConfig, stats: &PostureStats) -> RefinedLabel {
    if stats.std_x + stats.std_z > config.desk_work_threshold {
        return RefinedLabel::DeskWork;
    }
    let Some(theta) = stats.theta_z else {
        return RefinedLabel::DeskWork;
    };

    if theta > config.upright_low && theta < config.upright_high {
        // an empty gyro band counts as no rotation
        if stats.gyro_y.unwrap_or(0.0) <= config.standing_gyro_threshold {
            RefinedLabel::Sitting
        } else {
            RefinedLabel::Standing
        }
    } else if theta > 0.0 && theta < config.upright_low {
        RefinedLabel::SittingBentBackward
    } else if theta > config.upright_high && theta < 180.0 {
        RefinedLabel::SittingBentForward
    } else {
        RefinedLabel::DeskWork
    }
}

/// Lying orientation by inclination band
pub fn classify_lying(config: &LyingConfig, theta_z: Option<f64>) -> RefinedLabel {
    match theta_z {
        Some(t) if (0.0..=config.back_max).contains(&t) => RefinedLabel::LyingOnBack,
        Some(t) if t > config.back_max && t <= config.right_max => RefinedLabel::LyingOnRight,
        Some(t) if t > config.right_max && t <= config.left_max => RefinedLabel::LyingOnLeft,
        Some(t) if t > config.left_max && t <= config.stomach_max => {
            RefinedLabel::LyingOnStomach
        }
        _ => RefinedLabel::LyingOnBack,
    }
}

/// Mean of the gyroY block sums, each normalised by the largest absolute sum
///
/// Blocks start every `block_stride` samples inside each trend segment. A
/// window without any rotation has trend 0.
pub fn walking_trend(config: &WalkingConfig, window: &[Sample]) -> f64 {
    let sums = block_sums(config, window);
    let max_abs = sums.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()));
    if sums.is_empty() || !(max_abs.is_finite() && max_abs > 0.0) {
        return 0.0;
    }
    sums.iter().map(|s| s / max_abs).sum::<f64>() / sums.len() as f64
}

fn block_sums(config: &WalkingConfig, window: &[Sample]) -> Vec<f64> {
    if config.segment_length == 0 {
        return Vec::new();
    }
    let segments = window.len() / config.segment_length;
    let mut sums = Vec::with_capacity(segments * config.blocks_per_segment);
    for segment in 0..segments {
        let base = segment * config.segment_length;
        for block in 0..config.blocks_per_segment {
            let start = (base + block * config.block_stride).min(window.len());
            let end = (start + config.block_length).min(window.len());
            sums.push(window[start..end].iter().map(|s| s.gyro.y).sum());
        }
    }
    sums
}

/// Stairs when the trend magnitude reaches the threshold, walking otherwise
pub fn classify_walking(config: &WalkingConfig, trend: f64) -> RefinedLabel {
    if trend.abs() >= config.trend_threshold {
        if trend < 0.0 {
            RefinedLabel::DescendingStairs
        } else {
            RefinedLabel::ClimbingStairs
        }
    } else {
        RefinedLabel::Walking
    }
}
