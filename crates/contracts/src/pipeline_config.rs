//! Classification pipeline configuration
//!
//! Every threshold used by the window buffer, the post-classifier and the
//! step counter. Defaults are the production values of the Respeck pipeline.

use serde::{Deserialize, Serialize};

use crate::{ActivityClass, WindowLayout};

/// Complete pipeline tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window: WindowConfig,
    pub sitting: SittingConfig,
    pub lying: LyingConfig,
    pub walking: WalkingConfig,
    pub steps: StepCounterConfig,
    pub engine: EngineConfig,
}

/// Window geometry and overlap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Samples per window (`W`)
    pub length: usize,
    /// Newest samples kept when a window closes
    pub retain: usize,
    /// 1 for a flat `W×6` window, 2 for the split `2×1×(W/2)×6` window
    pub segments: usize,
}

impl WindowConfig {
    /// Samples per segment
    pub fn segment_length(&self) -> usize {
        if self.segments == 0 {
            return self.length;
        }
        self.length / self.segments
    }

    /// New samples required between two evaluations
    pub fn stride(&self) -> usize {
        self.length.saturating_sub(self.retain)
    }

    pub fn layout(&self) -> WindowLayout {
        WindowLayout::new(self.segments, self.segment_length())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length: 50,
            retain: 25,
            segments: 2,
        }
    }
}

/// Sitting/standing refinement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SittingConfig {
    /// gyroY values outside `(low, high)` are left out of the gyro mean
    pub gyro_band_low: f64,
    pub gyro_band_high: f64,
    /// `stdX + stdZ` above this means desk work
    pub desk_work_threshold: f64,
    /// Open band of trunk inclination (degrees) treated as upright
    pub upright_low: f64,
    pub upright_high: f64,
    /// Band gyro mean at or below this is sitting, above is standing
    pub standing_gyro_threshold: f64,
}

impl Default for SittingConfig {
    fn default() -> Self {
        Self {
            gyro_band_low: -10.0,
            gyro_band_high: 10.0,
            desk_work_threshold: 0.04,
            upright_low: 85.0,
            upright_high: 95.0,
            standing_gyro_threshold: 0.85,
        }
    }
}

/// Lying orientation bands (upper edges, degrees)
///
/// `[0, back_max]` back, `(back_max, right_max]` right,
/// `(right_max, left_max]` left, `(left_max, stomach_max]` stomach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyingConfig {
    pub back_max: f64,
    pub right_max: f64,
    pub left_max: f64,
    pub stomach_max: f64,
}

impl Default for LyingConfig {
    fn default() -> Self {
        Self {
            back_max: 45.0,
            right_max: 90.0,
            left_max: 135.0,
            stomach_max: 180.0,
        }
    }
}

/// Stair detection from gyroY partial sums
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkingConfig {
    /// `|trend|` at or above this means stairs
    pub trend_threshold: f64,
    /// Samples per trend segment
    pub segment_length: usize,
    /// Partial sums per trend segment
    pub blocks_per_segment: usize,
    /// Offset between consecutive block starts
    pub block_stride: usize,
    /// Samples summed per block
    pub block_length: usize,
}

impl WalkingConfig {
    /// Last sample index (exclusive) touched by the blocks of one segment
    pub fn block_extent(&self) -> usize {
        match self.blocks_per_segment {
            0 => 0,
            n => (n - 1) * self.block_stride + self.block_length,
        }
    }
}

impl Default for WalkingConfig {
    fn default() -> Self {
        Self {
            trend_threshold: 0.33,
            segment_length: 25,
            blocks_per_segment: 4,
            block_stride: 5,
            block_length: 10,
        }
    }
}

/// Step counter mode, one per locomotion class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    Walking,
    Running,
}

impl StepMode {
    /// Mode for a top class; `None` for non-locomotion classes
    pub fn for_class(class: ActivityClass) -> Option<Self> {
        match class {
            ActivityClass::Walking => Some(Self::Walking),
            ActivityClass::Running => Some(Self::Running),
            _ => None,
        }
    }
}

/// Step detection thresholds on the magnitude drop between two samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepCounterConfig {
    pub walking_threshold: f64,
    pub running_threshold: f64,
}

impl StepCounterConfig {
    pub fn threshold(&self, mode: StepMode) -> f64 {
        match mode {
            StepMode::Walking => self.walking_threshold,
            StepMode::Running => self.running_threshold,
        }
    }
}

impl Default for StepCounterConfig {
    fn default() -> Self {
        Self {
            walking_threshold: 1.2,
            running_threshold: 10.0,
        }
    }
}

/// Engine behaviour around ordering and failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject samples older than their predecessor
    pub reject_out_of_order: bool,
    /// Inference failures in a row after which a session is abandoned
    pub max_consecutive_failures: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reject_out_of_order: false,
            max_consecutive_failures: 3,
        }
    }
}
