//! Step detection on accelerometer magnitude drops.

use contracts::{StepCounterConfig, StepMode, Vector3};
use serde::{Deserialize, Serialize};

/// Persistent step counter state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepCounterState {
    pub last_magnitude: f64,
    pub step_count: u64,
}

/// Counts a step whenever the magnitude drops by more than the mode threshold
/// between two consecutive samples
///
/// Lives for the whole session; window rollover never resets it.
#[derive(Debug, Clone)]
pub struct StepCounter {
    state: StepCounterState,
    thresholds: StepCounterConfig,
}

impl StepCounter {
    pub fn new(thresholds: StepCounterConfig) -> Self {
        Self {
            state: StepCounterState::default(),
            thresholds,
        }
    }

    /// Feed one accelerometer reading, returns whether a step was counted
    pub fn update(&mut self, accel: &Vector3, mode: StepMode) -> bool {
        self.update_magnitude(accel.magnitude(), mode)
    }

    pub fn update_magnitude(&mut self, magnitude: f64, mode: StepMode) -> bool {
        let delta = self.state.last_magnitude - magnitude;
        self.state.last_magnitude = magnitude;
        let step = delta > self.thresholds.threshold(mode);
        if step {
            self.state.step_count += 1;
        }
        step
    }

    #[inline]
    pub fn step_count(&self) -> u64 {
        self.state.step_count
    }

    pub fn state(&self) -> StepCounterState {
        self.state
    }
}

impl Default for StepCounter {
    fn default() -> Self {
        Self::new(StepCounterConfig::default())
    }
}
