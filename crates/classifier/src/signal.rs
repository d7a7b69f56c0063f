//! Window statistics used by the refinement rules.

use contracts::{Sample, ACCEL_X, ACCEL_Y, ACCEL_Z};
use nalgebra::Vector3;

/// Arithmetic mean of one channel, 0 for an empty window
pub fn mean(window: &[Sample], channel: usize) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|s| s.channel(channel)).sum::<f64>() / window.len() as f64
}

/// Population standard deviation of one channel
pub fn population_std(window: &[Sample], channel: usize) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let mean = mean(window, channel);
    let variance = window
        .iter()
        .map(|s| {
            let d = s.channel(channel) - mean;
            d * d
        })
        .sum::<f64>()
        / window.len() as f64;
    variance.sqrt()
}

/// Mean of the channel values strictly inside `(low, high)`
///
/// `None` when no value falls inside the band.
pub fn band_mean(window: &[Sample], channel: usize, low: f64, high: f64) -> Option<f64> {
    let (sum, count) = window
        .iter()
        .map(|s| s.channel(channel))
        .filter(|v| *v > low && *v < high)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean accelerometer vector (gravity estimate)
pub fn mean_accel(window: &[Sample]) -> Vector3<f64> {
    Vector3::new(
        mean(window, ACCEL_X),
        mean(window, ACCEL_Y),
        mean(window, ACCEL_Z),
    )
}

/// Angle in degrees between a gravity estimate and the sensor Z axis
///
/// `None` for a zero or non-finite vector, where the angle is undefined.
pub fn inclination_deg(gravity: &Vector3<f64>) -> Option<f64> {
    let norm = gravity.norm();
    if !(norm.is_finite() && norm > 0.0) {
        return None;
    }
    let cos = (gravity.z / norm).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}
