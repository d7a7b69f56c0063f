//! Sample - one IMU timestep
//!
//! Produced by the ingestion collaborator at the sensor's native rate,
//! consumed by the window buffer.

use serde::{Deserialize, Serialize};

/// Number of channels per sample (3 accelerometer + 3 gyroscope)
pub const CHANNELS: usize = 6;

/// Channel index of accelerometer X
pub const ACCEL_X: usize = 0;
/// Channel index of accelerometer Y
pub const ACCEL_Y: usize = 1;
/// Channel index of accelerometer Z
pub const ACCEL_Z: usize = 2;
/// Channel index of gyroscope X
pub const GYRO_X: usize = 3;
/// Channel index of gyroscope Y
pub const GYRO_Y: usize = 4;
/// Channel index of gyroscope Z
pub const GYRO_Z: usize = 5;

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One timestep of a wearable IMU
///
/// Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Sensor timestamp (seconds)
    pub timestamp: f64,

    /// Accelerometer (g)
    pub accel: Vector3,

    /// Gyroscope (deg/s)
    pub gyro: Vector3,
}

impl Sample {
    /// Create a sample from accelerometer and gyroscope readings
    pub const fn new(timestamp: f64, accel: Vector3, gyro: Vector3) -> Self {
        Self {
            timestamp,
            accel,
            gyro,
        }
    }

    /// Create a sample from a flat channel array in model order
    pub fn from_channels(timestamp: f64, channels: [f64; CHANNELS]) -> Self {
        Self {
            timestamp,
            accel: Vector3::new(channels[ACCEL_X], channels[ACCEL_Y], channels[ACCEL_Z]),
            gyro: Vector3::new(channels[GYRO_X], channels[GYRO_Y], channels[GYRO_Z]),
        }
    }

    /// Channels in model order: accelX, accelY, accelZ, gyroX, gyroY, gyroZ
    #[inline]
    pub fn channels(&self) -> [f64; CHANNELS] {
        [
            self.accel.x,
            self.accel.y,
            self.accel.z,
            self.gyro.x,
            self.gyro.y,
            self.gyro.z,
        ]
    }

    /// Single channel by model index
    ///
    /// Indices outside `0..CHANNELS` read as `0.0`.
    #[inline]
    pub fn channel(&self, index: usize) -> f64 {
        match index {
            ACCEL_X => self.accel.x,
            ACCEL_Y => self.accel.y,
            ACCEL_Z => self.accel.z,
            GYRO_X => self.gyro.x,
            GYRO_Y => self.gyro.y,
            GYRO_Z => self.gyro.z,
            _ => 0.0,
        }
    }
}
