//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the activity monitor.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Data model
//! - [`Sample`]: one timestep of a wearable IMU (3 accel + 3 gyro channels)
//! - [`LabelDistribution`]: model scores aligned to [`ActivityClass::ALL`]
//! - [`ClassificationResult`]: one refined label per evaluated window
//!
//! ## Time model
//! Sample timestamps are seconds (`f64`) from the sensor clock. Samples of one
//! stream must arrive in increasing timestamp order.

mod error;
mod inference;
mod label;
mod monitor_config;
mod pipeline_config;
mod result;
mod sample;
mod sample_source;
mod sink;
mod stream_id;

pub use error::*;
pub use inference::*;
pub use label::*;
pub use monitor_config::*;
pub use pipeline_config::*;
pub use result::*;
pub use sample::*;
pub use sample_source::{SampleCallback, SampleSource};
pub use sink::*;
pub use stream_id::StreamId;
