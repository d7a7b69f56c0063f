//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineOptions, ReplayOptions};
pub use stats::PipelineStats;
