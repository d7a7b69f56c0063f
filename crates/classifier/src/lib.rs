//! # Classifier
//!
//! Streaming activity classification: a sliding window per stream, a call
//! into the activity model at a fixed cadence, rule-based refinement of the
//! top class and a step counter for locomotion windows.
//!
//! ```ignore
//! use classifier::ClassificationEngine;
//!
//! let mut engine = ClassificationEngine::new("respeck", pipeline_config, model);
//! for sample in samples {
//!     if let Some(result) = engine.submit(sample)? {
//!         println!("{}", result.display_text());
//!     }
//! }
//! ```

mod engine;
mod refine;
mod session;
pub mod signal;
mod step_counter;
mod window;

pub use engine::{select_top_class, ClassificationEngine};
pub use refine::{
    classify_lying, classify_posture, classify_walking, walking_trend, PostClassifier,
    PostureStats,
};
pub use session::SessionSet;
pub use step_counter::{StepCounter, StepCounterState};
pub use window::WindowBuffer;

pub use contracts::{ClassificationResult, PipelineConfig, Sample};
