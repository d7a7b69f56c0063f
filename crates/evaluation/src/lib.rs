//! # Evaluation
//!
//! Offline evaluation of an inference engine over labelled recordings.
//!
//! Rows are grouped per recording and cut into overlapping windows; each
//! window is scored by the engine and refined by the post-classifier. The
//! report carries a confusion matrix, per-class precision/recall/F1 and how
//! often the refined label matches the recorded activity.
//!
//! ```ignore
//! let rows = evaluation::read_rows(path)?;
//! let set = evaluation::build_windows(&rows, 50, 25);
//! let report = evaluation::Evaluator::new(engine, &pipeline).evaluate(&set)?;
//! println!("{report}");
//! ```

mod confusion;
mod dataset;
mod error;
mod evaluator;
mod labels;
mod report;

pub use confusion::{ClassScores, ConfusionMatrix};
pub use dataset::{build_windows, read_rows, LabelledRow, LabelledWindow, RowFormat, WindowSet};
pub use error::{EvaluationError, Result};
pub use evaluator::Evaluator;
pub use labels::{coarse_class, expected_refined, MOVEMENT};
pub use report::{Agreement, EvaluationReport};
