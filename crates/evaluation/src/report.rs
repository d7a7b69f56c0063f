//! Evaluation report

use std::collections::BTreeMap;
use std::fmt;

use contracts::ActivityClass;
use serde::Serialize;

use crate::confusion::{round2, ConfusionMatrix};

/// Agreement of refined labels for one activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Agreement {
    pub matched: u64,
    pub total: u64,
}

impl Agreement {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Outcome of evaluating a model over labelled recordings
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub engine: String,
    pub windows: usize,
    pub recordings: usize,
    pub movement_rows: usize,
    pub unknown_activities: BTreeMap<String, usize>,
    /// Windows left out for containing unknown-activity rows
    pub skipped_windows: usize,
    pub confusion: ConfusionMatrix,
    /// Refined-label agreement keyed by activity name
    pub refined: BTreeMap<String, Agreement>,
}

impl EvaluationReport {
    pub fn accuracy(&self) -> f64 {
        self.confusion.accuracy()
    }

    /// Agreement over every activity with a refined counterpart
    pub fn refined_overall(&self) -> Agreement {
        self.refined
            .values()
            .fold(Agreement::default(), |acc, a| Agreement {
                matched: acc.matched + a.matched,
                total: acc.total + a.total,
            })
    }

    /// Machine-readable form, used by `evaluate --json`
    pub fn to_json(&self) -> serde_json::Value {
        let classes: Vec<serde_json::Value> = self
            .confusion
            .all_scores()
            .iter()
            .map(|s| {
                serde_json::json!({
                    "class": s.class,
                    "name": s.class.name(),
                    "precision": round2(s.precision),
                    "recall": round2(s.recall),
                    "f1": round2(s.f1),
                    "support": s.support,
                })
            })
            .collect();

        serde_json::json!({
            "engine": self.engine,
            "windows": self.windows,
            "recordings": self.recordings,
            "movement_rows": self.movement_rows,
            "unknown_activities": self.unknown_activities,
            "skipped_windows": self.skipped_windows,
            "accuracy": self.accuracy(),
            "macro_f1": self.confusion.macro_f1(),
            "confusion_matrix": self.confusion,
            "confusion_matrix_normalised": self.confusion.row_normalised(),
            "classes": classes,
            "refined_agreement": self.refined,
        })
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "*".repeat(70);
        writeln!(f, "{rule}")?;
        writeln!(f, "Classification report ({})", self.engine)?;
        writeln!(f, "{rule}")?;
        writeln!(
            f,
            "Windows: {} from {} recordings ({} movement rows removed)",
            self.windows, self.recordings, self.movement_rows
        )?;
        for (activity, rows) in &self.unknown_activities {
            writeln!(f, "Skipped unknown activity '{activity}': {rows} rows")?;
        }
        if self.skipped_windows > 0 {
            writeln!(
                f,
                "Skipped {} windows overlapping unknown activities",
                self.skipped_windows
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows = true, columns = predicted):")?;
        write!(f, "{:>18}", "")?;
        for class in ActivityClass::ALL {
            write!(f, "{:>18}", class.name())?;
        }
        writeln!(f)?;
        let normalised = self.confusion.row_normalised();
        for class in ActivityClass::ALL {
            write!(f, "{:>18}", class.name())?;
            for value in normalised[class.index()] {
                write!(f, "{value:>18.2}")?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        for scores in self.confusion.all_scores() {
            writeln!(
                f,
                "{} ........... Accuracy: {:.2}, Precision: {:.2}, Recall: {:.2}, F-Score: {:.2} (support {})",
                scores.class.name(),
                normalised[scores.class.index()][scores.class.index()],
                scores.precision,
                scores.recall,
                scores.f1,
                scores.support,
            )?;
        }
        writeln!(
            f,
            "Overall accuracy: {:.2}, macro F1: {:.2}",
            self.accuracy(),
            self.confusion.macro_f1()
        )?;

        if !self.refined.is_empty() {
            writeln!(f)?;
            writeln!(f, "Refined label agreement:")?;
            for (activity, agreement) in &self.refined {
                writeln!(
                    f,
                    "  {activity}: {}/{} ({:.2})",
                    agreement.matched,
                    agreement.total,
                    agreement.rate()
                )?;
            }
            let overall = self.refined_overall();
            writeln!(
                f,
                "  overall: {}/{} ({:.2})",
                overall.matched,
                overall.total,
                overall.rate()
            )?;
        }
        Ok(())
    }
}
