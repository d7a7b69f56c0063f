//! Confusion matrix and per-class scores

use contracts::{ActivityClass, TopClass};
use serde::Serialize;

const N: usize = ActivityClass::COUNT;

/// Counts of actual (rows) against predicted (columns) classes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: [[u64; N]; N],
    /// Predictions outside the known classes, per actual class
    unknown: [u64; N],
}

/// Scores of one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScores {
    pub class: ActivityClass,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, actual: ActivityClass, predicted: TopClass) {
        match predicted.class() {
            Some(class) => self.counts[actual.index()][class.index()] += 1,
            None => self.unknown[actual.index()] += 1,
        }
    }

    pub fn count(&self, actual: ActivityClass, predicted: ActivityClass) -> u64 {
        self.counts[actual.index()][predicted.index()]
    }

    pub fn unknown(&self, actual: ActivityClass) -> u64 {
        self.unknown[actual.index()]
    }

    pub fn total(&self) -> u64 {
        (0..N).map(|i| self.row_total(i)).sum()
    }

    fn row_total(&self, actual: usize) -> u64 {
        self.counts[actual].iter().sum::<u64>() + self.unknown[actual]
    }

    fn column_total(&self, predicted: usize) -> u64 {
        self.counts.iter().map(|row| row[predicted]).sum()
    }

    /// Fraction of windows predicted correctly
    pub fn accuracy(&self) -> f64 {
        let correct: u64 = (0..N).map(|i| self.counts[i][i]).sum();
        ratio(correct, self.total())
    }

    /// Each row divided by its support, rounded to two decimals
    ///
    /// Rows without support stay zero.
    pub fn row_normalised(&self) -> [[f64; N]; N] {
        let mut normalised = [[0.0; N]; N];
        for (actual, row) in self.counts.iter().enumerate() {
            let total = self.row_total(actual);
            for (predicted, &count) in row.iter().enumerate() {
                normalised[actual][predicted] = round2(ratio(count, total));
            }
        }
        normalised
    }

    /// Precision, recall and F1 of one class; undefined ratios are 0
    pub fn scores(&self, class: ActivityClass) -> ClassScores {
        let i = class.index();
        let tp = self.counts[i][i];
        let support = self.row_total(i);
        let precision = ratio(tp, self.column_total(i));
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassScores {
            class,
            precision,
            recall,
            f1,
            support,
        }
    }

    pub fn all_scores(&self) -> Vec<ClassScores> {
        ActivityClass::ALL.iter().map(|c| self.scores(*c)).collect()
    }

    /// Unweighted mean F1 over classes with support
    pub fn macro_f1(&self) -> f64 {
        let supported: Vec<f64> = self
            .all_scores()
            .iter()
            .filter(|s| s.support > 0)
            .map(|s| s.f1)
            .collect();
        if supported.is_empty() {
            0.0
        } else {
            supported.iter().sum::<f64>() / supported.len() as f64
        }
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
