//! Classification metrics
//!
//! Recorders for the `metrics` facade plus an in-memory aggregator for
//! end-of-run summaries.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{ClassificationResult, RefinedLabel};
use metrics::{counter, gauge, histogram};

/// Record one classification result
///
/// ```ignore
/// if let Some(result) = engine.submit(sample)? {
///     observability::metrics::record_result(&result);
/// }
/// ```
pub fn record_result(result: &ClassificationResult) {
    let stream = result.stream_id.to_string();

    counter!(
        "activity_monitor_results_total",
        "stream" => stream.clone(),
        "label" => result.text()
    )
    .increment(1);

    gauge!("activity_monitor_last_window_index", "stream" => stream.clone())
        .set(result.window_index as f64);

    if let Some(confidence) = top_score(result) {
        histogram!("activity_monitor_confidence", "stream" => stream.clone()).record(confidence);
    }

    if let Some(steps) = result.step_count {
        gauge!("activity_monitor_session_steps", "stream" => stream).set(steps as f64);
    }
}

/// Record a sample pulled off the ingestion channel
pub fn record_sample_received(stream_id: &str) {
    counter!(
        "activity_monitor_samples_received_total",
        "stream" => stream_id.to_string()
    )
    .increment(1);
}

/// Record a result handed to the dispatcher
pub fn record_result_dispatched(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("activity_monitor_results_dispatched_total", "status" => status).increment(1);
}

/// Record the ingestion queue depth
pub fn record_queue_depth(depth: usize) {
    gauge!("activity_monitor_ingestion_queue_depth").set(depth as f64);
}

fn top_score(result: &ClassificationResult) -> Option<f64> {
    result
        .distribution
        .top_index()
        .and_then(|index| result.distribution.scores().get(index).copied())
}

/// Per-stream tallies
#[derive(Debug, Clone, Default)]
pub struct StreamTally {
    pub windows: u64,
    pub failures: u64,
    /// Times the refined label changed between consecutive windows
    pub transitions: u64,
    pub last_label: Option<RefinedLabel>,
    pub steps: u64,
}

/// Classification aggregator
///
/// Aggregates results in memory so a run can print a summary.
#[derive(Debug, Clone, Default)]
pub struct ClassificationAggregator {
    pub total_windows: u64,

    pub total_failures: u64,

    pub streams: BTreeMap<String, StreamTally>,

    /// Windows per top class key
    pub top_class_counts: BTreeMap<&'static str, u64>,

    /// Windows per refined label text
    pub refined_counts: BTreeMap<&'static str, u64>,

    /// Top score of each window
    pub confidence_stats: RunningStats,
}

impl ClassificationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, result: &ClassificationResult) {
        self.total_windows += 1;
        *self.top_class_counts.entry(result.top_class.key()).or_insert(0) += 1;
        *self.refined_counts.entry(result.text()).or_insert(0) += 1;

        if let Some(confidence) = top_score(result) {
            self.confidence_stats.push(confidence);
        }

        let tally = self
            .streams
            .entry(result.stream_id.to_string())
            .or_default();
        tally.windows += 1;
        if tally.last_label.is_some_and(|last| last != result.refined) {
            tally.transitions += 1;
        }
        tally.last_label = Some(result.refined);
        if let Some(steps) = result.step_count {
            tally.steps = steps;
        }
    }

    /// Count a window whose inference failed
    pub fn record_failure(&mut self, stream_id: &str) {
        self.total_failures += 1;
        self.streams.entry(stream_id.to_string()).or_default().failures += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_windows: self.total_windows,
            total_failures: self.total_failures,
            failure_rate: if self.total_windows + self.total_failures > 0 {
                self.total_failures as f64 / (self.total_windows + self.total_failures) as f64
                    * 100.0
            } else {
                0.0
            },
            confidence: StatsSummary::from(&self.confidence_stats),
            top_class_counts: self.top_class_counts.clone(),
            refined_counts: self.refined_counts.clone(),
            streams: self.streams.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary report
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_windows: u64,
    pub total_failures: u64,
    pub failure_rate: f64,
    pub confidence: StatsSummary,
    pub top_class_counts: BTreeMap<&'static str, u64>,
    pub refined_counts: BTreeMap<&'static str, u64>,
    pub streams: BTreeMap<String, StreamTally>,
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Classification Summary ===")?;
        writeln!(f, "Windows evaluated: {}", self.total_windows)?;
        writeln!(
            f,
            "Inference failures: {} ({:.2}%)",
            self.total_failures, self.failure_rate
        )?;
        writeln!(f, "Confidence: {}", self.confidence)?;

        if !self.top_class_counts.is_empty() {
            writeln!(f, "Top classes:")?;
            for (class, count) in &self.top_class_counts {
                writeln!(f, "  {class}: {count}")?;
            }
        }
        if !self.refined_counts.is_empty() {
            writeln!(f, "Refined labels:")?;
            for (label, count) in &self.refined_counts {
                writeln!(f, "  {label}: {count}")?;
            }
        }
        for (stream, tally) in &self.streams {
            writeln!(
                f,
                "Stream {stream}: windows={}, failures={}, transitions={}, steps={}, last={}",
                tally.windows,
                tally.failures,
                tally.transitions,
                tally.steps,
                tally.last_label.map(RefinedLabel::text).unwrap_or("-"),
            )?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
