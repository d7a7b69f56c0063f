//! Labelled recordings and their windows

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use contracts::{ActivityClass, Sample};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EvaluationError, Result};
use crate::labels::{coarse_class, MOVEMENT};

/// One labelled row, as exported by the data collection app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledRow {
    pub recording_id: String,
    pub activity_type: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
}

impl LabelledRow {
    /// Sample of this row; rows without a timestamp use their position
    pub fn sample(&self, position: usize) -> Sample {
        Sample::from_channels(
            self.timestamp.unwrap_or(position as f64),
            [
                self.accel_x,
                self.accel_y,
                self.accel_z,
                self.gyro_x,
                self.gyro_y,
                self.gyro_z,
            ],
        )
    }
}

/// Labelled data file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// Headered CSV, as exported by the data collection app
    Csv,
    /// One JSON object per line
    JsonLines,
}

impl RowFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "jsonl" | "ndjson" | "json" => Some(Self::JsonLines),
            _ => None,
        }
    }

    fn detect(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| EvaluationError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }
}

/// Read labelled rows, format chosen by extension
pub fn read_rows(path: &Path) -> Result<Vec<LabelledRow>> {
    let rows = match RowFormat::detect(path)? {
        RowFormat::Csv => read_csv(path)?,
        RowFormat::JsonLines => read_json_lines(path)?,
    };
    info!(path = %path.display(), rows = rows.len(), "loaded labelled rows");
    Ok(rows)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| EvaluationError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Columns are matched by header name; extra columns are ignored
fn read_csv(path: &Path) -> Result<Vec<LabelledRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(open(path)?);

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<LabelledRow>().enumerate() {
        let row = record.map_err(|e| EvaluationError::Parse {
            path: path.to_path_buf(),
            line: e
                .position()
                .map_or(index + 2, |position| position.line() as usize),
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Blank lines are skipped
fn read_json_lines(path: &Path) -> Result<Vec<LabelledRow>> {
    let mut rows = Vec::new();
    for (index, line) in BufReader::new(open(path)?).lines().enumerate() {
        let line = line.map_err(|source| EvaluationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line).map_err(|e| EvaluationError::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// A window cut from one recording
#[derive(Debug, Clone)]
pub struct LabelledWindow {
    pub recording_id: String,
    /// Activity of the window's first row
    pub activity: String,
    pub class: ActivityClass,
    pub samples: Vec<Sample>,
}

/// Windows of a data set plus what was left out
#[derive(Debug, Clone, Default)]
pub struct WindowSet {
    pub windows: Vec<LabelledWindow>,
    pub recordings: usize,
    /// Rows removed because they are general movement
    pub movement_rows: usize,
    /// Rows with an activity name that is not known
    pub unknown_activities: BTreeMap<String, usize>,
    /// Windows left out because they contain such a row
    pub skipped_windows: usize,
}

impl WindowSet {
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Cut windows of `length` rows every `step` rows, per recording
///
/// Movement rows are removed first. Rows with unknown activity names stay in
/// place so windows never span them; any window containing one is skipped.
/// Recordings are visited in id order; a recording shorter than `length`
/// yields nothing.
pub fn build_windows(rows: &[LabelledRow], length: usize, step: usize) -> WindowSet {
    let mut set = WindowSet::default();
    let mut recordings: BTreeMap<&str, Vec<(&LabelledRow, Option<ActivityClass>)>> =
        BTreeMap::new();

    for row in rows {
        if row.activity_type == MOVEMENT {
            set.movement_rows += 1;
            continue;
        }
        let class = coarse_class(&row.activity_type);
        if class.is_none() {
            *set
                .unknown_activities
                .entry(row.activity_type.clone())
                .or_insert(0) += 1;
        }
        recordings
            .entry(&row.recording_id)
            .or_default()
            .push((row, class));
    }

    set.recordings = recordings
        .values()
        .filter(|rows| rows.iter().any(|(_, class)| class.is_some()))
        .count();
    let step = step.max(1);
    if length == 0 {
        return set;
    }

    for (recording_id, rows) in recordings {
        let mut start = 0;
        while start + length <= rows.len() {
            let slice = &rows[start..start + length];
            match slice[0].1 {
                Some(class) if slice.iter().all(|(_, c)| c.is_some()) => {
                    set.windows.push(LabelledWindow {
                        recording_id: recording_id.to_string(),
                        activity: slice[0].0.activity_type.clone(),
                        class,
                        samples: slice
                            .iter()
                            .enumerate()
                            .map(|(i, (row, _))| row.sample(start + i))
                            .collect(),
                    });
                }
                _ => set.skipped_windows += 1,
            }
            start += step;
        }
        debug!(recording_id, rows = rows.len(), "windowed recording");
    }
    set
}
