//! Replay source - plays back a recorded JSONL session
//!
//! One record per line:
//! `{"stream_id": "respeck", "timestamp": 0.04, "accel": [x, y, z], "gyro": [x, y, z]}`.
//! Unknown fields are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{Sample, SampleCallback, SampleSource, StreamId, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{IngestionError, Result};

/// Replay configuration
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Playback speed (1.0 = recorded pace)
    pub speed_multiplier: f64,

    pub loop_playback: bool,

    /// Honour recorded timing; otherwise emit as fast as possible
    pub realtime: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            loop_playback: false,
            realtime: true,
        }
    }
}

/// One line of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    pub stream_id: String,
    pub timestamp: f64,
    pub accel: [f64; 3],
    pub gyro: [f64; 3],
}

impl RecordingRecord {
    pub fn sample(&self) -> Sample {
        Sample::new(
            self.timestamp,
            Vector3::new(self.accel[0], self.accel[1], self.accel[2]),
            Vector3::new(self.gyro[0], self.gyro[1], self.gyro[2]),
        )
    }
}

/// Read every record of a JSONL recording, skipping blank lines
pub fn read_recording(path: &Path) -> Result<Vec<RecordingRecord>> {
    let file = File::open(path).map_err(|source| IngestionError::RecordingIo {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| IngestionError::RecordingIo {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| IngestionError::ParseFailed {
            path: path.to_path_buf(),
            line: index + 1,
            message: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Replays one stream of a recording
pub struct ReplaySource {
    stream_id: StreamId,
    path: PathBuf,
    samples: Arc<[Sample]>,
    config: ReplayConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ReplaySource {
    /// Load the samples recorded for `stream_id`, ordered by timestamp
    pub fn load(path: &Path, stream_id: impl Into<StreamId>, config: ReplayConfig) -> Result<Self> {
        let stream_id = stream_id.into();
        let mut samples: Vec<Sample> = read_recording(path)?
            .iter()
            .filter(|record| record.stream_id == stream_id.as_str())
            .map(RecordingRecord::sample)
            .collect();

        if samples.is_empty() {
            return Err(IngestionError::EmptyRecording {
                path: path.to_path_buf(),
                stream_id: stream_id.to_string(),
            });
        }
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        info!(
            stream_id = %stream_id,
            path = %path.display(),
            samples = samples.len(),
            "loaded recording"
        );

        Ok(Self {
            stream_id,
            path: path.to_path_buf(),
            samples: samples.into(),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recorded duration in seconds
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
}

impl SampleSource for ReplaySource {
    fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    fn listen(&self, callback: SampleCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let stream_id = self.stream_id.clone();
        let samples = self.samples.clone();
        let config = self.config.clone();
        let speed = config.speed_multiplier.max(0.1);

        let handle = thread::spawn(move || {
            debug!(stream_id = %stream_id, "replay thread started");
            let Some(first) = samples.first().map(|s| s.timestamp) else {
                warn!(stream_id = %stream_id, "no samples to replay");
                listening.store(false, Ordering::SeqCst);
                return;
            };
            // Loops shift timestamps forward so the stream stays ordered
            let period = if samples.len() > 1 {
                (samples[samples.len() - 1].timestamp - first) / (samples.len() - 1) as f64
            } else {
                0.0
            };
            let pass_length = samples[samples.len() - 1].timestamp - first + period;
            let mut offset = 0.0;

            'passes: loop {
                let start_time = Instant::now();
                for sample in samples.iter() {
                    if !listening.load(Ordering::Relaxed) {
                        debug!(stream_id = %stream_id, "replay stopped");
                        break 'passes;
                    }

                    if config.realtime {
                        let target = Duration::from_secs_f64((sample.timestamp - first).max(0.0) / speed);
                        let elapsed = start_time.elapsed();
                        if target > elapsed {
                            thread::sleep(target - elapsed);
                        }
                    }

                    let mut shifted = *sample;
                    shifted.timestamp += offset;
                    callback(stream_id.clone(), shifted);
                }

                if !config.loop_playback {
                    info!(stream_id = %stream_id, "replay completed");
                    break;
                }
                offset += pass_length;
                debug!(stream_id = %stream_id, offset, "looping replay");
            }

            listening.store(false, Ordering::SeqCst);
        });

        if let Ok(mut slot) = self.thread_handle.lock() {
            *slot = Some(handle);
        }
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let handle = self.thread_handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
