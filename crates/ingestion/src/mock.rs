//! Synthetic wearable source
//!
//! Emits chest-sensor readings (accelerometer in g, gyroscope in deg/s)
//! following a script of motion profiles. Used without a device.

use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{Sample, SampleCallback, SampleSource, StreamId, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Motion the mock wearer performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionProfile {
    /// Upright trunk, no movement
    StillUpright,
    /// Trunk leaning forward about 30 degrees
    BentForward,
    LyingOnBack,
    Walking,
    ClimbingStairs,
    Running,
    /// Upright with a hard impact every two seconds
    Falling,
}

impl MotionProfile {
    pub const ALL: [MotionProfile; 7] = [
        MotionProfile::StillUpright,
        MotionProfile::BentForward,
        MotionProfile::LyingOnBack,
        MotionProfile::Walking,
        MotionProfile::ClimbingStairs,
        MotionProfile::Running,
        MotionProfile::Falling,
    ];

    /// Noise-free reading at time `t` (seconds since the step started)
    pub fn reading(self, t: f64) -> (Vector3, Vector3) {
        let upright = Vector3::new(0.0, -1.0, 0.0);
        match self {
            Self::StillUpright => (upright, Vector3::default()),
            Self::BentForward => {
                let lean = 120_f64.to_radians();
                (
                    Vector3::new(0.0, -lean.sin(), lean.cos()),
                    Vector3::default(),
                )
            }
            Self::LyingOnBack => (Vector3::new(0.0, 0.0, 1.0), Vector3::default()),
            Self::Walking => {
                let phase = TAU * 2.0 * t;
                (
                    Vector3::new(0.0, -1.0 + 0.25 * phase.sin(), 0.05 * phase.cos()),
                    Vector3::new(0.0, 5.0 * phase.sin(), 0.0),
                )
            }
            Self::ClimbingStairs => {
                let phase = TAU * 1.5 * t;
                (
                    Vector3::new(0.0, -1.0 + 0.25 * phase.sin(), 0.05 * phase.cos()),
                    Vector3::new(0.0, 4.0 + 2.0 * phase.sin(), 0.0),
                )
            }
            Self::Running => {
                let phase = TAU * 3.0 * t;
                (
                    Vector3::new(0.0, -1.0 + 0.8 * phase.sin(), 0.1 * phase.cos()),
                    Vector3::new(0.0, 20.0 * phase.sin(), 0.0),
                )
            }
            Self::Falling => {
                if t.rem_euclid(2.0) < 0.04 {
                    (Vector3::new(0.5, -4.0, 0.5), Vector3::new(30.0, 0.0, 30.0))
                } else {
                    (upright, Vector3::default())
                }
            }
        }
    }
}

/// One step of a mock script
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub profile: MotionProfile,
    pub duration_s: f64,
}

impl ScriptStep {
    pub fn new(profile: MotionProfile, duration_s: f64) -> Self {
        Self {
            profile,
            duration_s,
        }
    }
}

/// Mock source configuration
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    pub sample_rate_hz: f64,
    pub script: Vec<ScriptStep>,
    /// Uniform noise amplitude added to every accelerometer axis
    pub noise: f64,
    /// Noise seed, random when unset
    pub seed: Option<u64>,
    /// Sleep between samples to match the sample rate
    pub realtime: bool,
    /// Playback speed when realtime
    pub speed_multiplier: f64,
    /// Restart the script when it ends
    pub loop_script: bool,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 25.0,
            script: MotionProfile::ALL
                .iter()
                .map(|p| ScriptStep::new(*p, 10.0))
                .collect(),
            noise: 0.004,
            seed: None,
            realtime: true,
            speed_multiplier: 1.0,
            loop_script: false,
        }
    }
}

impl MockSourceConfig {
    /// Samples generated by one pass over the script
    pub fn samples_per_pass(&self) -> usize {
        self.script
            .iter()
            .map(|step| (step.duration_s * self.sample_rate_hz).round() as usize)
            .sum()
    }
}

/// Mock sample source
///
/// Generates samples on a background thread and hands them to the
/// registered callback.
pub struct MockSampleSource {
    stream_id: StreamId,
    config: MockSourceConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockSampleSource {
    pub fn new(stream_id: impl Into<StreamId>, config: MockSourceConfig) -> Self {
        Self {
            stream_id: stream_id.into(),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    /// Source playing a single profile for `duration_s` as fast as possible
    pub fn profile(stream_id: impl Into<StreamId>, profile: MotionProfile, duration_s: f64) -> Self {
        Self::new(
            stream_id,
            MockSourceConfig {
                script: vec![ScriptStep::new(profile, duration_s)],
                realtime: false,
                seed: Some(7),
                ..Default::default()
            },
        )
    }

    /// Generate the samples of one script pass without a thread
    pub fn generate(config: &MockSourceConfig, start_timestamp: f64) -> Vec<Sample> {
        let mut rng = rng_for(config.seed);
        let mut samples = Vec::with_capacity(config.samples_per_pass());
        let period = 1.0 / config.sample_rate_hz;
        let mut index = 0usize;
        for step in &config.script {
            let count = (step.duration_s * config.sample_rate_hz).round() as usize;
            for n in 0..count {
                let timestamp = start_timestamp + index as f64 * period;
                samples.push(noisy(step.profile, n as f64 * period, timestamp, config.noise, &mut rng));
                index += 1;
            }
        }
        samples
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn noisy(profile: MotionProfile, t: f64, timestamp: f64, noise: f64, rng: &mut StdRng) -> Sample {
    let (mut accel, gyro) = profile.reading(t);
    if noise > 0.0 {
        accel.x += rng.random_range(-noise..=noise);
        accel.y += rng.random_range(-noise..=noise);
        accel.z += rng.random_range(-noise..=noise);
    }
    Sample::new(timestamp, accel, gyro)
}

impl SampleSource for MockSampleSource {
    fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    fn listen(&self, callback: SampleCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let stream_id = self.stream_id.clone();
        let config = self.config.clone();
        let listening = self.listening.clone();

        let handle = thread::spawn(move || {
            let interval =
                Duration::from_secs_f64(1.0 / (config.sample_rate_hz * config.speed_multiplier.max(0.01)));
            let started = Instant::now();
            let mut emitted = 0u64;
            let mut pass_start = 0.0;
            let pass_length = config.samples_per_pass() as f64 / config.sample_rate_hz;

            debug!(stream_id = %stream_id, rate = config.sample_rate_hz, "mock source started");

            'passes: loop {
                for sample in MockSampleSource::generate(&config, pass_start) {
                    if !listening.load(Ordering::Relaxed) {
                        break 'passes;
                    }
                    callback(stream_id.clone(), sample);
                    emitted += 1;
                    trace!(stream_id = %stream_id, timestamp = sample.timestamp, "mock sample");

                    if config.realtime {
                        let target = interval.mul_f64(emitted as f64);
                        let elapsed = started.elapsed();
                        if target > elapsed {
                            thread::sleep(target - elapsed);
                        }
                    }
                }
                if !config.loop_script || pass_length <= 0.0 {
                    break;
                }
                pass_start += pass_length;
            }

            listening.store(false, Ordering::SeqCst);
            debug!(stream_id = %stream_id, emitted, "mock source finished");
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn test_generate_follows_script() {
        let config = MockSourceConfig {
            sample_rate_hz: 25.0,
            script: vec![
                ScriptStep::new(MotionProfile::StillUpright, 2.0),
                ScriptStep::new(MotionProfile::LyingOnBack, 1.0),
            ],
            noise: 0.0,
            seed: Some(1),
            realtime: false,
            ..Default::default()
        };
        let samples = MockSampleSource::generate(&config, 0.0);
        assert_eq!(samples.len(), 75);
        assert_eq!(samples[0].accel, Vector3::new(0.0, -1.0, 0.0));
        assert_eq!(samples[60].accel, Vector3::new(0.0, 0.0, 1.0));
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!((samples[74].timestamp - 74.0 / 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let config = MockSourceConfig {
            script: vec![ScriptStep::new(MotionProfile::Walking, 2.0)],
            seed: Some(42),
            ..Default::default()
        };
        let a = MockSampleSource::generate(&config, 0.0);
        let b = MockSampleSource::generate(&config, 0.0);
        assert_eq!(a, b);
        for (n, sample) in a.iter().enumerate() {
            let (clean, _) = MotionProfile::Walking.reading(n as f64 / 25.0);
            assert!((sample.accel.y - clean.y).abs() <= 0.004 + 1e-12);
        }
    }

    #[test]
    fn test_listen_delivers_all_samples_then_stops() {
        let source = MockSampleSource::profile("respeck", MotionProfile::Walking, 4.0);
        let received = Arc::new(StdMutex::new(Vec::new()));
        let sink = received.clone();
        source.listen(Arc::new(move |stream_id, sample| {
            assert_eq!(stream_id, "respeck");
            sink.lock().unwrap().push(sample);
        }));

        let deadline = Instant::now() + Duration::from_secs(5);
        while source.is_listening() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        source.stop();
        assert_eq!(received.lock().unwrap().len(), 100);
    }

    #[test]
    fn test_stop_interrupts_realtime_source() {
        let source = MockSampleSource::new(
            "thingy",
            MockSourceConfig {
                script: vec![ScriptStep::new(MotionProfile::StillUpright, 60.0)],
                ..Default::default()
            },
        );
        source.listen(Arc::new(|_, _| {}));
        assert!(source.is_listening());
        thread::sleep(Duration::from_millis(50));
        source.stop();
        assert!(!source.is_listening());
    }
}
