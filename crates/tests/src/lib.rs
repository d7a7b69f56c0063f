//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! - Config round trips
//! - Mock and replayed streams through engines and sinks
//! - Offline evaluation over labelled rows

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    const CONFIG: &str = r#"
        [[streams]]
        id = "respeck"

        [[streams]]
        id = "thingy"
        sensor = "thingy"
        sample_rate_hz = 26.0

        [pipeline.window]
        length = 50
        retain = 25

        [[sinks]]
        name = "results"
        sink_type = "file"
        params = { path = "out" }
    "#;

    #[test]
    fn test_config_round_trips_through_toml_and_json() {
        let config = ConfigLoader::load_from_str(CONFIG, ConfigFormat::Toml).unwrap();

        let toml = ConfigLoader::to_toml(&config).unwrap();
        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();

        for reloaded in [from_toml, from_json] {
            assert_eq!(reloaded.streams.len(), 2);
            assert_eq!(reloaded.streams[1].sample_rate_hz, 26.0);
            assert_eq!(reloaded.pipeline, config.pipeline);
            assert_eq!(reloaded.sinks[0].params["path"], "out");
        }
    }

    #[test]
    fn test_demo_config_is_valid() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/monitor.toml");
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.sinks.len(), 2);
        assert!(config.pipeline.engine.reject_out_of_order);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    use classifier::{ClassificationEngine, SessionSet};
    use contracts::{
        ActivityClass, ClassificationResult, IconTag, InferenceError, MonitorConfig,
        PipelineConfig, RefinedLabel, Sample, SinkConfig, SinkType, Vector3,
    };
    use dispatcher::create_dispatcher;
    use inference::ScriptedEngine;
    use ingestion::{
        IngestionPipeline, MockSampleSource, MotionProfile, ReplayConfig, ReplaySource,
        StreamSample,
    };
    use tokio::sync::mpsc;

    fn monitor(streams: &str) -> MonitorConfig {
        config_loader::ConfigLoader::load_from_str(streams, config_loader::ConfigFormat::Toml)
            .unwrap()
    }

    /// Drain the ingestion channel until it stays quiet
    async fn drain(pipeline: &mut IngestionPipeline) -> Vec<StreamSample> {
        let rx = pipeline.take_receiver().unwrap();
        pipeline.start_all();
        let mut samples = Vec::new();
        while let Ok(Ok(item)) = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await
        {
            samples.push(item);
        }
        pipeline.stop_all();
        samples
    }

    fn still(i: usize, accel: Vector3) -> Sample {
        Sample::new(i as f64 * 0.04, accel, Vector3::default())
    }

    /// Mock source -> SessionSet -> Dispatcher -> FileSink
    #[tokio::test]
    async fn test_e2e_mock_stream_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let config = monitor(
            r#"
            [[streams]]
            id = "respeck"
            "#,
        );
        let mut sessions = SessionSet::from_config(&config, |_| {
            Ok(ScriptedEngine::constant(ActivityClass::Walking))
        })
        .unwrap();

        let mut ingestion = IngestionPipeline::new(1000);
        ingestion
            .register_source(Box::new(MockSampleSource::profile(
                "respeck",
                MotionProfile::Walking,
                8.0,
            )))
            .unwrap();

        let (tx, rx) = mpsc::channel::<ClassificationResult>(100);
        let sinks = vec![SinkConfig {
            name: "results".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 50,
            params: HashMap::from([(
                "path".to_string(),
                dir.path().display().to_string(),
            )]),
        }];
        let handle = create_dispatcher(sinks, rx).unwrap().spawn();

        let samples = drain(&mut ingestion).await;
        assert_eq!(samples.len(), 200);

        let mut produced = Vec::new();
        for item in samples {
            if let Some(result) = sessions.submit(&item.stream_id, item.sample).unwrap() {
                produced.push(result.clone());
                tx.send(result).await.unwrap();
            }
        }
        drop(tx);
        let metrics = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();

        // first window after 50 samples, then every 25
        assert_eq!(produced.len(), 7);
        assert_eq!(metrics[0].1.write_count, 7);

        let written = std::fs::read_to_string(dir.path().join("respeck.jsonl")).unwrap();
        let lines: Vec<ClassificationResult> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), produced.len());
        for (line, result) in lines.iter().zip(&produced) {
            assert_eq!(line.window_index, result.window_index);
            assert_eq!(line.refined, result.refined);
            assert_eq!(line.step_count, result.step_count);
        }
        assert!(lines.iter().all(|r| r.icon == IconTag::Walking));
        let steps: Vec<u64> = lines.iter().map(|r| r.step_count.unwrap()).collect();
        assert!(steps.windows(2).all(|w| w[0] <= w[1]));
    }

    /// A desk-top sensor with gravity on Z sits on the backward band edge
    #[test]
    fn test_gravity_on_z_is_desk_work() {
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            ScriptedEngine::constant(ActivityClass::SittingStanding),
        );
        let results: Vec<_> = (0..50)
            .filter_map(|i| {
                engine
                    .submit(still(i, Vector3::new(0.0, 0.0, 1.0)))
                    .unwrap()
            })
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].refined, RefinedLabel::DeskWork);
        assert_eq!(results[0].display_text(), "You are currently: Doing Desk Work");
    }

    #[test]
    fn test_upright_still_trunk_is_sitting() {
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            ScriptedEngine::constant(ActivityClass::SittingStanding),
        );
        let result = (0..50)
            .filter_map(|i| {
                engine
                    .submit(still(i, Vector3::new(0.0, -1.0, 0.0)))
                    .unwrap()
            })
            .next()
            .unwrap();
        assert_eq!(result.refined, RefinedLabel::Sitting);
        assert_eq!(result.step_count, None);
    }

    #[test]
    fn test_failing_stream_reaches_abort_limit() {
        let config = monitor(
            r#"
            [[streams]]
            id = "respeck"

            [[streams]]
            id = "thingy"
            "#,
        );
        let mut sessions = SessionSet::from_config(&config, |stream| {
            Ok(if stream.id == "respeck" {
                ScriptedEngine::failing(InferenceError::Unavailable)
            } else {
                ScriptedEngine::constant(ActivityClass::Running)
            })
        })
        .unwrap();

        let limit = config.pipeline.engine.max_consecutive_failures;
        let mut failures = 0;
        let mut i = 0;
        while !sessions.get("respeck").unwrap().failure_limit_reached() {
            let sample = still(i, Vector3::new(0.0, 0.0, 1.0));
            if let Err(e) = sessions.submit("respeck", sample) {
                assert!(e.is_inference());
                failures += 1;
            }
            let healthy = sessions.submit("thingy", sample).unwrap();
            if let Some(result) = healthy {
                assert_eq!(result.refined, RefinedLabel::Running);
            }
            i += 1;
        }
        assert_eq!(failures, limit);
        assert_eq!(sessions.get("thingy").unwrap().consecutive_failures(), 0);
        assert!(sessions.submit("unknown", still(i, Vector3::default())).is_err());
    }

    /// Replayed JSONL recording through the stub model
    #[tokio::test]
    async fn test_replay_recording_through_stub_engine() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        for i in 0..100 {
            let record = serde_json::json!({
                "stream_id": if i % 2 == 0 { "respeck" } else { "thingy" },
                "timestamp": i as f64 * 0.04,
                "accel": [0.0, -1.0, 0.0],
                "gyro": [0.0, 0.0, 0.0],
            });
            writeln!(file, "{record}").unwrap();
        }

        let source = ReplaySource::load(
            file.path(),
            "respeck",
            ReplayConfig {
                realtime: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(source.len(), 50);

        let mut ingestion = IngestionPipeline::new(1000);
        ingestion.register_source(Box::new(source)).unwrap();
        let samples = drain(&mut ingestion).await;
        assert_eq!(samples.len(), 50);

        let config = monitor(
            r#"
            [[streams]]
            id = "respeck"
            "#,
        );
        let pipeline = config.pipeline.clone();
        let mut sessions = SessionSet::from_config(&config, |_| {
            inference::load_engine(&config.model, &pipeline).map_err(Into::into)
        })
        .unwrap();

        let results: Vec<_> = samples
            .into_iter()
            .filter_map(|item| sessions.submit(&item.stream_id, item.sample).unwrap())
            .collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].window_index, 0);
        assert!((results[0].timestamp - 98.0 * 0.04).abs() < 1e-9);
    }

    /// Aggregated counters over a scripted stream
    #[test]
    fn test_aggregator_tracks_transitions() {
        let mut engine = ClassificationEngine::new(
            "respeck",
            PipelineConfig::default(),
            ScriptedEngine::sequence(&[
                ActivityClass::Falling,
                ActivityClass::Falling,
                ActivityClass::Running,
            ]),
        );
        let mut aggregator = observability::ClassificationAggregator::new();
        for i in 0..100 {
            if let Some(result) = engine.submit(still(i, Vector3::new(0.0, 0.0, 1.0))).unwrap() {
                aggregator.update(&result);
            }
        }
        let summary = aggregator.summary();
        assert_eq!(summary.total_windows, 3);
        assert_eq!(aggregator.streams["respeck"].transitions, 1);
    }
}

#[cfg(test)]
mod evaluation_tests {
    use std::io::Write;

    use contracts::{ActivityClass, PipelineConfig};
    use evaluation::{build_windows, read_rows, Evaluator};
    use inference::ScriptedEngine;

    #[test]
    fn test_evaluate_labelled_recordings() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        let recordings = [("r1", "Sitting"), ("r2", "Running"), ("r3", "Movement")];
        for (id, activity) in recordings {
            for _ in 0..100 {
                let row = serde_json::json!({
                    "recording_id": id,
                    "activity_type": activity,
                    "accel_x": 0.0, "accel_y": -1.0, "accel_z": 0.0,
                    "gyro_x": 0.0, "gyro_y": 0.0, "gyro_z": 0.0,
                });
                writeln!(file, "{row}").unwrap();
            }
        }

        let rows = read_rows(file.path()).unwrap();
        let set = build_windows(&rows, 50, 25);
        assert_eq!(set.recordings, 2);
        assert_eq!(set.movement_rows, 100);
        assert_eq!(set.len(), 6);

        let engine = ScriptedEngine::constant(ActivityClass::SittingStanding);
        let report = Evaluator::new(engine, &PipelineConfig::default())
            .evaluate(&set)
            .unwrap();
        assert_eq!(report.windows, 6);
        assert!((report.accuracy() - 0.5).abs() < 1e-12);
        assert_eq!(
            report
                .confusion
                .count(ActivityClass::Running, ActivityClass::SittingStanding),
            3
        );
        // still upright rows refine to sitting
        assert_eq!(report.refined["Sitting"].matched, 3);
    }

    #[test]
    fn test_evaluate_csv_export() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "recording_id,activity_type,timestamp,accel_x,accel_y,accel_z,gyro_x,gyro_y,gyro_z"
        )
        .unwrap();
        for i in 0..60 {
            writeln!(file, "r1,Lying down on back,{i},0.0,0.0,-1.0,0.0,0.0,0.0").unwrap();
        }
        for i in 0..60 {
            let activity = if i == 30 { "Juggling" } else { "Lying down on back" };
            writeln!(file, "r2,{activity},{i},0.0,0.0,-1.0,0.0,0.0,0.0").unwrap();
        }

        let rows = read_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 120);
        let set = build_windows(&rows, 50, 25);
        assert_eq!(set.len(), 1);
        assert_eq!(set.skipped_windows, 1);
        assert_eq!(set.windows[0].recording_id, "r1");

        let engine = ScriptedEngine::constant(ActivityClass::LyingDown);
        let report = Evaluator::new(engine, &PipelineConfig::default())
            .evaluate(&set)
            .unwrap();
        assert_eq!(report.skipped_windows, 1);
        assert_eq!(report.to_json()["skipped_windows"], 1);
    }
}
