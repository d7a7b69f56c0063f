//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{MonitorConfig, PipelineConfig};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    model: ModelInfo,
    ingestion: IngestionInfo,
    window: WindowInfo,
    streams: Vec<StreamInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct ModelInfo {
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
}

#[derive(Serialize)]
struct IngestionInfo {
    channel_capacity: usize,
    drop_policy: String,
}

#[derive(Serialize)]
struct WindowInfo {
    length: usize,
    retain: usize,
    segments: usize,
}

#[derive(Serialize)]
struct StreamInfo {
    id: String,
    sensor: String,
    sample_rate_hz: f64,
    overrides_pipeline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<PipelineConfig>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &MonitorConfig, args: &InfoArgs) -> ConfigInfo {
    let window = &config.pipeline.window;

    let streams = config
        .streams
        .iter()
        .map(|s| StreamInfo {
            id: s.id.to_string(),
            sensor: s.sensor.as_str().to_string(),
            sample_rate_hz: s.sample_rate_hz,
            overrides_pipeline: s.pipeline.is_some(),
            pipeline: args.streams.then(|| config.pipeline_for(s)),
        })
        .collect();

    let sinks = if args.sinks {
        config
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        model: ModelInfo {
            kind: format!("{:?}", config.model.kind),
            path: config.model.path.as_ref().map(|p| p.display().to_string()),
        },
        ingestion: IngestionInfo {
            channel_capacity: config.ingestion.channel_capacity,
            drop_policy: format!("{:?}", config.ingestion.drop_policy),
        },
        window: WindowInfo {
            length: window.length,
            retain: window.retain,
            segments: window.segments,
        },
        streams,
        sinks,
    }
}

fn print_config_info(config: &MonitorConfig, args: &InfoArgs) {
    let pipeline = &config.pipeline;

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Activity Monitor Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🧠 Model");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Kind: {:?}", config.model.kind);
    match &config.model.path {
        Some(path) => println!("   └─ Path: {}", path.display()),
        None => println!("   └─ Path: (built-in)"),
    }

    println!("\n🪟 Window");
    println!("   ├─ Length: {} samples", pipeline.window.length);
    println!("   ├─ Retain: {} samples", pipeline.window.retain);
    println!("   ├─ Segments: {}", pipeline.window.segments);
    println!(
        "   ├─ Steps: walking > {}, running > {}",
        pipeline.steps.walking_threshold, pipeline.steps.running_threshold
    );
    println!(
        "   └─ Abort after {} consecutive failures",
        pipeline.engine.max_consecutive_failures
    );

    println!("\n📡 Streams ({})", config.streams.len());
    for (i, stream) in config.streams.iter().enumerate() {
        let is_last = i == config.streams.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({}, {} Hz)",
            prefix,
            stream.id,
            stream.sensor.as_str(),
            stream.sample_rate_hz
        );

        if args.streams {
            let effective = config.pipeline_for(stream);
            let source = if stream.pipeline.is_some() {
                "own"
            } else {
                "shared"
            };
            println!(
                "   {}  └─ {} tuning: window {}/{}, trend threshold {}",
                child_prefix,
                source,
                effective.window.length,
                effective.window.retain,
                effective.walking.trend_threshold
            );
        }
    }

    if !config.sinks.is_empty() {
        println!("\n📤 Sinks ({})", config.sinks.len());
        for (i, sink) in config.sinks.iter().enumerate() {
            let is_last = i == config.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            if args.sinks {
                println!(
                    "   {} {} ({:?}, queue {}) {:?}",
                    prefix, sink.name, sink.sink_type, sink.queue_capacity, sink.params
                );
            } else {
                println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);
            }
        }
    }

    println!();
}
