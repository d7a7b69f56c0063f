//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorConfig;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineOptions, ReplayOptions};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        streams = config.streams.len(),
        sinks = config.sinks.len(),
        model = ?config.model.kind,
        window = config.pipeline.window.length,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let options = PipelineOptions {
        config,
        replay: args.replay.clone().map(|path| ReplayOptions { path }),
        speed: args.speed,
        loop_playback: args.loop_playback,
        realtime: !args.fast,
        max_results: (args.max_results > 0).then_some(args.max_results),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    let pipeline = Pipeline::new(options);
    let shutdown_signal = shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                samples = stats.samples_processed,
                results = stats.results,
                duration_secs = stats.duration.as_secs_f64(),
                throughput = format!("{:.1}", stats.throughput()),
                "Pipeline completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Activity monitor finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &MonitorConfig) {
    let window = &config.pipeline.window;

    println!("\n=== Configuration Summary ===\n");
    println!("Streams ({}):", config.streams.len());
    for stream in &config.streams {
        let tuning = if stream.pipeline.is_some() {
            "own tuning"
        } else {
            "shared tuning"
        };
        println!(
            "  - {} ({}, {} Hz, {})",
            stream.id,
            stream.sensor.as_str(),
            stream.sample_rate_hz,
            tuning
        );
    }

    println!("\nWindow:");
    println!("  Length: {} samples", window.length);
    println!("  Retain: {} samples", window.retain);

    println!("\nModel: {:?}", config.model.kind);
    if let Some(ref path) = config.model.path {
        println!("  Path: {}", path.display());
    }

    if !config.sinks.is_empty() {
        println!("\nSinks ({}):", config.sinks.len());
        for sink in &config.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
