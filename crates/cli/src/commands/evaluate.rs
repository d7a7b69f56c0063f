//! `evaluate` command implementation.

use anyhow::{Context, Result};
use contracts::{InferenceEngine, ModelConfig, ModelKind, PipelineConfig};
use evaluation::{build_windows, read_rows, Evaluator};
use tracing::{info, warn};

use crate::cli::EvaluateArgs;
use crate::error::CliError;

/// Execute the `evaluate` command
pub fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let (pipeline, model) = resolve_model(args)?;

    let engine = inference::load_engine(&model, &pipeline).context("Failed to load model")?;
    info!(
        engine = engine.name(),
        recordings = %args.recordings.display(),
        "Evaluating model"
    );

    let rows = read_rows(&args.recordings)
        .with_context(|| format!("Failed to read {}", args.recordings.display()))?;
    let set = build_windows(&rows, pipeline.window.length, args.step.max(1));
    for (activity, count) in &set.unknown_activities {
        warn!(activity = %activity, rows = count, "Skipped rows with unknown activity");
    }
    if set.skipped_windows > 0 {
        warn!(
            windows = set.skipped_windows,
            "Skipped windows overlapping unknown activities"
        );
    }
    info!(
        rows = rows.len(),
        windows = set.len(),
        recordings = set.recordings,
        "Windows built"
    );

    let report = Evaluator::new(engine, &pipeline).evaluate(&set)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report.to_json())
            .context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Pipeline tuning and model from the optional config and `--model`
fn resolve_model(args: &EvaluateArgs) -> Result<(PipelineConfig, ModelConfig)> {
    let (pipeline, mut model) = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            let config = config_loader::ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config.pipeline, config.model)
        }
        None => (PipelineConfig::default(), ModelConfig::default()),
    };

    if let Some(ref path) = args.model {
        model = ModelConfig {
            kind: ModelKind::Linear,
            path: Some(path.clone()),
        };
    }
    Ok((pipeline, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> EvaluateArgs {
        EvaluateArgs {
            recordings: "rows.jsonl".into(),
            config: None,
            model: None,
            step: 25,
            json: false,
        }
    }

    #[test]
    fn test_defaults_to_stub() {
        let (pipeline, model) = resolve_model(&args()).unwrap();
        assert_eq!(model.kind, ModelKind::Stub);
        assert_eq!(pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_model_flag_selects_linear() {
        let mut args = args();
        args.model = Some("model.json".into());
        let (_, model) = resolve_model(&args).unwrap();
        assert_eq!(model.kind, ModelKind::Linear);
        assert_eq!(model.path.unwrap(), std::path::PathBuf::from("model.json"));
    }

    #[test]
    fn test_missing_config_is_reported() {
        let mut args = args();
        args.config = Some("/nonexistent/monitor.toml".into());
        let err = resolve_model(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound { .. })
        ));
    }
}
