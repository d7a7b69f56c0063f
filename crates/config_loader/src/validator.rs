//! Config validation
//!
//! Rules:
//! - at least one stream, stream ids non-empty and unique
//! - sample_rate_hz > 0
//! - window geometry: segments in {1, 2}, segments divide the window,
//!   retain <= length - 2, split windows keep exactly the newest half
//! - angle bands ordered inside [0, 180]
//! - thresholds finite and > 0
//! - stair blocks fit inside one trend segment
//! - linear model has a path
//! - sink names non-empty and unique, file sinks have a path

use std::collections::HashSet;

use contracts::{
    ContractError, LyingConfig, ModelKind, MonitorConfig, PipelineConfig, SinkType,
    SittingConfig, StepCounterConfig, WalkingConfig, WindowConfig,
};

/// Validate a MonitorConfig
///
/// Returns the first error encountered.
pub fn validate(config: &MonitorConfig) -> Result<(), ContractError> {
    validate_streams(config)?;
    validate_pipeline("pipeline", &config.pipeline)?;
    for stream in &config.streams {
        if let Some(pipeline) = &stream.pipeline {
            validate_pipeline(&format!("streams[{}].pipeline", stream.id), pipeline)?;
        }
    }
    validate_model(config)?;
    validate_ingestion(config)?;
    validate_sinks(config)?;
    Ok(())
}

fn validate_streams(config: &MonitorConfig) -> Result<(), ContractError> {
    if config.streams.is_empty() {
        return Err(ContractError::config_validation(
            "streams",
            "at least one stream is required",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, stream) in config.streams.iter().enumerate() {
        if stream.id.is_empty() {
            return Err(ContractError::config_validation(
                format!("streams[{idx}].id"),
                "stream id cannot be empty",
            ));
        }
        if !seen.insert(stream.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("streams[id={}]", stream.id),
                "duplicate stream id",
            ));
        }
        if !(stream.sample_rate_hz.is_finite() && stream.sample_rate_hz > 0.0) {
            return Err(ContractError::config_validation(
                format!("streams[{}].sample_rate_hz", stream.id),
                format!("sample_rate_hz must be > 0, got {}", stream.sample_rate_hz),
            ));
        }
    }
    Ok(())
}

/// Validate one pipeline section, `prefix` names it in errors
pub fn validate_pipeline(prefix: &str, pipeline: &PipelineConfig) -> Result<(), ContractError> {
    validate_window(prefix, &pipeline.window)?;
    validate_sitting(prefix, &pipeline.sitting)?;
    validate_lying(prefix, &pipeline.lying)?;
    validate_walking(prefix, &pipeline.walking, &pipeline.window)?;
    validate_steps(prefix, &pipeline.steps)?;

    if pipeline.engine.max_consecutive_failures == 0 {
        return Err(ContractError::config_validation(
            format!("{prefix}.engine.max_consecutive_failures"),
            "must be at least 1",
        ));
    }
    Ok(())
}

fn validate_window(prefix: &str, window: &WindowConfig) -> Result<(), ContractError> {
    let field = |name: &str| format!("{prefix}.window.{name}");

    if !matches!(window.segments, 1 | 2) {
        return Err(ContractError::config_validation(
            field("segments"),
            format!("segments must be 1 or 2, got {}", window.segments),
        ));
    }
    if window.length == 0 || window.length % window.segments != 0 {
        return Err(ContractError::config_validation(
            field("length"),
            format!(
                "length ({}) must be a positive multiple of segments ({})",
                window.length, window.segments
            ),
        ));
    }
    if window.retain >= window.length {
        return Err(ContractError::config_validation(
            field("retain"),
            format!(
                "retain ({}) must be < length ({})",
                window.retain, window.length
            ),
        ));
    }
    // a one-sample stride would refill the window during a retry
    if window.length - window.retain < 2 {
        return Err(ContractError::config_validation(
            field("retain"),
            format!(
                "windows need at least two new samples, retain ({}) must be <= {}",
                window.retain,
                window.length.saturating_sub(2)
            ),
        ));
    }
    if window.segments == 2 && window.retain != window.segment_length() {
        return Err(ContractError::config_validation(
            field("retain"),
            format!(
                "split windows retain exactly one segment ({}), got {}",
                window.segment_length(),
                window.retain
            ),
        ));
    }
    Ok(())
}

fn validate_sitting(prefix: &str, sitting: &SittingConfig) -> Result<(), ContractError> {
    let field = |name: &str| format!("{prefix}.sitting.{name}");

    if !(sitting.gyro_band_low.is_finite()
        && sitting.gyro_band_high.is_finite()
        && sitting.gyro_band_low < sitting.gyro_band_high)
    {
        return Err(ContractError::config_validation(
            field("gyro_band_low / gyro_band_high"),
            format!(
                "gyro band ({}, {}) must be finite with low < high",
                sitting.gyro_band_low, sitting.gyro_band_high
            ),
        ));
    }
    ensure_positive(&field("desk_work_threshold"), sitting.desk_work_threshold)?;
    ensure_angle_order(
        &field("upright_low / upright_high"),
        &[sitting.upright_low, sitting.upright_high],
    )?;
    if !sitting.standing_gyro_threshold.is_finite() {
        return Err(ContractError::config_validation(
            field("standing_gyro_threshold"),
            "must be finite",
        ));
    }
    Ok(())
}

fn validate_lying(prefix: &str, lying: &LyingConfig) -> Result<(), ContractError> {
    ensure_angle_order(
        &format!("{prefix}.lying"),
        &[
            lying.back_max,
            lying.right_max,
            lying.left_max,
            lying.stomach_max,
        ],
    )
}

fn validate_walking(
    prefix: &str,
    walking: &WalkingConfig,
    window: &WindowConfig,
) -> Result<(), ContractError> {
    let field = |name: &str| format!("{prefix}.walking.{name}");

    ensure_positive(&field("trend_threshold"), walking.trend_threshold)?;
    if walking.segment_length == 0 || window.length % walking.segment_length != 0 {
        return Err(ContractError::config_validation(
            field("segment_length"),
            format!(
                "segment_length ({}) must divide the window length ({})",
                walking.segment_length, window.length
            ),
        ));
    }
    if walking.blocks_per_segment == 0 || walking.block_length == 0 {
        return Err(ContractError::config_validation(
            field("blocks_per_segment / block_length"),
            "blocks_per_segment and block_length must be > 0",
        ));
    }
    if walking.block_extent() > walking.segment_length {
        return Err(ContractError::config_validation(
            field("block_stride"),
            format!(
                "blocks span {} samples but a segment holds {}",
                walking.block_extent(),
                walking.segment_length
            ),
        ));
    }
    Ok(())
}

fn validate_steps(prefix: &str, steps: &StepCounterConfig) -> Result<(), ContractError> {
    ensure_positive(
        &format!("{prefix}.steps.walking_threshold"),
        steps.walking_threshold,
    )?;
    ensure_positive(
        &format!("{prefix}.steps.running_threshold"),
        steps.running_threshold,
    )
}

fn validate_model(config: &MonitorConfig) -> Result<(), ContractError> {
    if config.model.kind == ModelKind::Linear && config.model.path.is_none() {
        return Err(ContractError::config_validation(
            "model.path",
            "linear model requires a path",
        ));
    }
    Ok(())
}

fn validate_ingestion(config: &MonitorConfig) -> Result<(), ContractError> {
    if config.ingestion.channel_capacity == 0 {
        return Err(ContractError::config_validation(
            "ingestion.channel_capacity",
            "channel_capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_sinks(config: &MonitorConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in config.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if sink.sink_type == SinkType::File && !sink.params.contains_key("path") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.path", sink.name),
                "file sink requires a path",
            ));
        }
    }
    Ok(())
}

fn ensure_positive(field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("must be finite and > 0, got {value}"),
        ))
    }
}

/// Band edges must be strictly increasing inside [0, 180]
fn ensure_angle_order(field: &str, edges: &[f64]) -> Result<(), ContractError> {
    let in_range = edges
        .iter()
        .all(|edge| edge.is_finite() && (0.0..=180.0).contains(edge));
    let increasing = edges.windows(2).all(|pair| pair[0] < pair[1]);
    if in_range && increasing {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("angle edges {edges:?} must increase strictly within [0, 180]"),
        ))
    }
}
