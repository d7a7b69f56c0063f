//! Config parsing
//!
//! TOML is the primary format, JSON is accepted.

use contracts::{ContractError, MonitorConfig};

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_toml(content: &str) -> Result<MonitorConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse_json(content: &str) -> Result<MonitorConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

pub fn parse(content: &str, format: ConfigFormat) -> Result<MonitorConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ModelKind, SinkType};

    #[test]
    fn test_parse_toml() {
        let content = r#"
[[streams]]
id = "respeck"
sample_rate_hz = 25.0

[pipeline.window]
length = 50
retain = 25
segments = 2

[model]
kind = "linear"
path = "models/respeck.json"

[[sinks]]
name = "results"
sink_type = "file"
[sinks.params]
path = "out"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.streams.len(), 1);
        assert_eq!(config.model.kind, ModelKind::Linear);
        assert_eq!(config.sinks[0].sink_type, SinkType::File);
        assert_eq!(config.sinks[0].params.get("path").map(String::as_str), Some("out"));
        assert_eq!(config.sinks[0].queue_capacity, 100);
    }

    #[test]
    fn test_parse_json() {
        let content = r#"{
            "streams": [{ "id": "respeck" }, { "id": "thingy", "sensor": "thingy" }],
            "pipeline": { "steps": { "running_threshold": 1.2 } },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.pipeline.steps.running_threshold, 1.2);
        assert_eq!(config.pipeline.steps.walking_threshold, 1.2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_toml("streams = [[["),
            Err(ContractError::ConfigParse { .. })
        ));
        // streams is required
        assert!(matches!(
            parse_json("{}"),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
