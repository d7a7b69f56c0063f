//! # Config Loader
//!
//! Loads a [`MonitorConfig`] from TOML or JSON and validates it before any
//! stream is started.
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("monitor.toml")).unwrap();
//! println!("streams: {}", config.streams.len());
//! ```

mod parser;
mod validator;

pub use contracts::MonitorConfig;
pub use parser::ConfigFormat;
pub use validator::validate_pipeline;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file, format chosen by extension
    ///
    /// # Errors
    /// Read, unsupported format, parse or validation failure.
    pub fn load_from_path(path: &Path) -> Result<MonitorConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<MonitorConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already built configuration
    pub fn validate(config: &MonitorConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    pub fn to_toml(config: &MonitorConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(config: &MonitorConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MONITOR_TOML: &str = r#"
[[streams]]
id = "respeck"
sensor = "respeck"

[[streams]]
id = "thingy"
sensor = "thingy"
sample_rate_hz = 26.0

[pipeline.steps]
walking_threshold = 1.2
running_threshold = 10.0

[[sinks]]
name = "log"
sink_type = "log"
"#;

    #[test]
    fn test_load_from_str() {
        let config = ConfigLoader::load_from_str(MONITOR_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.streams.len(), 2);
        assert_eq!(config.streams[1].sample_rate_hz, 26.0);
        assert_eq!(config.pipeline.window.length, 50);
    }

    #[test]
    fn test_round_trip_toml_and_json() {
        let config = ConfigLoader::load_from_str(MONITOR_TOML, ConfigFormat::Toml).unwrap();

        let toml = ConfigLoader::to_toml(&config).unwrap();
        let from_toml = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(from_toml.pipeline, config.pipeline);

        let json = ConfigLoader::to_json(&config).unwrap();
        let from_json = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(from_json.streams[1].id, "thingy");
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[streams]]
id = "respeck"

[pipeline.window]
segments = 2
retain = 10
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MONITOR_TOML.as_bytes()).unwrap();
        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.streams[0].id, "respeck");

        let unknown = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(unknown.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
