//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON run configuration files
//! - Validate configuration legality
//! - Produce `RunConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("run.toml")).unwrap();
//! println!("Event: {}", config.event_name);
//! ```

mod parser;
mod validator;

pub use contracts::RunConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<RunConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<RunConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Validate an already-built configuration (e.g. after CLI overrides)
    pub fn validate(config: &RunConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize RunConfig to TOML string
    pub fn to_toml(config: &RunConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize RunConfig to JSON string
    pub fn to_json(config: &RunConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ChannelName, ColorScalePolicy, TimeReference, TransformType};

    const FULL_TOML: &str = r#"
version = "V1"
event_name = "Skyfall"
station_id = "1637610021"

[reference_fix]
latitude_deg = 35.83
longitude_deg = -115.57
altitude_m = 1028.2
epoch_s = 1603808160.0

[transform]
kind = "stft"
order = 6
max_time_points = 2000

[time_reference]
kind = "channel"
channel = "audio"

[geodesy.pressure_model]
kind = "log_polynomial"
reference_kpa = 101.325
coefficients = [0.0, 8434.5]

[synchronization]
gap_duration_s = 5.0
[synchronization.gap_policy]
kind = "at_indices"
indices = [11]

[channels.barometer]
highpass = true
color_scale = "range"
color_range_bits = 12.0
highpass_cutoff_hz = 0.01

[channels.gyroscope]
skip = true
"#;

    #[test]
    fn test_load_from_str_toml() {
        let config = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(config.event_name, "Skyfall");
        assert_eq!(config.transform.kind, TransformType::Stft);
        assert_eq!(config.transform.order, 6);
        assert_eq!(
            config.time_reference,
            TimeReference::Channel {
                channel: ChannelName::Audio
            }
        );

        let barometer = config.channel_settings(ChannelName::Barometer);
        assert!(barometer.highpass);
        assert_eq!(barometer.color_scale, ColorScalePolicy::Range);
        assert!(config.channel_settings(ChannelName::Gyroscope).skip);
        assert!(!config.channel_settings(ChannelName::Audio).skip);
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            ConfigLoader::load_from_str("event_name = \"Skyfall\"", ConfigFormat::Toml).unwrap();
        assert_eq!(config.transform.kind, TransformType::Wavelet);
        assert_eq!(config.transform.order, 12);
        assert_eq!(config.transform.floor_bits, -32.0);
        assert_eq!(config.time_reference, TimeReference::ChannelStart);
        assert_eq!(config.synchronization.gap_duration_s, 5.0);
        assert!(config.reference_fix.is_none());
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let again = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.transform.order, again.transform.order);
        assert_eq!(config.time_reference, again.time_reference);
        assert_eq!(config.channels, again.channels);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(FULL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let again = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.event_name, again.event_name);
        assert_eq!(config.geodesy.pressure_model, again.geodesy.pressure_model);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
event_name = "Skyfall"
[transform]
order = 30
"#;
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
        assert!(err.to_string().contains("order"));
    }

    #[test]
    fn test_load_from_path_unknown_extension() {
        let err = ConfigLoader::load_from_path(Path::new("run.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }
}
