//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式，输出 `RunConfig`。

use contracts::{ContractError, RunConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<RunConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<RunConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RunConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GapPolicy, PressureModel, TransformType};

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
event_name = "Skyfall"

[transform]
kind = "wavelet"
order = 3

[synchronization.gap_policy]
kind = "none"
"#;
        let config = parse_toml(content).unwrap();
        assert_eq!(config.event_name, "Skyfall");
        assert_eq!(config.transform.kind, TransformType::Wavelet);
        assert_eq!(config.synchronization.gap_policy, GapPolicy::None);
        assert_eq!(config.geodesy.pressure_model, PressureModel::StandardAtmosphere);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "event_name": "Skyfall",
            "transform": { "kind": "stft", "order": 12 },
            "time_reference": { "kind": "epoch", "epoch_s": 1603808160.0 },
            "channels": { "audio": { "color_scale": "range" } }
        }"#;
        let config = parse_json(content).unwrap();
        assert_eq!(config.transform.kind, TransformType::Stft);
        assert_eq!(config.channels.len(), 1);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let err = parse_toml("invalid toml [[[").unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let content = r#"
event_name = "Skyfall"
[channels.thermometer]
skip = true
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
