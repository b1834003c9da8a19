//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RunConfig, TimeReference};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    event_name: String,
    transform: String,
    order: u32,
    has_reference_fix: bool,
    configured_channels: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    event_name: config.event_name.clone(),
                    transform: config.transform.kind.to_string(),
                    order: config.transform.order,
                    has_reference_fix: config.reference_fix.is_some(),
                    configured_channels: config.channels.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RunConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.reference_fix.is_none() {
        warnings.push(
            "No reference_fix configured - location trajectory will be reported as failed"
                .to_string(),
        );
    }

    if let TimeReference::Channel { channel } = config.time_reference {
        if config.channel_settings(channel).skip {
            warnings.push(format!(
                "time_reference channel '{channel}' is skipped - its mesh will not be produced"
            ));
        }
    }

    for (name, settings) in &config.channels {
        if settings.highpass_cutoff_hz.is_some() && !settings.highpass {
            warnings.push(format!(
                "channels.{name}.highpass_cutoff_hz is set but highpass is disabled"
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Event: {}", summary.event_name);
            println!("  Transform: {} (1/{} octave)", summary.transform, summary.order);
            println!("  Reference fix: {}", if summary.has_reference_fix { "yes" } else { "no" });
            println!("  Configured channels: {}", summary.configured_channels);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};
    use std::io::Write;

    #[test]
    fn test_warnings() {
        let config = ConfigLoader::load_from_str(
            r#"
event_name = "Skyfall"
[channels.audio]
highpass_cutoff_hz = 1.0
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        let warnings = collect_warnings(&config);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("reference_fix"));
        assert!(warnings[1].contains("channels.audio"));
    }

    #[test]
    fn test_validate_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "event_name = \"Skyfall\"").unwrap();

        let args = ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        };
        let result = validate_config(&args);
        assert!(result.valid);
        assert_eq!(result.summary.unwrap().order, 12);
    }

    #[test]
    fn test_validate_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/run.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
