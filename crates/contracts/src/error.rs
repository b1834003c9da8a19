//! Layered error definitions
//!
//! Categorized by source: measurement / signal / shape / reference / config

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Measurement Errors =====
    /// A physical reading outside its valid domain (non-positive pressure, NaN latitude, ...)
    #[error("invalid {quantity} at index {index}: {value}")]
    InvalidMeasurement {
        quantity: String,
        index: usize,
        value: f64,
    },

    // ===== Signal Errors =====
    /// Waveform or transform parameters that cannot produce a mesh
    #[error("invalid signal: {message}")]
    InvalidSignal { message: String },

    // ===== Shape Errors =====
    /// Parallel arrays whose lengths disagree
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Dataset entry whose channel reports a different name than its key
    #[error("channel stored under '{key}' is named '{name}'")]
    ChannelNameMismatch { key: String, name: String },

    // ===== Reference Errors =====
    /// Reference fix required but not configured
    #[error("missing reference fix for channel '{channel}'")]
    MissingReference { channel: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Coarse error category, serializable for failure reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidMeasurement,
    InvalidSignal,
    ShapeMismatch,
    MissingReference,
    Config,
    Io,
    Other,
}

impl ContractError {
    /// Create invalid measurement error
    pub fn invalid_measurement(quantity: impl Into<String>, index: usize, value: f64) -> Self {
        Self::InvalidMeasurement {
            quantity: quantity.into(),
            index,
            value,
        }
    }

    /// Create invalid signal error
    pub fn invalid_signal(message: impl Into<String>) -> Self {
        Self::InvalidSignal {
            message: message.into(),
        }
    }

    /// Create shape mismatch error
    pub fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }

    /// Create channel name mismatch error
    pub fn channel_name_mismatch(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ChannelNameMismatch {
            key: key.into(),
            name: name.into(),
        }
    }

    /// Create missing reference error
    pub fn missing_reference(channel: impl Into<String>) -> Self {
        Self::MissingReference {
            channel: channel.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMeasurement { .. } => ErrorKind::InvalidMeasurement,
            Self::InvalidSignal { .. } => ErrorKind::InvalidSignal,
            Self::ShapeMismatch { .. } | Self::ChannelNameMismatch { .. } => {
                ErrorKind::ShapeMismatch
            }
            Self::MissingReference { .. } => ErrorKind::MissingReference,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}
