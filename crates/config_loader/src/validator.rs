//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (`validator` derive：事件名、阶数、下限、时间列上限)
//! - 数值必须有限 (derive 的 range 检查对 NaN 放行)
//! - 参考点经纬度范围
//! - 气压模型：log_polynomial 至少两个系数、参考气压 > 0
//! - 时间基准通道不能是 location
//! - 间隙策略阈值 > 0
//! - 各通道色标范围与高通截止频率 > 0

use ::validator::Validate;
use contracts::{ChannelName, ContractError, GapPolicy, PressureModel, RunConfig, TimeReference};

/// 校验 RunConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &RunConfig) -> Result<(), ContractError> {
    validate_derived(config)?;
    validate_finite(config)?;
    validate_reference_fix(config)?;
    validate_pressure_model(config)?;
    validate_time_reference(config)?;
    validate_gap_policy(config)?;
    validate_channels(config)?;
    Ok(())
}

/// derive 生成的字段级约束
fn validate_derived(config: &RunConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field = errors
            .errors()
            .keys()
            .map(|k| k.to_string())
            .min()
            .unwrap_or_else(|| "config".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

fn require_finite(field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            field,
            format!("must be finite, got {value}"),
        ))
    }
}

/// NaN / inf 检查
fn validate_finite(config: &RunConfig) -> Result<(), ContractError> {
    require_finite("transform.floor_bits", config.transform.floor_bits)?;
    require_finite(
        "synchronization.gap_duration_s",
        config.synchronization.gap_duration_s,
    )?;
    if let TimeReference::Epoch { epoch_s } = config.time_reference {
        require_finite("time_reference.epoch_s", epoch_s)?;
    }
    Ok(())
}

/// 校验参考点
fn validate_reference_fix(config: &RunConfig) -> Result<(), ContractError> {
    let Some(fix) = &config.reference_fix else {
        return Ok(());
    };

    require_finite("reference_fix.latitude_deg", fix.latitude_deg)?;
    require_finite("reference_fix.longitude_deg", fix.longitude_deg)?;
    require_finite("reference_fix.altitude_m", fix.altitude_m)?;
    require_finite("reference_fix.epoch_s", fix.epoch_s)?;
    Ok(())
}

/// 校验气压模型
fn validate_pressure_model(config: &RunConfig) -> Result<(), ContractError> {
    if let PressureModel::LogPolynomial {
        reference_kpa,
        coefficients,
    } = &config.geodesy.pressure_model
    {
        if !(reference_kpa.is_finite() && *reference_kpa > 0.0) {
            return Err(ContractError::config_validation(
                "geodesy.pressure_model.reference_kpa",
                format!("reference_kpa must be finite and > 0, got {reference_kpa}"),
            ));
        }
        if coefficients.len() < 2 {
            return Err(ContractError::config_validation(
                "geodesy.pressure_model.coefficients",
                format!(
                    "log_polynomial needs at least 2 coefficients, got {}",
                    coefficients.len()
                ),
            ));
        }
        if let Some((i, c)) = coefficients.iter().enumerate().find(|(_, c)| !c.is_finite()) {
            return Err(ContractError::config_validation(
                format!("geodesy.pressure_model.coefficients[{i}]"),
                format!("must be finite, got {c}"),
            ));
        }
    }
    Ok(())
}

/// 校验时间基准
fn validate_time_reference(config: &RunConfig) -> Result<(), ContractError> {
    if let TimeReference::Channel { channel } = config.time_reference {
        if channel == ChannelName::Location {
            return Err(ContractError::config_validation(
                "time_reference.channel",
                "location has no mesh and cannot be the time reference",
            ));
        }
    }
    Ok(())
}

/// 校验间隙策略
fn validate_gap_policy(config: &RunConfig) -> Result<(), ContractError> {
    match &config.synchronization.gap_policy {
        GapPolicy::MaxInterval { threshold_s } => {
            if !(threshold_s.is_finite() && *threshold_s > 0.0) {
                return Err(ContractError::config_validation(
                    "synchronization.gap_policy.threshold_s",
                    format!("threshold_s must be finite and > 0, got {threshold_s}"),
                ));
            }
        }
        GapPolicy::AtIndices { indices } => {
            if indices.contains(&0) {
                return Err(ContractError::config_validation(
                    "synchronization.gap_policy.indices",
                    "a gap cannot precede the first exchange (index 0)",
                ));
            }
        }
        GapPolicy::None => {}
    }
    Ok(())
}

/// 校验各通道策略
fn validate_channels(config: &RunConfig) -> Result<(), ContractError> {
    for (name, settings) in &config.channels {
        settings.validate().map_err(|errors| {
            ContractError::config_validation(format!("channels.{name}"), errors.to_string())
        })?;

        require_finite(
            &format!("channels.{name}.color_range_bits"),
            settings.color_range_bits,
        )?;
        if let Some(cutoff) = settings.highpass_cutoff_hz {
            require_finite(&format!("channels.{name}.highpass_cutoff_hz"), cutoff)?;
        }
    }
    Ok(())
}
