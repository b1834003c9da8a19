//! RunConfig - Config Loader 输出
//!
//! 描述一次处理运行：参考点、时频变换、时间基准、气压模型、同步合并与各通道策略。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::{
    ChannelName, ColorScalePolicy, GapPolicy, PressureModel, ReferenceFix, SpeedSource,
    TransformOptions, TransformType, DEFAULT_FLOOR_BITS,
};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 事件名称 (e.g., "Skyfall")
    #[validate(length(min = 1))]
    pub event_name: String,

    /// 站点 ID (可选，数据集中的值优先用于缺省)
    #[serde(default)]
    pub station_id: Option<String>,

    /// 参考点 (处理 location 时必需)
    #[serde(default)]
    #[validate(nested)]
    pub reference_fix: Option<ReferenceFix>,

    /// 时频变换
    #[serde(default)]
    #[validate(nested)]
    pub transform: TransformConfig,

    /// 网格时间基准
    #[serde(default)]
    pub time_reference: TimeReference,

    /// 大地测量
    #[serde(default)]
    pub geodesy: GeodesyConfig,

    /// 同步序列合并
    #[serde(default)]
    #[validate(nested)]
    pub synchronization: SynchronizationConfig,

    /// 各通道策略 (未列出的通道使用默认值)
    #[serde(default)]
    pub channels: BTreeMap<ChannelName, ChannelSettings>,
}

impl RunConfig {
    /// Settings for `name`, falling back to defaults
    pub fn channel_settings(&self, name: ChannelName) -> ChannelSettings {
        self.channels.get(&name).cloned().unwrap_or_default()
    }
}

/// 时频变换配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransformConfig {
    /// 变换类型
    #[serde(default)]
    pub kind: TransformType,

    /// 1/N 倍频程阶数
    #[serde(default = "default_order")]
    #[validate(range(min = 1, max = 24))]
    pub order: u32,

    /// 能量下限 (bits)
    #[serde(default = "default_floor_bits")]
    #[validate(range(exclusive_max = 0.0))]
    pub floor_bits: f64,

    /// 时间列抽取上限
    #[serde(default)]
    #[validate(range(min = 2))]
    pub max_time_points: Option<usize>,
}

impl TransformConfig {
    pub fn options(&self) -> TransformOptions {
        TransformOptions {
            floor_bits: self.floor_bits,
            max_time_points: self.max_time_points,
        }
    }
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            kind: TransformType::default(),
            order: default_order(),
            floor_bits: default_floor_bits(),
            max_time_points: None,
        }
    }
}

fn default_order() -> u32 {
    12
}

fn default_floor_bits() -> f64 {
    DEFAULT_FLOOR_BITS
}

/// 网格时间基准
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeReference {
    /// 每个网格相对于自身通道的首个 epoch
    #[default]
    ChannelStart,
    /// 所有网格相对于某通道的首个 epoch
    Channel { channel: ChannelName },
    /// 所有网格相对于固定 epoch
    Epoch { epoch_s: f64 },
}

/// 大地测量配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeodesyConfig {
    #[serde(default)]
    pub speed_source: SpeedSource,

    #[serde(default)]
    pub pressure_model: PressureModel,
}

/// 同步序列合并配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SynchronizationConfig {
    /// 间隙哨兵相对前一样本的偏移 (秒)
    #[serde(default = "default_gap_duration_s")]
    #[validate(range(exclusive_min = 0.0))]
    pub gap_duration_s: f64,

    /// 间隙检测策略
    #[serde(default)]
    pub gap_policy: GapPolicy,
}

impl Default for SynchronizationConfig {
    fn default() -> Self {
        Self {
            gap_duration_s: default_gap_duration_s(),
            gap_policy: GapPolicy::default(),
        }
    }
}

fn default_gap_duration_s() -> f64 {
    5.0
}

/// 单通道策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChannelSettings {
    /// 跳过该通道
    #[serde(default)]
    pub skip: bool,

    /// 使用高通变体
    #[serde(default)]
    pub highpass: bool,

    /// 高通变体缺失时回退滤波器的截止频率 (Hz)；None = 按采样率推导
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0))]
    pub highpass_cutoff_hz: Option<f64>,

    /// 色标策略
    #[serde(default)]
    pub color_scale: ColorScalePolicy,

    /// `range` 策略下的动态范围 (bits)
    #[serde(default = "default_color_range_bits")]
    #[validate(range(exclusive_min = 0.0))]
    pub color_range_bits: f64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            skip: false,
            highpass: false,
            highpass_cutoff_hz: None,
            color_scale: ColorScalePolicy::default(),
            color_range_bits: default_color_range_bits(),
        }
    }
}

fn default_color_range_bits() -> f64 {
    15.0
}
