//! Spectral mesh types
//!
//! 时频网格：time × frequency 的能量矩阵 (bits)。

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// 时频变换类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    /// 常 Q Gabor/Morlet 小波
    #[default]
    Wavelet,
    /// 短时傅里叶变换
    Stft,
}

impl std::fmt::Display for TransformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wavelet => f.write_str("wavelet"),
            Self::Stft => f.write_str("stft"),
        }
    }
}

/// 变换参数 (除阶数与变换类型之外)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// 下限 (bits)，低于此值的能量被截断
    pub floor_bits: f64,

    /// 网格时间列数上限 (None = 不抽取)
    pub max_time_points: Option<usize>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            floor_bits: DEFAULT_FLOOR_BITS,
            max_time_points: None,
        }
    }
}

/// Default dynamic-range floor of a mesh
pub const DEFAULT_FLOOR_BITS: f64 = -32.0;

/// 时频网格
///
/// `bits` 的形状为 `(time_s.len(), frequency_hz.len())`。
/// 时间相对于 `epoch_origin_s`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralMesh {
    pub transform: TransformType,
    pub order: u32,
    /// Unix 秒，时间轴零点
    pub epoch_origin_s: f64,
    pub time_s: Vec<f64>,
    pub frequency_hz: Vec<f64>,
    pub bits: Array2<f64>,
}

impl SpectralMesh {
    /// (time, frequency)
    pub fn shape(&self) -> (usize, usize) {
        self.bits.dim()
    }

    /// Same mesh with its time origin set to `epoch_origin_s` (no shift)
    pub fn with_epoch_origin(mut self, epoch_origin_s: f64) -> Self {
        self.epoch_origin_s = epoch_origin_s;
        self
    }

    /// Copy whose time axis is relative to `reference_epoch_s`
    pub fn reframed(&self, reference_epoch_s: f64) -> Self {
        let shift = self.epoch_origin_s - reference_epoch_s;
        Self {
            transform: self.transform,
            order: self.order,
            epoch_origin_s: reference_epoch_s,
            time_s: self.time_s.iter().map(|t| t + shift).collect(),
            frequency_hz: self.frequency_hz.clone(),
            bits: self.bits.clone(),
        }
    }

    pub fn max_bits(&self) -> f64 {
        self.bits.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min_bits(&self) -> f64 {
        self.bits.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// 色标策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScalePolicy {
    /// 使用网格自身的 min/max
    #[default]
    Auto,
    /// 以最大值为上限，向下 `range_bits`
    Range,
}

/// 渲染用色标上下限 (bits)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorLimits {
    pub min_bits: f64,
    pub max_bits: f64,
}
