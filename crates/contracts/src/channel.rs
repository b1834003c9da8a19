//! Channel data model - dataset collaborator output
//!
//! 传感器通道、位置序列与整体数据集。所有数组按 epoch 对齐。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{ContractError, SyncSample};

/// 传感器通道名称 (封闭枚举)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelName {
    Audio,
    Barometer,
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Location,
}

impl ChannelName {
    /// Channels that carry waveforms suitable for spectral analysis
    pub const WAVEFORM: [ChannelName; 5] = [
        ChannelName::Audio,
        ChannelName::Barometer,
        ChannelName::Accelerometer,
        ChannelName::Gyroscope,
        ChannelName::Magnetometer,
    ];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Audio => "Audio",
            Self::Barometer => "Barometer",
            Self::Accelerometer => "Accelerometer",
            Self::Gyroscope => "Gyroscope",
            Self::Magnetometer => "Magnetometer",
            Self::Location => "Location",
        }
    }

    /// Stable snake_case identifier (metrics labels, file names)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Barometer => "barometer",
            Self::Accelerometer => "accelerometer",
            Self::Gyroscope => "gyroscope",
            Self::Magnetometer => "magnetometer",
            Self::Location => "location",
        }
    }

    /// Expected number of waveform axes; `None` for non-waveform channels
    pub fn expected_axes(&self) -> Option<usize> {
        match self {
            Self::Audio | Self::Barometer => Some(1),
            Self::Accelerometer | Self::Gyroscope | Self::Magnetometer => Some(3),
            Self::Location => None,
        }
    }

    pub fn is_waveform(&self) -> bool {
        self.expected_axes().is_some()
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 波形变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformVariant {
    #[default]
    Raw,
    Highpass,
}

/// 单个传感器通道
///
/// 每个轴 (raw / highpass) 的长度必须等于 `epochs_s` 的长度。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// 通道名称
    pub name: ChannelName,

    /// 标称采样率 (Hz)
    pub sample_rate_hz: f64,

    /// 采样时间戳 (Unix 秒)，单调不减，可能不均匀
    pub epochs_s: Vec<f64>,

    /// 原始波形 (每轴一个数组)
    pub raw: Vec<Vec<f64>>,

    /// 高通波形 (可选，由数据集协作方提供)
    #[serde(default)]
    pub highpass: Option<Vec<Vec<f64>>>,
}

impl Channel {
    /// Check axis counts and per-axis lengths against the epoch array
    pub fn validate(&self) -> Result<(), ContractError> {
        let n = self.epochs_s.len();

        if let Some(expected) = self.name.expected_axes() {
            if self.raw.len() != expected {
                return Err(ContractError::shape_mismatch(
                    format!("{}.raw axes", self.name),
                    expected,
                    self.raw.len(),
                ));
            }
        }

        for (axis, values) in self.raw.iter().enumerate() {
            if values.len() != n {
                return Err(ContractError::shape_mismatch(
                    format!("{}.raw[{axis}]", self.name),
                    n,
                    values.len(),
                ));
            }
        }

        if let Some(highpass) = &self.highpass {
            if highpass.len() != self.raw.len() {
                return Err(ContractError::shape_mismatch(
                    format!("{}.highpass axes", self.name),
                    self.raw.len(),
                    highpass.len(),
                ));
            }
            for (axis, values) in highpass.iter().enumerate() {
                if values.len() != n {
                    return Err(ContractError::shape_mismatch(
                        format!("{}.highpass[{axis}]", self.name),
                        n,
                        values.len(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Axes of the requested variant, if present
    pub fn axes(&self, variant: WaveformVariant) -> Option<&[Vec<f64>]> {
        match variant {
            WaveformVariant::Raw => Some(&self.raw),
            WaveformVariant::Highpass => self.highpass.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.epochs_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs_s.is_empty()
    }

    pub fn first_epoch(&self) -> Option<f64> {
        self.epochs_s.first().copied()
    }

    pub fn last_epoch(&self) -> Option<f64> {
        self.epochs_s.last().copied()
    }

    /// Health summary: rate, span and sample count
    pub fn summary(&self) -> ChannelSummary {
        let first = self.first_epoch();
        let last = self.last_epoch();
        let duration_s = match (first, last) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        };
        let samples = self.len();
        let effective_rate_hz = if samples > 1 && duration_s > 0.0 {
            (samples - 1) as f64 / duration_s
        } else {
            0.0
        };

        ChannelSummary {
            name: self.name,
            sample_rate_hz: self.sample_rate_hz,
            first_epoch_s: first,
            last_epoch_s: last,
            duration_s,
            samples,
            axes: self.raw.len(),
            has_highpass: self.highpass.is_some(),
            effective_rate_hz,
        }
    }
}

/// 通道摘要 (采样率、首个 epoch、时长)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub name: ChannelName,
    pub sample_rate_hz: f64,
    pub first_epoch_s: Option<f64>,
    pub last_epoch_s: Option<f64>,
    pub duration_s: f64,
    pub samples: usize,
    pub axes: usize,
    pub has_highpass: bool,
    /// 由时间戳估计的实际采样率
    pub effective_rate_hz: f64,
}

/// 位置序列 (WGS-84 大地坐标)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationSeries {
    pub epochs_s: Vec<f64>,
    pub latitude_deg: Vec<f64>,
    pub longitude_deg: Vec<f64>,
    pub altitude_m: Vec<f64>,

    /// 设备报告的速度 (m/s)，可选
    #[serde(default)]
    pub speed_m_s: Option<Vec<f64>>,
}

impl LocationSeries {
    pub fn len(&self) -> usize {
        self.epochs_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs_s.is_empty()
    }

    pub fn first_epoch(&self) -> Option<f64> {
        self.epochs_s.first().copied()
    }

    /// All coordinate arrays must share the epoch length
    pub fn validate(&self) -> Result<(), ContractError> {
        let n = self.epochs_s.len();
        let columns: [(&str, usize); 3] = [
            ("location.latitude_deg", self.latitude_deg.len()),
            ("location.longitude_deg", self.longitude_deg.len()),
            ("location.altitude_m", self.altitude_m.len()),
        ];
        for (what, len) in columns {
            if len != n {
                return Err(ContractError::shape_mismatch(what, n, len));
            }
        }
        if let Some(speed) = &self.speed_m_s {
            if speed.len() != n {
                return Err(ContractError::shape_mismatch(
                    "location.speed_m_s",
                    n,
                    speed.len(),
                ));
            }
        }
        Ok(())
    }
}

/// 数据集 (不可变，跨任务通过 Arc 共享)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// 站点 ID
    #[serde(default)]
    pub station_id: String,

    /// 波形通道
    #[serde(default)]
    pub channels: BTreeMap<ChannelName, Arc<Channel>>,

    /// 位置序列
    #[serde(default)]
    pub location: Option<Arc<LocationSeries>>,

    /// 时钟同步交换样本
    #[serde(default)]
    pub synchronization: Vec<SyncSample>,
}

impl Dataset {
    pub fn channel(&self, name: ChannelName) -> Option<&Arc<Channel>> {
        self.channels.get(&name)
    }

    /// Summaries for every waveform channel, ordered by name
    pub fn summaries(&self) -> Vec<ChannelSummary> {
        self.channels.values().map(|c| c.summary()).collect()
    }
}
