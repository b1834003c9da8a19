//! RunBundle - Pipeline 输出
//!
//! 一次运行的全部产物，交给渲染协作方。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    Channel, ChannelName, ChannelSummary, ColorLimits, ContractError, DerivedTrajectory,
    ErrorKind, MergedSyncSeries, SpectralMesh, WaveformVariant,
};

/// 处理阶段 (用于失败归因)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Validate,
    Highpass,
    Transform,
    Height,
    Trajectory,
    Synchronization,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validate => "validate",
            Self::Highpass => "highpass",
            Self::Transform => "transform",
            Self::Height => "height",
            Self::Trajectory => "trajectory",
            Self::Synchronization => "synchronization",
        };
        f.write_str(s)
    }
}

/// 单通道失败记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFailure {
    /// 通道名 (或 "synchronization")
    pub channel: String,
    pub stage: ProcessingStage,
    pub kind: ErrorKind,
    pub message: String,
}

impl ChannelFailure {
    pub fn new(channel: impl Into<String>, stage: ProcessingStage, error: &ContractError) -> Self {
        Self {
            channel: channel.into(),
            stage,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// 单通道产物
#[derive(Debug, Clone, Serialize)]
pub struct ChannelProduct {
    pub channel: ChannelName,

    /// 实际使用的波形变体
    pub variant: WaveformVariant,

    /// 高通变体由回退滤波器生成
    pub highpass_fallback: bool,

    pub summary: ChannelSummary,

    /// 每轴一个网格，按轴顺序
    pub meshes: Vec<SpectralMesh>,

    /// 每轴色标
    pub color_limits: Vec<ColorLimits>,

    /// 原始通道 (进程内共享，供渲染使用，不序列化)
    #[serde(skip)]
    pub source: Option<Arc<Channel>>,
}

/// 一次运行的全部产物
///
/// 仅输出：NaN 哨兵序列化为 `null`，无法读回 `Vec<f64>`，因此不实现 Deserialize。
#[derive(Debug, Clone, Serialize)]
pub struct RunBundle {
    pub event_name: String,
    pub station_id: String,

    /// 共享时间基准 (None = 每个网格相对于自身通道)
    pub time_reference_epoch_s: Option<f64>,

    pub products: BTreeMap<ChannelName, ChannelProduct>,

    /// 气压高度 (m)，与 barometer epochs 对齐
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barometric_height_m: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<DerivedTrajectory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synchronization: Option<MergedSyncSeries>,

    pub failures: Vec<ChannelFailure>,
}

impl RunBundle {
    pub fn new(event_name: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            station_id: station_id.into(),
            time_reference_epoch_s: None,
            products: BTreeMap::new(),
            barometric_height_m: None,
            trajectory: None,
            synchronization: None,
            failures: Vec::new(),
        }
    }

    pub fn product(&self, name: ChannelName) -> Option<&ChannelProduct> {
        self.products.get(&name)
    }

    /// Failures recorded against `channel`
    pub fn failures_for<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a ChannelFailure> {
        self.failures.iter().filter(move |f| f.channel == channel)
    }

    pub fn mesh_count(&self) -> usize {
        self.products.values().map(|p| p.meshes.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
