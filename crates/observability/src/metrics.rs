//! Pipeline 指标收集模块
//!
//! 通过 `metrics` facade 记录通道处理结果，并在内存中聚合运行统计。
//! 未安装 recorder 时所有记录均为空操作。

use std::collections::BTreeMap;

use contracts::ChannelFailure;
use metrics::{counter, gauge, histogram};

/// 记录通道处理成功
pub fn record_channel_processed(channel: &str, meshes: usize) {
    counter!("skyfall_channels_processed_total", "channel" => channel.to_string()).increment(1);
    gauge!("skyfall_channel_meshes", "channel" => channel.to_string()).set(meshes as f64);
}

/// 记录通道失败
pub fn record_channel_failure(failure: &ChannelFailure) {
    counter!(
        "skyfall_channel_failures_total",
        "channel" => failure.channel.clone(),
        "stage" => failure.stage.to_string()
    )
    .increment(1);
}

/// 记录单个网格的计算耗时
pub fn record_mesh_computed(channel: &str, elapsed_ms: f64) {
    counter!("skyfall_meshes_total").increment(1);
    histogram!("skyfall_mesh_compute_ms", "channel" => channel.to_string()).record(elapsed_ms);
}

/// 记录同步序列中的间隙数
pub fn record_sync_gaps(gaps: usize) {
    counter!("skyfall_sync_gaps_total").increment(gaps as u64);
}

/// 记录整次运行耗时
pub fn record_run_duration(seconds: f64) {
    histogram!("skyfall_run_duration_seconds").record(seconds);
}

/// 运行指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    /// 成功处理的通道数
    pub channels_processed: u64,

    /// 失败记录数
    pub failures: u64,

    /// 网格总数
    pub meshes: u64,

    /// 网格计算耗时统计 (ms)
    pub mesh_time_ms: RunningStats,

    /// 各阶段失败次数
    pub failures_by_stage: BTreeMap<String, u64>,
}

impl RunMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个成功通道
    pub fn update_channel(&mut self, meshes: usize, mesh_times_ms: &[f64]) {
        self.channels_processed += 1;
        self.meshes += meshes as u64;
        for &t in mesh_times_ms {
            self.mesh_time_ms.push(t);
        }
    }

    /// 记录一个失败
    pub fn update_failure(&mut self, failure: &ChannelFailure) {
        self.failures += 1;
        *self
            .failures_by_stage
            .entry(failure.stage.to_string())
            .or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> RunMetricsSummary {
        let attempted = self.channels_processed + self.failures;
        RunMetricsSummary {
            channels_processed: self.channels_processed,
            failures: self.failures,
            meshes: self.meshes,
            failure_rate: if attempted > 0 {
                self.failures as f64 / attempted as f64 * 100.0
            } else {
                0.0
            },
            mesh_time_ms: StatsSummary::from(&self.mesh_time_ms),
            failures_by_stage: self.failures_by_stage.clone(),
        }
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct RunMetricsSummary {
    pub channels_processed: u64,
    pub failures: u64,
    pub meshes: u64,
    pub failure_rate: f64,
    pub mesh_time_ms: StatsSummary,
    pub failures_by_stage: BTreeMap<String, u64>,
}

impl std::fmt::Display for RunMetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Run Metrics Summary ===")?;
        writeln!(f, "Channels processed: {}", self.channels_processed)?;
        writeln!(
            f,
            "Failures: {} ({:.2}%)",
            self.failures, self.failure_rate
        )?;
        writeln!(f, "Meshes: {}", self.meshes)?;
        writeln!(f, "Mesh time (ms): {}", self.mesh_time_ms)?;

        if !self.failures_by_stage.is_empty() {
            writeln!(f, "Failures by stage:")?;
            for (stage, count) in &self.failures_by_stage {
                writeln!(f, "  {}: {}", stage, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
