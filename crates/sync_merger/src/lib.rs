//! # Sync Merger
//!
//! 时钟同步交换样本 (latency / offset) 的合并。
//!
//! 负责：
//! - 间隙检测 (先验索引 / 最大间隔阈值)
//! - 前导锚点与间隙处插入 NaN 哨兵
//! - 合并序列到密集时间轴的保持重采样
//! - latency / offset 统计摘要
//!
//! ## 使用示例
//!
//! ```
//! use contracts::{GapPolicy, SyncSample};
//!
//! let samples = vec![SyncSample::new(10.0, 3.0, 1.0), SyncSample::new(500.0, 4.0, 1.5)];
//! let merged = sync_merger::merge_sync_series(
//!     &samples,
//!     &[0.0],
//!     &GapPolicy::MaxInterval { threshold_s: 60.0 },
//!     5.0,
//! )
//! .unwrap();
//! assert_eq!(merged.len(), samples.len() + 2);
//! ```

mod gaps;
mod merger;
mod resample;
mod stats;

pub use gaps::{gap_indices, sentinel_epoch};
pub use merger::merge_sync_series;
pub use resample::resample_onto;
pub use stats::SyncStatistics;

pub use contracts::{GapPolicy, MergedSyncSeries, SyncSample};
