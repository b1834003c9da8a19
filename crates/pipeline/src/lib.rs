//! # Pipeline
//!
//! 一次处理运行的编排：
//! - 每个波形通道独立计算时频网格，失败只记录在该通道上
//! - barometer 气压高度、location 轨迹、同步序列合并
//! - 运行统计与指标
//!
//! 顺序 (`Pipeline::process`) 与并发 (`Pipeline::process_concurrent`)
//! 两种模式产出相同的 `RunBundle`。

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineOutput};
pub use stats::PipelineStats;
