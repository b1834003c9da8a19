//! Pipeline statistics and metrics.

use std::time::Duration;

use observability::RunMetricsAggregator;
use sync_merger::SyncStatistics;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Waveform channels handed to the spectral engine
    pub channels_attempted: usize,

    /// Channels skipped by configuration
    pub channels_skipped: usize,

    /// Points in the derived trajectory
    pub trajectory_points: usize,

    /// Total duration of the run
    pub duration: Duration,

    /// Channel / mesh metrics aggregator
    pub metrics: RunMetricsAggregator,

    /// Synchronization record summary (None = no exchanges or merge failed)
    pub sync: Option<SyncStatistics>,
}

impl PipelineStats {
    /// Meshes per second of wall time
    pub fn mesh_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.metrics.meshes as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        let summary = self.metrics.summary();

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Channels attempted: {}", self.channels_attempted);
        println!("   ├─ Channels skipped: {}", self.channels_skipped);
        println!("   ├─ Channels processed: {}", summary.channels_processed);
        println!("   ├─ Meshes: {} ({:.2}/s)", summary.meshes, self.mesh_rate());
        println!("   └─ Trajectory points: {}", self.trajectory_points);

        println!("\n📈 Mesh Timing (ms)");
        println!("   └─ {}", summary.mesh_time_ms);

        if let Some(sync) = &self.sync {
            println!("\n🕒 Synchronization");
            println!("   ├─ Exchanges: {} ({} without latency)", sync.exchanges, sync.missing_latency);
            println!("   ├─ Latency (ms): {}", sync.latency_ms);
            println!("   ├─ Offset (ms): {}", sync.offset_ms);
            println!("   └─ Gaps: {}", sync.gaps);
        }

        if !summary.failures_by_stage.is_empty() {
            println!(
                "\n⚠️  Failures: {} ({:.2}%)",
                summary.failures, summary.failure_rate
            );
            for (stage, count) in &summary.failures_by_stage {
                println!("   ├─ {}: {}", stage, count);
            }
        }

        println!();
    }
}
