//! Latency / offset summary statistics.

use contracts::{MergedSyncSeries, SyncSample};
use observability::{RunningStats, StatsSummary};

/// Summary of one synchronization record
#[derive(Debug, Clone, Default)]
pub struct SyncStatistics {
    /// Exchanges seen
    pub exchanges: usize,
    /// Exchanges without a latency value
    pub missing_latency: usize,
    pub latency_ms: StatsSummary,
    pub offset_ms: StatsSummary,
    pub gaps: usize,
}

impl SyncStatistics {
    /// Statistics over valid values only
    pub fn from_samples(samples: &[SyncSample], merged: Option<&MergedSyncSeries>) -> Self {
        let mut latency = RunningStats::default();
        let mut offset = RunningStats::default();
        let mut missing_latency = 0;

        for sample in samples {
            match sample.latency_ms.filter(|v| v.is_finite()) {
                Some(v) => latency.push(v),
                None => missing_latency += 1,
            }
            if let Some(v) = sample.offset_ms.filter(|v| v.is_finite()) {
                offset.push(v);
            }
        }

        Self {
            exchanges: samples.len(),
            missing_latency,
            latency_ms: StatsSummary::from(&latency),
            offset_ms: StatsSummary::from(&offset),
            gaps: merged.map_or(0, |m| m.gap_count()),
        }
    }
}

impl std::fmt::Display for SyncStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Exchanges: {} ({} without latency)", self.exchanges, self.missing_latency)?;
        writeln!(f, "Latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Offset (ms): {}", self.offset_ms)?;
        write!(f, "Gaps: {}", self.gaps)
    }
}
