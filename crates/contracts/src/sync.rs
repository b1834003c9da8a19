//! Clock synchronization types
//!
//! Sparse latency/offset exchanges and their merged, gap-annotated series.

use serde::{Deserialize, Serialize};

/// One clock synchronization exchange
///
/// `None` means the exchange ran but produced no usable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyncSample {
    pub epoch_s: f64,
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default)]
    pub offset_ms: Option<f64>,
}

impl SyncSample {
    pub fn new(epoch_s: f64, latency_ms: f64, offset_ms: f64) -> Self {
        Self {
            epoch_s,
            latency_ms: Some(latency_ms),
            offset_ms: Some(offset_ms),
        }
    }
}

/// How gaps in the exchange sequence are located
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GapPolicy {
    /// No gap sentinels besides the leading anchor
    None,
    /// Gap before each listed sample index (a-priori knowledge of the recording)
    AtIndices { indices: Vec<usize> },
    /// Gap after any interval longer than `threshold_s`
    MaxInterval { threshold_s: f64 },
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self::MaxInterval {
            threshold_s: default_gap_threshold_s(),
        }
    }
}

fn default_gap_threshold_s() -> f64 {
    60.0
}

/// Merged latency/offset series
///
/// `f64::NAN` marks "no value here"; plotting collaborators render it as a
/// visual break. Positions listed in `gap_positions` are sentinels inserted
/// for gaps; the leading anchor sits at index 0 whenever a timeline was given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergedSyncSeries {
    pub epochs_s: Vec<f64>,
    pub latency_ms: Vec<f64>,
    pub offset_ms: Vec<f64>,
    /// Output indices of inserted gap sentinels
    pub gap_positions: Vec<usize>,
    /// Whether index 0 is the leading timeline anchor
    pub anchored: bool,
}

impl MergedSyncSeries {
    pub fn len(&self) -> usize {
        self.epochs_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs_s.is_empty()
    }

    /// True if both latency and offset are sentinels at `index`
    pub fn is_missing(&self, index: usize) -> bool {
        self.latency_ms.get(index).map_or(true, |v| v.is_nan())
            && self.offset_ms.get(index).map_or(true, |v| v.is_nan())
    }

    pub fn gap_count(&self) -> usize {
        self.gap_positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_policy_serde_tagged() {
        let policy: GapPolicy =
            serde_json::from_str(r#"{"kind":"max_interval","threshold_s":30.0}"#).unwrap();
        assert_eq!(policy, GapPolicy::MaxInterval { threshold_s: 30.0 });

        let policy: GapPolicy =
            serde_json::from_str(r#"{"kind":"at_indices","indices":[11]}"#).unwrap();
        assert_eq!(policy, GapPolicy::AtIndices { indices: vec![11] });
    }

    #[test]
    fn test_sync_sample_missing_values_default() {
        let sample: SyncSample = serde_json::from_str(r#"{"epoch_s": 5.0}"#).unwrap();
        assert_eq!(sample.latency_ms, None);
        assert_eq!(sample.offset_ms, None);
    }

    #[test]
    fn test_is_missing() {
        let series = MergedSyncSeries {
            epochs_s: vec![0.0, 1.0],
            latency_ms: vec![f64::NAN, 3.0],
            offset_ms: vec![f64::NAN, 1.0],
            gap_positions: vec![],
            anchored: true,
        };
        assert!(series.is_missing(0));
        assert!(!series.is_missing(1));
    }
}
