//! Sample-and-hold of a merged series onto a denser timeline.

use contracts::MergedSyncSeries;

/// Hold each merged value until the next merged epoch
///
/// Timeline epochs before the first merged epoch, or whose most recent merged
/// entry is a sentinel (inside a gap), receive NaN. `gap_positions` of the
/// result are the timeline indices where a gap interval begins.
///
/// `merged.epochs_s` must be ascending, which holds for the output of
/// [`crate::merge_sync_series`] when exchanges are ordered.
pub fn resample_onto(merged: &MergedSyncSeries, timeline: &[f64]) -> MergedSyncSeries {
    let mut out = MergedSyncSeries {
        epochs_s: timeline.to_vec(),
        latency_ms: Vec::with_capacity(timeline.len()),
        offset_ms: Vec::with_capacity(timeline.len()),
        gap_positions: Vec::new(),
        anchored: false,
    };

    let mut last_source: Option<usize> = None;
    for (i, &t) in timeline.iter().enumerate() {
        // Number of merged epochs <= t
        let held = merged.epochs_s.partition_point(|&e| e <= t);
        let source = held.checked_sub(1);

        match source {
            Some(j) => {
                out.latency_ms.push(merged.latency_ms[j]);
                out.offset_ms.push(merged.offset_ms[j]);
                if source != last_source && merged.gap_positions.binary_search(&j).is_ok() {
                    out.gap_positions.push(i);
                }
            }
            None => {
                out.latency_ms.push(f64::NAN);
                out.offset_ms.push(f64::NAN);
            }
        }
        last_source = source;
    }

    out
}
