//! Sentinel merge of latency/offset exchanges onto a timeline.

use contracts::{ContractError, GapPolicy, MergedSyncSeries, SyncSample};
use tracing::{debug, instrument, warn};

use crate::gaps::{gap_indices, sentinel_epoch};

/// Merge sparse exchanges into one series with explicit missing-value sentinels
///
/// - A leading sentinel anchored at `target_timeline[0]` so every derived
///   series starts at the common timeline start (skipped when the timeline is empty)
/// - A sentinel at each gap located by `gaps`, at `previous + gap_duration_s`
/// - Exchanges without a value map to NaN but do not count as gaps
///
/// Output length is `samples.len() + 1 + gaps`.
///
/// The anchor always stays at index 0. When it is later than the first
/// exchange the merged epochs are not ascending; a warning is logged and
/// [`crate::resample_onto`] must not be used on that result.
///
/// # Errors
/// - `InvalidSignal` for a non-finite or non-positive `gap_duration_s`, a
///   non-finite sample epoch or a non-finite timeline anchor
/// - `ShapeMismatch` for an out-of-range `AtIndices` entry
#[instrument(
    name = "sync_merger_merge",
    level = "debug",
    skip(samples, target_timeline),
    fields(samples = samples.len())
)]
pub fn merge_sync_series(
    samples: &[SyncSample],
    target_timeline: &[f64],
    gaps: &GapPolicy,
    gap_duration_s: f64,
) -> Result<MergedSyncSeries, ContractError> {
    if !gap_duration_s.is_finite() || gap_duration_s <= 0.0 {
        return Err(ContractError::invalid_signal(format!(
            "gap duration must be finite and > 0, got {gap_duration_s}"
        )));
    }
    if let Some((i, sample)) = samples
        .iter()
        .enumerate()
        .find(|(_, s)| !s.epoch_s.is_finite())
    {
        return Err(ContractError::invalid_signal(format!(
            "synchronization epoch at index {i} is not finite: {}",
            sample.epoch_s
        )));
    }

    let gap_at = gap_indices(samples, gaps)?;
    let capacity = samples.len() + 1 + gap_at.len();

    let mut merged = MergedSyncSeries {
        epochs_s: Vec::with_capacity(capacity),
        latency_ms: Vec::with_capacity(capacity),
        offset_ms: Vec::with_capacity(capacity),
        gap_positions: Vec::with_capacity(gap_at.len()),
        anchored: false,
    };

    if let Some(&anchor) = target_timeline.first() {
        if !anchor.is_finite() {
            return Err(ContractError::invalid_signal(format!(
                "timeline anchor is not finite: {anchor}"
            )));
        }
        if let Some(first) = samples.first().filter(|s| s.epoch_s < anchor) {
            warn!(
                anchor,
                first_exchange = first.epoch_s,
                "Timeline anchor is later than the first exchange, merged epochs not ascending"
            );
        }
        push_sentinel(&mut merged, anchor);
        merged.anchored = true;
    }

    let mut pending_gaps = gap_at.iter().copied().peekable();
    for (i, sample) in samples.iter().enumerate() {
        if pending_gaps.next_if_eq(&i).is_some() {
            let epoch = sentinel_epoch(samples[i - 1].epoch_s, Some(sample.epoch_s), gap_duration_s);
            merged.gap_positions.push(merged.epochs_s.len());
            push_sentinel(&mut merged, epoch);
        }

        merged.epochs_s.push(sample.epoch_s);
        merged.latency_ms.push(sample.latency_ms.unwrap_or(f64::NAN));
        merged.offset_ms.push(sample.offset_ms.unwrap_or(f64::NAN));
    }

    // Trailing gap after the last exchange
    if let (Some(_), Some(last)) = (pending_gaps.next(), samples.last()) {
        let epoch = sentinel_epoch(last.epoch_s, None, gap_duration_s);
        merged.gap_positions.push(merged.epochs_s.len());
        push_sentinel(&mut merged, epoch);
    }

    debug!(
        output_len = merged.len(),
        gaps = merged.gap_count(),
        anchored = merged.anchored,
        "Synchronization series merged"
    );

    Ok(merged)
}

fn push_sentinel(merged: &mut MergedSyncSeries, epoch_s: f64) {
    merged.epochs_s.push(epoch_s);
    merged.latency_ms.push(f64::NAN);
    merged.offset_ms.push(f64::NAN);
}
