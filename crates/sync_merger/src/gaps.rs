//! Gap detection in the synchronization exchange sequence.

use contracts::{ContractError, GapPolicy, SyncSample};

/// Sample indices that a gap sentinel is inserted *before*
///
/// Index `samples.len()` means "after the last sample". The result is sorted
/// and free of duplicates.
///
/// # Errors
/// - `ShapeMismatch` for an `AtIndices` entry outside `1..=samples.len()`
/// - `InvalidSignal` for a non-finite or non-positive `MaxInterval` threshold
pub fn gap_indices(samples: &[SyncSample], policy: &GapPolicy) -> Result<Vec<usize>, ContractError> {
    let n = samples.len();

    let mut indices = match policy {
        GapPolicy::None => Vec::new(),
        GapPolicy::AtIndices { indices } => {
            for &index in indices {
                if index == 0 || index > n {
                    return Err(ContractError::shape_mismatch(
                        format!("gap index {index} (valid 1..={n})"),
                        n,
                        index,
                    ));
                }
            }
            indices.clone()
        }
        GapPolicy::MaxInterval { threshold_s } => {
            if !threshold_s.is_finite() || *threshold_s <= 0.0 {
                return Err(ContractError::invalid_signal(format!(
                    "gap threshold must be finite and > 0, got {threshold_s}"
                )));
            }
            samples
                .windows(2)
                .enumerate()
                .filter(|(_, pair)| pair[1].epoch_s - pair[0].epoch_s > *threshold_s)
                .map(|(i, _)| i + 1)
                .collect()
        }
    };

    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

/// Epoch of the sentinel inserted between `previous_s` and `next_s`
///
/// `previous_s + gap_duration_s`, moved to the midpoint when it would not
/// precede the next sample.
pub fn sentinel_epoch(previous_s: f64, next_s: Option<f64>, gap_duration_s: f64) -> f64 {
    let candidate = previous_s + gap_duration_s;
    match next_s {
        Some(next) if candidate >= next => previous_s + (next - previous_s) / 2.0,
        _ => candidate,
    }
}
