//! Fractional-octave band geometry and time-axis helpers.

use std::f64::consts::PI;

/// Lowest supported 1/N-octave order
pub const MIN_ORDER: u32 = 1;
/// Highest supported 1/N-octave order
pub const MAX_ORDER: u32 = 24;

/// Half-width of a wavelet atom, in standard deviations, that must fit in the record
const ATOM_HALF_WIDTH_SIGMAS: f64 = 3.0;

/// Ratio between adjacent band centers, `2^(1/N)`
pub fn band_ratio(order: u32) -> f64 {
    2f64.powf(1.0 / order as f64)
}

/// Constant-Q quality factor of a 1/N-octave band
///
/// `Q = sqrt(2^(1/N)) / (2^(1/N) - 1)`, center frequency over bandwidth.
pub fn quality_factor(order: u32) -> f64 {
    let r = band_ratio(order);
    r.sqrt() / (r - 1.0)
}

/// Time-domain standard deviation (s) of the Gabor atom centered at `center_hz`
pub fn atom_sigma_s(order: u32, center_hz: f64) -> f64 {
    quality_factor(order) / (2.0 * PI * center_hz)
}

/// Base-2 band centers `2^(k/N)` Hz, ascending
///
/// Lowest band: the first whose ±3σ atom fits in `duration_s`.
/// Highest band: the last whose upper edge `f·2^(1/2N)` stays below Nyquist.
pub fn band_centers(order: u32, sample_rate_hz: f64, duration_s: f64) -> Vec<f64> {
    let nyquist = sample_rate_hz / 2.0;
    let n = order as f64;
    let q = quality_factor(order);

    // 2·3σ_t ≤ T  ⇔  f ≥ 3Q / (π T)
    let f_min = ATOM_HALF_WIDTH_SIGMAS * q / (PI * duration_s);
    let half_band = 2f64.powf(1.0 / (2.0 * n));

    let k_min = (n * f_min.log2()).ceil() as i64;
    let k_max = (n * nyquist.log2()).floor() as i64;

    (k_min..=k_max)
        .map(|k| 2f64.powf(k as f64 / n))
        .filter(|&f| f >= f_min && f * half_band < nyquist)
        .collect()
}

/// Smallest power of two ≥ `n` (n ≥ 1)
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Largest power of two ≤ `n` (n ≥ 1)
pub fn prev_pow2(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - n.leading_zeros())
}

/// Evenly strided indices into `0..len`, at most `max_points` of them
pub fn decimate_indices(len: usize, max_points: Option<usize>) -> Vec<usize> {
    match max_points {
        Some(max) if max > 0 && len > max => {
            let stride = len.div_ceil(max);
            (0..len).step_by(stride).collect()
        }
        _ => (0..len).collect(),
    }
}
