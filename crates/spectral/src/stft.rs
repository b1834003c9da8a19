//! Short-time Fourier transform with a Hann window.

use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::bands::{decimate_indices, next_pow2, prev_pow2};
use crate::wavelet::Scalogram;

/// Window length in samples for 1/N-octave resolution
///
/// `next_pow2(16·N)`, capped at the largest power of two not exceeding the signal length.
pub fn stft_window_len(order: u32, signal_len: usize) -> usize {
    next_pow2(16 * order as usize).min(prev_pow2(signal_len))
}

/// Create Hanning window coefficients
fn hanning_window(size: usize) -> Vec<f64> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Centered, zero-padded frames every `nfft / 4` samples over the whole record
///
/// Frequencies are the bins `k·fs/nfft` for `k = 1..=nfft/2`; DC is excluded.
pub(crate) fn stft_magnitude(
    planner: &mut FftPlanner<f64>,
    signal: &[f64],
    sample_rate_hz: f64,
    order: u32,
    max_time_points: Option<usize>,
) -> Scalogram {
    let n = signal.len();
    let nfft = stft_window_len(order, n);
    let hop = (nfft / 4).max(1);
    let half = nfft / 2;

    let fft = planner.plan_fft_forward(nfft);
    let window = hanning_window(nfft);

    let frame_count = (n - 1) / hop + 1;
    let frames = decimate_indices(frame_count, max_time_points);

    let mut magnitude = Array2::<f64>::zeros((frames.len(), half));
    let mut buffer = vec![Complex::new(0.0, 0.0); nfft];

    for (row, &frame) in frames.iter().enumerate() {
        let center = frame * hop;
        for (j, slot) in buffer.iter_mut().enumerate() {
            // Sample index center - nfft/2 + j, zero outside the record
            let value = (center + j)
                .checked_sub(half)
                .and_then(|idx| signal.get(idx))
                .copied()
                .unwrap_or(0.0);
            *slot = Complex::new(value * window[j], 0.0);
        }

        fft.process(&mut buffer);

        for k in 1..=half {
            magnitude[[row, k - 1]] = buffer[k].norm();
        }
    }

    let time_s = frames
        .iter()
        .map(|&m| (m * hop) as f64 / sample_rate_hz)
        .collect();
    let frequency_hz = (1..=half)
        .map(|k| k as f64 * sample_rate_hz / nfft as f64)
        .collect();

    Scalogram {
        time_s,
        frequency_hz,
        magnitude,
    }
}
