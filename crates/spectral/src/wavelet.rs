//! Constant-Q Gabor (Morlet) transform by FFT convolution.
//!
//! One forward FFT of the zero-padded signal, then per band a Gaussian
//! analytic filter in the frequency domain and one inverse FFT.

use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::bands::{band_centers, decimate_indices, next_pow2, quality_factor};

/// Spectral support of a band filter, in standard deviations
const FILTER_SUPPORT_SIGMAS: f64 = 6.0;

/// Magnitude scalogram of a demeaned signal
pub(crate) struct Scalogram {
    pub time_s: Vec<f64>,
    pub frequency_hz: Vec<f64>,
    /// (time, frequency)
    pub magnitude: Array2<f64>,
}

/// Returns `None` when no band can be resolved for this record length.
///
/// A tone of amplitude `A` at a band center yields magnitude ≈ `A` in that band.
pub(crate) fn wavelet_magnitude(
    planner: &mut FftPlanner<f64>,
    signal: &[f64],
    sample_rate_hz: f64,
    order: u32,
    max_time_points: Option<usize>,
) -> Option<Scalogram> {
    let n = signal.len();
    let duration_s = n as f64 / sample_rate_hz;
    let centers = band_centers(order, sample_rate_hz, duration_s);
    if centers.is_empty() {
        return None;
    }

    // Zero padding to 2n keeps the circular convolution from wrapping
    let nfft = next_pow2(2 * n);
    let forward = planner.plan_fft_forward(nfft);
    let inverse = planner.plan_fft_inverse(nfft);

    let mut spectrum: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(nfft)
        .collect();
    forward.process(&mut spectrum);

    let time_indices = decimate_indices(n, max_time_points);
    let mut magnitude = Array2::<f64>::zeros((time_indices.len(), centers.len()));

    let q = quality_factor(order);
    let bin_hz = sample_rate_hz / nfft as f64;
    let half = nfft / 2;
    // Analytic signal gain and unnormalized inverse FFT
    let scale = 2.0 / nfft as f64;

    let mut buffer = vec![Complex::new(0.0, 0.0); nfft];
    for (band, &center_hz) in centers.iter().enumerate() {
        let sigma_hz = center_hz / q;

        buffer.fill(Complex::new(0.0, 0.0));
        let lo = (((center_hz - FILTER_SUPPORT_SIGMAS * sigma_hz) / bin_hz).floor().max(1.0)) as usize;
        let hi = (((center_hz + FILTER_SUPPORT_SIGMAS * sigma_hz) / bin_hz).ceil() as usize).min(half - 1);
        for bin in lo..=hi {
            let f = bin as f64 * bin_hz;
            let z = (f - center_hz) / sigma_hz;
            let weight = (-0.5 * z * z).exp();
            buffer[bin] = spectrum[bin] * weight * scale;
        }

        inverse.process(&mut buffer);

        for (row, &t) in time_indices.iter().enumerate() {
            magnitude[[row, band]] = buffer[t].norm();
        }
    }

    let time_s = time_indices
        .iter()
        .map(|&i| i as f64 / sample_rate_hz)
        .collect();

    Some(Scalogram {
        time_s,
        frequency_hz: centers,
        magnitude,
    })
}
