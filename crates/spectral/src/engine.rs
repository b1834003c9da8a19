//! Spectral engine: input validation, transform dispatch and bits scaling.

use contracts::{ContractError, SpectralMesh, TransformOptions, TransformType};
use rustfft::FftPlanner;
use tracing::{debug, instrument};

use crate::bands::{MAX_ORDER, MIN_ORDER};
use crate::bits::magnitude_to_bits;
use crate::stft::stft_magnitude;
use crate::wavelet::{wavelet_magnitude, Scalogram};

/// Shortest waveform accepted by either transform
pub const MIN_SIGNAL_SAMPLES: usize = 8;

/// Configured time-frequency transform
///
/// Stateless between calls; every call allocates its own output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralEngine {
    transform: TransformType,
    order: u32,
    options: TransformOptions,
}

impl SpectralEngine {
    /// # Errors
    /// - `InvalidSignal` for an order outside `1..=24`, a non-negative or
    ///   non-finite floor, or fewer than two allowed time points
    pub fn new(
        transform: TransformType,
        order: u32,
        options: TransformOptions,
    ) -> Result<Self, ContractError> {
        if !(MIN_ORDER..=MAX_ORDER).contains(&order) {
            return Err(ContractError::invalid_signal(format!(
                "order must be in {MIN_ORDER}..={MAX_ORDER}, got {order}"
            )));
        }
        if !(options.floor_bits.is_finite() && options.floor_bits < 0.0) {
            return Err(ContractError::invalid_signal(format!(
                "floor_bits must be finite and < 0, got {}",
                options.floor_bits
            )));
        }
        if let Some(max) = options.max_time_points {
            if max < 2 {
                return Err(ContractError::invalid_signal(format!(
                    "max_time_points must be >= 2, got {max}"
                )));
            }
        }

        Ok(Self {
            transform,
            order,
            options,
        })
    }

    pub fn transform(&self) -> TransformType {
        self.transform
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Mesh of a single waveform; time is relative to its first sample
    pub fn mesh(&self, waveform: &[f64], sample_rate_hz: f64) -> Result<SpectralMesh, ContractError> {
        let mut planner = FftPlanner::new();
        self.mesh_with_planner(&mut planner, waveform, sample_rate_hz)
    }

    /// One mesh per axis, in axis order; fails on the first invalid axis
    pub fn channel_meshes(
        &self,
        axes: &[Vec<f64>],
        sample_rate_hz: f64,
    ) -> Result<Vec<SpectralMesh>, ContractError> {
        if axes.is_empty() {
            return Err(ContractError::invalid_signal("channel has no axes"));
        }
        let mut planner = FftPlanner::new();
        axes.iter()
            .map(|axis| self.mesh_with_planner(&mut planner, axis, sample_rate_hz))
            .collect()
    }

    #[instrument(
        name = "spectral_mesh",
        level = "debug",
        skip(self, planner, waveform),
        fields(transform = %self.transform, order = self.order, samples = waveform.len())
    )]
    fn mesh_with_planner(
        &self,
        planner: &mut FftPlanner<f64>,
        waveform: &[f64],
        sample_rate_hz: f64,
    ) -> Result<SpectralMesh, ContractError> {
        validate_signal(waveform, sample_rate_hz)?;

        let demeaned = demean(waveform);
        let scalogram: Scalogram = match self.transform {
            TransformType::Wavelet => wavelet_magnitude(
                planner,
                &demeaned,
                sample_rate_hz,
                self.order,
                self.options.max_time_points,
            )
            .ok_or_else(|| {
                ContractError::invalid_signal(format!(
                    "no 1/{}-octave band resolvable in {} samples at {} Hz",
                    self.order,
                    waveform.len(),
                    sample_rate_hz
                ))
            })?,
            TransformType::Stft => stft_magnitude(
                planner,
                &demeaned,
                sample_rate_hz,
                self.order,
                self.options.max_time_points,
            ),
        };

        let bits = magnitude_to_bits(&scalogram.magnitude, self.options.floor_bits);
        debug!(
            time_points = scalogram.time_s.len(),
            frequencies = scalogram.frequency_hz.len(),
            "Mesh computed"
        );

        Ok(SpectralMesh {
            transform: self.transform,
            order: self.order,
            epoch_origin_s: 0.0,
            time_s: scalogram.time_s,
            frequency_hz: scalogram.frequency_hz,
            bits,
        })
    }
}

fn validate_signal(waveform: &[f64], sample_rate_hz: f64) -> Result<(), ContractError> {
    if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
        return Err(ContractError::invalid_signal(format!(
            "sample rate must be finite and > 0, got {sample_rate_hz}"
        )));
    }
    if waveform.is_empty() {
        return Err(ContractError::invalid_signal("waveform is empty"));
    }
    if waveform.len() < MIN_SIGNAL_SAMPLES {
        return Err(ContractError::invalid_signal(format!(
            "waveform has {} samples, need at least {MIN_SIGNAL_SAMPLES}",
            waveform.len()
        )));
    }
    if let Some((i, v)) = waveform.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ContractError::invalid_signal(format!(
            "non-finite sample {v} at index {i}"
        )));
    }
    Ok(())
}

fn demean(waveform: &[f64]) -> Vec<f64> {
    let mean = waveform.iter().sum::<f64>() / waveform.len() as f64;
    waveform.iter().map(|v| v - mean).collect()
}

/// Time-frequency mesh of one waveform
///
/// # Errors
/// - `InvalidSignal` for an empty, too short or non-finite waveform, a
///   non-positive sample rate, an order outside `1..=24`, or when no band is
///   resolvable
pub fn compute_spectral_mesh(
    waveform: &[f64],
    sample_rate_hz: f64,
    order: u32,
    transform: TransformType,
    options: &TransformOptions,
) -> Result<SpectralMesh, ContractError> {
    SpectralEngine::new(transform, order, *options)?.mesh(waveform, sample_rate_hz)
}

/// One mesh per axis of a multi-axis channel, in axis order
pub fn compute_channel_meshes(
    axes: &[Vec<f64>],
    sample_rate_hz: f64,
    order: u32,
    transform: TransformType,
    options: &TransformOptions,
) -> Result<Vec<SpectralMesh>, ContractError> {
    SpectralEngine::new(transform, order, *options)?.channel_meshes(axes, sample_rate_hz)
}
