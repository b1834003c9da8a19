//! # Spectral
//!
//! 时频变换引擎：波形 → time × frequency 能量网格 (bits)。
//!
//! 负责：
//! - 常 Q Gabor/Morlet 小波 (1/N 倍频程)
//! - Hann 窗 STFT
//! - log2 归一化与下限截断，色标上下限
//! - 高通变体缺失时的零相位 Butterworth 回退
//!
//! ## 使用示例
//!
//! ```
//! use contracts::{TransformOptions, TransformType};
//!
//! let fs = 32.0;
//! let signal: Vec<f64> = (0..256).map(|i| (i as f64 * 0.5).sin()).collect();
//! let mesh = spectral::compute_spectral_mesh(
//!     &signal,
//!     fs,
//!     3,
//!     TransformType::Wavelet,
//!     &TransformOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(mesh.shape(), (mesh.time_s.len(), mesh.frequency_hz.len()));
//! ```

mod bands;
mod bits;
mod engine;
mod highpass;
mod stft;
mod wavelet;

pub use bands::{
    atom_sigma_s, band_centers, band_ratio, quality_factor, MAX_ORDER, MIN_ORDER,
};
pub use bits::{magnitude_to_bits, resolve_color_limits};
pub use engine::{
    compute_channel_meshes, compute_spectral_mesh, SpectralEngine, MIN_SIGNAL_SAMPLES,
};
pub use highpass::{highpass_fallback, ButterworthHighpass, DEFAULT_CUTOFF_FRACTION};
pub use stft::stft_window_len;

pub use contracts::{ColorLimits, ColorScalePolicy, SpectralMesh, TransformOptions, TransformType};
