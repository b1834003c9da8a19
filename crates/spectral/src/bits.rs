//! Logarithmic (bits) scaling and color limits.

use contracts::{ColorLimits, ColorScalePolicy, SpectralMesh};
use ndarray::Array2;

/// `log2(|X| / max|X|)`, clamped below at `floor_bits`
///
/// The maximum cell maps to 0 bits. An all-zero input yields an all-floor mesh.
pub fn magnitude_to_bits(magnitude: &Array2<f64>, floor_bits: f64) -> Array2<f64> {
    let max = magnitude
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    if max <= 0.0 {
        return Array2::from_elem(magnitude.dim(), floor_bits);
    }

    magnitude.mapv(|v| {
        if v > 0.0 && v.is_finite() {
            (v / max).log2().max(floor_bits)
        } else {
            floor_bits
        }
    })
}

/// Color limits for rendering a mesh under `policy`
///
/// `Auto` spans the mesh; `Range` spans `range_bits` below the mesh maximum.
pub fn resolve_color_limits(
    mesh: &SpectralMesh,
    policy: ColorScalePolicy,
    range_bits: f64,
) -> ColorLimits {
    let max_bits = mesh.max_bits();
    match policy {
        ColorScalePolicy::Auto => ColorLimits {
            min_bits: mesh.min_bits(),
            max_bits,
        },
        ColorScalePolicy::Range => ColorLimits {
            min_bits: max_bits - range_bits,
            max_bits,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::TransformType;

    #[test]
    fn test_bits_normalized_to_max() {
        let magnitude = Array2::from_shape_vec((1, 4), vec![8.0, 4.0, 1.0, 0.0]).unwrap();
        let bits = magnitude_to_bits(&magnitude, -32.0);
        assert_eq!(bits[[0, 0]], 0.0);
        assert_eq!(bits[[0, 1]], -1.0);
        assert_eq!(bits[[0, 2]], -3.0);
        assert_eq!(bits[[0, 3]], -32.0);
    }

    #[test]
    fn test_bits_floor_clamp() {
        let magnitude = Array2::from_shape_vec((1, 2), vec![1.0, 1e-20]).unwrap();
        let bits = magnitude_to_bits(&magnitude, -10.0);
        assert_eq!(bits[[0, 1]], -10.0);
    }

    #[test]
    fn test_all_zero_is_floor() {
        let magnitude = Array2::<f64>::zeros((3, 2));
        let bits = magnitude_to_bits(&magnitude, -32.0);
        assert!(bits.iter().all(|&b| b == -32.0));
    }

    #[test]
    fn test_color_limits() {
        let mesh = SpectralMesh {
            transform: TransformType::Wavelet,
            order: 3,
            epoch_origin_s: 0.0,
            time_s: vec![0.0],
            frequency_hz: vec![1.0, 2.0, 4.0],
            bits: Array2::from_shape_vec((1, 3), vec![0.0, -4.0, -20.0]).unwrap(),
        };
        let auto = resolve_color_limits(&mesh, ColorScalePolicy::Auto, 15.0);
        assert_eq!((auto.min_bits, auto.max_bits), (-20.0, 0.0));
        let range = resolve_color_limits(&mesh, ColorScalePolicy::Range, 15.0);
        assert_eq!((range.min_bits, range.max_bits), (-15.0, 0.0));
    }
}
