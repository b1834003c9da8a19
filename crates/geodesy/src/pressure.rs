//! Barometric pressure → height.
//!
//! Pressure is in kPa, heights in meters. Models are supplied, never fitted.

use contracts::{ContractError, PressureModel};

/// Meters → kilometers
pub const METERS_TO_KM: f64 = 1e-3;

/// Standard sea-level pressure (kPa); the standard atmosphere maps it to 0 m
pub const SEA_LEVEL_PRESSURE_KPA: f64 = 101.325;

const STANDARD_GRAVITY: f64 = 9.80665;
const MOLAR_MASS_AIR: f64 = 0.028_964_4;
const GAS_CONSTANT: f64 = 8.314_459_8;
const SEA_LEVEL_TEMPERATURE_K: f64 = 288.15;

/// (base height m, lapse rate K/m) of each standard-atmosphere layer
const ISA_LAYER_TABLE: [(f64, f64); 7] = [
    (0.0, -0.0065),
    (11_000.0, 0.0),
    (20_000.0, 0.001),
    (32_000.0, 0.0028),
    (47_000.0, 0.0),
    (51_000.0, -0.0028),
    (71_000.0, -0.002),
];

/// Height as a function of pressure
pub trait HeightModel {
    /// Height in meters for a validated (finite, positive) pressure in kPa
    fn height_m(&self, pressure_kpa: f64) -> f64;
}

#[derive(Debug, Clone, Copy)]
struct AtmosphereLayer {
    base_height_m: f64,
    base_pressure_pa: f64,
    base_temperature_k: f64,
    lapse_rate_k_per_m: f64,
}

impl AtmosphereLayer {
    /// Pressure at `height_m` within this layer
    fn pressure_at(&self, height_m: f64) -> f64 {
        let dh = height_m - self.base_height_m;
        if self.lapse_rate_k_per_m == 0.0 {
            self.base_pressure_pa
                * (-STANDARD_GRAVITY * MOLAR_MASS_AIR * dh
                    / (GAS_CONSTANT * self.base_temperature_k))
                    .exp()
        } else {
            let t = self.base_temperature_k + self.lapse_rate_k_per_m * dh;
            self.base_pressure_pa
                * (self.base_temperature_k / t).powf(
                    STANDARD_GRAVITY * MOLAR_MASS_AIR / (GAS_CONSTANT * self.lapse_rate_k_per_m),
                )
        }
    }

    /// Inverse of [`Self::pressure_at`]
    fn height_at(&self, pressure_pa: f64) -> f64 {
        if self.lapse_rate_k_per_m == 0.0 {
            self.base_height_m
                + GAS_CONSTANT * self.base_temperature_k / (STANDARD_GRAVITY * MOLAR_MASS_AIR)
                    * (self.base_pressure_pa / pressure_pa).ln()
        } else {
            let exponent =
                -GAS_CONSTANT * self.lapse_rate_k_per_m / (STANDARD_GRAVITY * MOLAR_MASS_AIR);
            self.base_height_m
                + self.base_temperature_k / self.lapse_rate_k_per_m
                    * ((pressure_pa / self.base_pressure_pa).powf(exponent) - 1.0)
        }
    }
}

/// Piecewise International Standard Atmosphere
///
/// Layer base pressures are chained from the sea-level values so the curve is
/// continuous across layer boundaries. Below sea level and above the last
/// layer the outermost layers are extrapolated.
#[derive(Debug, Clone)]
pub struct StandardAtmosphere {
    layers: Vec<AtmosphereLayer>,
}

impl StandardAtmosphere {
    pub fn new() -> Self {
        let mut layers: Vec<AtmosphereLayer> = Vec::with_capacity(ISA_LAYER_TABLE.len());
        for &(base_height_m, lapse_rate_k_per_m) in &ISA_LAYER_TABLE {
            let layer = match layers.last() {
                None => AtmosphereLayer {
                    base_height_m,
                    base_pressure_pa: SEA_LEVEL_PRESSURE_KPA * 1000.0,
                    base_temperature_k: SEA_LEVEL_TEMPERATURE_K,
                    lapse_rate_k_per_m,
                },
                Some(prev) => AtmosphereLayer {
                    base_height_m,
                    base_pressure_pa: prev.pressure_at(base_height_m),
                    base_temperature_k: prev.base_temperature_k
                        + prev.lapse_rate_k_per_m * (base_height_m - prev.base_height_m),
                    lapse_rate_k_per_m,
                },
            };
            layers.push(layer);
        }
        Self { layers }
    }

    fn layer_for(&self, pressure_pa: f64) -> &AtmosphereLayer {
        // Pressure decreases with height: take the highest layer whose base is still at or above `pressure_pa`
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.base_pressure_pa >= pressure_pa)
            .unwrap_or(&self.layers[0])
    }
}

impl Default for StandardAtmosphere {
    fn default() -> Self {
        Self::new()
    }
}

impl HeightModel for StandardAtmosphere {
    fn height_m(&self, pressure_kpa: f64) -> f64 {
        let pressure_pa = pressure_kpa * 1000.0;
        self.layer_for(pressure_pa).height_at(pressure_pa)
    }
}

/// Empirical polynomial in log-pressure
#[derive(Debug, Clone)]
pub struct LogPolynomial {
    reference_kpa: f64,
    coefficients: Vec<f64>,
}

impl LogPolynomial {
    pub fn new(reference_kpa: f64, coefficients: Vec<f64>) -> Result<Self, ContractError> {
        if !(reference_kpa.is_finite() && reference_kpa > 0.0) {
            return Err(ContractError::invalid_measurement(
                "reference_kpa",
                0,
                reference_kpa,
            ));
        }
        if coefficients.is_empty() {
            return Err(ContractError::config_validation(
                "geodesy.pressure_model.coefficients",
                "at least one coefficient is required",
            ));
        }
        Ok(Self {
            reference_kpa,
            coefficients,
        })
    }
}

impl HeightModel for LogPolynomial {
    fn height_m(&self, pressure_kpa: f64) -> f64 {
        let x = -(pressure_kpa / self.reference_kpa).ln();
        // Horner
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }
}

/// Build the height model described by `model`
pub fn build_height_model(model: &PressureModel) -> Result<Box<dyn HeightModel + Send + Sync>, ContractError> {
    match model {
        PressureModel::StandardAtmosphere => Ok(Box::new(StandardAtmosphere::new())),
        PressureModel::LogPolynomial {
            reference_kpa,
            coefficients,
        } => Ok(Box::new(LogPolynomial::new(
            *reference_kpa,
            coefficients.clone(),
        )?)),
    }
}

/// Height (m) for every pressure sample (kPa)
///
/// # Errors
/// - `InvalidMeasurement` for the first non-finite or non-positive pressure
pub fn compute_height_from_pressure(
    pressure_kpa: &[f64],
    model: &PressureModel,
) -> Result<Vec<f64>, ContractError> {
    let height_model = build_height_model(model)?;

    pressure_kpa
        .iter()
        .enumerate()
        .map(|(index, &p)| {
            if !p.is_finite() || p <= 0.0 {
                Err(ContractError::invalid_measurement("pressure_kpa", index, p))
            } else {
                Ok(height_model.height_m(p))
            }
        })
        .collect()
}

/// Scalar convenience wrapper
pub fn height_from_pressure(pressure_kpa: f64, model: &PressureModel) -> Result<f64, ContractError> {
    let heights = compute_height_from_pressure(&[pressure_kpa], model)?;
    Ok(heights[0])
}
