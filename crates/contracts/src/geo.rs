//! Geodesy types
//!
//! Reference fix and the derived local-tangent-plane trajectory.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Surveyed reference position, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ReferenceFix {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude_deg: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude_deg: f64,
    pub altitude_m: f64,
    /// Epoch (Unix seconds) the trajectory's elapsed time is measured from
    pub epoch_s: f64,
}

/// Trajectory derived from a location series relative to a [`ReferenceFix`]
///
/// Column-oriented; every column has one entry per location epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedTrajectory {
    pub epochs_s: Vec<f64>,
    /// Seconds since the reference fix epoch
    pub elapsed_s: Vec<f64>,
    pub east_m: Vec<f64>,
    pub north_m: Vec<f64>,
    /// Horizontal distance in the tangent plane
    pub range_m: Vec<f64>,
    /// Height above the reference (ENU up)
    pub height_m: Vec<f64>,
    pub speed_m_s: Vec<f64>,
    /// Clockwise from north, [0, 360)
    pub bearing_deg: Vec<f64>,
}

impl DerivedTrajectory {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            epochs_s: Vec::with_capacity(n),
            elapsed_s: Vec::with_capacity(n),
            east_m: Vec::with_capacity(n),
            north_m: Vec::with_capacity(n),
            range_m: Vec::with_capacity(n),
            height_m: Vec::with_capacity(n),
            speed_m_s: Vec::with_capacity(n),
            bearing_deg: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.epochs_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs_s.is_empty()
    }

    /// Largest horizontal range reached, ignoring NaN
    pub fn max_range_m(&self) -> Option<f64> {
        self.range_m
            .iter()
            .copied()
            .filter(|r| r.is_finite())
            .fold(None, |acc, r| Some(acc.map_or(r, |a: f64| a.max(r))))
    }
}

/// Where trajectory speed comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedSource {
    /// Successive ENU displacement over elapsed time
    #[default]
    FiniteDifference,
    /// Device-reported speed column of the location series
    Provided,
}

/// Pressure → height model (supplied, never fitted here)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PressureModel {
    /// Piecewise International Standard Atmosphere
    #[default]
    StandardAtmosphere,
    /// Empirical fit `h = sum(c_i * x^i)`, `x = -ln(p / reference_kpa)`, in meters
    LogPolynomial {
        reference_kpa: f64,
        coefficients: Vec<f64>,
    },
}
