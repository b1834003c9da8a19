//! Geodetic → local East-North-Up trajectory.
//!
//! WGS-84 geodetic → ECEF → ENU rotation about the reference fix. Range is
//! measured in the tangent plane, so accuracy degrades for positions tens of
//! kilometers away from the fix; no error is raised for that.

use contracts::{ContractError, DerivedTrajectory, LocationSeries, ReferenceFix, SpeedSource};
use nalgebra::{Matrix3, Vector3};
use tracing::{instrument, warn};

// ===== WGS-84 =====
const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geodetic (deg, deg, m) → ECEF (m)
pub fn geodetic_to_ecef(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Vector3<f64> {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + altitude_m) * cos_lat * cos_lon,
        (n + altitude_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + altitude_m) * sin_lat,
    )
}

/// Local tangent plane anchored at a reference position
#[derive(Debug, Clone)]
pub struct EnuFrame {
    origin_ecef: Vector3<f64>,
    rotation: Matrix3<f64>,
}

impl EnuFrame {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        let lat = latitude_deg.to_radians();
        let lon = longitude_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        #[rustfmt::skip]
        let rotation = Matrix3::new(
            -sin_lon,            cos_lon,            0.0,
            -sin_lat * cos_lon, -sin_lat * sin_lon,  cos_lat,
             cos_lat * cos_lon,  cos_lat * sin_lon,  sin_lat,
        );

        Self {
            origin_ecef: geodetic_to_ecef(latitude_deg, longitude_deg, altitude_m),
            rotation,
        }
    }

    pub fn from_fix(fix: &ReferenceFix) -> Self {
        Self::new(fix.latitude_deg, fix.longitude_deg, fix.altitude_m)
    }

    /// ENU (m) of a geodetic position
    pub fn to_enu(&self, latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Vector3<f64> {
        self.rotation * (geodetic_to_ecef(latitude_deg, longitude_deg, altitude_m) - self.origin_ecef)
    }
}

/// Clockwise angle from north, [0, 360)
pub fn bearing_deg(east_m: f64, north_m: f64) -> f64 {
    let bearing = east_m.atan2(north_m).to_degrees().rem_euclid(360.0);
    // rem_euclid may round a tiny negative angle up to exactly 360
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

fn check_fix(fix: &ReferenceFix) -> Result<(), ContractError> {
    let fields = [
        ("reference_fix.latitude_deg", fix.latitude_deg),
        ("reference_fix.longitude_deg", fix.longitude_deg),
        ("reference_fix.altitude_m", fix.altitude_m),
        ("reference_fix.epoch_s", fix.epoch_s),
    ];
    for (quantity, value) in fields {
        if !value.is_finite() {
            return Err(ContractError::invalid_measurement(quantity, 0, value));
        }
    }
    if fix.latitude_deg.abs() > 90.0 {
        return Err(ContractError::invalid_measurement(
            "reference_fix.latitude_deg",
            0,
            fix.latitude_deg,
        ));
    }
    Ok(())
}

fn check_sample(location: &LocationSeries, i: usize) -> Result<(), ContractError> {
    let lat = location.latitude_deg[i];
    if !lat.is_finite() || lat.abs() > 90.0 {
        return Err(ContractError::invalid_measurement("latitude_deg", i, lat));
    }
    let fields = [
        ("longitude_deg", location.longitude_deg[i]),
        ("altitude_m", location.altitude_m[i]),
        ("epoch_s", location.epochs_s[i]),
    ];
    for (quantity, value) in fields {
        if !value.is_finite() {
            return Err(ContractError::invalid_measurement(quantity, i, value));
        }
    }
    Ok(())
}

/// Range, height, speed and bearing of every location sample relative to `fix`
///
/// Speed is 0 at the first sample. Epochs are not required to ascend; a
/// non-positive interval yields a NaN speed and a single warning.
///
/// # Errors
/// - `ShapeMismatch` if the coordinate columns differ in length, or if
///   `SpeedSource::Provided` is requested without a speed column
/// - `InvalidMeasurement` for non-finite coordinates or |latitude| > 90
#[instrument(level = "debug", skip_all, fields(samples = location.len(), speed_source = ?speed_source))]
pub fn compute_trajectory(
    location: &LocationSeries,
    fix: &ReferenceFix,
    speed_source: SpeedSource,
) -> Result<DerivedTrajectory, ContractError> {
    location.validate()?;
    check_fix(fix)?;

    let n = location.len();
    if n == 0 {
        return Ok(DerivedTrajectory::default());
    }

    let provided_speed = match speed_source {
        SpeedSource::FiniteDifference => None,
        SpeedSource::Provided => Some(
            location
                .speed_m_s
                .as_deref()
                .ok_or_else(|| ContractError::shape_mismatch("location.speed_m_s", n, 0))?,
        ),
    };

    let frame = EnuFrame::from_fix(fix);
    let mut trajectory = DerivedTrajectory::with_capacity(n);
    let mut previous: Option<(f64, Vector3<f64>)> = None;
    let mut warned_unordered = false;

    for i in 0..n {
        check_sample(location, i)?;

        let epoch = location.epochs_s[i];
        let enu = frame.to_enu(
            location.latitude_deg[i],
            location.longitude_deg[i],
            location.altitude_m[i],
        );
        let (east, north, up) = (enu.x, enu.y, enu.z);

        let speed = match provided_speed {
            Some(speed) => speed[i],
            None => match previous {
                None => 0.0,
                Some((prev_epoch, prev_enu)) => {
                    let dt = epoch - prev_epoch;
                    if dt > 0.0 {
                        (enu - prev_enu).norm() / dt
                    } else {
                        if !warned_unordered {
                            warn!(
                                index = i,
                                dt_s = dt,
                                "Location epochs not strictly ascending; speed set to NaN"
                            );
                            warned_unordered = true;
                        }
                        f64::NAN
                    }
                }
            },
        };
        previous = Some((epoch, enu));

        trajectory.epochs_s.push(epoch);
        trajectory.elapsed_s.push(epoch - fix.epoch_s);
        trajectory.east_m.push(east);
        trajectory.north_m.push(north);
        trajectory.range_m.push(east.hypot(north));
        trajectory.height_m.push(up);
        trajectory.speed_m_s.push(speed);
        trajectory.bearing_deg.push(bearing_deg(east, north));
    }

    Ok(trajectory)
}
