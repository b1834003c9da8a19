//! # Geodesy
//!
//! Derived positional quantities from raw telemetry.
//!
//! 负责：
//! - 气压 → 高度 (标准大气 / 对数多项式模型)
//! - 大地坐标 + 参考点 → ENU 距离、高度、速度、方位
//!
//! ## 使用示例
//!
//! ```
//! use contracts::{LocationSeries, PressureModel, ReferenceFix, SpeedSource};
//!
//! let heights = geodesy::compute_height_from_pressure(
//!     &[101.325, 100.0],
//!     &PressureModel::StandardAtmosphere,
//! )
//! .unwrap();
//! assert!(heights[1] > heights[0]);
//!
//! let fix = ReferenceFix { latitude_deg: 34.0, longitude_deg: -118.0, altitude_m: 0.0, epoch_s: 0.0 };
//! let location = LocationSeries {
//!     epochs_s: vec![0.0],
//!     latitude_deg: vec![34.0],
//!     longitude_deg: vec![-118.0],
//!     altitude_m: vec![0.0],
//!     speed_m_s: None,
//! };
//! let trajectory = geodesy::compute_trajectory(&location, &fix, SpeedSource::FiniteDifference).unwrap();
//! assert!(trajectory.range_m[0].abs() < 1e-6);
//! ```

mod enu;
mod pressure;

pub use enu::{bearing_deg, compute_trajectory, geodetic_to_ecef, EnuFrame};
pub use pressure::{
    build_height_model, compute_height_from_pressure, height_from_pressure, HeightModel,
    LogPolynomial, StandardAtmosphere, METERS_TO_KM, SEA_LEVEL_PRESSURE_KPA,
};
