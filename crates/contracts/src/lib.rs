//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and the unified error type.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Epochs are Unix seconds (f64)
//! - Mesh time axes are seconds relative to an explicit `epoch_origin_s`
//! - `f64::NAN` is the missing-value sentinel in merged series; it is data, not an error

mod bundle;
mod channel;
mod config;
mod error;
mod geo;
mod spectral;
mod sync;

pub use bundle::*;
pub use channel::*;
pub use config::*;
pub use error::*;
pub use geo::*;
pub use spectral::*;
pub use sync::*;

/// Result alias used across the engines
pub type Result<T> = std::result::Result<T, ContractError>;
