//! # cephkit Core
//!
//! Error types, measurement units, viewport policy and engine-wide defaults
//! shared by the engine, settings and binary crates.

pub mod constants;
pub mod error;
pub mod policy;
pub mod units;

pub use error::{AcquisitionError, Error, InputError, Result, SnapshotError};
pub use policy::ViewportPolicy;
pub use units::{format_value, MeasurementUnit};
