//! # Sync Engine
//!
//! Gyro-based time synchronization of two recording devices.
//!
//! Responsibilities:
//! - Resample both gyro streams onto a common interval
//! - FFT cross-correlation of rotation invariant magnitudes
//! - Least-squares axis calibration between the sensor frames
//! - Sub-sample peak refinement on a natural cubic spline
//! - Clock offset between devices
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::{clock_offset, TimeSync};
//!
//! let mut sync = TimeSync::new(first, second, true);
//! sync.resample(1e-3)?;
//! let estimate = sync.estimate_delay()?;
//! println!("delay: {} s", estimate.delay_s);
//! ```

pub mod calibration;
mod estimator;
pub mod numeric;
mod offset;
pub mod spline;

// Re-exports
pub use estimator::{choose_root, interpolate_gyro, refine_peak, PeakRefinement, TimeSync};
pub use offset::clock_offset;
pub use spline::{CubicSpline, SegmentCoefficients};

// Re-export contracts types
pub use contracts::{ComplexRootPolicy, DelayEstimate, EstimatorConfig, GyroStream, SyncError};
