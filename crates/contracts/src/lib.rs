//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are seconds (f64) on each device's own clock
//! - A `DelayEstimate` relates the two clocks through the start of each stream

mod config;
mod error;
mod estimate;
mod gyro;

pub use config::*;
pub use error::*;
pub use estimate::*;
pub use gyro::*;
