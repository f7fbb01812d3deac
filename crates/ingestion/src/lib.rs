//! # Ingestion
//!
//! Gyro recording ingestion.
//!
//! Responsibilities:
//! - Parse `x,y,z,t` recordings from text, bytes, files and sockets
//! - Convert device timestamps into seconds
//! - Hand validated `GyroStream`s to the estimator
//! - Mock gyro sources for tests and demos
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::TimestampUnit;
//! use ingestion::read_recording;
//!
//! let first = read_recording("gyro_client.csv", TimestampUnit::Nanoseconds)?.into_stream()?;
//! let second = read_recording("gyro_leader.csv", TimestampUnit::Nanoseconds)?.into_stream()?;
//! ```

mod csv;
pub mod mock;
mod reader;
mod recording;

// Re-exports
pub use csv::{parse_bytes, parse_recording};
pub use mock::{MockGyroConfig, MockGyroSource};
pub use reader::{read_recording, read_recording_async, read_to_end_chunked};
pub use recording::GyroRecording;
