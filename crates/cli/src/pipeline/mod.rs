//! Estimation pipeline shared by the `estimate` and `serve` commands.

mod orchestrator;
mod stats;

pub use orchestrator::{run_estimation, SyncOutcome};
pub use stats::ServerStats;
