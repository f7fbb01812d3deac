//! Server lifetime statistics.

use std::time::Duration;

use observability::EstimationStatsAggregator;

/// Statistics from a server run
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Completed sessions, successful or not
    pub sessions: u64,

    /// Sessions aborted before an offset could be returned
    pub aborted_sessions: u64,

    /// Total bytes uploaded by devices
    pub bytes_received: u64,

    /// Total duration of the server run
    pub duration: Duration,

    /// Estimation results aggregator
    pub estimations: EstimationStatsAggregator,
}

impl ServerStats {
    /// Sessions per minute
    pub fn session_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.sessions as f64 / self.duration.as_secs_f64() * 60.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Server Statistics ===");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Sessions: {} ({:.2}/min)", self.sessions, self.session_rate());
        println!("  Aborted sessions: {}", self.aborted_sessions);
        println!("  Bytes received: {}", self.bytes_received);
        println!();
        print!("{}", self.estimations.summary());
        println!();
    }
}
