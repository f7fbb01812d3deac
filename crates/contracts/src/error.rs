//! Layered error definitions
//!
//! Categorized by source: input / numeric / config / ingestion

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum SyncError {
    // ===== Input Errors =====
    /// Gyro stream or argument violates a precondition
    #[error("invalid input at '{field}': {message}")]
    InvalidInput { field: String, message: String },

    // ===== Numerical Errors =====
    /// Normal matrix of the calibration system is not invertible
    #[error("singular calibration system (det = {determinant:e})")]
    SingularSystem { determinant: f64 },

    /// Coarse alignment left too few rows to calibrate
    #[error("insufficient overlap for calibration: {rows} aligned rows")]
    InsufficientOverlap { rows: usize },

    /// Derivative of the peak segment has no real root
    #[error("non-real roots {re} ± {im}i while refining correlation peak")]
    ComplexRoots { re: f64, im: f64 },

    /// Both quadratic and linear coefficients vanished
    #[error("degenerate quadratic: leading coefficients are zero")]
    DegenerateQuadratic,

    /// Correlation peak sits on a knot with no enclosing segment
    #[error("correlation peak at boundary index {index} of {len}")]
    PeakAtBoundary { index: i64, len: usize },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Ingestion Errors =====
    /// Gyro recording line could not be parsed
    #[error("recording parse error at line {line}: {message}")]
    RecordingParse { line: usize, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Create invalid input error
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create recording parse error
    pub fn recording_parse(line: usize, message: impl Into<String>) -> Self {
        Self::RecordingParse {
            line,
            message: message.into(),
        }
    }

    /// Short machine-readable label, used as a metrics tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::SingularSystem { .. } => "singular_system",
            Self::InsufficientOverlap { .. } => "insufficient_overlap",
            Self::ComplexRoots { .. } => "complex_roots",
            Self::DegenerateQuadratic => "degenerate_quadratic",
            Self::PeakAtBoundary { .. } => "peak_at_boundary",
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::RecordingParse { .. } => "recording_parse",
            Self::Io(_) => "io",
        }
    }
}

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = SyncError::invalid_input("timestamps", "must be strictly increasing");
        assert_eq!(
            err.to_string(),
            "invalid input at 'timestamps': must be strictly increasing"
        );
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SyncError = io.into();
        assert!(matches!(err, SyncError::Io(_)));
        assert_eq!(err.kind(), "io");
    }
}
