//! Error handling module for the ctkt CLI.
//!
//! Every variant is fatal and reported before or after a run; problems with
//! individual fixtures are outcomes in the run report, never errors.

use ctk_engine::EngineError;
use thiserror::Error;

/// Main error type for the ctkt CLI application.
#[derive(Error, Debug)]
pub enum CtkError {
    /// Error when a configuration file is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error when command-line input validation fails.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error raised by the execution engine before scheduling.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when the JSON report cannot be written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using CtkError.
pub type Result<T> = std::result::Result<T, CtkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_error_display() {
        let err = CtkError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_validation_error_display() {
        let err = CtkError::Validation("no roots".to_string());
        assert_eq!(err.to_string(), "Validation error: no roots");
    }

    #[test]
    fn test_engine_error_is_transparent() {
        let err: CtkError = EngineError::ArchiveMissing(PathBuf::from("rt.jar")).into();
        assert_eq!(err.to_string(), "Classpath archive not found: rt.jar");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ctk_err: CtkError = io_err.into();
        assert!(matches!(ctk_err, CtkError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let ctk_err: CtkError = json_err.into();
        assert!(matches!(ctk_err, CtkError::Json(_)));
    }
}
