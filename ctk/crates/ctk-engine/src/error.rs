//! Engine error types.
//!
//! Only configuration problems surface as [`EngineError`]. Anything that goes
//! wrong while executing a single fixture becomes that fixture's
//! [`Outcome`](crate::Outcome) instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole run before any fixture is scheduled.
#[derive(Error, Debug)]
pub enum EngineError {
    /// External tool binary could not be located.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Bootclasspath archive does not exist.
    #[error("Classpath archive not found: {}", .0.display())]
    ArchiveMissing(PathBuf),

    /// Fixture list file does not exist.
    #[error("Fixture list not found: {}", .0.display())]
    FixtureListMissing(PathBuf),

    /// Worker pool could not be started.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_display() {
        let err = EngineError::ToolNotFound("javac".to_string());
        assert_eq!(err.to_string(), "Tool not found: javac");
    }

    #[test]
    fn test_archive_missing_display() {
        let err = EngineError::ArchiveMissing(PathBuf::from("/opt/rt.jar"));
        assert_eq!(err.to_string(), "Classpath archive not found: /opt/rt.jar");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
