//! Error types for calshot.

use thiserror::Error;

/// Errors that can occur in calshot operations.
#[derive(Error, Debug)]
pub enum CalShotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid date '{0}'. Expected {1}")]
    InvalidDate(String, &'static str),

    #[error("Invalid color '{0}'. Expected #RRGGBB")]
    InvalidColor(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Clipboard write failed: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calshot operations.
pub type CalShotResult<T> = Result<T, CalShotError>;
