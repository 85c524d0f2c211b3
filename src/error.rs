//! Error types for height reconstruction.

use thiserror::Error;

/// Result type alias using ReliefError.
pub type Result<T> = std::result::Result<T, ReliefError>;

/// Main error type for relief baking operations.
#[derive(Error, Debug)]
pub enum ReliefError {
    /// Input grid or parameters cannot be reconstructed (empty dimensions,
    /// anchor outside the grid, oversized fit input).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The least-squares system could not be solved.
    #[error("Numerical failure: {0}")]
    NumericalFailure(String),

    /// Failed to read or encode an image.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration parsed but is not usable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReliefError {
    /// Whether the cross-scan path is a sensible substitute for this failure.
    pub fn is_numerical(&self) -> bool {
        matches!(self, ReliefError::NumericalFailure(_))
    }
}
