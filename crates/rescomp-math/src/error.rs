//! Error types for numeric operations

use thiserror::Error;

/// Result type for math operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Errors that can occur in numeric routines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Operand dimensions do not agree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        got: usize,
    },

    /// Index outside the valid range
    #[error("Index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Container length
        len: usize,
    },

    /// Input rejected before computation
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Reason the input was rejected
        reason: &'static str,
    },
}
