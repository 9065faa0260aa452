//! Error types for the reservoir core

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building or driving a reservoir
#[derive(Error, Debug)]
pub enum CoreError {
    /// Numeric support error
    #[error("Math error: {source}")]
    Math {
        #[from]
        /// Source math error
        source: rescomp_math::MathError,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Topology construction failure
    #[error("Topology error: {reason}")]
    Topology {
        /// Reason for the failure
        reason: String,
    },

    /// Spectral-radius normalization was requested but the estimated
    /// dominant eigenvalue is zero
    #[error("Spectral radius normalization failed: estimated dominant eigenvalue is 0 (target {target})")]
    ZeroEigenvalue {
        /// Requested target radius
        target: f64,
    },

    /// Cross-reference to a pool that does not exist
    #[error("Pool index {pool} out of bounds ({pools} pools configured)")]
    PoolNotFound {
        /// Offending pool index
        pool: usize,
        /// Number of configured pools
        pools: usize,
    },

    /// Output buffer too small for the requested write
    #[error("Buffer too small: need {needed} values from offset {offset}, have {available}")]
    BufferTooSmall {
        /// Values that would be written
        needed: usize,
        /// Write offset
        offset: usize,
        /// Space remaining in the buffer
        available: usize,
    },

    /// Input vector length does not match the configured input fields
    #[error("Input length mismatch: expected {expected}, got {got}")]
    InputLengthMismatch {
        /// Expected input length
        expected: usize,
        /// Actual input length
        got: usize,
    },
}

impl CoreError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a topology error
    pub fn topology(reason: impl Into<String>) -> Self {
        Self::Topology {
            reason: reason.into(),
        }
    }
}
