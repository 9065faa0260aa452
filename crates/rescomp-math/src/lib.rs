//! Numeric support for the rescomp reservoir-computing engine
//!
//! This crate provides the small set of numeric building blocks the core
//! engine needs: a CSR sparse matrix, a power-iteration estimator for the
//! dominant eigenvalue magnitude, and an incremental statistics
//! accumulator used by the observability layer.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod sparse;
pub mod eigen;
pub mod stats;

pub use error::{MathError, Result};
pub use sparse::SparseMatrix;
pub use eigen::estimate_dominant_eigenvalue;
pub use stats::BasicStat;

/// Scalar type used throughout the engine.
pub type Float = f64;
