//! Error types for problem validation.

use thiserror::Error;

/// Structural problems detected in an [`NlpProblem`](crate::NlpProblem).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NlpError {
    /// An expression references a variable outside the decision vector.
    #[error("{context} references variable {index}, but the problem has {num_variables}")]
    VariableOutOfRange {
        /// Where the reference was found.
        context: String,
        /// Offending index.
        index: usize,
        /// Number of declared variables.
        num_variables: usize,
    },

    /// A lower bound exceeds its upper bound, or a bound is NaN.
    #[error("invalid bounds on {context}: [{lower}, {upper}]")]
    InvalidBounds {
        /// Which variable or constraint.
        context: String,
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },

    /// A variable scale factor is zero, negative or not finite.
    #[error("scale factor of x[{index}] must be positive and finite, got {factor}")]
    InvalidScaling {
        /// Offending variable.
        index: usize,
        /// Factor supplied.
        factor: f64,
    },

    /// Initial point has the wrong length.
    #[error("initial point has {actual} entries, expected {expected}")]
    DimensionMismatch {
        /// Declared number of variables.
        expected: usize,
        /// Length supplied.
        actual: usize,
    },
}
