//! Error types for the gauss-elim library
//!
//! This module provides the main error and result types used throughout the
//! library. All errors use the `thiserror` crate for automatic trait
//! implementations.

use thiserror::Error;

/// Main result type used throughout the gauss-elim library
pub type GaussResult<T> = Result<T, GaussError>;

/// Main error type for the gauss-elim library
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GaussError {
    /// A variable index was looked up in a container that does not hold it
    #[error("unknown variable {0}")]
    InvalidKey(usize),

    /// Non-finite matrix entries or otherwise malformed input
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Elimination produced rank less than the declared frontal dimension
    #[error(
        "factor is singular in variable {key}, discovered while attempting to eliminate this variable"
    )]
    Singular { key: usize },

    /// Two factors disagree on a variable's dimension, or an operand has the
    /// wrong size
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_display_names_key() {
        let error = GaussError::Singular { key: 7 };
        assert!(error.to_string().contains("singular in variable 7"));
    }

    #[test]
    fn test_gauss_result_err() {
        let result: GaussResult<i32> =
            Err(GaussError::InvalidArgument("NaN entries".to_string()));
        assert!(result.is_err());
    }
}
