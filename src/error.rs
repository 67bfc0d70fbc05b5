//! Unified error types for cdfnet.
//!
//! This module provides [`CdfError`], the single error type returned by the
//! linear-algebra primitives, parameter construction and every inference
//! backend. It uses the `thiserror` crate for ergonomic error handling.
//!
//! All errors are deterministic caller defects: there is no retry policy,
//! every variant names the offending dimensions.
//!
//! # Example
//!
//! ```rust
//! use cdfnet::CdfError;
//!
//! fn check_columns(left: usize, right: usize) -> Result<(), CdfError> {
//!     if left != right {
//!         return Err(CdfError::shape_mismatch("dot", "lengths", left, right));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_columns(3, 4).is_err());
//! ```

use std::borrow::Cow;

use thiserror::Error;

use crate::config::ConfigError;

/// Unified error type for cdfnet operations.
#[derive(Error, Debug)]
pub enum CdfError {
    /// Two operand dimensions of a primitive operation disagree.
    ///
    /// `op` names the operation, `what` names the pair of dimensions that
    /// were compared, `left`/`right` are their values.
    #[error("Shape mismatch in {op}: {what} do not match: {left} <> {right}")]
    ShapeMismatch {
        /// Operation that rejected its operands.
        op: &'static str,
        /// Which dimensions were compared.
        what: &'static str,
        /// Dimension of the left-hand operand.
        left: usize,
        /// Dimension of the right-hand operand.
        right: usize,
    },

    /// A container could not be built with the requested shape
    /// (empty, non-positive or ragged source).
    #[error("Invalid shape: {0}")]
    InvalidShape(Cow<'static, str>),

    /// Parameter or generator configuration violates a shape relation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input vector length differs from the number of embedding tables.
    #[error("Input vector size doesn't match the number of embedding tables: {got} <> {expected}")]
    InputLength {
        /// Number of embedding tables.
        expected: usize,
        /// Length of the supplied input.
        got: usize,
    },

    /// An input index falls outside its table's cardinality.
    #[error("Input index {index} of feature {feature} is outside [0, {cardinality})")]
    IndexOutOfRange {
        /// Feature (table) position in the input vector.
        feature: usize,
        /// Offending index.
        index: usize,
        /// Number of rows of the feature's table.
        cardinality: usize,
    },

    /// A backend name did not parse.
    #[error("Unknown backend: {0} (expected generic, native or optimized)")]
    UnknownBackend(String),
}

/// Result type alias for cdfnet operations.
pub type CdfResult<T> = Result<T, CdfError>;

impl CdfError {
    /// Creates a shape mismatch error.
    pub fn shape_mismatch(op: &'static str, what: &'static str, left: usize, right: usize) -> Self {
        CdfError::ShapeMismatch {
            op,
            what,
            left,
            right,
        }
    }

    /// Creates an invalid shape error with a static message.
    pub fn invalid_shape(msg: &'static str) -> Self {
        CdfError::InvalidShape(Cow::Borrowed(msg))
    }

    /// Creates an invalid shape error with a formatted message.
    pub fn invalid_shape_msg<S: Into<String>>(msg: S) -> Self {
        CdfError::InvalidShape(Cow::Owned(msg.into()))
    }

    /// Creates an input length error.
    pub fn input_length(expected: usize, got: usize) -> Self {
        CdfError::InputLength { expected, got }
    }

    /// Creates an index out of range error.
    pub fn index_out_of_range(feature: usize, index: usize, cardinality: usize) -> Self {
        CdfError::IndexOutOfRange {
            feature,
            index,
            cardinality,
        }
    }

    /// True for errors raised by the shape checks of the primitives.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            CdfError::ShapeMismatch { .. } | CdfError::InvalidShape(_)
        )
    }

    /// True for errors caused by a bad input vector.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CdfError::InputLength { .. } | CdfError::IndexOutOfRange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_names_both_dimensions() {
        let err = CdfError::shape_mismatch("transpose", "columns and target rows", 3, 4);
        let msg = err.to_string();
        assert!(msg.contains("transpose"));
        assert!(msg.contains("3 <> 4"));
        assert!(err.is_shape_error());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_input_errors() {
        let err = CdfError::input_length(9, 8);
        assert!(err.to_string().contains("8 <> 9"));
        assert!(err.is_input_error());

        let err = CdfError::index_out_of_range(2, 5, 3);
        let msg = err.to_string();
        assert!(msg.contains("feature 2"));
        assert!(msg.contains("[0, 3)"));
    }

    #[test]
    fn test_config_error() {
        let err = CdfError::from(ConfigError::Bias1Length {
            bias: 10,
            layer1_rows: 12,
        });
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("10 <> 12"));
    }
}
