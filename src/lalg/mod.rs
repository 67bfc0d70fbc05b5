//! Shape-checked dense linear algebra over flat `f64` storage.
//!
//! - [`Matrix`] — row-major `rows × columns` matrix
//! - [`RowVector`] / [`ColVector`] — `1×N` / `N×1` vectors with zero-copy
//!   transpose views
//! - [`ops`] — element-wise operations and reductions
//!
//! Every operation validates its operand dimensions on every call, in
//! release builds as well, and reports both mismatched dimensions.
//!
//! The product kernel, [`Matrix::multiply_by_transposed_matrix`], takes its
//! right operand pre-transposed so that each output element is a dot
//! product of two contiguous rows. The same kernel serves vector·matrix
//! ([`RowVector::multiply_by_transposed_matrix`]) and matrix·matrix products.

mod matrix;
pub mod ops;
mod vector;

pub use matrix::Matrix;
pub use vector::{ColVector, RowVector};
