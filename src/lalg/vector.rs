//! Row (`1×N`) and column (`N×1`) vectors.
//!
//! Both are degenerate matrices over the same kind of flat storage. Their
//! mutual transpose is a zero-copy view: [`RowVector::transpose`] borrows
//! the row's storage as a column, [`RowVector::transpose_mut`] does so
//! mutably, and writes through either view are visible through the other.
//!
//! ```rust
//! use cdfnet::RowVector;
//!
//! let mut row = RowVector::new(vec![1.0, 2.0, 3.0]).unwrap();
//! {
//!     let mut col = row.transpose_mut();
//!     col.as_mut_slice()[0] = 10.0;
//!     assert_eq!(col.rows(), 3);
//! }
//! assert_eq!(row.as_slice()[0], 10.0);
//! ```

use std::fmt;

use crate::error::{CdfError, CdfResult};
use crate::lalg::matrix::{multiply_transposed_kernel, Matrix};
use crate::lalg::ops::dot_kernel;

/// `1×N` vector with immutable dimensions but mutable content.
#[derive(Clone, PartialEq)]
pub struct RowVector<S = Vec<f64>> {
    data: S,
}

/// `N×1` vector with immutable dimensions but mutable content.
#[derive(Clone, PartialEq)]
pub struct ColVector<S = Vec<f64>> {
    data: S,
}

impl RowVector<Vec<f64>> {
    /// Creates a zero `1×N` vector.
    pub fn zeros(columns: usize) -> CdfResult<Self> {
        if columns == 0 {
            return Err(CdfError::invalid_shape_msg(format!(
                "Number of columns is invalid: {}",
                columns
            )));
        }
        Ok(Self {
            data: vec![0.0; columns],
        })
    }
}

impl ColVector<Vec<f64>> {
    /// Creates a zero `N×1` vector.
    pub fn zeros(rows: usize) -> CdfResult<Self> {
        if rows == 0 {
            return Err(CdfError::invalid_shape_msg(format!(
                "Number of rows is invalid: {}",
                rows
            )));
        }
        Ok(Self {
            data: vec![0.0; rows],
        })
    }
}

impl<S: AsRef<[f64]>> RowVector<S> {
    /// Wraps existing storage without copying it.
    ///
    /// # Errors
    ///
    /// [`CdfError::InvalidShape`] for empty storage.
    pub fn new(data: S) -> CdfResult<Self> {
        if data.as_ref().is_empty() {
            return Err(CdfError::invalid_shape("Array has no elements"));
        }
        Ok(Self { data })
    }

    /// Wraps storage whose length was already validated.
    #[inline]
    pub(crate) fn wrap(data: S) -> Self {
        debug_assert!(!data.as_ref().is_empty());
        Self { data }
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Contents.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_ref()
    }

    /// Copy with fresh storage.
    pub fn to_owned_vector(&self) -> RowVector {
        RowVector {
            data: self.as_slice().to_vec(),
        }
    }

    /// Releases the storage.
    #[inline]
    pub fn into_storage(self) -> S {
        self.data
    }

    /// Zero-copy `N×1` view of the same storage.
    #[inline]
    pub fn transpose(&self) -> ColVector<&[f64]> {
        ColVector::wrap(self.as_slice())
    }

    /// Moves the storage into an `N×1` vector.
    #[inline]
    pub fn into_transpose(self) -> ColVector<S> {
        ColVector { data: self.data }
    }

    /// `1×N` matrix view of the same storage.
    #[inline]
    pub fn as_matrix(&self) -> Matrix<&[f64]> {
        Matrix::wrap(self.as_slice(), 1, self.columns())
    }

    /// Multiplies this `1×N` vector by the *transposed* `M×N` matrix
    /// (the original was `N×M`), writing the `1×M` result into `target`.
    ///
    /// # Errors
    ///
    /// [`CdfError::ShapeMismatch`] when `N` differs from the matrix columns
    /// or `M` from the target columns.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cdfnet::{Matrix, RowVector};
    ///
    /// let v = RowVector::new(vec![1.0, 2.0]).unwrap();
    /// // original 2x3 matrix stored transposed as 3x2
    /// let wt = Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]).unwrap();
    /// let mut out = RowVector::zeros(3).unwrap();
    /// v.multiply_by_transposed_matrix(&wt, &mut out).unwrap();
    /// assert_eq!(out.as_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn multiply_by_transposed_matrix<T, U>(
        &self,
        transposed: &Matrix<T>,
        target: &mut RowVector<U>,
    ) -> CdfResult<()>
    where
        T: AsRef<[f64]>,
        U: AsRef<[f64]> + AsMut<[f64]>,
    {
        if self.columns() != transposed.columns() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_transposed_matrix",
                "source vector columns and transposed matrix columns",
                self.columns(),
                transposed.columns(),
            ));
        }
        if target.columns() != transposed.rows() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_transposed_matrix",
                "target vector columns and transposed matrix rows",
                target.columns(),
                transposed.rows(),
            ));
        }

        let n = self.columns();
        multiply_transposed_kernel(self.as_slice(), transposed.as_slice(), n, target.as_mut_slice());
        Ok(())
    }

    /// Row·column dot product.
    pub fn multiply_by_vector<T: AsRef<[f64]>>(&self, vector: &ColVector<T>) -> CdfResult<f64> {
        if self.columns() != vector.rows() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_vector",
                "this vector's columns and other vector's rows",
                self.columns(),
                vector.rows(),
            ));
        }
        Ok(dot_kernel(self.as_slice(), vector.as_slice()))
    }
}

impl<S: AsRef<[f64]> + AsMut<[f64]>> RowVector<S> {
    /// Mutable contents.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data.as_mut()
    }

    /// Mutable zero-copy `N×1` view of the same storage.
    #[inline]
    pub fn transpose_mut(&mut self) -> ColVector<&mut [f64]> {
        ColVector::wrap(self.data.as_mut())
    }
}

impl<S: AsRef<[f64]>> ColVector<S> {
    /// Wraps existing storage without copying it.
    ///
    /// # Errors
    ///
    /// [`CdfError::InvalidShape`] for empty storage.
    pub fn new(data: S) -> CdfResult<Self> {
        if data.as_ref().is_empty() {
            return Err(CdfError::invalid_shape("Array has no elements"));
        }
        Ok(Self { data })
    }

    #[inline]
    pub(crate) fn wrap(data: S) -> Self {
        debug_assert!(!data.as_ref().is_empty());
        Self { data }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.as_ref().len()
    }

    /// Contents.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_ref()
    }

    /// Copy with fresh storage.
    pub fn to_owned_vector(&self) -> ColVector {
        ColVector {
            data: self.as_slice().to_vec(),
        }
    }

    /// Releases the storage.
    #[inline]
    pub fn into_storage(self) -> S {
        self.data
    }

    /// Zero-copy `1×N` view of the same storage.
    #[inline]
    pub fn transpose(&self) -> RowVector<&[f64]> {
        RowVector::wrap(self.as_slice())
    }

    /// Moves the storage into a `1×N` vector.
    #[inline]
    pub fn into_transpose(self) -> RowVector<S> {
        RowVector { data: self.data }
    }

    /// Outer product: this `M×1` vector times the `1×N` vector, written
    /// into the `M×N` target.
    pub fn multiply_by_vector<T, U>(&self, vector: &RowVector<T>, target: &mut Matrix<U>) -> CdfResult<()>
    where
        T: AsRef<[f64]>,
        U: AsRef<[f64]> + AsMut<[f64]>,
    {
        if self.rows() != target.rows() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_vector",
                "this vector's rows and target matrix's rows",
                self.rows(),
                target.rows(),
            ));
        }
        if vector.columns() != target.columns() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_vector",
                "other vector's columns and target matrix's columns",
                vector.columns(),
                target.columns(),
            ));
        }

        let columns = target.columns();
        let tgt = target.as_mut_slice();
        for (src, tgt_row) in self.as_slice().iter().zip(tgt.chunks_exact_mut(columns)) {
            for (t, v) in tgt_row.iter_mut().zip(vector.as_slice()) {
                *t = src * v;
            }
        }
        Ok(())
    }
}

impl<S: AsRef<[f64]> + AsMut<[f64]>> ColVector<S> {
    /// Mutable contents.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data.as_mut()
    }

    /// Mutable zero-copy `1×N` view of the same storage.
    #[inline]
    pub fn transpose_mut(&mut self) -> RowVector<&mut [f64]> {
        RowVector::wrap(self.data.as_mut())
    }
}

impl<S: AsRef<[f64]>> fmt::Debug for RowVector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowVector")
            .field("columns", &self.columns())
            .finish_non_exhaustive()
    }
}

impl<S: AsRef<[f64]>> fmt::Debug for ColVector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColVector")
            .field("rows", &self.rows())
            .finish_non_exhaustive()
    }
}
