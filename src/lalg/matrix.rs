//! Row-major dense matrix over flat storage.

use std::fmt;

use crate::error::{CdfError, CdfResult};
use crate::lalg::ops::dot_kernel;
use crate::lalg::vector::{ColVector, RowVector};

/// `rows × columns` matrix with immutable dimensions but mutable content.
///
/// The storage `S` is any flat `f64` container of length `rows * columns`:
/// an owned `Vec<f64>` (the default), a borrowed slice for views, or an
/// [`AlignedBuffer`](crate::AlignedBuffer).
#[derive(Clone, PartialEq)]
pub struct Matrix<S = Vec<f64>> {
    data: S,
    rows: usize,
    columns: usize,
}

/// Computes `a(M×N) · b(K×N)ᵗ → target(M×K)`.
///
/// Operands are flat row-major slices; callers validate the shapes and
/// guarantee `n > 0`.
#[inline]
pub(crate) fn multiply_transposed_kernel(a: &[f64], b: &[f64], n: usize, target: &mut [f64]) {
    let mut out = target.iter_mut();
    for a_row in a.chunks_exact(n) {
        for (b_row, t) in b.chunks_exact(n).zip(out.by_ref()) {
            *t = dot_kernel(a_row, b_row);
        }
    }
}

impl Matrix<Vec<f64>> {
    /// Creates a matrix by copying a rectangular 2-D source.
    ///
    /// # Errors
    ///
    /// [`CdfError::InvalidShape`] when the source has no rows, no columns,
    /// or rows of different lengths.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cdfnet::Matrix;
    ///
    /// let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    /// assert_eq!(m.shape(), (2, 2));
    /// assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
    /// ```
    pub fn from_rows<R: AsRef<[f64]>>(source: &[R]) -> CdfResult<Self> {
        let rows = source.len();
        if rows == 0 {
            return Err(CdfError::invalid_shape("Array has no elements"));
        }

        let columns = source[0].as_ref().len();
        if columns == 0 {
            return Err(CdfError::invalid_shape("Array has no columns"));
        }

        let mut data = Vec::with_capacity(rows * columns);
        for (i, row) in source.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != columns {
                return Err(CdfError::invalid_shape_msg(format!(
                    "Array has different size of rows: row {} has {} <> {}",
                    i,
                    row.len(),
                    columns
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            data,
            rows,
            columns,
        })
    }

    /// Creates a zero matrix.
    ///
    /// # Errors
    ///
    /// [`CdfError::InvalidShape`] when either dimension is zero or
    /// `rows * columns` overflows.
    pub fn zeros(rows: usize, columns: usize) -> CdfResult<Self> {
        let len = check_dims(rows, columns)?;
        Ok(Self {
            data: vec![0.0; len],
            rows,
            columns,
        })
    }
}

/// Validates the dimensions and returns the element count.
#[inline]
fn check_dims(rows: usize, columns: usize) -> CdfResult<usize> {
    if rows == 0 {
        return Err(CdfError::invalid_shape_msg(format!(
            "Number of rows is invalid: {}",
            rows
        )));
    }
    if columns == 0 {
        return Err(CdfError::invalid_shape_msg(format!(
            "Number of columns is invalid: {}",
            columns
        )));
    }
    rows.checked_mul(columns).ok_or_else(|| {
        CdfError::invalid_shape_msg(format!("Array size overflow: {} * {}", rows, columns))
    })
}

impl<S: AsRef<[f64]>> Matrix<S> {
    /// Wraps existing flat storage without copying it.
    ///
    /// # Errors
    ///
    /// [`CdfError::InvalidShape`] when a dimension is zero or the storage
    /// length differs from `rows * columns` (including when the product
    /// overflows).
    pub fn from_storage(data: S, rows: usize, columns: usize) -> CdfResult<Self> {
        let expected = check_dims(rows, columns)?;
        let len = data.as_ref().len();
        if len != expected {
            return Err(CdfError::invalid_shape_msg(format!(
                "Array size mismatch: {} <> ({} * {})",
                len, rows, columns
            )));
        }
        Ok(Self {
            data,
            rows,
            columns,
        })
    }

    /// Wraps storage whose length was already validated.
    #[inline]
    pub(crate) fn wrap(data: S, rows: usize, columns: usize) -> Self {
        debug_assert_eq!(data.as_ref().len(), rows * columns);
        Self {
            data,
            rows,
            columns,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Flat row-major contents.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_ref()
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`, like slice indexing.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        assert!(i < self.rows, "Row {} out of bounds ({} rows)", i, self.rows);
        let start = i * self.columns;
        &self.as_slice()[start..start + self.columns]
    }

    /// Iterator over the rows.
    #[inline]
    pub fn iter_rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.as_slice().chunks_exact(self.columns)
    }

    /// Element at `(row, column)`, `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row < self.rows && column < self.columns {
            Some(self.as_slice()[row * self.columns + column])
        } else {
            None
        }
    }

    /// Borrowing view over the same storage.
    #[inline]
    pub fn view(&self) -> Matrix<&[f64]> {
        Matrix {
            data: self.as_slice(),
            rows: self.rows,
            columns: self.columns,
        }
    }

    /// Copy of this matrix with fresh storage.
    pub fn to_owned_matrix(&self) -> Matrix {
        Matrix {
            data: self.as_slice().to_vec(),
            rows: self.rows,
            columns: self.columns,
        }
    }

    /// Releases the storage.
    #[inline]
    pub fn into_storage(self) -> S {
        self.data
    }

    /// Writes the transpose of this matrix into `target`.
    ///
    /// # Errors
    ///
    /// [`CdfError::ShapeMismatch`] unless `target` is `columns × rows`.
    pub fn transpose<T: AsMut<[f64]>>(&self, target: &mut Matrix<T>) -> CdfResult<()> {
        if self.columns != target.rows {
            return Err(CdfError::shape_mismatch(
                "transpose",
                "this matrix's columns and target matrix's rows",
                self.columns,
                target.rows,
            ));
        }
        if self.rows != target.columns {
            return Err(CdfError::shape_mismatch(
                "transpose",
                "this matrix's rows and target matrix's columns",
                self.rows,
                target.columns,
            ));
        }

        let rows = self.rows;
        let tgt = target.data.as_mut();
        for (i, src_row) in self.iter_rows().enumerate() {
            for (j, v) in src_row.iter().enumerate() {
                tgt[j * rows + i] = *v;
            }
        }
        Ok(())
    }

    /// Multiplies this `M×N` matrix by the *transposed* `K×N` matrix
    /// `transposed` (the original was `N×K`), writing the `M×K` result.
    ///
    /// The transpose is never materialized: each output element is a dot
    /// product of two contiguous rows.
    ///
    /// # Errors
    ///
    /// [`CdfError::ShapeMismatch`] naming the first pair of disagreeing
    /// dimensions.
    pub fn multiply_by_transposed_matrix<T, U>(
        &self,
        transposed: &Matrix<T>,
        target: &mut Matrix<U>,
    ) -> CdfResult<()>
    where
        T: AsRef<[f64]>,
        U: AsMut<[f64]>,
    {
        if self.columns != transposed.columns {
            return Err(CdfError::shape_mismatch(
                "multiply_by_transposed_matrix",
                "this matrix's columns and other matrix's columns",
                self.columns,
                transposed.columns,
            ));
        }
        if self.rows != target.rows {
            return Err(CdfError::shape_mismatch(
                "multiply_by_transposed_matrix",
                "this matrix's rows and target matrix's rows",
                self.rows,
                target.rows,
            ));
        }
        if transposed.rows != target.columns {
            return Err(CdfError::shape_mismatch(
                "multiply_by_transposed_matrix",
                "other matrix's rows and target matrix's columns",
                transposed.rows,
                target.columns,
            ));
        }

        multiply_transposed_kernel(
            self.as_slice(),
            transposed.as_slice(),
            self.columns,
            target.data.as_mut(),
        );
        Ok(())
    }

    /// Multiplies this `M×N` matrix by the `N×1` vector, writing `M×1`.
    pub fn multiply_by_vector<T, U>(
        &self,
        vector: &ColVector<T>,
        target: &mut ColVector<U>,
    ) -> CdfResult<()>
    where
        T: AsRef<[f64]>,
        U: AsRef<[f64]> + AsMut<[f64]>,
    {
        if self.columns != vector.rows() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_vector",
                "this matrix's columns and other vector's rows",
                self.columns,
                vector.rows(),
            ));
        }
        if self.rows != target.rows() {
            return Err(CdfError::shape_mismatch(
                "multiply_by_vector",
                "this matrix's rows and target vector's rows",
                self.rows,
                target.rows(),
            ));
        }

        for (t, row) in target.as_mut_slice().iter_mut().zip(self.iter_rows()) {
            *t = dot_kernel(row, vector.as_slice());
        }
        Ok(())
    }

    /// Views a `1×N` matrix as a row vector.
    pub fn as_row_vector(&self) -> CdfResult<RowVector<&[f64]>> {
        if self.rows > 1 {
            return Err(CdfError::shape_mismatch(
                "as_row_vector",
                "matrix rows and row vector rows",
                self.rows,
                1,
            ));
        }
        Ok(RowVector::wrap(self.as_slice()))
    }

    /// Views an `N×1` matrix as a column vector.
    pub fn as_col_vector(&self) -> CdfResult<ColVector<&[f64]>> {
        if self.columns > 1 {
            return Err(CdfError::shape_mismatch(
                "as_col_vector",
                "matrix columns and column vector columns",
                self.columns,
                1,
            ));
        }
        Ok(ColVector::wrap(self.as_slice()))
    }

    /// Value of a `1×1` matrix.
    pub fn to_scalar(&self) -> CdfResult<f64> {
        if self.rows > 1 {
            return Err(CdfError::shape_mismatch("to_scalar", "matrix rows and scalar rows", self.rows, 1));
        }
        if self.columns > 1 {
            return Err(CdfError::shape_mismatch(
                "to_scalar",
                "matrix columns and scalar columns",
                self.columns,
                1,
            ));
        }
        Ok(self.as_slice()[0])
    }
}

impl<S: AsRef<[f64]> + AsMut<[f64]>> Matrix<S> {
    /// Mutable flat row-major contents.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data.as_mut()
    }

    /// Mutable row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        assert!(i < self.rows, "Row {} out of bounds ({} rows)", i, self.rows);
        let start = i * self.columns;
        let columns = self.columns;
        &mut self.as_mut_slice()[start..start + columns]
    }
}

impl<S: AsRef<[f64]>> fmt::Debug for Matrix<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.rows)
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}
