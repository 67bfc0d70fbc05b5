//! `ndarray`-backed backend.
//!
//! The parameters stay in their shared flat storage; every call wraps them
//! in `ndarray` views and lets the library run the matrix-vector products,
//! the element-wise maps and the reductions. Intermediate arrays are owned
//! by `ndarray` and dropped at the end of the call.

use std::sync::Arc;

use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};

use crate::buffer::Workspace;
use crate::error::{CdfError, CdfResult};
use crate::inference::{Backend, NeuralInference};
use crate::lalg::Matrix;
use crate::params::ModelParams;

/// Backend delegating kernels to `ndarray`.
#[derive(Debug, Clone)]
pub struct NativeInference {
    params: Arc<ModelParams>,
}

fn view(matrix: &Matrix) -> CdfResult<ArrayView2<'_, f64>> {
    ArrayView2::from_shape(matrix.shape(), matrix.as_slice())
        .map_err(|e| CdfError::invalid_shape_msg(e.to_string()))
}

impl NativeInference {
    pub fn new(params: Arc<ModelParams>) -> Self {
        Self { params }
    }

    /// Runs the pipeline and returns the `ndarray` result.
    ///
    /// # Errors
    ///
    /// Input validation errors, see [`NeuralInference::compute`].
    pub fn compute_array(&self, input: &[usize]) -> CdfResult<Array1<f64>> {
        let params = &*self.params;
        params.validate_input(input)?;

        let mut embedding = Array1::<f64>::zeros(params.embedding_width());
        let offsets = params.embedding_offsets();
        for (i, (table, &index)) in params.embeddings().iter().zip(input).enumerate() {
            embedding
                .slice_mut(s![offsets[i]..offsets[i + 1]])
                .assign(&ArrayView1::from(table.row(index)));
        }

        let bias1 = ArrayView1::from(params.bias1().as_slice());
        let mut hidden = view(params.layer1())?.dot(&embedding) + &bias1;
        hidden.mapv_inplace(|v| if v < 0.0 { 0.0 } else { v });

        let bias2 = ArrayView1::from(params.bias2().as_slice());
        let mut output = view(params.layer2())?.dot(&hidden) + &bias2;

        // Signed value of the first largest-magnitude element
        let (_, offset) = output.iter().fold((0.0f64, 0.0f64), |(max, offset), &v| {
            if v.abs() > max {
                (v.abs(), v)
            } else {
                (max, offset)
            }
        });
        output.mapv_inplace(|v| (v - offset).exp());
        let total = output.sum();
        output /= total;

        output.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
        Ok(output)
    }
}

impl NeuralInference for NativeInference {
    fn backend(&self) -> Backend {
        Backend::Native
    }

    fn params(&self) -> &ModelParams {
        &self.params
    }

    fn compute<'w>(&self, input: &[usize], workspace: &'w mut Workspace) -> CdfResult<&'w [f64]> {
        let output = self.compute_array(input)?;
        let (data, offset) = output.into_raw_vec_and_offset();
        debug_assert_eq!(offset, Some(0));
        workspace.fresh_output = data;
        Ok(&workspace.fresh_output)
    }

    fn create_workspace(&self) -> Workspace {
        Workspace::new()
    }

    fn compute_to_vec(&self, input: &[usize]) -> CdfResult<Vec<f64>> {
        Ok(self.compute_array(input)?.to_vec())
    }
}
