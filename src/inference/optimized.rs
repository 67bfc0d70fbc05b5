//! Zero-allocation backend.
//!
//! Every intermediate vector lives in the caller's [`Workspace`]; the
//! stages run in place over its aligned buffers using the [`lalg`]
//! primitives (4-wide SIMD dot product in both dense layers). After the
//! workspace has grown to the engine's widths once, `compute` performs no
//! heap allocation at all.
//!
//! [`lalg`]: crate::lalg

use std::sync::Arc;

use crate::buffer::Workspace;
use crate::error::CdfResult;
use crate::inference::{Backend, NeuralInference};
use crate::lalg::{ops, RowVector};
use crate::params::ModelParams;

/// Workspace-backed backend built on the `lalg` primitives.
#[derive(Debug, Clone)]
pub struct OptimizedInference {
    params: Arc<ModelParams>,
}

impl OptimizedInference {
    pub fn new(params: Arc<ModelParams>) -> Self {
        Self { params }
    }

    fn gather(&self, input: &[usize], embedding: &mut [f64]) {
        let offsets = self.params.embedding_offsets();
        for (i, (table, &index)) in self.params.embeddings().iter().zip(input).enumerate() {
            embedding[offsets[i]..offsets[i + 1]].copy_from_slice(table.row(index));
        }
    }
}

impl NeuralInference for OptimizedInference {
    fn backend(&self) -> Backend {
        Backend::Optimized
    }

    fn params(&self) -> &ModelParams {
        &self.params
    }

    fn compute<'w>(&self, input: &[usize], workspace: &'w mut Workspace) -> CdfResult<&'w [f64]> {
        let params = &*self.params;
        params.validate_input(input)?;
        workspace.prepare(params);

        self.gather(input, workspace.embedding.as_mut_slice());

        {
            let x = RowVector::wrap(workspace.embedding.as_slice());
            let mut hidden = RowVector::wrap(workspace.hidden.as_mut_slice());
            x.multiply_by_transposed_matrix(params.layer1(), &mut hidden)?;
            ops::add_inplace(hidden.as_mut_slice(), params.bias1().as_slice())?;
            ops::relu_inplace(hidden.as_mut_slice());
        }

        {
            let x = RowVector::wrap(workspace.hidden.as_slice());
            let mut output = RowVector::wrap(workspace.output.as_mut_slice());
            x.multiply_by_transposed_matrix(params.layer2(), &mut output)?;
            ops::add_inplace(output.as_mut_slice(), params.bias2().as_slice())?;
        }

        let output = workspace.output.as_mut_slice();
        ops::softmax_inplace(output);
        ops::cumsum_inplace(output);

        Ok(workspace.output.as_slice())
    }
}
