//! Straightforward scalar backend.
//!
//! Every stage allocates its own output vector, and nothing but plain
//! indexing loops over the parameter slices is used. This is the
//! baseline the other backends are measured against.

#![allow(clippy::needless_range_loop)]

use std::sync::Arc;

use crate::buffer::Workspace;
use crate::error::CdfResult;
use crate::inference::{Backend, NeuralInference};
use crate::lalg::{Matrix, RowVector};
use crate::params::ModelParams;

/// Scalar-loop backend with fresh output per call.
#[derive(Debug, Clone)]
pub struct GenericInference {
    params: Arc<ModelParams>,
}

impl GenericInference {
    pub fn new(params: Arc<ModelParams>) -> Self {
        Self { params }
    }

    /// Runs the pipeline and returns a freshly allocated result.
    ///
    /// # Errors
    ///
    /// Input validation errors, see [`NeuralInference::compute`].
    pub fn compute_owned(&self, input: &[usize]) -> CdfResult<Vec<f64>> {
        self.params.validate_input(input)?;

        let embedding = self.gather(input);
        let hidden = relu(apply_layer(&embedding, self.params.layer1(), self.params.bias1()));
        let logits = apply_layer(&hidden, self.params.layer2(), self.params.bias2());
        Ok(cumsum(&softmax(&logits)))
    }

    fn gather(&self, input: &[usize]) -> Vec<f64> {
        let mut result = vec![0.0; self.params.embedding_width()];
        let mut k = 0;
        for (table, &index) in self.params.embeddings().iter().zip(input) {
            let line = table.row(index);
            for j in 0..line.len() {
                result[k] = line[j];
                k += 1;
            }
        }
        result
    }
}

fn apply_layer(input: &[f64], layer: &Matrix, bias: &RowVector) -> Vec<f64> {
    let weights = layer.as_slice();
    let n = layer.columns();
    let mut output = vec![0.0; layer.rows()];

    for i in 0..output.len() {
        let line = &weights[i * n..(i + 1) * n];
        for j in 0..input.len() {
            output[i] += input[j] * line[j];
        }
    }

    let bias = bias.as_slice();
    for i in 0..output.len() {
        output[i] += bias[i];
    }

    output
}

fn relu(mut input: Vec<f64>) -> Vec<f64> {
    for v in input.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
    input
}

fn arg_abs_max(input: &[f64]) -> usize {
    let mut max_val = 0.0;
    let mut max_idx = 0;
    for i in 0..input.len() {
        let v = input[i].abs();
        if v > max_val {
            max_val = v;
            max_idx = i;
        }
    }
    max_idx
}

fn softmax(input: &[f64]) -> Vec<f64> {
    let offset = input[arg_abs_max(input)];

    let mut exp = vec![0.0; input.len()];
    let mut total = 0.0;
    for i in 0..input.len() {
        let v = (input[i] - offset).exp();
        exp[i] = v;
        total += v;
    }

    for v in exp.iter_mut() {
        *v /= total;
    }
    exp
}

fn cumsum(input: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; input.len()];
    let mut sum = 0.0;
    for i in 0..input.len() {
        sum += input[i];
        out[i] = sum;
    }
    out
}

impl NeuralInference for GenericInference {
    fn backend(&self) -> Backend {
        Backend::Generic
    }

    fn params(&self) -> &ModelParams {
        &self.params
    }

    fn compute<'w>(&self, input: &[usize], workspace: &'w mut Workspace) -> CdfResult<&'w [f64]> {
        workspace.fresh_output = self.compute_owned(input)?;
        Ok(&workspace.fresh_output)
    }

    fn create_workspace(&self) -> Workspace {
        Workspace::new()
    }

    fn compute_to_vec(&self, input: &[usize]) -> CdfResult<Vec<f64>> {
        self.compute_owned(input)
    }
}
