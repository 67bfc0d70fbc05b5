//! Inference backends.
//!
//! Three interchangeable implementations of the same pipeline:
//!
//! ```text
//! gather embeddings → dense + ReLU → dense → softmax → cumulative sum
//! ```
//!
//! | Backend | Strategy |
//! |---|---|
//! | [`GenericInference`] | plain scalar loops, fresh output per call |
//! | [`NativeInference`] | `ndarray` kernels over views of the shared parameters |
//! | [`OptimizedInference`] | `lalg` primitives over [`Workspace`] buffers, no allocation |
//!
//! All three agree within relative `1e-6`. They share one read-only
//! [`ModelParams`] behind an `Arc`; each calling thread brings its own
//! [`Workspace`], and the returned slice borrows from it.
//!
//! # Example
//!
//! ```rust
//! use cdfnet::{Backend, Dataset, DatasetConfig, Engine, NeuralInference};
//! use std::sync::Arc;
//!
//! let config = DatasetConfig::builder()
//!     .embedding_width(4)
//!     .inner_width(8)
//!     .output_width(12)
//!     .cardinalities(vec![5, 3, 7])
//!     .build()
//!     .unwrap();
//! let (params, inputs) = Dataset::generate(&config, 1).unwrap().into_params().unwrap();
//! let params = Arc::new(params);
//!
//! let mut reference = None;
//! for backend in Backend::ALL {
//!     let engine = Engine::new(backend, Arc::clone(&params));
//!     let cdf = engine.compute_to_vec(&inputs[0]).unwrap();
//!     assert_eq!(cdf.len(), 12);
//!     let first = reference.get_or_insert_with(|| cdf.clone());
//!     for (a, b) in cdf.iter().zip(first.iter()) {
//!         assert!((a - b).abs() <= 1e-6 * b.abs().max(1e-300));
//!     }
//! }
//! ```

mod generic;
mod native;
mod optimized;

pub use generic::GenericInference;
pub use native::NativeInference;
pub use optimized::OptimizedInference;

use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::Workspace;
use crate::error::{CdfError, CdfResult};
use crate::params::ModelParams;

/// Computes the CDF output for one input vector.
///
/// Implementations are immutable after construction and safe to call from
/// any number of threads, each with its own workspace.
pub trait NeuralInference: Send + Sync {
    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// The shared parameters.
    fn params(&self) -> &ModelParams;

    /// Runs the pipeline for `input` (one index per embedding table).
    ///
    /// The result has `params().output_width()` non-decreasing values in
    /// `[0, 1]` and borrows from `workspace`; copy it to keep it past the
    /// next call.
    ///
    /// # Errors
    ///
    /// [`CdfError::InputLength`] or [`CdfError::IndexOutOfRange`] for an
    /// invalid input.
    fn compute<'w>(&self, input: &[usize], workspace: &'w mut Workspace) -> CdfResult<&'w [f64]>;

    /// Creates a workspace already sized for this engine.
    fn create_workspace(&self) -> Workspace {
        Workspace::for_params(self.params())
    }

    /// Runs the pipeline with a temporary workspace and returns an owned copy.
    fn compute_to_vec(&self, input: &[usize]) -> CdfResult<Vec<f64>> {
        let mut workspace = self.create_workspace();
        Ok(self.compute(input, &mut workspace)?.to_vec())
    }
}

/// Backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    Generic,
    Native,
    Optimized,
}

impl Backend {
    /// Every backend, in declaration order.
    pub const ALL: [Backend; 3] = [Backend::Generic, Backend::Native, Backend::Optimized];

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Backend::Generic => "generic",
            Backend::Native => "native",
            Backend::Optimized => "optimized",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = CdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CdfError::UnknownBackend(s.to_string()))
    }
}

/// One backend chosen at runtime.
///
/// Dispatches every [`NeuralInference`] call to the wrapped backend.
#[derive(Debug, Clone)]
pub enum Engine {
    Generic(GenericInference),
    Native(NativeInference),
    Optimized(OptimizedInference),
}

thread_local! {
    static THREAD_WORKSPACE: RefCell<Workspace> = RefCell::new(Workspace::new());
}

impl Engine {
    /// Builds the `backend` engine over shared parameters.
    pub fn new(backend: Backend, params: Arc<ModelParams>) -> Self {
        log::debug!(
            "building {} engine: {} features, embedding={} hidden={} output={}",
            backend,
            params.num_features(),
            params.embedding_width(),
            params.hidden_width(),
            params.output_width()
        );
        match backend {
            Backend::Generic => Engine::Generic(GenericInference::new(params)),
            Backend::Native => Engine::Native(NativeInference::new(params)),
            Backend::Optimized => Engine::Optimized(OptimizedInference::new(params)),
        }
    }

    /// The wrapped backend as a trait object.
    pub fn as_inference(&self) -> &dyn NeuralInference {
        match self {
            Engine::Generic(e) => e,
            Engine::Native(e) => e,
            Engine::Optimized(e) => e,
        }
    }

    /// Runs the pipeline with this thread's workspace and hands the result to `f`.
    ///
    /// The workspace is created on first use and lives as long as the
    /// thread. A nested call from inside `f` gets a temporary workspace.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use cdfnet::{Backend, Dataset, DatasetConfig, Engine};
    /// # use std::sync::Arc;
    /// # let config = DatasetConfig::builder()
    /// #     .embedding_width(2).inner_width(4).output_width(5)
    /// #     .cardinalities(vec![3]).build().unwrap();
    /// # let (params, inputs) = Dataset::generate(&config, 1).unwrap().into_params().unwrap();
    /// let engine = Engine::new(Backend::Optimized, Arc::new(params));
    /// let last = engine
    ///     .compute_with_thread_workspace(&inputs[0], |cdf| cdf[cdf.len() - 1])
    ///     .unwrap();
    /// assert!((last - 1.0).abs() < 1e-3);
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`NeuralInference::compute`].
    pub fn compute_with_thread_workspace<R, F>(&self, input: &[usize], f: F) -> CdfResult<R>
    where
        F: FnOnce(&[f64]) -> R,
    {
        THREAD_WORKSPACE.with(|cell| match cell.try_borrow_mut() {
            Ok(mut workspace) => Ok(f(self.compute(input, &mut workspace)?)),
            Err(_) => {
                let mut workspace = self.create_workspace();
                Ok(f(self.compute(input, &mut workspace)?))
            }
        })
    }
}

impl NeuralInference for Engine {
    fn backend(&self) -> Backend {
        self.as_inference().backend()
    }

    fn params(&self) -> &ModelParams {
        self.as_inference().params()
    }

    fn create_workspace(&self) -> Workspace {
        self.as_inference().create_workspace()
    }

    fn compute_to_vec(&self, input: &[usize]) -> CdfResult<Vec<f64>> {
        self.as_inference().compute_to_vec(input)
    }

    #[inline]
    fn compute<'w>(&self, input: &[usize], workspace: &'w mut Workspace) -> CdfResult<&'w [f64]> {
        match self {
            Engine::Generic(e) => e.compute(input, workspace),
            Engine::Native(e) => e.compute(input, workspace),
            Engine::Optimized(e) => e.compute(input, workspace),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_backend_names() {
        for backend in Backend::ALL {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
        assert_eq!("Optimized".parse::<Backend>().unwrap(), Backend::Optimized);
        assert_eq!(" NATIVE ".parse::<Backend>().unwrap(), Backend::Native);
        let err = "blas".parse::<Backend>().unwrap_err();
        assert!(matches!(err, CdfError::UnknownBackend(ref s) if s == "blas"));
    }

    #[test]
    fn test_engine_dispatch() {
        let params = small_params();
        for backend in Backend::ALL {
            let engine = Engine::new(backend, Arc::clone(&params));
            assert_eq!(engine.backend(), backend);
            assert_eq!(engine.params().output_width(), 5);
            assert_eq!(engine.as_inference().backend(), backend);
        }
    }

    #[test]
    fn test_engines_match_straight_line_evaluation() {
        let params = small_params();
        for backend in Backend::ALL {
            let engine = Engine::new(backend, Arc::clone(&params));
            let mut ws = engine.create_workspace();
            for input in [[0usize, 0], [1, 3], [2, 1]] {
                let want = expected(&params, &input);
                let got = engine.compute(&input, &mut ws).unwrap();
                assert_eq!(got.len(), want.len());
                for (g, w) in got.iter().zip(&want) {
                    assert_relative_eq!(*g, *w, max_relative = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_engines_reject_bad_input() {
        let params = small_params();
        for backend in Backend::ALL {
            let engine = Engine::new(backend, Arc::clone(&params));
            let mut ws = Workspace::new();
            let err = engine.compute(&[0], &mut ws).unwrap_err();
            assert!(matches!(err, CdfError::InputLength { expected: 2, got: 1 }));
            let err = engine.compute(&[3, 0], &mut ws).unwrap_err();
            assert!(matches!(
                err,
                CdfError::IndexOutOfRange {
                    feature: 0,
                    index: 3,
                    cardinality: 3
                }
            ));
        }
    }

    #[test]
    fn test_thread_workspace_reentrant() {
        let params = small_params();
        let engine = Engine::new(Backend::Optimized, params);
        let (outer, inner) = engine
            .compute_with_thread_workspace(&[1, 2], |outer| {
                let inner = engine
                    .compute_with_thread_workspace(&[1, 2], |inner| inner.to_vec())
                    .unwrap();
                (outer.to_vec(), inner)
            })
            .unwrap();
        assert_eq!(outer, inner);
    }
}
