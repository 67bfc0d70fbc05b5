//! # cdfnet - Embedding-Lookup Inference to Probability CDFs
//!
//! A two-layer feed-forward network over categorical embeddings:
//! gather one embedding row per feature, dense + ReLU, dense, softmax,
//! cumulative sum. Three interchangeable backends compute the same output.
//!
//! ## Architecture
//! - Row-major flat `f64` storage; weights stored pre-transposed `[Out, In]`
//! - Shape-checked [`lalg`] primitives with a 4-wide SIMD dot product
//! - Aligned buffers (64-byte) in a per-thread [`Workspace`]
//! - Parameters validated once and shared read-only behind an `Arc`
//!
//! ## Usage
//! ```rust
//! use cdfnet::{Backend, Dataset, DatasetConfig, Engine, NeuralInference};
//! use std::sync::Arc;
//!
//! let config = DatasetConfig::builder()
//!     .embedding_width(8)
//!     .inner_width(32)
//!     .output_width(20)
//!     .cardinalities(vec![24, 3, 13])
//!     .build()
//!     .unwrap();
//! let (params, inputs) = Dataset::generate(&config, 16).unwrap().into_params().unwrap();
//! let engine = Engine::new(Backend::Optimized, Arc::new(params));
//!
//! let mut workspace = engine.create_workspace();
//! let cdf = engine.compute(&inputs[0], &mut workspace).unwrap();
//! assert_eq!(cdf.len(), 20);
//! assert!(cdf.windows(2).all(|w| w[0] <= w[1]));
//! ```

pub mod buffer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod lalg;
pub mod params;
pub mod random;

// Re-exports
pub use buffer::{AlignedBuffer, Workspace, CACHE_LINE};
pub use config::{
    ConfigError, DatasetConfig, DatasetConfigBuilder, REFERENCE_CARDINALITIES,
    REFERENCE_EMBEDDING_WIDTH, REFERENCE_INNER_WIDTH, REFERENCE_OUTPUT_WIDTH,
};
pub use dataset::Dataset;
pub use error::{CdfError, CdfResult};
pub use inference::{
    Backend, Engine, GenericInference, NativeInference, NeuralInference, OptimizedInference,
};
pub use lalg::{ColVector, Matrix, RowVector};
pub use params::ModelParams;
pub use random::JavaRandom;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
