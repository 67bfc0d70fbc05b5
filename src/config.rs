//! Synthetic dataset configuration and parameter shape errors.
//!
//! This module provides [`DatasetConfig`], the shape and seed contract of the
//! synthetic data generator, and [`ConfigError`], raised whenever a parameter
//! set or a configuration violates a shape relation.
//!
//! Engine sizing is never configured here: the inference backends derive
//! every width from the matrices they are given. `DatasetConfig` only tells
//! the generator which matrices to produce.
//!
//! # Example
//!
//! ```rust
//! use cdfnet::DatasetConfig;
//!
//! // Reference sizes: 9 tables of width 128, inner width 2048, 330 outputs
//! let config = DatasetConfig::reference();
//! assert_eq!(config.total_embedding_width(), 9 * 128);
//!
//! // Or a small custom shape
//! let config = DatasetConfig::builder()
//!     .embedding_width(4)
//!     .inner_width(16)
//!     .output_width(10)
//!     .cardinalities(vec![3, 5])
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.total_embedding_width(), 8);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Embedding width of the reference configuration.
pub const REFERENCE_EMBEDDING_WIDTH: usize = 128;

/// Inner (Layer1 output) width of the reference configuration.
pub const REFERENCE_INNER_WIDTH: usize = 2048;

/// Output width (number of CDF points) of the reference configuration.
pub const REFERENCE_OUTPUT_WIDTH: usize = 330;

/// Feature cardinalities of the reference configuration (9 features).
pub const REFERENCE_CARDINALITIES: [usize; 9] = [24, 3, 3, 13, 128_363, 184, 385, 40, 115_402];

/// Scale factor at which [`DatasetConfig::scaled`] reproduces the reference sizes.
pub const REFERENCE_FACTOR: usize = 4;

/// Seed of the first embedding table; table `i` uses `EMBEDDING_SEED_BASE + i`.
pub const EMBEDDING_SEED_BASE: i64 = 0xDEAD_01;

/// Seed of the pre-transposed Layer1 matrix.
pub const LAYER1_SEED: i64 = 0xBEAF_01;

/// Seed of the pre-transposed Layer2 matrix.
pub const LAYER2_SEED: i64 = 0xBEAF_02;

/// Seed shared by both bias vectors.
pub const BIAS_SEED: i64 = 0xBEAF_03;

/// Seed of the input index generator.
pub const INPUT_SEED: i64 = 0;

/// Probability that a generated scalar keeps its `[0, 1)` magnitude.
pub const DEFAULT_SMALL_MAGNITUDE_PROBABILITY: f64 = 0.05;

/// Divisor applied to every other generated scalar.
pub const DEFAULT_LARGE_MAGNITUDE: f64 = 1e30;

/// Shape and seed contract of the synthetic data generator.
///
/// The generator produces one `cardinalities[i] × embedding_width` table per
/// feature, a pre-transposed `inner_width × total_embedding_width` Layer1, a
/// pre-transposed `output_width × inner_width` Layer2 and the two biases.
///
/// # Creating a Configuration
///
/// ```rust
/// use cdfnet::DatasetConfig;
///
/// // Half the reference widths, as in the benchmark sweep
/// let config = DatasetConfig::scaled(2).expect("valid factor");
/// assert_eq!(config.embedding_width, 64);
/// assert_eq!(config.inner_width, 1024);
///
/// config.validate().expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatasetConfig {
    /// Width of every embedding table.
    pub embedding_width: usize,

    /// Number of Layer1 outputs.
    pub inner_width: usize,

    /// Number of Layer2 outputs (length of the CDF).
    pub output_width: usize,

    /// Number of rows of each embedding table, one entry per feature.
    pub cardinalities: Vec<usize>,

    /// Seed of the first embedding table.
    pub embedding_seed_base: i64,

    /// Seed of Layer1.
    pub layer1_seed: i64,

    /// Seed of Layer2.
    pub layer2_seed: i64,

    /// Seed of Bias1.
    pub bias1_seed: i64,

    /// Seed of Bias2.
    pub bias2_seed: i64,

    /// Seed of the input pool.
    pub input_seed: i64,

    /// Probability of keeping a drawn scalar undivided.
    pub small_magnitude_probability: f64,

    /// Divisor applied to the remaining scalars.
    pub large_magnitude: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::reference()
    }
}

impl DatasetConfig {
    /// Reference configuration: 9 tables of width 128, inner width 2048,
    /// 330 outputs, reference seeds.
    ///
    /// The two largest tables hold ~31M scalars together (~250 MB).
    pub fn reference() -> Self {
        Self {
            embedding_width: REFERENCE_EMBEDDING_WIDTH,
            inner_width: REFERENCE_INNER_WIDTH,
            output_width: REFERENCE_OUTPUT_WIDTH,
            cardinalities: REFERENCE_CARDINALITIES.to_vec(),
            embedding_seed_base: EMBEDDING_SEED_BASE,
            layer1_seed: LAYER1_SEED,
            layer2_seed: LAYER2_SEED,
            bias1_seed: BIAS_SEED,
            bias2_seed: BIAS_SEED,
            input_seed: INPUT_SEED,
            small_magnitude_probability: DEFAULT_SMALL_MAGNITUDE_PROBABILITY,
            large_magnitude: DEFAULT_LARGE_MAGNITUDE,
        }
    }

    /// Reference configuration with widths scaled by `factor / 4`.
    ///
    /// Factor 4 gives the reference sizes; the benchmark sweep uses 1, 2, 4, 8.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFactor`] when a scaled width rounds to zero.
    pub fn scaled(factor: usize) -> Result<Self, ConfigError> {
        let config = Self {
            embedding_width: REFERENCE_EMBEDDING_WIDTH * factor / REFERENCE_FACTOR,
            inner_width: REFERENCE_INNER_WIDTH * factor / REFERENCE_FACTOR,
            ..Self::reference()
        };
        if config.embedding_width == 0 || config.inner_width == 0 {
            return Err(ConfigError::InvalidFactor(factor));
        }
        Ok(config)
    }

    /// Creates a builder starting from the reference configuration.
    pub fn builder() -> DatasetConfigBuilder {
        DatasetConfigBuilder::default()
    }

    /// Number of features (embedding tables).
    #[inline]
    pub fn num_features(&self) -> usize {
        self.cardinalities.len()
    }

    /// Sum of all table widths, i.e. the Layer1 input width.
    #[inline]
    pub fn total_embedding_width(&self) -> usize {
        self.num_features() * self.embedding_width
    }

    /// Seed of embedding table `feature`.
    #[inline]
    pub fn embedding_seed(&self, feature: usize) -> i64 {
        self.embedding_seed_base + feature as i64
    }

    /// Number of generated parameter scalars (tables, layers, biases).
    pub fn param_count(&self) -> usize {
        let tables: usize = self
            .cardinalities
            .iter()
            .map(|rows| rows * self.embedding_width)
            .sum();
        tables
            + self.inner_width * self.total_embedding_width()
            + self.output_width * self.inner_width
            + self.inner_width
            + self.output_width
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - any width is zero
    /// - there are no features, or a feature has zero cardinality
    /// - the small-magnitude probability is outside `[0, 1]`
    /// - the large magnitude is not a finite positive number
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_width == 0 {
            return Err(ConfigError::InvalidDimension("embedding_width must be > 0"));
        }
        if self.inner_width == 0 {
            return Err(ConfigError::InvalidDimension("inner_width must be > 0"));
        }
        if self.output_width == 0 {
            return Err(ConfigError::InvalidDimension("output_width must be > 0"));
        }
        if self.cardinalities.is_empty() {
            return Err(ConfigError::NoEmbeddings);
        }
        if self.cardinalities.iter().any(|&rows| rows == 0) {
            return Err(ConfigError::InvalidDimension("every cardinality must be > 0"));
        }
        if self.cardinalities.iter().any(|&rows| rows > i32::MAX as usize) {
            return Err(ConfigError::InvalidDimension(
                "cardinalities must fit the input generator's 31-bit range",
            ));
        }
        if !(0.0..=1.0).contains(&self.small_magnitude_probability) {
            return Err(ConfigError::InvalidProbability(
                self.small_magnitude_probability,
            ));
        }
        if !self.large_magnitude.is_finite() || self.large_magnitude <= 0.0 {
            return Err(ConfigError::InvalidMagnitude(self.large_magnitude));
        }
        Ok(())
    }
}

/// Builder for [`DatasetConfig`], starting from [`DatasetConfig::reference`].
#[derive(Debug, Clone, Default)]
pub struct DatasetConfigBuilder {
    config: Option<DatasetConfig>,
}

impl DatasetConfigBuilder {
    fn config(&mut self) -> &mut DatasetConfig {
        self.config.get_or_insert_with(DatasetConfig::reference)
    }

    /// Sets the width of every embedding table.
    pub fn embedding_width(mut self, width: usize) -> Self {
        self.config().embedding_width = width;
        self
    }

    /// Sets the number of Layer1 outputs.
    pub fn inner_width(mut self, width: usize) -> Self {
        self.config().inner_width = width;
        self
    }

    /// Sets the number of Layer2 outputs.
    pub fn output_width(mut self, width: usize) -> Self {
        self.config().output_width = width;
        self
    }

    /// Sets the table cardinalities (one per feature).
    pub fn cardinalities(mut self, cardinalities: Vec<usize>) -> Self {
        self.config().cardinalities = cardinalities;
        self
    }

    /// Offsets every seed by `salt`, yielding an independent dataset of the same shape.
    pub fn seed_salt(mut self, salt: i64) -> Self {
        let config = self.config();
        config.embedding_seed_base = EMBEDDING_SEED_BASE.wrapping_add(salt);
        config.layer1_seed = LAYER1_SEED.wrapping_add(salt);
        config.layer2_seed = LAYER2_SEED.wrapping_add(salt);
        config.bias1_seed = BIAS_SEED.wrapping_add(salt);
        config.bias2_seed = BIAS_SEED.wrapping_add(salt);
        config.input_seed = INPUT_SEED.wrapping_add(salt);
        self
    }

    /// Sets the probability of keeping a drawn scalar undivided.
    pub fn small_magnitude_probability(mut self, probability: f64) -> Self {
        self.config().small_magnitude_probability = probability;
        self
    }

    /// Sets the divisor applied to the remaining scalars.
    pub fn large_magnitude(mut self, magnitude: f64) -> Self {
        self.config().large_magnitude = magnitude;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(mut self) -> Result<DatasetConfig, ConfigError> {
        let config = self.config().clone();
        config.validate()?;
        Ok(config)
    }
}

/// Shape relation violated by a parameter set or a generator configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// No embedding tables were supplied.
    #[error("At least one embedding table is required")]
    NoEmbeddings,

    /// Layer1 columns differ from the total embedding width.
    #[error("Layer 1 column mismatch: {embedding_width} <> {layer1_columns}")]
    Layer1Columns {
        /// Sum of the embedding table widths.
        embedding_width: usize,
        /// Columns of the pre-transposed Layer1.
        layer1_columns: usize,
    },

    /// Layer2 columns differ from Layer1 rows.
    #[error("Layer 2 column mismatch: {layer1_rows} <> {layer2_columns}")]
    Layer2Columns {
        /// Rows of the pre-transposed Layer1.
        layer1_rows: usize,
        /// Columns of the pre-transposed Layer2.
        layer2_columns: usize,
    },

    /// Bias1 length differs from Layer1 rows.
    #[error("Bias 1 length mismatch: {bias} <> {layer1_rows}")]
    Bias1Length {
        /// Length of Bias1.
        bias: usize,
        /// Rows of the pre-transposed Layer1.
        layer1_rows: usize,
    },

    /// Bias2 length differs from Layer2 rows.
    #[error("Bias 2 length mismatch: {bias} <> {layer2_rows}")]
    Bias2Length {
        /// Length of Bias2.
        bias: usize,
        /// Rows of the pre-transposed Layer2.
        layer2_rows: usize,
    },

    /// A dimension parameter is invalid.
    #[error("Invalid dimension: {0}")]
    InvalidDimension(&'static str),

    /// Scale factor produces an empty width.
    #[error("Scale factor {0} yields a zero width")]
    InvalidFactor(usize),

    /// Probability outside `[0, 1]`.
    #[error("Small magnitude probability must be in [0, 1], got {0}")]
    InvalidProbability(f64),

    /// Magnitude divisor is not a finite positive number.
    #[error("Large magnitude must be finite and positive, got {0}")]
    InvalidMagnitude(f64),
}
