//! Seeded synthetic dataset generator.
//!
//! Every parameter array is drawn from its own [`JavaRandom`] stream, seeded
//! per [`DatasetConfig`]. Each scalar takes two draws:
//!
//! ```text
//! u = next_double()
//! value = next_double() / (if u < small_magnitude_probability { 1 } else { large_magnitude })
//! ```
//!
//! so the bulk of the values are vanishingly small and a few are of order
//! one. Matrices are filled row by row. Identical configurations always
//! yield identical data.
//!
//! ```rust
//! use cdfnet::{Dataset, DatasetConfig};
//!
//! let config = DatasetConfig::builder()
//!     .embedding_width(4)
//!     .inner_width(16)
//!     .output_width(10)
//!     .cardinalities(vec![7, 3])
//!     .build()
//!     .unwrap();
//!
//! let a = Dataset::generate(&config, 8).unwrap();
//! let b = Dataset::generate(&config, 8).unwrap();
//! assert_eq!(a.inputs, b.inputs);
//! assert_eq!(a.layer1, b.layer1);
//! ```

use rand::Rng;

use crate::config::{ConfigError, DatasetConfig};
use crate::error::{CdfError, CdfResult};
use crate::lalg::{Matrix, RowVector};
use crate::params::ModelParams;
use crate::random::JavaRandom;

/// Generated parameters plus a pool of valid inputs.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Configuration the data was generated from.
    pub config: DatasetConfig,

    /// One `cardinality × embedding_width` table per feature.
    pub embeddings: Vec<Matrix>,

    /// Pre-transposed Layer1, `inner_width × total_embedding_width`.
    pub layer1: Matrix,

    /// Pre-transposed Layer2, `output_width × inner_width`.
    pub layer2: Matrix,

    pub bias1: RowVector,
    pub bias2: RowVector,

    /// Input pool, one index per feature.
    pub inputs: Vec<Vec<usize>>,
}

impl Dataset {
    /// Generates the parameters and `input_count` inputs for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn generate(config: &DatasetConfig, input_count: usize) -> CdfResult<Self> {
        config.validate()?;

        log::debug!(
            "generating dataset: {} features, embedding={} inner={} output={}, {} scalars",
            config.num_features(),
            config.embedding_width,
            config.inner_width,
            config.output_width,
            config.param_count()
        );

        let embeddings = config
            .cardinalities
            .iter()
            .enumerate()
            .map(|(i, &rows)| {
                random_matrix(rows, config.embedding_width, config.embedding_seed(i), config)
            })
            .collect::<CdfResult<Vec<_>>>()?;

        let layer1 = random_matrix(
            config.inner_width,
            config.total_embedding_width(),
            config.layer1_seed,
            config,
        )?;
        let layer2 = random_matrix(
            config.output_width,
            config.inner_width,
            config.layer2_seed,
            config,
        )?;
        let bias1 = RowVector::new(random_array(config.inner_width, config.bias1_seed, config))?;
        let bias2 = RowVector::new(random_array(config.output_width, config.bias2_seed, config))?;

        let inputs = build_inputs(&config.cardinalities, input_count, config.input_seed)?;

        Ok(Self {
            config: config.clone(),
            embeddings,
            layer1,
            layer2,
            bias1,
            bias2,
            inputs,
        })
    }

    /// Draws `count` additional valid inputs from any `rand` generator.
    pub fn random_inputs<R: Rng>(&self, count: usize, rng: &mut R) -> Vec<Vec<usize>> {
        (0..count)
            .map(|_| {
                self.config
                    .cardinalities
                    .iter()
                    .map(|&rows| rng.gen_range(0..rows))
                    .collect()
            })
            .collect()
    }

    /// Splits the dataset into validated parameters and the input pool.
    ///
    /// # Errors
    ///
    /// Propagates [`ModelParams::new`] validation errors.
    pub fn into_params(self) -> CdfResult<(ModelParams, Vec<Vec<usize>>)> {
        let params = ModelParams::new(
            self.embeddings,
            self.layer1,
            self.layer2,
            self.bias1,
            self.bias2,
        )?;
        Ok((params, self.inputs))
    }
}

#[inline]
fn draw(rng: &mut JavaRandom, config: &DatasetConfig) -> f64 {
    let magnitude = if rng.next_double() < config.small_magnitude_probability {
        1.0
    } else {
        config.large_magnitude
    };
    rng.next_double() / magnitude
}

/// `len` scalars from a fresh stream seeded with `seed`.
pub fn random_array(len: usize, seed: i64, config: &DatasetConfig) -> Vec<f64> {
    let mut rng = JavaRandom::new(seed);
    (0..len).map(|_| draw(&mut rng, config)).collect()
}

/// `rows × columns` matrix filled row by row from a fresh stream.
///
/// # Errors
///
/// Returns an error if either dimension is zero or `rows * columns`
/// overflows.
pub fn random_matrix(
    rows: usize,
    columns: usize,
    seed: i64,
    config: &DatasetConfig,
) -> CdfResult<Matrix> {
    let len = rows.checked_mul(columns).ok_or_else(|| {
        CdfError::invalid_shape_msg(format!("Array size overflow: {} * {}", rows, columns))
    })?;
    Matrix::from_storage(random_array(len, seed, config), rows, columns)
}

/// `count` inputs, one `next_int(cardinality)` draw per feature from a
/// single stream seeded with `seed`.
///
/// # Errors
///
/// [`ConfigError::InvalidDimension`] when a cardinality is zero or exceeds
/// `i32::MAX`; nothing is drawn in that case.
pub fn build_inputs(
    cardinalities: &[usize],
    count: usize,
    seed: i64,
) -> CdfResult<Vec<Vec<usize>>> {
    let bounds = cardinalities
        .iter()
        .map(|&rows| match i32::try_from(rows) {
            Ok(bound) if bound > 0 => Ok(bound),
            Ok(_) => Err(ConfigError::InvalidDimension("every cardinality must be > 0")),
            Err(_) => Err(ConfigError::InvalidDimension(
                "cardinalities must fit the input generator's 31-bit range",
            )),
        })
        .collect::<Result<Vec<i32>, _>>()?;

    let mut rng = JavaRandom::new(seed);
    Ok((0..count)
        .map(|_| bounds.iter().map(|&bound| rng.next_int(bound) as usize).collect())
        .collect())
}
