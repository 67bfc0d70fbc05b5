//! Shape-validated network parameters.
//!
//! [`ModelParams`] owns the embedding tables, the two pre-transposed weight
//! matrices and the two biases. Every shape relation is checked once, at
//! construction; afterwards the parameters are immutable and are shared
//! read-only (typically behind an `Arc`) by any number of engines and
//! threads.

use crate::config::ConfigError;
use crate::error::{CdfError, CdfResult};
use crate::lalg::{Matrix, RowVector};

/// Parameters of the embedding → dense → dense network.
///
/// Weight matrices are stored *pre-transposed* (`out × in`), so Layer1 has
/// one row per hidden unit and `Σ Di` columns.
#[derive(Clone)]
pub struct ModelParams {
    embeddings: Vec<Matrix>,
    /// Column offset of each table inside the gathered vector, plus the total.
    offsets: Vec<usize>,
    layer1: Matrix,
    layer2: Matrix,
    bias1: RowVector,
    bias2: RowVector,
}

impl ModelParams {
    /// Validates and assembles a parameter set.
    ///
    /// Checks, in order: at least one table, `Layer1.columns == Σ Di`,
    /// `Layer1.rows == Layer2.columns`, `Bias1.len == Layer1.rows`,
    /// `Bias2.len == Layer2.rows`.
    ///
    /// # Errors
    ///
    /// [`CdfError::Config`] naming the first violated relation and both sizes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cdfnet::{Matrix, ModelParams, RowVector};
    ///
    /// let params = ModelParams::new(
    ///     vec![Matrix::zeros(10, 4).unwrap()],
    ///     Matrix::zeros(8, 4).unwrap(),
    ///     Matrix::zeros(3, 8).unwrap(),
    ///     RowVector::zeros(8).unwrap(),
    ///     RowVector::zeros(3).unwrap(),
    /// )
    /// .unwrap();
    /// assert_eq!(params.output_width(), 3);
    /// ```
    pub fn new(
        embeddings: Vec<Matrix>,
        layer1: Matrix,
        layer2: Matrix,
        bias1: RowVector,
        bias2: RowVector,
    ) -> CdfResult<Self> {
        if embeddings.is_empty() {
            return Err(ConfigError::NoEmbeddings.into());
        }

        let mut offsets = Vec::with_capacity(embeddings.len() + 1);
        let mut total = 0;
        offsets.push(0);
        for table in &embeddings {
            total += table.columns();
            offsets.push(total);
        }

        if layer1.columns() != total {
            return Err(ConfigError::Layer1Columns {
                embedding_width: total,
                layer1_columns: layer1.columns(),
            }
            .into());
        }
        if layer1.rows() != layer2.columns() {
            return Err(ConfigError::Layer2Columns {
                layer1_rows: layer1.rows(),
                layer2_columns: layer2.columns(),
            }
            .into());
        }
        if bias1.columns() != layer1.rows() {
            return Err(ConfigError::Bias1Length {
                bias: bias1.columns(),
                layer1_rows: layer1.rows(),
            }
            .into());
        }
        if bias2.columns() != layer2.rows() {
            return Err(ConfigError::Bias2Length {
                bias: bias2.columns(),
                layer2_rows: layer2.rows(),
            }
            .into());
        }

        log::debug!(
            "model params: {} features, embedding={} hidden={} output={}",
            embeddings.len(),
            total,
            layer1.rows(),
            layer2.rows()
        );

        Ok(Self {
            embeddings,
            offsets,
            layer1,
            layer2,
            bias1,
            bias2,
        })
    }

    /// Number of categorical features (embedding tables).
    #[inline]
    pub fn num_features(&self) -> usize {
        self.embeddings.len()
    }

    /// Row count `Mi` of every table.
    pub fn cardinalities(&self) -> Vec<usize> {
        self.embeddings.iter().map(Matrix::rows).collect()
    }

    /// Start column of each table in the gathered vector, followed by the
    /// total width (`num_features() + 1` entries).
    #[inline]
    pub fn embedding_offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// `Σ Di`, the length of the gathered embedding vector.
    #[inline]
    pub fn embedding_width(&self) -> usize {
        self.layer1.columns()
    }

    /// Layer1 output width.
    #[inline]
    pub fn hidden_width(&self) -> usize {
        self.layer1.rows()
    }

    /// Length of the CDF output.
    #[inline]
    pub fn output_width(&self) -> usize {
        self.layer2.rows()
    }

    #[inline]
    pub fn embeddings(&self) -> &[Matrix] {
        &self.embeddings
    }

    /// Pre-transposed Layer1 (`hidden × Σ Di`).
    #[inline]
    pub fn layer1(&self) -> &Matrix {
        &self.layer1
    }

    /// Pre-transposed Layer2 (`output × hidden`).
    #[inline]
    pub fn layer2(&self) -> &Matrix {
        &self.layer2
    }

    #[inline]
    pub fn bias1(&self) -> &RowVector {
        &self.bias1
    }

    #[inline]
    pub fn bias2(&self) -> &RowVector {
        &self.bias2
    }

    /// Checks one index per feature, each inside its table.
    ///
    /// # Errors
    ///
    /// [`CdfError::InputLength`] or [`CdfError::IndexOutOfRange`].
    pub fn validate_input(&self, input: &[usize]) -> CdfResult<()> {
        if input.len() != self.embeddings.len() {
            return Err(CdfError::input_length(self.embeddings.len(), input.len()));
        }
        for (feature, (&index, table)) in input.iter().zip(&self.embeddings).enumerate() {
            if index >= table.rows() {
                return Err(CdfError::index_out_of_range(feature, index, table.rows()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ModelParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelParams")
            .field("cardinalities", &self.cardinalities())
            .field("embedding_width", &self.embedding_width())
            .field("hidden_width", &self.hidden_width())
            .field("output_width", &self.output_width())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Vec<Matrix> {
        vec![Matrix::zeros(3, 2).unwrap(), Matrix::zeros(5, 4).unwrap()]
    }

    fn build(l1: (usize, usize), l2: (usize, usize), b1: usize, b2: usize) -> CdfResult<ModelParams> {
        ModelParams::new(
            tables(),
            Matrix::zeros(l1.0, l1.1).unwrap(),
            Matrix::zeros(l2.0, l2.1).unwrap(),
            RowVector::zeros(b1).unwrap(),
            RowVector::zeros(b2).unwrap(),
        )
    }

    #[test]
    fn test_valid_params() {
        let params = build((7, 6), (9, 7), 7, 9).unwrap();
        assert_eq!(params.num_features(), 2);
        assert_eq!(params.cardinalities(), vec![3, 5]);
        assert_eq!(params.embedding_offsets(), &[0, 2, 6]);
        assert_eq!(params.embedding_width(), 6);
        assert_eq!(params.hidden_width(), 7);
        assert_eq!(params.output_width(), 9);
    }

    #[test]
    fn test_no_embeddings() {
        let err = ModelParams::new(
            Vec::new(),
            Matrix::zeros(1, 1).unwrap(),
            Matrix::zeros(1, 1).unwrap(),
            RowVector::zeros(1).unwrap(),
            RowVector::zeros(1).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, CdfError::Config(ConfigError::NoEmbeddings)));
    }

    #[test]
    fn test_validation_order() {
        // Every relation broken: the first check reports
        let err = build((7, 5), (9, 8), 6, 10).unwrap_err();
        assert!(matches!(
            err,
            CdfError::Config(ConfigError::Layer1Columns {
                embedding_width: 6,
                layer1_columns: 5
            })
        ));

        let err = build((7, 6), (9, 8), 6, 10).unwrap_err();
        assert!(matches!(
            err,
            CdfError::Config(ConfigError::Layer2Columns {
                layer1_rows: 7,
                layer2_columns: 8
            })
        ));

        let err = build((7, 6), (9, 7), 6, 10).unwrap_err();
        assert!(matches!(
            err,
            CdfError::Config(ConfigError::Bias1Length {
                bias: 6,
                layer1_rows: 7
            })
        ));

        let err = build((7, 6), (9, 7), 7, 10).unwrap_err();
        assert!(matches!(
            err,
            CdfError::Config(ConfigError::Bias2Length {
                bias: 10,
                layer2_rows: 9
            })
        ));
        assert!(err.to_string().contains("10 <> 9"));
    }

    #[test]
    fn test_validate_input() {
        let params = build((7, 6), (9, 7), 7, 9).unwrap();
        assert!(params.validate_input(&[2, 4]).is_ok());

        let err = params.validate_input(&[0]).unwrap_err();
        assert!(matches!(err, CdfError::InputLength { expected: 2, got: 1 }));

        let err = params.validate_input(&[0, 5]).unwrap_err();
        assert!(matches!(
            err,
            CdfError::IndexOutOfRange {
                feature: 1,
                index: 5,
                cardinality: 5
            }
        ));
    }
}
