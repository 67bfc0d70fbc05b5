//! Softmax Offset Tests
//!
//! Every backend shifts the logits by the *signed* value of largest
//! magnitude before exponentiating. The shift is only observable when the
//! exponentials leave the f64 range:
//! - `[-720, -700]`: signed offset -720 stays finite (a `|max|` offset of
//!   +720 underflows both terms to 0 and yields NaN)
//! - `[-800, 10]`: signed offset -800 overflows `exp(810)` (plain max
//!   subtraction would give a clean `[0, 1]`)
//!
//! Run with: cargo test --test softmax_offset

use std::sync::Arc;

use approx::assert_relative_eq;
use cdfnet::lalg::ops;
use cdfnet::{Backend, Engine, Matrix, ModelParams, NeuralInference, RowVector};

/// One single-row feature and a zero hidden layer, so the logits equal `bias2`.
fn params_with_logits(logits: &[f64]) -> Arc<ModelParams> {
    let table = Matrix::from_rows(&[[0.0]]).unwrap();
    let layer1 = Matrix::from_rows(&[[0.0]]).unwrap();
    let layer2 = Matrix::zeros(logits.len(), 1).unwrap();
    let bias1 = RowVector::new(vec![0.0]).unwrap();
    let bias2 = RowVector::new(logits.to_vec()).unwrap();
    Arc::new(ModelParams::new(vec![table], layer1, layer2, bias1, bias2).unwrap())
}

fn compute_all(logits: &[f64]) -> Vec<(Backend, Vec<f64>)> {
    let params = params_with_logits(logits);
    Backend::ALL
        .iter()
        .map(|&backend| {
            let engine = Engine::new(backend, Arc::clone(&params));
            let mut ws = engine.create_workspace();
            let cdf = engine.compute(&[0], &mut ws).unwrap().to_vec();
            (backend, cdf)
        })
        .collect()
}

// =============================================================================
// OFFSET SELECTION
// =============================================================================

#[test]
fn test_offset_is_signed_value_of_largest_magnitude() {
    // Signed offset -5; |max| would be +5 and plain max would be 3
    assert_eq!(ops::softmax_offset(&[3.0, -5.0]), -5.0);
    assert_eq!(ops::softmax_offset(&[-720.0, -700.0]), -720.0);
    assert_eq!(ops::softmax_offset(&[-800.0, 10.0]), -800.0);

    // Ties keep the first index
    assert_eq!(ops::softmax_offset(&[-2.0, 2.0]), -2.0);
    assert_eq!(ops::softmax_offset(&[0.0, 0.0, 0.0]), 0.0);

    println!("✓ Offset is the signed value at the first abs-max index");
}

// =============================================================================
// LARGE NEGATIVE LOGITS STAY FINITE
// =============================================================================

#[test]
fn test_large_negative_logits_stay_finite() {
    let logits = [-720.0, -700.0];
    let first = 1.0 / (1.0 + 20f64.exp());

    let mut p = logits;
    ops::softmax_inplace(&mut p);
    assert!(p.iter().all(|v| v.is_finite()), "ops: {:?}", p);
    assert_relative_eq!(p[0], first, max_relative = 1e-12);

    for (backend, cdf) in compute_all(&logits) {
        assert!(cdf.iter().all(|v| v.is_finite()), "{}: {:?}", backend, cdf);
        assert_relative_eq!(cdf[0], first, max_relative = 1e-12);
        assert_relative_eq!(cdf[1], 1.0, max_relative = 1e-12);
        println!("✓ {} keeps [-720, -700] finite", backend);
    }
}

// =============================================================================
// SIGNED OFFSET OVERFLOWS ON A SMALL POSITIVE LOGIT
// =============================================================================

#[test]
fn test_signed_offset_overflow_is_preserved() {
    // exp(10 - (-800)) = +inf, so the second term is inf / inf
    let logits = [-800.0, 10.0];

    let mut p = logits;
    ops::softmax_inplace(&mut p);
    assert_eq!(p[0], 0.0);
    assert!(p[1].is_nan(), "ops: {:?}", p);

    for (backend, cdf) in compute_all(&logits) {
        assert_eq!(cdf.len(), 2, "{}", backend);
        assert_eq!(cdf[0], 0.0, "{}: {:?}", backend, cdf);
        assert!(!cdf[1].is_finite(), "{}: {:?}", backend, cdf);
        println!("✓ {} overflows on [-800, 10]", backend);
    }
}
