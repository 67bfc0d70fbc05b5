//! Element-wise operations over flat `f64` slices.
//!
//! Every operation taking more than one slice checks the lengths on every
//! call and reports both of them on mismatch.
//!
//! # Softmax offset
//!
//! [`softmax_inplace`] subtracts the *signed* element of largest absolute
//! value, not the maximum. The result is identical to the textbook form up
//! to rounding, and all backends use this exact offset.

use wide::f64x4;

use crate::error::{CdfError, CdfResult};

/// SIMD lane count of the dot product kernel.
pub const LANES: usize = 4;

#[inline]
fn check_pair(op: &'static str, a: &[f64], b: &[f64]) -> CdfResult<()> {
    if a.len() != b.len() {
        return Err(CdfError::shape_mismatch(op, "array lengths", a.len(), b.len()));
    }
    Ok(())
}

#[inline]
fn check_triple(op: &'static str, a: &[f64], b: &[f64], target: &[f64]) -> CdfResult<()> {
    if a.len() != b.len() {
        return Err(CdfError::shape_mismatch(op, "array lengths (data1, data2)", a.len(), b.len()));
    }
    if a.len() != target.len() {
        return Err(CdfError::shape_mismatch(
            op,
            "array lengths (data1, target)",
            a.len(),
            target.len(),
        ));
    }
    Ok(())
}

/// Dot product kernel (4-wide SIMD body, scalar tail).
///
/// Callers guarantee `a.len() == b.len()`.
#[inline]
pub(crate) fn dot_kernel(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = f64x4::splat(0.0);
    let a_chunks = a.chunks_exact(LANES);
    let b_chunks = b.chunks_exact(LANES);
    let a_tail = a_chunks.remainder();
    let b_tail = b_chunks.remainder();

    for (ca, cb) in a_chunks.zip(b_chunks) {
        let va = f64x4::new([ca[0], ca[1], ca[2], ca[3]]);
        let vb = f64x4::new([cb[0], cb[1], cb[2], cb[3]]);
        acc += va * vb;
    }

    let lanes: [f64; LANES] = acc.into();
    let mut sum: f64 = lanes.iter().sum();

    for (x, y) in a_tail.iter().zip(b_tail) {
        sum += x * y;
    }

    sum
}

/// Dot product of two equally long arrays.
pub fn dot(a: &[f64], b: &[f64]) -> CdfResult<f64> {
    check_pair("dot", a, b)?;
    Ok(dot_kernel(a, b))
}

/// `target[i] = a[i] + b[i]`.
pub fn add(a: &[f64], b: &[f64], target: &mut [f64]) -> CdfResult<()> {
    check_triple("add", a, b, target)?;
    for ((t, x), y) in target.iter_mut().zip(a).zip(b) {
        *t = x + y;
    }
    Ok(())
}

/// `target[i] = a[i] - b[i]`.
pub fn sub(a: &[f64], b: &[f64], target: &mut [f64]) -> CdfResult<()> {
    check_triple("sub", a, b, target)?;
    for ((t, x), y) in target.iter_mut().zip(a).zip(b) {
        *t = x - y;
    }
    Ok(())
}

/// Hadamard product, `target[i] = a[i] * b[i]`.
pub fn mul(a: &[f64], b: &[f64], target: &mut [f64]) -> CdfResult<()> {
    check_triple("mul", a, b, target)?;
    for ((t, x), y) in target.iter_mut().zip(a).zip(b) {
        *t = x * y;
    }
    Ok(())
}

/// `data[i] += other[i]`.
pub fn add_inplace(data: &mut [f64], other: &[f64]) -> CdfResult<()> {
    check_pair("add_inplace", data, other)?;
    for (d, o) in data.iter_mut().zip(other) {
        *d += o;
    }
    Ok(())
}

/// Rectification, `data[i] = max(data[i], 0)`.
#[inline]
pub fn relu_inplace(data: &mut [f64]) {
    for v in data.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
}

/// `max(|data[i]|)`, zero for an empty array.
pub fn norm_max(data: &[f64]) -> f64 {
    data.iter().fold(0.0, |max, v| max.max(v.abs()))
}

/// Index of the first element with the largest absolute value.
///
/// Returns 0 for an empty or all-zero array.
pub fn arg_abs_max(data: &[f64]) -> usize {
    let mut max = 0.0;
    let mut idx = 0;
    for (i, v) in data.iter().enumerate() {
        let a = v.abs();
        if a > max {
            max = a;
            idx = i;
        }
    }
    idx
}

/// Largest element, `-inf` for an empty array.
pub fn max(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Smallest element, `+inf` for an empty array.
pub fn min(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Sum of all elements.
pub fn sum(data: &[f64]) -> f64 {
    data.iter().sum()
}

/// Signed value used as the softmax stability offset.
///
/// This is `data[arg_abs_max(data)]`, zero for an empty array.
#[inline]
pub fn softmax_offset(data: &[f64]) -> f64 {
    data.get(arg_abs_max(data)).copied().unwrap_or(0.0)
}

/// Softmax in place with the signed max-magnitude offset.
pub fn softmax_inplace(data: &mut [f64]) {
    let offset = softmax_offset(data);

    let mut total = 0.0;
    for v in data.iter_mut() {
        *v = (*v - offset).exp();
        total += *v;
    }

    for v in data.iter_mut() {
        *v /= total;
    }
}

/// Running sum in place, `data[i] = Σ data[0..=i]`.
#[inline]
pub fn cumsum_inplace(data: &mut [f64]) {
    let mut acc = 0.0;
    for v in data.iter_mut() {
        acc += *v;
        *v = acc;
    }
}
