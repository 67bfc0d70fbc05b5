//! Aligned buffers and workspace for zero-allocation inference.
//!
//! This module provides two key types:
//!
//! - [`AlignedBuffer`] — 64-byte aligned `f64` buffer for SIMD kernels
//! - [`Workspace`] — the scratch set of one calling thread
//!
//! # Zero-Allocation Pattern
//!
//! The optimized backend writes every intermediate vector into the buffers
//! of a [`Workspace`]. Create it once per thread and reuse it:
//!
//! ```rust
//! use cdfnet::{Backend, Dataset, DatasetConfig, Engine, NeuralInference};
//! use std::sync::Arc;
//!
//! let config = DatasetConfig::builder()
//!     .embedding_width(4)
//!     .inner_width(8)
//!     .output_width(6)
//!     .cardinalities(vec![3, 5])
//!     .build()
//!     .unwrap();
//! let (params, inputs) = Dataset::generate(&config, 4).unwrap().into_params().unwrap();
//! let engine = Engine::new(Backend::Optimized, Arc::new(params));
//!
//! // Allocate once
//! let mut workspace = engine.create_workspace();
//!
//! // All subsequent calls are zero-allocation
//! for input in &inputs {
//!     let cdf = engine.compute(input, &mut workspace).unwrap();
//!     assert_eq!(cdf.len(), 6);
//! }
//! assert_eq!(workspace.growth_count(), 1);
//! ```
//!
//! # Memory Alignment
//!
//! [`AlignedBuffer`] uses 64-byte alignment ([`CACHE_LINE`]) so that the
//! 4-lane `f64` dot product always starts on a cache line.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ptr::NonNull;

use crate::params::ModelParams;

/// Cache line size for memory alignment (64 bytes).
pub const CACHE_LINE: usize = 64;

/// 64-byte aligned `f64` buffer.
///
/// Provides a `Vec<f64>`-like interface with cache-friendly memory layout.
/// It implements `AsRef<[f64]>`/`AsMut<[f64]>`, so it can back any of the
/// [`lalg`](crate::lalg) containers directly.
///
/// # Example
///
/// ```rust
/// use cdfnet::AlignedBuffer;
///
/// let mut buf = AlignedBuffer::with_capacity(1024);
/// buf.resize(100);
/// buf.as_mut_slice()[0] = 1.0;
/// assert_eq!(buf.as_slice()[0], 1.0);
/// ```
///
/// # Safety
///
/// The buffer uses raw allocation with proper alignment. All unsafe
/// operations are encapsulated and the public API is safe.
#[repr(C)]
pub struct AlignedBuffer {
    ptr: NonNull<f64>,
    len: usize,
    capacity: usize,
}

// Safety: AlignedBuffer owns its data and doesn't share it
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl AlignedBuffer {
    /// Creates a new empty aligned buffer.
    pub fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
        }
    }

    /// Creates a buffer with the specified capacity (in f64 elements).
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }

        let layout = Self::layout(capacity);
        // SAFETY: layout is derived from a positive `capacity`, allocation handled via handle_alloc_error
        let ptr = unsafe {
            let raw = alloc_zeroed(layout);
            if raw.is_null() {
                std::alloc::handle_alloc_error(layout);
            }
            NonNull::new_unchecked(raw as *mut f64)
        };

        Self {
            ptr,
            len: 0,
            capacity,
        }
    }

    /// Ensures capacity is at least `new_cap`.
    /// Does not shrink. Returns `true` when a reallocation happened.
    #[inline]
    pub fn reserve(&mut self, new_cap: usize) -> bool {
        if new_cap <= self.capacity {
            return false;
        }

        let new_layout = Self::layout(new_cap);
        // SAFETY: new_layout is valid for `new_cap`, allocation failure handled
        let new_ptr = unsafe {
            let raw = alloc_zeroed(new_layout);
            if raw.is_null() {
                std::alloc::handle_alloc_error(new_layout);
            }
            NonNull::new_unchecked(raw as *mut f64)
        };

        if self.capacity > 0 && self.len > 0 {
            // SAFETY: source and destination are valid, non-overlapping, len=self.len
            unsafe {
                std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), self.len);
            }
        }

        if self.capacity > 0 {
            let old_layout = Self::layout(self.capacity);
            // SAFETY: layout matches original allocation
            unsafe {
                dealloc(self.ptr.as_ptr() as *mut u8, old_layout);
            }
        }

        self.ptr = new_ptr;
        self.capacity = new_cap;
        true
    }

    /// Resizes the buffer, filling new elements with zero.
    #[inline]
    pub fn resize(&mut self, new_len: usize) {
        self.reserve(new_len);
        if new_len > self.len {
            // SAFETY: destination is within allocated region; zero the tail
            unsafe {
                std::ptr::write_bytes(self.ptr.as_ptr().add(self.len), 0, new_len - self.len);
            }
        }
        self.len = new_len;
    }

    /// Current length.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Current capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Is empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a slice of the buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        if self.len == 0 {
            &[]
        } else {
            // SAFETY: ptr is valid for `len` contiguous elements
            unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
        }
    }

    /// Returns a mutable slice of the buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        if self.len == 0 {
            &mut []
        } else {
            // SAFETY: ptr uniquely owned, valid for `len` contiguous elements
            unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
        }
    }

    /// Raw pointer.
    #[inline]
    pub fn as_ptr(&self) -> *const f64 {
        self.ptr.as_ptr()
    }

    fn layout(capacity: usize) -> Layout {
        Layout::from_size_align(capacity * std::mem::size_of::<f64>(), CACHE_LINE)
            .expect("Invalid layout")
    }
}

impl Default for AlignedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        if self.capacity > 0 {
            let layout = Self::layout(self.capacity);
            // SAFETY: layout matches allocation, ptr is valid
            unsafe {
                dealloc(self.ptr.as_ptr() as *mut u8, layout);
            }
        }
    }
}

impl Clone for AlignedBuffer {
    fn clone(&self) -> Self {
        let mut new = Self::with_capacity(self.capacity);
        new.len = self.len;
        if self.len > 0 {
            // SAFETY: source/dest are distinct allocations, len is within both
            unsafe {
                std::ptr::copy_nonoverlapping(self.ptr.as_ptr(), new.ptr.as_ptr(), self.len);
            }
        }
        new
    }
}

impl fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl AsRef<[f64]> for AlignedBuffer {
    #[inline]
    fn as_ref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl AsMut<[f64]> for AlignedBuffer {
    #[inline]
    fn as_mut(&mut self) -> &mut [f64] {
        self.as_mut_slice()
    }
}

/// Per-thread scratch set for inference.
///
/// The workspace holds the intermediate vectors of one `compute` call:
///
/// - `embedding`: gathered embedding row `[Σ table widths]`
/// - `hidden`: Layer1 output after ReLU `[Layer1 rows]`
/// - `output`: Layer2 output, softmax and CDF in place `[Layer2 rows]`
/// - `fresh_output`: slot for the per-call arrays of the allocating backends
///
/// Buffers grow monotonically and are reused; one workspace can serve
/// engines of different sizes.
///
/// # Thread Safety
///
/// Workspaces are NOT shared: each thread owns its own. The engines and
/// their parameters are shared read-only.
#[derive(Debug, Default)]
pub struct Workspace {
    /// Gathered embedding vector.
    pub(crate) embedding: AlignedBuffer,

    /// Layer1 activations.
    pub(crate) hidden: AlignedBuffer,

    /// Layer2 activations, transformed in place into the CDF.
    pub(crate) output: AlignedBuffer,

    /// Result slot of the allocating backends, replaced on every call.
    pub(crate) fresh_output: Vec<f64>,

    /// Number of times any scratch buffer had to grow.
    growth_count: usize,
}

impl Workspace {
    /// Creates an empty workspace; buffers are allocated on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a workspace already sized for `params`.
    pub fn for_params(params: &ModelParams) -> Self {
        let mut ws = Self::new();
        ws.reserve(
            params.embedding_width(),
            params.hidden_width(),
            params.output_width(),
        );
        ws
    }

    /// Ensures capacity for the given vector widths.
    /// Only allocates if a width exceeds the current capacity.
    #[inline]
    pub fn reserve(&mut self, embedding: usize, hidden: usize, output: usize) {
        let grew = self.embedding.reserve(embedding)
            | self.hidden.reserve(hidden)
            | self.output.reserve(output);
        if grew {
            self.growth_count += 1;
            log::trace!(
                "workspace grown to embedding={} hidden={} output={}",
                self.embedding.capacity(),
                self.hidden.capacity(),
                self.output.capacity()
            );
        }
    }

    /// Prepares the scratch buffers for one forward pass over `params`.
    #[inline]
    pub(crate) fn prepare(&mut self, params: &ModelParams) {
        let (embedding, hidden, output) = (
            params.embedding_width(),
            params.hidden_width(),
            params.output_width(),
        );
        self.reserve(embedding, hidden, output);
        self.embedding.resize(embedding);
        self.hidden.resize(hidden);
        self.output.resize(output);
    }

    /// Current capacities `(embedding, hidden, output)`.
    #[inline]
    pub fn capacity(&self) -> (usize, usize, usize) {
        (
            self.embedding.capacity(),
            self.hidden.capacity(),
            self.output.capacity(),
        )
    }

    /// How many times the scratch buffers had to grow.
    ///
    /// Stays constant once the workspace reached the size of the largest
    /// engine it serves.
    #[inline]
    pub fn growth_count(&self) -> usize {
        self.growth_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lalg::{Matrix, RowVector};

    fn tiny_params() -> ModelParams {
        ModelParams::new(
            vec![Matrix::zeros(3, 2).unwrap(), Matrix::zeros(4, 3).unwrap()],
            Matrix::zeros(6, 5).unwrap(),
            Matrix::zeros(7, 6).unwrap(),
            RowVector::zeros(6).unwrap(),
            RowVector::zeros(7).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_aligned_buffer_basic() {
        let mut buf = AlignedBuffer::with_capacity(100);
        assert_eq!(buf.capacity(), 100);
        assert_eq!(buf.len(), 0);

        buf.resize(50);
        assert_eq!(buf.len(), 50);

        assert_eq!(buf.as_ptr() as usize % CACHE_LINE, 0);
    }

    #[test]
    fn test_aligned_buffer_grow() {
        let mut buf = AlignedBuffer::with_capacity(10);
        buf.resize(10);
        for (i, v) in buf.as_mut_slice().iter_mut().enumerate() {
            *v = i as f64;
        }

        assert!(buf.reserve(100));
        assert_eq!(buf.capacity(), 100);
        assert!(!buf.reserve(50));

        for (i, v) in buf.as_slice().iter().enumerate() {
            assert_eq!(*v, i as f64);
        }
    }

    #[test]
    fn test_aligned_buffer_clone_is_independent() {
        let mut buf = AlignedBuffer::with_capacity(3);
        buf.resize(3);
        buf.as_mut_slice().copy_from_slice(&[1.0, 2.0, 3.0]);
        let copy = buf.clone();
        buf.as_mut_slice().fill(0.0);
        assert_eq!(buf.as_slice(), &[0.0, 0.0, 0.0]);
        assert_eq!(copy.as_slice(), &[1.0, 2.0, 3.0]);

        // Growth keeps the contents and zero-fills the tail
        buf.resize(5);
        assert_eq!(buf.as_slice(), &[0.0; 5]);
    }

    #[test]
    fn test_workspace_for_params() {
        let params = tiny_params();
        let ws = Workspace::for_params(&params);
        assert_eq!(ws.capacity(), (5, 6, 7));
        assert_eq!(ws.growth_count(), 1);
    }

    #[test]
    fn test_workspace_prepare_reuses_capacity() {
        let params = tiny_params();
        let mut ws = Workspace::new();
        assert_eq!(ws.growth_count(), 0);

        ws.prepare(&params);
        assert_eq!(ws.embedding.len(), 5);
        assert_eq!(ws.hidden.len(), 6);
        assert_eq!(ws.output.len(), 7);
        assert_eq!(ws.growth_count(), 1);

        for _ in 0..10 {
            ws.prepare(&params);
        }
        assert_eq!(ws.growth_count(), 1);

        // Smaller request never shrinks
        ws.reserve(1, 1, 1);
        assert_eq!(ws.capacity(), (5, 6, 7));
    }
}
