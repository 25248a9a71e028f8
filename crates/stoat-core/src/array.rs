use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

// DenseArray — Block value storage
//
// A DenseArray is a row-major n-dimensional array of f64 values. It is the
// storage behind every TensorBlock, and the place where gradient tracking
// lives: each array carries a `requires_grad` flag telling the training
// machinery whether gradients should flow through these values.
//
// MEMORY MODEL:
//
//   The data is wrapped in Arc, so cloning an array is cheap (just a
//   refcount increment) and detaching an array shares the same storage.
//   Arrays are immutable after construction; anything that "changes" the
//   tracking flag returns a new handle over the same data.

/// Row-major f64 storage with a shape and a gradient-tracking flag.
#[derive(Debug, Clone)]
pub struct DenseArray {
    /// The raw values, shared between handles.
    data: Arc<Vec<f64>>,
    /// Size of each dimension.
    shape: Vec<usize>,
    /// Whether gradients should be tracked through these values.
    requires_grad: bool,
}

impl DenseArray {
    /// Create an array from a flat vec and a shape.
    ///
    /// The vec length must equal the product of the dimensions.
    /// New arrays start with gradient tracking disabled.
    pub fn from_vec(data: Vec<f64>, shape: Vec<usize>) -> Result<Self> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }
        Ok(DenseArray {
            data: Arc::new(data),
            shape,
            requires_grad: false,
        })
    }

    /// Create a zero-filled array with the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let count = shape.iter().product::<usize>();
        DenseArray {
            data: Arc::new(vec![0.0; count]),
            shape,
            requires_grad: false,
        }
    }

    /// The raw values, in row-major order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// The dimension sizes.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    /// Whether gradients are tracked through these values.
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// A handle over the same storage with the tracking flag set to `flag`.
    pub fn tracked(&self, flag: bool) -> Self {
        DenseArray {
            data: Arc::clone(&self.data),
            shape: self.shape.clone(),
            requires_grad: flag,
        }
    }

    /// A detached handle: same data, no gradient tracking.
    pub fn detach(&self) -> Self {
        self.tracked(false)
    }
}

impl PartialEq for DenseArray {
    /// Arrays compare by shape and values; the tracking flag is a property
    /// of the handle, not of the data.
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.data == other.data
    }
}

impl fmt::Display for DenseArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DenseArray(shape={:?}, requires_grad={})",
            self.shape, self.requires_grad
        )
    }
}
