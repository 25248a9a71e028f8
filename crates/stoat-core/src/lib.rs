//! # stoat-core
//!
//! Core data model for Stoat: labeled tensor maps.
//!
//! This crate provides:
//! - [`Labels`] — named integer metadata describing rows of a value array
//! - [`DenseArray`] — row-major f64 storage with a gradient-tracking flag
//! - [`TensorBlock`] — values plus the labels describing each of their axes
//! - [`TensorMap`] — a set of blocks indexed by a key set
//! - [`Error`] / [`Result`] — the shared error type

pub mod array;
pub mod block;
pub mod error;
pub mod labels;
pub mod tensor;

pub use array::DenseArray;
pub use block::TensorBlock;
pub use error::{Error, Result};
pub use labels::{Labels, LabelsEntry};
pub use tensor::TensorMap;
