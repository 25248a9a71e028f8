//! # Stoat
//!
//! Labeled tensor maps for scientific ML, built in Rust.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use stoat::prelude::*;
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `stoat-core` | Labels, TensorBlock, TensorMap, DenseArray, Error |
//! | `stoat-script` | Compiled/scripted runtime representation (feature-gated) |
//!
//! ## Modules
//!
//! - [`backend`] — execution mode probing and dual-mode type resolution
//! - [`ops`] — gradient-tracking operations (`detach`, `requires_grad`)
//! - [`io`] — tensor map serialization (save/load, files and buffers)
//!
//! ## Execution modes
//!
//! Stoat code runs either in dynamic mode (the native types from
//! `stoat-core`) or, with the `script` feature, in compiled mode where the
//! scripted runtime wraps every stoat type in its opaque [`ScriptObject`]
//! representation. The [`backend`] module answers "is this value a
//! TensorMap?" correctly in both modes.

/// Re-export core types.
pub use stoat_core::{DenseArray, Error, Labels, LabelsEntry, Result, TensorBlock, TensorMap};

/// Re-export the scripted runtime (requires the `script` feature).
#[cfg(feature = "script")]
pub use stoat_script::{ScriptModule, ScriptObject, TypeDescriptor};

/// The full scripted runtime API (requires the `script` feature).
#[cfg(feature = "script")]
pub mod script {
    pub use stoat_script::*;
}

/// Execution mode probing and dual-mode type resolution.
pub mod backend;

/// Gradient-tracking operations over tensor maps.
pub mod ops;

/// Tensor map serialization.
pub mod io;

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::backend::{
        execution_mode, is_instance, is_instance_of, runtime_origin, ExecutionMode, LogicalType,
        RuntimeOrigin,
    };
    pub use crate::io::{load, load_buffer, save, save_buffer};
    pub use crate::ops::{detach, requires_grad};
    pub use crate::{DenseArray, Error, Labels, LabelsEntry, Result, TensorBlock, TensorMap};

    #[cfg(feature = "script")]
    pub use crate::backend::is_instance_scripted;
    #[cfg(feature = "script")]
    pub use crate::{ScriptModule, ScriptObject, TypeDescriptor};
}
