//! # stoat-script
//!
//! The compiled/scripted runtime representation for Stoat.
//!
//! In compiled mode every Stoat type is carried by one generic wrapper,
//! [`ScriptObject`], which embeds a [`TypeDescriptor`] naming the wrapped
//! type. Compiled operations are [`ScriptModule`]s, which can be saved to
//! and loaded from a byte stream.
//!
//! This crate provides:
//! - [`ScriptObject`] / [`TypeDescriptor`] — the opaque object representation
//! - [`ScriptModule`] — a named, serializable compiled operation
//! - [`detach`] / [`requires_grad`] — scripted tensor-map operations
//! - [`runtime_available`] — the startup capability probe

pub mod module;
pub mod object;

pub use module::{detach, requires_grad, ScriptModule};
pub use object::{ScriptObject, TypeDescriptor};

use std::sync::OnceLock;

/// Whether the scripted runtime can be used in this process.
///
/// The probe runs once; the answer never changes for the process lifetime.
/// Setting the environment variable `STOAT_SCRIPT=0` disables the runtime,
/// forcing every consumer back to dynamic mode.
pub fn runtime_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| !matches!(std::env::var("STOAT_SCRIPT").as_deref(), Ok("0")))
}
