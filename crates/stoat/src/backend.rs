use std::any::{Any, TypeId};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use stoat_core::{Error, Labels, Result, TensorBlock, TensorMap};

// Backend — Dual-mode type resolution
//
// Stoat code runs in one of two modes, fixed for the process lifetime:
//
//   Dynamic  — ordinary execution using the native stoat-core types.
//   Compiled — the scripted runtime represents every stoat type behind its
//              generic ScriptObject wrapper (see stoat-script).
//
// The same logical type ("TensorMap") is therefore represented by two
// unrelated concrete Rust types depending on the mode. Code that accepts
// opaque values — operation dispatchers, dataset collators — must answer
// "is this a TensorMap?" without knowing which mode produced the value.
// This module is that answer.
//
// The bindings from logical name to concrete type are established once, on
// first use, and never reassigned: a running process can not silently
// switch modes halfway through.

// Logical types

/// The mode-independent identity of a stoat type.
///
/// The set is closed: these are the only types the resolver knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    Labels,
    TensorBlock,
    TensorMap,
}

impl LogicalType {
    /// All logical types, in a fixed order.
    pub const ALL: [LogicalType; 3] = [
        LogicalType::Labels,
        LogicalType::TensorBlock,
        LogicalType::TensorMap,
    ];

    /// The type name, e.g. `"TensorMap"`.
    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Labels => "Labels",
            LogicalType::TensorBlock => "TensorBlock",
            LogicalType::TensorMap => "TensorMap",
        }
    }
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "Labels" => Ok(LogicalType::Labels),
            "TensorBlock" => Ok(LogicalType::TensorBlock),
            "TensorMap" => Ok(LogicalType::TensorMap),
            _ => Err(Error::invalid_parameter(format!(
                "unknown stoat type name: '{name}'"
            ))),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Execution mode

/// How this process executes stoat code. Determined once, never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Ordinary execution with the native stoat-core types.
    Dynamic,
    /// The scripted runtime is available and owns the compiled types.
    Compiled,
}

fn probe_execution_mode() -> ExecutionMode {
    #[cfg(feature = "script")]
    {
        if stoat_script::runtime_available() {
            return ExecutionMode::Compiled;
        }
    }
    ExecutionMode::Dynamic
}

/// The process-wide execution mode.
///
/// Probed on first call (is the scripted runtime compiled in and enabled?)
/// and cached for the process lifetime.
pub fn execution_mode() -> ExecutionMode {
    static MODE: OnceLock<ExecutionMode> = OnceLock::new();
    *MODE.get_or_init(probe_execution_mode)
}

/// Whether this process runs in compiled/scripted mode.
pub fn is_scripting() -> bool {
    execution_mode() == ExecutionMode::Compiled
}

// Type bindings

/// The logical-name → concrete-type table for this process.
///
/// Populated once during initialization and read-only afterwards, so it is
/// safe to share across threads without synchronization.
#[derive(Debug)]
pub struct TypeBindings {
    mode: ExecutionMode,
    labels: TypeId,
    block: TypeId,
    map: TypeId,
}

impl TypeBindings {
    fn init() -> Self {
        TypeBindings {
            mode: execution_mode(),
            labels: TypeId::of::<Labels>(),
            block: TypeId::of::<TensorBlock>(),
            map: TypeId::of::<TensorMap>(),
        }
    }

    /// The execution mode the bindings were established under.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// The dynamic-mode concrete type bound to a logical name.
    pub fn concrete(&self, logical: LogicalType) -> TypeId {
        match logical {
            LogicalType::Labels => self.labels,
            LogicalType::TensorBlock => self.block,
            LogicalType::TensorMap => self.map,
        }
    }

    /// Nominal instance check against the dynamic-mode binding.
    pub fn matches(&self, value: &dyn Any, logical: LogicalType) -> bool {
        value.type_id() == self.concrete(logical)
    }
}

/// The process-wide type bindings, established on first use.
pub fn bindings() -> &'static TypeBindings {
    static BINDINGS: OnceLock<TypeBindings> = OnceLock::new();
    BINDINGS.get_or_init(TypeBindings::init)
}

// Runtime origin

/// Which representation family an opaque value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeOrigin {
    /// A native stoat-core value.
    DynamicFamily(LogicalType),
    /// A scripted-runtime wrapper around a stoat value.
    CompiledFamily(LogicalType),
    /// Anything else.
    Unrelated,
}

/// Classify an opaque value by representation family.
///
/// This is the capability query behind the resolver: it recognizes both
/// the native types and (when the scripted runtime is available) the
/// opaque compiled-mode wrappers, without string-matching type names.
pub fn runtime_origin(value: &dyn Any) -> RuntimeOrigin {
    for logical in LogicalType::ALL {
        if bindings().matches(value, logical) {
            return RuntimeOrigin::DynamicFamily(logical);
        }
    }

    #[cfg(feature = "script")]
    {
        if stoat_script::runtime_available() {
            if let Some(object) = value.downcast_ref::<stoat_script::ScriptObject>() {
                let descriptor = object.type_descriptor();
                if descriptor.is_stoat() {
                    if let Ok(logical) = descriptor.name().parse::<LogicalType>() {
                        return RuntimeOrigin::CompiledFamily(logical);
                    }
                }
            }
        }
    }

    RuntimeOrigin::Unrelated
}

/// The logical type of a compiled-family value crossing into dynamic-mode
/// code, if that is what `value` is. `None` for everything else.
///
/// This is the advisory check used by [`is_instance`]; it is split out so
/// the advisory condition can be tested without a tracing subscriber.
pub fn cross_mode_advisory(value: &dyn Any) -> Option<LogicalType> {
    match runtime_origin(value) {
        RuntimeOrigin::CompiledFamily(logical) => Some(logical),
        _ => None,
    }
}

// Instance checks

/// Whether `value` is a dynamic-mode instance of the given logical type.
///
/// If `value` turns out to be a compiled-mode stoat object, this emits one
/// advisory warning (use the compiled-mode resolver for those) and still
/// returns the dynamic-mode answer, which is legitimately `false`: a
/// compiled object is never an instance of the native type.
pub fn is_instance(value: &dyn Any, logical: LogicalType) -> bool {
    if let Some(compiled) = cross_mode_advisory(value) {
        tracing::warn!(
            logical_type = compiled.name(),
            "trying to use dynamic-mode stoat code with an object from the \
             scripted runtime; use the scripted resolver (is_instance_scripted) instead"
        );
    }

    bindings().matches(value, logical)
}

/// [`is_instance`] with the logical type given by name.
///
/// The name must be one of `"Labels"`, `"TensorBlock"`, `"TensorMap"`;
/// anything else is an `InvalidParameter` error.
pub fn is_instance_of(value: &dyn Any, name: &str) -> Result<bool> {
    let logical = name.parse::<LogicalType>()?;
    Ok(is_instance(value, logical))
}

/// Whether `value` is a compiled-mode instance of the given logical type.
///
/// The scripted counterpart of [`is_instance`]: it recognizes the opaque
/// wrapper representation and never matches native values.
#[cfg(feature = "script")]
pub fn is_instance_scripted(value: &dyn Any, logical: LogicalType) -> bool {
    matches!(
        runtime_origin(value),
        RuntimeOrigin::CompiledFamily(compiled) if compiled == logical
    )
}

// Version compatibility
//
// The resolver is part of stoat's cross-package compatibility surface:
// other packages link against it by version, and check at load time that
// the stoat they found is recent enough.

/// Whether `version` is at least `expected`, comparing the leading
/// `major.minor` pair numerically and ignoring everything after it.
///
/// Malformed version strings are an `InvalidParameter` error.
pub fn version_at_least(version: &str, expected: &str) -> Result<bool> {
    Ok(parse_major_minor(version)? >= parse_major_minor(expected)?)
}

fn parse_major_minor(version: &str) -> Result<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parse_leading_digits(parts.next(), version)?;
    let minor = parse_leading_digits(parts.next(), version)?;
    Ok((major, minor))
}

fn parse_leading_digits(part: Option<&str>, version: &str) -> Result<u32> {
    let part = part.unwrap_or("");
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end]
        .parse()
        .map_err(|_| Error::invalid_parameter(format!("invalid version string: '{version}'")))
}
