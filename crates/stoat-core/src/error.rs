/// All errors that can occur within Stoat.
///
/// This enum captures every failure mode: malformed labels, shape/label
/// disagreements, block count mismatches, and serialization problems.
/// Using a single error type across the library simplifies error propagation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied parameter is invalid (unknown logical type name,
    /// duplicate labels entry, unknown operation, malformed version string).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Block values shape does not match the shape implied by its labels.
    #[error("shape mismatch: labels require {expected:?}, values have {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// Element count mismatch when creating an array from a vec.
    #[error("element count mismatch: shape {shape:?} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },

    /// A tensor map was given a different number of blocks than keys.
    #[error("block count mismatch: {keys} keys but {blocks} blocks")]
    BlockCountMismatch { keys: usize, blocks: usize },

    /// Block index out of range for the tensor map.
    #[error("block index out of range: {index} for tensor map with {count} blocks")]
    BlockOutOfRange { index: usize, count: usize },

    /// Entry index out of range for a labels set.
    #[error("entry index out of range: {index} for labels with {count} entries")]
    EntryOutOfRange { index: usize, count: usize },

    /// Malformed or inconsistent serialized data.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Create an `InvalidParameter` error from any string message.
    pub fn invalid_parameter(s: impl Into<String>) -> Self {
        Error::InvalidParameter(s.into())
    }
}

/// Convenience Result type used throughout Stoat.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
