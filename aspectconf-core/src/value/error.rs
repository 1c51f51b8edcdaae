//! Error types for value operations

use thiserror::Error;

/// Error type for value coercion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The value cannot be represented as the requested type
    #[error("Cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: &'static str,
        to: &'static str,
        reason: String,
    },

    /// A numeric value does not fit the requested Rust type
    #[error("Value {value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },
}

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;
