//! Error types for the type-descriptor layer.

use thiserror::Error;

/// Errors raised by SQL type descriptors and the type registry.
#[derive(Debug, Error)]
pub enum TypeError {
    /// The type definition itself is malformed (construction-time, fatal).
    #[error("malformed type definition: {0}")]
    Definition(String),

    /// A value cannot be cast to the type's canonical representation.
    #[error("cannot cast {value} to {type_name}")]
    Conversion {
        /// Canonical name of the target type.
        type_name: String,
        /// Debug rendering of the rejected value.
        value: String,
    },

    /// A driver-reported type name matches no registered type.
    #[error("unrecognized SQL type name: {0}")]
    UnrecognizedType(String),
}

/// Result type alias for type-descriptor operations.
pub type Result<T> = std::result::Result<T, TypeError>;
