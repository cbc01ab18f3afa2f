use std::fmt::Display;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type XmlResult<T> = Result<T, XmlError>;

/// Marshalling error
#[derive(Error, Debug)]
pub enum XmlError {
    /// The target shape could not be analyzed into a marshalling context.
    /// Fatal for that shape until its definition changes.
    #[error("Failed to create a marshalling context for type {shape}: {reason}")]
    Setup {
        shape: &'static str,
        reason: String,
    },

    /// An execution method was invoked on a reader with no configured source.
    #[error("You have not specified a data source, such as a reader, string or byte buffer")]
    NoSource,

    /// Malformed XML, or a value that cannot be coerced into the target
    /// shape. The underlying parser/mapping message is preserved verbatim.
    #[error("Failed to read into type '{shape}': {message}")]
    Decode {
        shape: &'static str,
        message: String,
    },

    /// The value cannot be serialized, or the configured encoding is not
    /// supported.
    #[error("Failed to generate XML output: {message}")]
    Encode { message: String },
}

impl XmlError {
    pub(crate) fn decode(shape: &'static str, cause: impl Display) -> Self {
        XmlError::Decode {
            shape,
            message: cause.to_string(),
        }
    }

    pub(crate) fn encode(cause: impl Display) -> Self {
        XmlError::Encode {
            message: cause.to_string(),
        }
    }
}
