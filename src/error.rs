//! Error kinds for the console (spec §7).

use thiserror::Error;

/// Errors raised by the parameter/processor/console machinery.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MixError {
    /// A parameter was assigned a value outside its bounds or options.
    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// A processor, list, or console was constructed with invalid settings.
    #[error("invalid construction: {0}")]
    InvalidConstruction(String),

    /// Lookup of a processor by name failed.
    #[error("no processor named '{0}'")]
    MissingProcessor(String),

    /// Loading or validating an external resource (e.g. an impulse response) failed.
    #[error("resource error: {0}")]
    Resource(String),

    /// An operation was requested that the target does not support.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

pub type Result<T> = std::result::Result<T, MixError>;
