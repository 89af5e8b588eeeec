//! Error types for bitstream parsing.

use thiserror::Error;

/// Error type for payload parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Payload ended before a field could be read.
    #[error("payload truncated: {needed} bits needed, {available} available")]
    Truncated {
        /// Bits the field needs
        needed: u64,
        /// Bits left in the payload
        available: u64,
    },

    /// A field violates the syntax constraints.
    #[error("invalid data: {0}")]
    InvalidData(&'static str),

    /// A parameter set refers to a set that cannot be used.
    #[error("parameter set {set} refers to an unusable reference")]
    InvalidReference {
        /// Index of the referring set
        set: u8,
    },

    /// A reserved value was used.
    #[error("reserved value in {0}")]
    Reserved(&'static str),

    /// Side data could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// Underlying reader failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<grain_core::Error> for ParseError {
    fn from(err: grain_core::Error) -> Self {
        match err {
            grain_core::Error::OutOfMemory { .. } => Self::OutOfMemory,
            grain_core::Error::Io(e) => Self::Io(e),
            _ => Self::InvalidData("frame rejected side data"),
        }
    }
}

/// Result type for payload parsing.
pub type ParseResult<T> = Result<T, ParseError>;
