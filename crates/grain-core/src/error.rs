//! Error types for grain-core operations.
//!
//! This module provides the error type shared by frame allocation, raw frame
//! I/O and parameter validation.
//!
//! # Usage
//!
//! ```rust
//! use grain_core::{Error, Result};
//!
//! fn check_size(width: u32, height: u32) -> Result<()> {
//!     if width == 0 || height == 0 {
//!         return Err(Error::invalid_dimensions(width, height, "zero area"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation
//!
//! # Used By
//!
//! - [`crate::frame::Frame`] - Buffer allocation
//! - [`crate::params::AomFilmGrain::validate`] - Parameter bounds
//! - `grain-synth` and `grain-bitstream` wrap it in their own error types

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, reading or validating frames and
/// grain parameters.
///
/// # Categories
///
/// - **Format errors**: [`UnsupportedPixelFormat`](Error::UnsupportedPixelFormat)
/// - **Dimension errors**: [`InvalidDimensions`](Error::InvalidDimensions), [`InvalidStride`](Error::InvalidStride), [`BufferTooSmall`](Error::BufferTooSmall)
/// - **Allocation errors**: [`OutOfMemory`](Error::OutOfMemory)
/// - **Parameter errors**: [`InvalidParams`](Error::InvalidParams)
/// - **I/O errors**: [`Io`](Error::Io)
#[derive(Debug, Error)]
pub enum Error {
    /// The pixel format has no defined grain synthesis path, or is not
    /// understood by the operation.
    #[error("unsupported pixel format: {format}")]
    UnsupportedPixelFormat {
        /// Format name
        format: String,
    },

    /// Invalid frame dimensions.
    ///
    /// Returned when width or height is zero, or dimensions would overflow
    /// buffer size calculations.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
        /// Reason why dimensions are invalid
        reason: String,
    },

    /// Plane stride is smaller than its width.
    #[error("stride {stride} is less than plane width {width}")]
    InvalidStride {
        /// Provided stride (samples)
        stride: usize,
        /// Plane width (samples)
        width: usize,
    },

    /// A plane buffer does not hold `stride * height` samples.
    #[error("plane buffer holds {got} samples, need {needed}")]
    BufferTooSmall {
        /// Samples required
        needed: usize,
        /// Samples provided
        got: usize,
    },

    /// Memory allocation failed.
    #[error("out of memory while allocating {requested} elements")]
    OutOfMemory {
        /// Elements requested
        requested: usize,
    },

    /// Grain parameters violate the bounds of the bitstream grammar.
    #[error("invalid film grain parameters: {0}")]
    InvalidParams(String),

    /// I/O error while reading or writing raw frames.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::UnsupportedPixelFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedPixelFormat {
            format: format.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidParams`] error.
    #[inline]
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns `true` if this is a pixel format error.
    #[inline]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::UnsupportedPixelFormat { .. })
    }

    /// Returns `true` if this is an allocation error.
    #[inline]
    pub fn is_allocation_error(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// Returns `true` if this is an I/O error.
    #[inline]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format() {
        let err = Error::unsupported_format("rgb24");
        assert!(err.to_string().contains("rgb24"));
        assert!(err.is_format_error());
        assert!(!err.is_allocation_error());
    }

    #[test]
    fn test_invalid_dimensions() {
        let err = Error::invalid_dimensions(0, 64, "zero width");
        let msg = err.to_string();
        assert!(msg.contains("0x64"));
        assert!(msg.contains("zero width"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: Error = io_err.into();
        assert!(err.is_io_error());
    }
}
