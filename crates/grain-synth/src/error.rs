//! Error types for grain synthesis.

use grain_core::PixelFormat;
use thiserror::Error;

/// Error type for grain synthesis.
#[derive(Error, Debug)]
pub enum SynthError {
    /// The frame format has no film grain synthesis path.
    ///
    /// Callers usually pass the frame through without grain.
    #[error("film grain cannot be applied to {format} frames")]
    UnsupportedPixelFormat {
        /// Offending format
        format: PixelFormat,
    },

    /// Input and output frames differ in format, size or storage.
    #[error("frame mismatch: {0}")]
    FrameMismatch(String),

    /// The parameter set does not carry an AOM grain model.
    #[error("parameter set is not an AOM film grain set")]
    NotAomParams,

    /// None of the frame's parameter sets applies to it.
    #[error("no applicable film grain parameters")]
    NoApplicableParams,

    /// Frame allocation or copy failure.
    #[error(transparent)]
    Core(#[from] grain_core::Error),
}

impl SynthError {
    /// Returns `true` when the frame can still be emitted without grain.
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPixelFormat { .. } | Self::NoApplicableParams | Self::NotAomParams
        )
    }
}

/// Result type for grain synthesis.
pub type SynthResult<T> = Result<T, SynthError>;
