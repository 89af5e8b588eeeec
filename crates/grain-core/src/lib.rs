//! # grain-core
//!
//! Core types for AV1/AOM film grain synthesis.
//!
//! This crate provides the data every other grain crate shares:
//!
//! - [`PixelFormat`] - Frame formats and which of them can carry grain
//! - [`Frame`], [`Plane`] - Planar frame buffers with per-plane stride
//! - [`Pixel`] - `u8` / `u16` sample storage for generic synthesis code
//! - [`FilmGrainParams`], [`AomFilmGrain`] - The grain parameter data model
//! - [`SideData`], [`select_film_grain_params`] - Per-frame parameter sets
//! - [`io`] - Raw planar frame reading and writing
//!
//! ## Crate Structure
//!
//! ```text
//! grain-core (this crate)
//!    ^
//!    |
//!    +-- grain-synth (grain generation and application)
//!    +-- grain-bitstream (AFGS1, AV1, T.35, HDR10+ parsers)
//!    +-- grain-cli
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialization of parameters and colour metadata (enabled by default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod color;
pub mod error;
pub mod format;
pub mod frame;
pub mod io;
pub mod params;
pub mod pixel;
pub mod side_data;

pub use color::{
    ColorPrimaries, ColorProperties, ColorRange, MatrixCoefficients, TransferCharacteristics,
};
pub use error::{Error, Result};
pub use format::{FormatDescriptor, GrainLayout, PixelFormat, SampleStorage, Subsampling};
pub use frame::{Frame, FramePlanes, Plane};
pub use params::{AomFilmGrain, FilmGrainParams, GrainCodec};
pub use pixel::{GrainEntry, Pixel};
pub use side_data::{SideData, select_film_grain_params};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use grain_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::color::{ColorProperties, ColorRange, MatrixCoefficients};
    pub use crate::error::{Error, Result};
    pub use crate::format::{PixelFormat, Subsampling};
    pub use crate::frame::{Frame, FramePlanes, Plane};
    pub use crate::params::{AomFilmGrain, FilmGrainParams, GrainCodec};
    pub use crate::pixel::{GrainEntry, Pixel};
    pub use crate::side_data::{SideData, select_film_grain_params};
}
