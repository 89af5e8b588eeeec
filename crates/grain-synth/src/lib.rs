//! # grain-synth
//!
//! AV1/AOM film grain synthesis.
//!
//! Grain is modelled as autoregressive noise filtered from a fixed Gaussian
//! table, generated on a small grid per plane, and added to the frame in
//! 32x32 blocks with a strength that depends on the local sample value.
//! Output is bit-exact with other conforming AV1 decoders.
//!
//! ## Modules
//!
//! - [`rng`] - 16-bit LFSR shared by grid generation and block offsets
//! - [`gaussian`] - The 2048-entry Gaussian table
//! - [`grain`] - Luma and chroma grain grids with AR filtering
//! - [`scaling`] - Piecewise-linear scaling tables
//! - [`block`] - Per-block-row noise application with overlap blending
//! - [`synth`] - Frame-level orchestration
//!
//! ## Usage
//!
//! ```rust
//! use grain_core::{AomFilmGrain, FilmGrainParams, Frame, PixelFormat};
//! use grain_synth::apply_film_grain;
//!
//! let input = Frame::new(PixelFormat::Yuv420p10, 48, 48).unwrap();
//! let mut out = Frame::new_like(&input).unwrap();
//! let params = FilmGrainParams::aom(AomFilmGrain::default(), 0);
//! apply_film_grain(&mut out, &input, &params).unwrap();
//! assert_eq!(out.planes(), input.planes());
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - Process block rows on the rayon pool (enabled by default)

#![warn(missing_docs)]

pub mod block;
pub mod gaussian;
pub mod grain;
pub mod parallel;
pub mod rng;
pub mod scaling;
pub mod synth;

mod error;

pub use error::{SynthError, SynthResult};
pub use synth::{FilmGrainSynthesizer, SynthOptions, apply_film_grain, apply_film_grain_with};
