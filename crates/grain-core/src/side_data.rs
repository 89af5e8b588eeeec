//! Per-frame side data and film grain set selection.
//!
//! A frame may carry several grain parameter sets, each restricted to some
//! frame size, bit depth or colour description. [`select_film_grain_params`]
//! picks the one that fits the frame best.
//!
//! # Usage
//!
//! ```rust
//! use grain_core::{Frame, PixelFormat, select_film_grain_params};
//! use grain_core::params::{AomFilmGrain, FilmGrainParams};
//!
//! let mut frame = Frame::new(PixelFormat::Yuv420p, 64, 64).unwrap();
//!
//! let mut small = FilmGrainParams::aom(AomFilmGrain::default(), 1);
//! small.width = 32;
//! small.height = 32;
//! small.subsampling_x = 1;
//! small.subsampling_y = 1;
//! let mut large = small.clone();
//! large.width = 64;
//! large.height = 64;
//!
//! frame.add_film_grain_params(small).unwrap();
//! frame.add_film_grain_params(large).unwrap();
//! assert_eq!(select_film_grain_params(&frame).unwrap().width, 64);
//! ```

use tracing::trace;

use crate::color::ColorRange;
use crate::frame::Frame;
use crate::params::{FilmGrainParams, GrainCodec};
use crate::{Error, Result};

/// Metadata attached to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideData {
    /// Film grain parameter set.
    FilmGrain(FilmGrainParams),
    /// ST 2094-40 dynamic metadata, as the raw T.35 payload after the
    /// application identifier.
    DynamicHdrPlus(Vec<u8>),
}

impl Frame {
    /// Appends a side data entry.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the side data list cannot grow.
    pub fn add_side_data(&mut self, entry: SideData) -> Result<()> {
        self.side_data
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory {
                requested: self.side_data.len() + 1,
            })?;
        self.side_data.push(entry);
        Ok(())
    }

    /// Appends a film grain parameter set.
    pub fn add_film_grain_params(&mut self, params: FilmGrainParams) -> Result<()> {
        self.add_side_data(SideData::FilmGrain(params))
    }

    /// Iterates over attached film grain parameter sets.
    pub fn film_grain_params(&self) -> impl Iterator<Item = &FilmGrainParams> {
        self.side_data.iter().filter_map(|sd| match sd {
            SideData::FilmGrain(p) => Some(p),
            _ => None,
        })
    }

    /// Removes every film grain parameter set.
    pub fn remove_film_grain_params(&mut self) {
        self.side_data
            .retain(|sd| !matches!(sd, SideData::FilmGrain(_)));
    }
}

/// Returns `true` when `a` and `b` are both specified and differ.
#[inline]
fn conflicts<T: PartialEq>(a: T, b: T, unspecified: T) -> bool {
    a != unspecified && b != unspecified && a != b
}

/// Picks the grain parameter set best suited to `frame`.
///
/// A set is skipped when:
/// - it is restricted to a size smaller than the frame,
/// - its bit depths, range, primaries, transfer or matrix are specified and
///   differ from the frame's,
/// - it is a `None` set,
/// - its chroma subsampling differs from the frame's (AOM grain needs an
///   exact match).
///
/// Among the remaining sets the one with the largest width or height wins;
/// ties keep the earlier set.
pub fn select_film_grain_params(frame: &Frame) -> Option<&FilmGrainParams> {
    let desc = frame.format().descriptor();
    let depth = desc.bit_depth as u8;
    let color = frame.color();
    let mut best: Option<&FilmGrainParams> = None;

    for fgp in frame.film_grain_params() {
        if fgp.width != 0 && fgp.width > frame.width()
            || fgp.height != 0 && fgp.height > frame.height()
        {
            continue;
        }
        if conflicts(fgp.bit_depth_luma, depth, 0)
            || conflicts(fgp.bit_depth_chroma, depth, 0)
            || conflicts(fgp.color.range, color.range, ColorRange::Unspecified)
            || conflicts(fgp.color.primaries.0, color.primaries.0, 2)
            || conflicts(fgp.color.transfer.0, color.transfer.0, 2)
            || conflicts(fgp.color.matrix.0, color.matrix.0, 2)
        {
            continue;
        }
        match fgp.codec {
            GrainCodec::None => continue,
            GrainCodec::Aom(_) => {
                if u32::from(fgp.subsampling_x) != desc.log2_chroma_w
                    || u32::from(fgp.subsampling_y) != desc.log2_chroma_h
                {
                    continue;
                }
            }
        }
        if best.is_none_or(|b| b.width < fgp.width || b.height < fgp.height) {
            best = Some(fgp);
        }
    }

    trace!(
        candidates = frame.film_grain_params().count(),
        selected = best.is_some(),
        "select_film_grain_params"
    );
    best
}
