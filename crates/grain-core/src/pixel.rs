//! Sample storage types.
//!
//! Film grain runs on two storage widths: one byte per sample for 8-bit
//! formats and two bytes for 9 to 12-bit formats. The [`Pixel`] trait lets the
//! synthesis code be written once and instantiated for both.
//!
//! # Types
//!
//! - [`Pixel`] - `u8` / `u16` sample storage
//! - [`GrainEntry`] - `i8` / `i16` grain grid cells paired with each storage
//!
//! # Usage
//!
//! ```rust
//! use grain_core::{Frame, Pixel, PixelFormat};
//!
//! fn luma_sum<P: Pixel>(frame: &Frame) -> i64 {
//!     let Some(planes) = P::planes(frame) else { return 0 };
//!     let luma = &planes[0];
//!     (0..luma.height())
//!         .flat_map(|y| luma.row(y).iter())
//!         .map(|&p| p.to_i32() as i64)
//!         .sum()
//! }
//!
//! let frame = Frame::new(PixelFormat::Gray10, 4, 4).unwrap();
//! assert_eq!(luma_sum::<u16>(&frame), 0);
//! ```
//!
//! # Used By
//!
//! - `grain-synth` - grain grid generation and block application

use std::fmt::Debug;

use crate::format::SampleStorage;
use crate::frame::{Frame, FramePlanes, Plane};

// ============================================================================
// Grain grid cells
// ============================================================================

/// Signed cell type of a grain grid.
///
/// 8-bit storage uses `i8` cells: grain is clipped to `[-128, 127]` there.
/// Deeper formats use `i16`.
pub trait GrainEntry: Copy + Default + Debug + Send + Sync + 'static {
    /// Converts to `i32` for arithmetic.
    fn to_i32(self) -> i32;

    /// Narrows an already clipped value.
    fn from_i32(v: i32) -> Self;
}

impl GrainEntry for i8 {
    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        v as i8
    }
}

impl GrainEntry for i16 {
    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        v as i16
    }
}

// ============================================================================
// Pixel storage
// ============================================================================

/// Unsigned sample storage of a planar frame.
pub trait Pixel: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    /// Grain grid cell type used with this storage.
    type Grain: GrainEntry;

    /// Matching storage tag.
    const STORAGE: SampleStorage;

    /// Converts to `i32` for arithmetic.
    fn to_i32(self) -> i32;

    /// Narrows an already clipped value.
    fn from_i32(v: i32) -> Self;

    /// Typed view of the frame's planes, `None` if the frame stores another width.
    fn planes(frame: &Frame) -> Option<&[Plane<Self>]>;

    /// Mutable typed view of the frame's planes.
    fn planes_mut(frame: &mut Frame) -> Option<&mut [Plane<Self>]>;
}

impl Pixel for u8 {
    type Grain = i8;
    const STORAGE: SampleStorage = SampleStorage::U8;

    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        v as u8
    }

    fn planes(frame: &Frame) -> Option<&[Plane<Self>]> {
        match frame.planes() {
            FramePlanes::U8(p) => Some(p),
            FramePlanes::U16(_) => None,
        }
    }

    fn planes_mut(frame: &mut Frame) -> Option<&mut [Plane<Self>]> {
        match frame.planes_mut() {
            FramePlanes::U8(p) => Some(p),
            FramePlanes::U16(_) => None,
        }
    }
}

impl Pixel for u16 {
    type Grain = i16;
    const STORAGE: SampleStorage = SampleStorage::U16;

    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn from_i32(v: i32) -> Self {
        v as u16
    }

    fn planes(frame: &Frame) -> Option<&[Plane<Self>]> {
        match frame.planes() {
            FramePlanes::U16(p) => Some(p),
            FramePlanes::U8(_) => None,
        }
    }

    fn planes_mut(frame: &mut Frame) -> Option<&mut [Plane<Self>]> {
        match frame.planes_mut() {
            FramePlanes::U16(p) => Some(p),
            FramePlanes::U8(_) => None,
        }
    }
}
