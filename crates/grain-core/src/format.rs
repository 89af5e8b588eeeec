//! Pixel formats and their plane layouts.
//!
//! This module provides the closed set of frame formats the workspace knows
//! about, and the projection of that set onto the formats film grain can be
//! synthesized for.
//!
//! # Types
//!
//! - [`PixelFormat`] - Frame format (planar YUV/gray, plus a few packed and
//!   semi-planar formats that are recognised but never grained)
//! - [`FormatDescriptor`] - Plane count, chroma subsampling, bit depth, storage
//! - [`GrainLayout`] - Subsampling and bit depth of a grain-capable format
//!
//! # Usage
//!
//! ```rust
//! use grain_core::format::{PixelFormat, SampleStorage, Subsampling};
//!
//! let fmt: PixelFormat = "yuv420p10".parse().unwrap();
//! let desc = fmt.descriptor();
//! assert_eq!(desc.bit_depth, 10);
//! assert_eq!(desc.storage, SampleStorage::U16);
//!
//! let layout = fmt.grain_layout().unwrap();
//! assert_eq!(layout.subsampling, Subsampling::Yuv420);
//!
//! // Packed formats are known but cannot carry grain.
//! assert!(PixelFormat::Yuyv422.grain_layout().is_none());
//! ```

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Storage type of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleStorage {
    /// One byte per sample (8-bit formats).
    U8,
    /// Two bytes per sample (9 to 16-bit formats).
    U16,
}

impl SampleStorage {
    /// Bytes per stored sample.
    #[inline]
    pub const fn bytes(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }
}

/// Chroma layout of a grain-capable format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsampling {
    /// Luma only.
    Mono,
    /// Chroma halved horizontally and vertically.
    Yuv420,
    /// Chroma halved horizontally.
    Yuv422,
    /// Full resolution chroma.
    Yuv444,
}

impl Subsampling {
    /// log2 of the horizontal chroma subsampling factor.
    #[inline]
    pub const fn ss_x(&self) -> u32 {
        match self {
            Self::Yuv420 | Self::Yuv422 => 1,
            Self::Mono | Self::Yuv444 => 0,
        }
    }

    /// log2 of the vertical chroma subsampling factor.
    #[inline]
    pub const fn ss_y(&self) -> u32 {
        match self {
            Self::Yuv420 => 1,
            _ => 0,
        }
    }

    /// Whether the format carries chroma planes.
    #[inline]
    pub const fn has_chroma(&self) -> bool {
        !matches!(self, Self::Mono)
    }
}

/// Static description of a [`PixelFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Every component lives in its own plane.
    pub planar: bool,
    /// Number of planes in memory.
    pub num_planes: usize,
    /// log2 horizontal chroma subsampling.
    pub log2_chroma_w: u32,
    /// log2 vertical chroma subsampling.
    pub log2_chroma_h: u32,
    /// Significant bits per sample.
    pub bit_depth: u32,
    /// Sample storage type.
    pub storage: SampleStorage,
    /// Samples per pixel in each plane (1 for planar, 2 for interleaved UV, ...).
    pub steps: [usize; 3],
}

impl FormatDescriptor {
    /// Width in samples of plane `index` for a frame `width` pixels wide.
    pub fn plane_width(&self, index: usize, width: u32) -> usize {
        let w = if index == 0 || !self.planar && self.num_planes == 1 {
            width as usize
        } else {
            ceil_rshift(width, self.log2_chroma_w) as usize
        };
        w * self.steps[index]
    }

    /// Height in rows of plane `index` for a frame `height` pixels tall.
    pub fn plane_height(&self, index: usize, height: u32) -> usize {
        if index == 0 {
            height as usize
        } else {
            ceil_rshift(height, self.log2_chroma_h) as usize
        }
    }
}

/// Right shift rounding up, for chroma plane dimensions.
#[inline]
pub const fn ceil_rshift(value: u32, shift: u32) -> u32 {
    (value + (1 << shift) - 1) >> shift
}

/// Subsampling and bit depth of a format film grain can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrainLayout {
    /// Chroma layout.
    pub subsampling: Subsampling,
    /// Bits per sample: 8, 9, 10 or 12.
    pub bit_depth: u32,
}

/// Frame pixel format.
///
/// Names follow the usual lowercase video conventions (`yuv420p10`, `gray`).
/// The `Yuvj*` variants are the full-range flavours of the 8-bit formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[allow(missing_docs)]
pub enum PixelFormat {
    Gray8,
    Gray9,
    Gray10,
    Gray12,
    Gray16,
    Yuv420p,
    Yuv422p,
    Yuv444p,
    Yuvj420p,
    Yuvj422p,
    Yuvj444p,
    Yuv420p9,
    Yuv422p9,
    Yuv444p9,
    Yuv420p10,
    Yuv422p10,
    Yuv444p10,
    Yuv420p12,
    Yuv422p12,
    Yuv444p12,
    Yuv420p16,
    Yuv422p16,
    Yuv444p16,
    /// Semi-planar 4:2:0, interleaved UV plane.
    Nv12,
    /// Packed 4:2:2, Y0 U Y1 V.
    Yuyv422,
    /// Packed RGB.
    Rgb24,
}

impl PixelFormat {
    /// Every known format.
    pub const ALL: [PixelFormat; 26] = [
        Self::Gray8,
        Self::Gray9,
        Self::Gray10,
        Self::Gray12,
        Self::Gray16,
        Self::Yuv420p,
        Self::Yuv422p,
        Self::Yuv444p,
        Self::Yuvj420p,
        Self::Yuvj422p,
        Self::Yuvj444p,
        Self::Yuv420p9,
        Self::Yuv422p9,
        Self::Yuv444p9,
        Self::Yuv420p10,
        Self::Yuv422p10,
        Self::Yuv444p10,
        Self::Yuv420p12,
        Self::Yuv422p12,
        Self::Yuv444p12,
        Self::Yuv420p16,
        Self::Yuv422p16,
        Self::Yuv444p16,
        Self::Nv12,
        Self::Yuyv422,
        Self::Rgb24,
    ];

    /// Returns the plane layout of this format.
    pub const fn descriptor(&self) -> FormatDescriptor {
        use PixelFormat::*;
        let (sub, depth) = match self {
            Gray8 => (Subsampling::Mono, 8),
            Gray9 => (Subsampling::Mono, 9),
            Gray10 => (Subsampling::Mono, 10),
            Gray12 => (Subsampling::Mono, 12),
            Gray16 => (Subsampling::Mono, 16),
            Yuv420p | Yuvj420p => (Subsampling::Yuv420, 8),
            Yuv422p | Yuvj422p => (Subsampling::Yuv422, 8),
            Yuv444p | Yuvj444p => (Subsampling::Yuv444, 8),
            Yuv420p9 => (Subsampling::Yuv420, 9),
            Yuv422p9 => (Subsampling::Yuv422, 9),
            Yuv444p9 => (Subsampling::Yuv444, 9),
            Yuv420p10 => (Subsampling::Yuv420, 10),
            Yuv422p10 => (Subsampling::Yuv422, 10),
            Yuv444p10 => (Subsampling::Yuv444, 10),
            Yuv420p12 => (Subsampling::Yuv420, 12),
            Yuv422p12 => (Subsampling::Yuv422, 12),
            Yuv444p12 => (Subsampling::Yuv444, 12),
            Yuv420p16 => (Subsampling::Yuv420, 16),
            Yuv422p16 => (Subsampling::Yuv422, 16),
            Yuv444p16 => (Subsampling::Yuv444, 16),
            Nv12 => {
                return FormatDescriptor {
                    planar: false,
                    num_planes: 2,
                    log2_chroma_w: 1,
                    log2_chroma_h: 1,
                    bit_depth: 8,
                    storage: SampleStorage::U8,
                    steps: [1, 2, 0],
                };
            }
            Yuyv422 => {
                return FormatDescriptor {
                    planar: false,
                    num_planes: 1,
                    log2_chroma_w: 1,
                    log2_chroma_h: 0,
                    bit_depth: 8,
                    storage: SampleStorage::U8,
                    steps: [2, 0, 0],
                };
            }
            Rgb24 => {
                return FormatDescriptor {
                    planar: false,
                    num_planes: 1,
                    log2_chroma_w: 0,
                    log2_chroma_h: 0,
                    bit_depth: 8,
                    storage: SampleStorage::U8,
                    steps: [3, 0, 0],
                };
            }
        };
        let storage = if depth > 8 {
            SampleStorage::U16
        } else {
            SampleStorage::U8
        };
        let (num_planes, steps) = if sub.has_chroma() {
            (3, [1, 1, 1])
        } else {
            (1, [1, 0, 0])
        };
        FormatDescriptor {
            planar: true,
            num_planes,
            log2_chroma_w: sub.ss_x(),
            log2_chroma_h: sub.ss_y(),
            bit_depth: depth,
            storage,
            steps,
        }
    }

    /// Returns the grain layout if film grain synthesis is defined for this
    /// format: planar gray/YUV at 8, 9, 10 or 12 bits.
    pub const fn grain_layout(&self) -> Option<GrainLayout> {
        let desc = self.descriptor();
        if !desc.planar || desc.bit_depth > 12 {
            return None;
        }
        let subsampling = match (desc.num_planes, desc.log2_chroma_w, desc.log2_chroma_h) {
            (1, _, _) => Subsampling::Mono,
            (3, 1, 1) => Subsampling::Yuv420,
            (3, 1, 0) => Subsampling::Yuv422,
            (3, 0, 0) => Subsampling::Yuv444,
            _ => return None,
        };
        Some(GrainLayout {
            subsampling,
            bit_depth: desc.bit_depth,
        })
    }

    /// Whether this is one of the full-range `yuvj` formats.
    #[inline]
    pub const fn is_full_range(&self) -> bool {
        matches!(self, Self::Yuvj420p | Self::Yuvj422p | Self::Yuvj444p)
    }

    /// Lowercase name of the format.
    pub const fn name(&self) -> &'static str {
        use PixelFormat::*;
        match self {
            Gray8 => "gray",
            Gray9 => "gray9",
            Gray10 => "gray10",
            Gray12 => "gray12",
            Gray16 => "gray16",
            Yuv420p => "yuv420p",
            Yuv422p => "yuv422p",
            Yuv444p => "yuv444p",
            Yuvj420p => "yuvj420p",
            Yuvj422p => "yuvj422p",
            Yuvj444p => "yuvj444p",
            Yuv420p9 => "yuv420p9",
            Yuv422p9 => "yuv422p9",
            Yuv444p9 => "yuv444p9",
            Yuv420p10 => "yuv420p10",
            Yuv422p10 => "yuv422p10",
            Yuv444p10 => "yuv444p10",
            Yuv420p12 => "yuv420p12",
            Yuv422p12 => "yuv422p12",
            Yuv444p12 => "yuv444p12",
            Yuv420p16 => "yuv420p16",
            Yuv422p16 => "yuv422p16",
            Yuv444p16 => "yuv444p16",
            Nv12 => "nv12",
            Yuyv422 => "yuyv422",
            Rgb24 => "rgb24",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let lower = match lower.as_str() {
            "gray8" => "gray",
            "yuv420p8" => "yuv420p",
            "yuv422p8" => "yuv422p",
            "yuv444p8" => "yuv444p",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == lower)
            .ok_or_else(|| Error::unsupported_format(s))
    }
}
