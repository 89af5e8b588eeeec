//! Planar frame buffers.
//!
//! A [`Frame`] owns one [`Plane`] per component, stored either as bytes or as
//! 16-bit words depending on the format's bit depth. Planes carry their own
//! stride (in samples) so buffers produced elsewhere, with padding, can be
//! wrapped without copying.
//!
//! # Usage
//!
//! ```rust
//! use grain_core::{Frame, FramePlanes, PixelFormat};
//!
//! let frame = Frame::new(PixelFormat::Yuv420p, 65, 33).unwrap();
//! assert_eq!(frame.num_planes(), 3);
//!
//! if let FramePlanes::U8(planes) = frame.planes() {
//!     assert_eq!(planes[0].width(), 65);
//!     assert_eq!(planes[1].width(), 33);
//!     assert_eq!(planes[1].height(), 17);
//!     assert!(planes[0].stride() >= 65);
//! }
//! ```
//!
//! # Used By
//!
//! - [`crate::io`] - raw frame reading/writing
//! - `grain-synth` - input and output of grain synthesis

use crate::color::ColorProperties;
use crate::format::{PixelFormat, SampleStorage};
use crate::side_data::SideData;
use crate::{Error, Result};

/// Stride alignment of freshly allocated planes, in samples.
pub const STRIDE_ALIGN: usize = 32;

// ============================================================================
// Plane
// ============================================================================

/// One component of a frame: `height` rows of `width` samples, `stride` apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plane<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    stride: usize,
}

impl<T: Copy + Default> Plane<T> {
    /// Allocates a zeroed plane with an aligned stride.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the buffer cannot be reserved.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let stride = width.div_ceil(STRIDE_ALIGN) * STRIDE_ALIGN;
        Self::with_stride(width, height, stride.max(STRIDE_ALIGN))
    }

    /// Allocates a zeroed plane with an explicit stride.
    pub fn with_stride(width: usize, height: usize, stride: usize) -> Result<Self> {
        if stride < width {
            return Err(Error::InvalidStride { stride, width });
        }
        let len = stride
            .checked_mul(height)
            .ok_or(Error::OutOfMemory { requested: usize::MAX })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { requested: len })?;
        data.resize(len, T::default());
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Wraps an existing buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidStride`] if `stride < width`
    /// - [`Error::BufferTooSmall`] if `data` holds fewer than `stride * height` samples
    pub fn from_vec(data: Vec<T>, width: usize, height: usize, stride: usize) -> Result<Self> {
        if stride < width {
            return Err(Error::InvalidStride { stride, width });
        }
        let needed = stride * height;
        if data.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Width in samples.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between rows, in samples.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whole backing buffer including row padding.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable backing buffer including row padding.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Samples of row `y`, without padding.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        debug_assert!(y < self.height, "row out of bounds");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Mutable samples of row `y`, without padding.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        debug_assert!(y < self.height, "row out of bounds");
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Iterates over the rows of the plane.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Sets every visible sample to `value`.
    pub fn fill(&mut self, value: T) {
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }

    /// Copies the visible samples of `src`; strides may differ.
    ///
    /// # Panics
    ///
    /// Panics if the dimensions differ.
    pub fn copy_from(&mut self, src: &Plane<T>) {
        assert_eq!(
            (self.width, self.height),
            (src.width, src.height),
            "plane dimensions differ"
        );
        for y in 0..self.height {
            self.row_mut(y).copy_from_slice(src.row(y));
        }
    }
}

// ============================================================================
// Frame
// ============================================================================

/// Planes of a frame, tagged by storage width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePlanes {
    /// 8-bit formats.
    U8(Vec<Plane<u8>>),
    /// 9 to 16-bit formats.
    U16(Vec<Plane<u16>>),
}

impl FramePlanes {
    /// Number of planes.
    pub fn len(&self) -> usize {
        match self {
            Self::U8(p) => p.len(),
            Self::U16(p) => p.len(),
        }
    }

    /// Returns `true` if there are no planes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage width of the planes.
    pub fn storage(&self) -> SampleStorage {
        match self {
            Self::U8(_) => SampleStorage::U8,
            Self::U16(_) => SampleStorage::U16,
        }
    }

    /// `(width, height)` of plane `index`.
    pub fn dimensions(&self, index: usize) -> Option<(usize, usize)> {
        match self {
            Self::U8(p) => p.get(index).map(|p| (p.width(), p.height())),
            Self::U16(p) => p.get(index).map(|p| (p.width(), p.height())),
        }
    }

    /// 8-bit planes, if that is the storage.
    pub fn as_u8(&self) -> Option<&[Plane<u8>]> {
        match self {
            Self::U8(p) => Some(p),
            Self::U16(_) => None,
        }
    }

    /// 16-bit planes, if that is the storage.
    pub fn as_u16(&self) -> Option<&[Plane<u16>]> {
        match self {
            Self::U16(p) => Some(p),
            Self::U8(_) => None,
        }
    }
}

/// A video frame: pixel format, dimensions, planes, colour metadata and side data.
#[derive(Debug, Clone)]
pub struct Frame {
    format: PixelFormat,
    width: u32,
    height: u32,
    planes: FramePlanes,
    color: ColorProperties,
    pub(crate) side_data: Vec<SideData>,
}

impl Frame {
    /// Allocates a zeroed frame.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] for a zero width or height
    /// - [`Error::OutOfMemory`] if a plane cannot be reserved
    pub fn new(format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "zero area"));
        }
        let desc = format.descriptor();
        let dims: Vec<(usize, usize)> = (0..desc.num_planes)
            .map(|i| (desc.plane_width(i, width), desc.plane_height(i, height)))
            .collect();
        let planes = match desc.storage {
            SampleStorage::U8 => FramePlanes::U8(
                dims.iter()
                    .map(|&(w, h)| Plane::new(w, h))
                    .collect::<Result<_>>()?,
            ),
            SampleStorage::U16 => FramePlanes::U16(
                dims.iter()
                    .map(|&(w, h)| Plane::new(w, h))
                    .collect::<Result<_>>()?,
            ),
        };
        let mut color = ColorProperties::default();
        if format.is_full_range() {
            color.range = crate::color::ColorRange::Full;
        }
        Ok(Self {
            format,
            width,
            height,
            planes,
            color,
            side_data: Vec::new(),
        })
    }

    /// Wraps planes produced elsewhere after checking they match `format`.
    pub fn from_planes(
        format: PixelFormat,
        width: u32,
        height: u32,
        planes: FramePlanes,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_dimensions(width, height, "zero area"));
        }
        check_plane_geometry(format, width, height, &planes)?;
        Ok(Self {
            format,
            width,
            height,
            planes,
            color: ColorProperties::default(),
            side_data: Vec::new(),
        })
    }

    /// Allocates a zeroed frame with the same format, size and colour metadata.
    pub fn new_like(other: &Frame) -> Result<Self> {
        let mut frame = Self::new(other.format, other.width, other.height)?;
        frame.color = other.color;
        Ok(frame)
    }

    /// Copies colour metadata and side data from `other`.
    pub fn copy_props_from(&mut self, other: &Frame) {
        self.color = other.color;
        self.side_data = other.side_data.clone();
    }

    /// Pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of planes.
    #[inline]
    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    /// Planes.
    #[inline]
    pub fn planes(&self) -> &FramePlanes {
        &self.planes
    }

    /// Mutable planes.
    ///
    /// Planes replaced through this reference are not checked here; see
    /// [`Frame::check_planes`].
    #[inline]
    pub fn planes_mut(&mut self) -> &mut FramePlanes {
        &mut self.planes
    }

    /// Checks that the planes still have the storage, count and sizes the
    /// format implies.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimensions`] naming the first plane of the wrong size
    /// - [`Error::Other`] for the wrong storage or plane count
    pub fn check_planes(&self) -> Result<()> {
        check_plane_geometry(self.format, self.width, self.height, &self.planes)
    }

    /// Colour metadata.
    #[inline]
    pub fn color(&self) -> &ColorProperties {
        &self.color
    }

    /// Replaces the colour metadata.
    #[inline]
    pub fn set_color(&mut self, color: ColorProperties) {
        self.color = color;
    }

    /// Attached side data, in insertion order.
    #[inline]
    pub fn side_data(&self) -> &[SideData] {
        &self.side_data
    }

    /// Drops all side data.
    pub fn clear_side_data(&mut self) {
        self.side_data.clear();
    }

    /// Copies every plane's visible samples from `src`.
    ///
    /// # Errors
    ///
    /// Fails if the frames differ in format or size.
    pub fn copy_planes_from(&mut self, src: &Frame) -> Result<()> {
        if self.format != src.format || self.width != src.width || self.height != src.height {
            return Err(Error::other(format!(
                "cannot copy {} {}x{} into {} {}x{}",
                src.format, src.width, src.height, self.format, self.width, self.height
            )));
        }
        src.check_planes()?;
        self.check_planes()?;
        match (&mut self.planes, &src.planes) {
            (FramePlanes::U8(d), FramePlanes::U8(s)) => {
                d.iter_mut().zip(s).for_each(|(d, s)| d.copy_from(s))
            }
            (FramePlanes::U16(d), FramePlanes::U16(s)) => {
                d.iter_mut().zip(s).for_each(|(d, s)| d.copy_from(s))
            }
            _ => return Err(Error::other("plane storage differs")),
        }
        Ok(())
    }
}

fn check_plane_geometry(format: PixelFormat, width: u32, height: u32, planes: &FramePlanes) -> Result<()> {
    let desc = format.descriptor();
    if planes.storage() != desc.storage || planes.len() != desc.num_planes {
        return Err(Error::other(format!(
            "{} expects {} {:?} planes",
            format, desc.num_planes, desc.storage
        )));
    }
    for i in 0..desc.num_planes {
        let expected = (desc.plane_width(i, width), desc.plane_height(i, height));
        if planes.dimensions(i) != Some(expected) {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("plane {} is not {}x{}", i, expected.0, expected.1),
            ));
        }
    }
    Ok(())
}
