//! Raw planar frame I/O.
//!
//! Raw files hold frames back to back, each plane tightly packed (no stride
//! padding), 16-bit samples little endian. This is the layout written by
//! `ffmpeg -f rawvideo`.
//!
//! # Usage
//!
//! ```rust
//! use grain_core::{Frame, PixelFormat};
//! use grain_core::io::{read_raw_frame, write_raw_frame};
//!
//! let frame = Frame::new(PixelFormat::Yuv420p10, 4, 2).unwrap();
//! let mut buf = Vec::new();
//! write_raw_frame(&mut buf, &frame).unwrap();
//! assert_eq!(buf.len(), (8 + 2 + 2) * 2);
//!
//! let back = read_raw_frame(&mut buf.as_slice(), PixelFormat::Yuv420p10, 4, 2)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(back.planes(), frame.planes());
//! ```

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use tracing::trace;

use crate::format::PixelFormat;
use crate::frame::{Frame, FramePlanes};
use crate::{Error, Result};

/// Bytes one frame occupies in a raw file.
pub fn frame_size_bytes(format: PixelFormat, width: u32, height: u32) -> usize {
    let desc = format.descriptor();
    (0..desc.num_planes)
        .map(|i| desc.plane_width(i, width) * desc.plane_height(i, height))
        .sum::<usize>()
        * desc.storage.bytes()
}

/// Fills `buf` from `reader`, returning how many bytes were read before EOF.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads the next frame.
///
/// Returns `Ok(None)` at a clean end of stream.
///
/// # Errors
///
/// - [`Error::Io`] with `UnexpectedEof` if the stream ends mid-frame
/// - [`Error::InvalidDimensions`] / [`Error::OutOfMemory`] from allocation
pub fn read_raw_frame<R: Read>(
    reader: &mut R,
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<Option<Frame>> {
    let mut frame = Frame::new(format, width, height)?;
    let size = frame_size_bytes(format, width, height);
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(size)
        .map_err(|_| Error::OutOfMemory { requested: size })?;
    bytes.resize(size, 0);

    let got = read_full(reader, &mut bytes)?;
    if got == 0 {
        return Ok(None);
    }
    if got < size {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("truncated frame: {} of {} bytes", got, size),
        )));
    }

    let mut offset = 0;
    match frame.planes_mut() {
        FramePlanes::U8(planes) => {
            for plane in planes.iter_mut() {
                let w = plane.width();
                for y in 0..plane.height() {
                    plane.row_mut(y).copy_from_slice(&bytes[offset..offset + w]);
                    offset += w;
                }
            }
        }
        FramePlanes::U16(planes) => {
            for plane in planes.iter_mut() {
                let w = plane.width();
                for y in 0..plane.height() {
                    LittleEndian::read_u16_into(&bytes[offset..offset + 2 * w], plane.row_mut(y));
                    offset += 2 * w;
                }
            }
        }
    }
    trace!(%format, width, height, bytes = size, "read_raw_frame");
    Ok(Some(frame))
}

/// Writes `frame` tightly packed.
pub fn write_raw_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    match frame.planes() {
        FramePlanes::U8(planes) => {
            for row in planes.iter().flat_map(|p| p.rows()) {
                writer.write_all(row)?;
            }
        }
        FramePlanes::U16(planes) => {
            for row in planes.iter().flat_map(|p| p.rows()) {
                for &sample in row {
                    writer.write_u16::<LittleEndian>(sample)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        assert_eq!(frame_size_bytes(PixelFormat::Yuv420p, 64, 64), 64 * 64 * 3 / 2);
        assert_eq!(frame_size_bytes(PixelFormat::Yuv420p, 3, 3), 9 + 4 + 4);
        assert_eq!(frame_size_bytes(PixelFormat::Gray12, 10, 2), 40);
        assert_eq!(frame_size_bytes(PixelFormat::Yuyv422, 4, 1), 8);
    }

    #[test]
    fn test_u8_layout() {
        let data: Vec<u8> = (0..6).collect();
        let frame = read_raw_frame(&mut data.as_slice(), PixelFormat::Gray8, 3, 2)
            .unwrap()
            .unwrap();
        let luma = &frame.planes().as_u8().unwrap()[0];
        assert_eq!(luma.row(1), &[3, 4, 5]);
    }

    #[test]
    fn test_u16_little_endian() {
        let data = [0x34u8, 0x12, 0xff, 0x03];
        let frame = read_raw_frame(&mut data.as_slice(), PixelFormat::Gray10, 2, 1)
            .unwrap()
            .unwrap();
        assert_eq!(frame.planes().as_u16().unwrap()[0].row(0), &[0x1234, 0x3ff]);

        let mut out = Vec::new();
        write_raw_frame(&mut out, &frame).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_eof_handling() {
        let empty: &[u8] = &[];
        assert!(read_raw_frame(&mut &*empty, PixelFormat::Gray8, 2, 2).unwrap().is_none());

        let short = [1u8, 2, 3];
        let err = read_raw_frame(&mut short.as_slice(), PixelFormat::Gray8, 2, 2).unwrap_err();
        assert!(err.is_io_error());
    }
}
