//! Scaling function lookup tables.
//!
//! A scaling function maps a sample value (or, for chroma, a blended
//! luma/chroma index) to a grain strength. It is transmitted as up to 14
//! piecewise-linear control points over 8-bit values and expanded here into a
//! dense table of `1 << bitdepth` entries.
//!
//! # Algorithm
//!
//! 1. Entries below the first point take its strength.
//! 2. Each segment is interpolated with a 16.16 fixed-point slope, writing
//!    every `1 << (bitdepth - 8)`-th entry.
//! 3. Entries from the last point on take its strength.
//! 4. Above 8 bits the entries between the written ones are filled by
//!    distributing the difference of their neighbours.
//!
//! # Example
//!
//! ```rust
//! use grain_synth::scaling::{ScalingLut, build_scaling_lut, new_scaling_lut};
//!
//! let mut lut: ScalingLut = new_scaling_lut();
//! build_scaling_lut(&[[0, 0], [1, 4]], 10, &mut lut);
//! assert_eq!(&lut[..6], &[0, 1, 2, 3, 4, 4]);
//! ```

use tracing::trace;

/// Capacity of a scaling table (12-bit samples).
pub const SCALING_SIZE: usize = 4096;

/// Dense scaling table. 8-bit content only uses the first 256 entries.
pub type ScalingLut = [u8; SCALING_SIZE];

/// Allocates a zeroed table.
#[inline]
pub const fn new_scaling_lut() -> ScalingLut {
    [0; SCALING_SIZE]
}

/// Expands `points` into `lut` for samples of `bitdepth` bits.
///
/// Segments whose x does not increase are skipped.
///
/// # Panics
///
/// Panics if `1 << bitdepth` exceeds [`SCALING_SIZE`] or `bitdepth < 8`.
pub fn build_scaling_lut(points: &[[u8; 2]], bitdepth: u32, lut: &mut ScalingLut) {
    assert!(
        (8..=12).contains(&bitdepth),
        "scaling table for {}-bit samples exceeds {} entries",
        bitdepth,
        SCALING_SIZE
    );
    let shift = bitdepth - 8;
    let size = 1usize << bitdepth;

    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        lut[..size].fill(0);
        return;
    };

    lut[..(first[0] as usize) << shift].fill(first[1]);

    for seg in points.windows(2) {
        let (bx, by) = (i32::from(seg[0][0]), i32::from(seg[0][1]));
        let (ex, ey) = (i32::from(seg[1][0]), i32::from(seg[1][1]));
        let dx = ex - bx;
        if dx <= 0 {
            continue;
        }
        let dy = ey - by;
        let delta = dy * ((0x10000 + (dx >> 1)) / dx);
        let mut d = 0x8000;
        for x in 0..dx {
            lut[((bx + x) as usize) << shift] = (by + (d >> 16)) as u8;
            d += delta;
        }
    }

    let n = (last[0] as usize) << shift;
    lut[n..size].fill(last[1]);

    if shift > 0 {
        let pad = 1usize << shift;
        let rnd = (pad >> 1) as i32;
        for seg in points.windows(2) {
            let bx = (seg[0][0] as usize) << shift;
            let ex = (seg[1][0] as usize) << shift;
            if ex <= bx {
                continue;
            }
            for x in (0..ex - bx).step_by(pad) {
                let base = i32::from(lut[bx + x]);
                let range = i32::from(lut[bx + x + pad]) - base;
                let mut r = rnd;
                for k in 1..pad {
                    r += range;
                    lut[bx + x + k] = (base + (r >> shift)) as u8;
                }
            }
        }
    }

    trace!(points = points.len(), bitdepth, "build_scaling_lut");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(points: &[[u8; 2]], bitdepth: u32) -> ScalingLut {
        let mut lut = new_scaling_lut();
        build_scaling_lut(points, bitdepth, &mut lut);
        lut
    }

    #[test]
    fn test_no_points_is_zero() {
        let mut lut = [7u8; SCALING_SIZE];
        build_scaling_lut(&[], 10, &mut lut);
        assert!(lut[..1024].iter().all(|&v| v == 0));
    }

    #[test]
    fn test_single_point_fills_everything() {
        for bitdepth in [8, 9, 10, 12] {
            for x in [0u8, 77, 255] {
                let lut = build(&[[x, 123]], bitdepth);
                assert!(
                    lut[..1 << bitdepth].iter().all(|&v| v == 123),
                    "bitdepth {} x {}",
                    bitdepth,
                    x
                );
            }
        }
    }

    #[test]
    fn test_8bit_segment() {
        let lut = build(&[[64, 10], [192, 90]], 8);
        assert_eq!(lut[63], 10);
        assert_eq!(lut[64], 10);
        assert_eq!(lut[65], 11);
        assert_eq!(lut[100], 33);
        assert_eq!(lut[128], 50);
        assert_eq!(lut[191], 89);
        assert_eq!(lut[192], 90);
        assert_eq!(lut[255], 90);
    }

    #[test]
    fn test_10bit_smoothing() {
        let lut = build(&[[64, 10], [192, 90]], 10);
        assert_eq!(&lut[256..261], &[10, 10, 11, 11, 11]);
        assert_eq!(lut[512], 50);
        assert_eq!(lut[767], 90);
        assert_eq!(lut[1023], 90);
    }

    #[test]
    fn test_decreasing_segment() {
        let lut = build(&[[0, 90], [100, 10]], 8);
        assert_eq!((lut[0], lut[1], lut[50], lut[99], lut[100]), (90, 89, 50, 11, 10));
    }

    #[test]
    fn test_monotonic_interpolation() {
        for bitdepth in [8u32, 10, 12] {
            let lut = build(&[[16, 5], [200, 250]], bitdepth);
            let shift = bitdepth - 8;
            let span = &lut[16 << shift..=200 << shift];
            assert!(span.windows(2).all(|w| w[0] <= w[1]), "bitdepth {}", bitdepth);
        }
    }

    #[test]
    fn test_unordered_points_stay_in_bounds() {
        let lut = build(&[[200, 10], [100, 20], [255, 30]], 12);
        assert_eq!(lut[4095], 30);
        assert_eq!(lut[0], 10);
    }

    #[test]
    #[should_panic]
    fn test_oversized_bitdepth_panics() {
        build(&[[0, 1]], 16);
    }
}
