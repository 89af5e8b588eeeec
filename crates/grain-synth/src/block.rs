//! Block applicator.
//!
//! Grain is added in rows of 32-line blocks. Every block samples a 32x32
//! (subsampled for chroma) window of the grain grid at an offset drawn from
//! the row's generator, so a block row depends only on the frame seed and its
//! own index. With overlap enabled the first two columns and rows of a block
//! are blended with the grain the left and upper neighbours would have used.
//!
//! # Noise
//!
//! ```text
//! noise = round2(scaling[index] * grain, scaling_shift)
//! out   = clip(src + noise, min, max)
//! ```
//!
//! where `index` is the sample itself for luma and a blend of chroma and
//! co-located luma for chroma.
//!
//! # Used By
//!
//! - [`crate::synth`] - drives one call per plane and block row

use grain_core::params::AomFilmGrain;
use grain_core::pixel::{GrainEntry, Pixel};

use crate::grain::{FG_BLOCK_SIZE, GrainLut, grain_range, round2};
use crate::rng::{RandomState, row_seeds};
use crate::scaling::ScalingLut;

/// Overlap weights: `[subsampled][offset] = [old, new]`.
const OVERLAP_WEIGHTS: [[[i32; 2]; 2]; 2] = [[[27, 17], [17, 27]], [[23, 22], [0, 0]]];

// ============================================================================
// Plane views
// ============================================================================

/// Read-only rows of a plane starting at some block row.
#[derive(Debug, Clone, Copy)]
pub struct PlaneSlice<'a, P> {
    /// Samples, first row first.
    pub data: &'a [P],
    /// Row distance in samples.
    pub stride: usize,
}

impl<'a, P: Copy> PlaneSlice<'a, P> {
    /// Wraps `data` with `stride`.
    #[inline]
    pub fn new(data: &'a [P], stride: usize) -> Self {
        Self { data, stride }
    }

    #[inline(always)]
    fn at(&self, x: usize, y: usize) -> P {
        self.data[y * self.stride + x]
    }
}

/// Writable rows of a plane starting at some block row.
#[derive(Debug)]
pub struct PlaneSliceMut<'a, P> {
    /// Samples, first row first.
    pub data: &'a mut [P],
    /// Row distance in samples.
    pub stride: usize,
}

impl<'a, P: Copy> PlaneSliceMut<'a, P> {
    /// Wraps `data` with `stride`.
    #[inline]
    pub fn new(data: &'a mut [P], stride: usize) -> Self {
        Self { data, stride }
    }

    #[inline(always)]
    fn set(&mut self, x: usize, y: usize, v: P) {
        self.data[y * self.stride + x] = v;
    }
}

// ============================================================================
// Shared state
// ============================================================================

/// Per-plane inputs shared by every block row.
#[derive(Debug, Clone, Copy)]
pub struct GrainContext<'a, G> {
    /// Sanitized parameters.
    pub params: &'a AomFilmGrain,
    /// Grain grid of the plane.
    pub grain: &'a GrainLut<G>,
    /// Scaling table of the plane.
    pub scaling: &'a ScalingLut,
    /// Frame seed.
    pub seed: u16,
    /// Sample bit depth.
    pub bitdepth: u32,
}

/// Chroma plane description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromaPlane {
    /// 0 for Cb, 1 for Cr.
    pub uv: usize,
    /// Horizontally subsampled.
    pub subx: bool,
    /// Vertically subsampled.
    pub suby: bool,
    /// Frame is coded with the identity matrix (RGB).
    pub is_id: bool,
}

/// Block offsets of a row: `[column][row]`, column 1 being the left
/// neighbour and row 1 the block above.
struct BlockOffsets {
    seeds: [RandomState; 2],
    rows: usize,
    overlap: bool,
    offsets: [[i32; 2]; 2],
}

impl BlockOffsets {
    fn new(seed: u16, row: usize, overlap: bool) -> Self {
        Self {
            seeds: row_seeds(seed, row, overlap),
            rows: 1 + usize::from(overlap && row > 0),
            overlap,
            offsets: [[0; 2]; 2],
        }
    }

    /// Moves to the block starting at column `bx`.
    fn advance(&mut self, bx: usize) {
        if self.overlap && bx != 0 {
            for i in 0..self.rows {
                self.offsets[1][i] = self.offsets[0][i];
            }
        }
        for i in 0..self.rows {
            self.offsets[0][i] = self.seeds[i].draw_bits(8);
        }
    }

    /// Grain cell `(x, y)` of block `(col, row)` within the current window.
    #[allow(clippy::too_many_arguments)]
    #[inline(always)]
    fn sample<G: GrainEntry>(
        &self,
        grain: &GrainLut<G>,
        sx: usize,
        sy: usize,
        col: usize,
        row: usize,
        x: usize,
        y: usize,
    ) -> i32 {
        let randval = self.offsets[col][row] as usize;
        let offx = 3 + (2 >> sx) * (3 + (randval >> 4));
        let offy = 3 + (2 >> sy) * (3 + (randval & 0xF));
        grain[offy + y + (FG_BLOCK_SIZE >> sy) * row][offx + x + (FG_BLOCK_SIZE >> sx) * col]
            .to_i32()
    }
}

/// Clip range of the output.
fn output_range(params: &AomFilmGrain, bitdepth: u32, chroma_is_id: Option<bool>) -> (i32, i32) {
    let bd_min_8 = bitdepth - 8;
    if params.limit_output_range {
        let max = match chroma_is_id {
            Some(false) => 240,
            _ => 235,
        };
        (16 << bd_min_8, max << bd_min_8)
    } else {
        (0, (1 << bitdepth) - 1)
    }
}

/// Grain of `(x, y)` with left, top and corner blending applied.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn blended_grain<G: GrainEntry>(
    offsets: &BlockOffsets,
    grain: &GrainLut<G>,
    sx: usize,
    sy: usize,
    x: usize,
    y: usize,
    xstart: usize,
    ystart: usize,
    grain_min: i32,
    grain_max: i32,
) -> i32 {
    let wx = &OVERLAP_WEIGHTS[sx];
    let wy = &OVERLAP_WEIGHTS[sy];
    let blend = |old: i32, new: i32, w: [i32; 2]| {
        round2(old * w[0] + new * w[1], 5).clamp(grain_min, grain_max)
    };

    let cur = offsets.sample(grain, sx, sy, 0, 0, x, y);
    match (x < xstart, y < ystart) {
        (false, false) => cur,
        (true, false) => blend(offsets.sample(grain, sx, sy, 1, 0, x, y), cur, wx[x]),
        (false, true) => blend(offsets.sample(grain, sx, sy, 0, 1, x, y), cur, wy[y]),
        (true, true) => {
            let top = offsets.sample(grain, sx, sy, 0, 1, x, y);
            let top_left = offsets.sample(grain, sx, sy, 1, 1, x, y);
            let top = blend(top_left, top, wx[x]);
            let left = offsets.sample(grain, sx, sy, 1, 0, x, y);
            let cur = blend(left, cur, wx[x]);
            blend(top, cur, wy[y])
        }
    }
}

// ============================================================================
// Luma
// ============================================================================

/// Adds grain to luma block row `row`.
///
/// `dst` and `src` start at the first line of the block row; `width` is the
/// plane width and `height` the number of lines in this block row (at most 32).
pub fn apply_luma_row<P: Pixel>(
    ctx: &GrainContext<'_, P::Grain>,
    row: usize,
    mut dst: PlaneSliceMut<'_, P>,
    src: PlaneSlice<'_, P>,
    width: usize,
    height: usize,
) {
    let p = ctx.params;
    let (grain_min, grain_max) = grain_range(ctx.bitdepth);
    let (min_value, max_value) = output_range(p, ctx.bitdepth, None);
    let bitdepth_max = (1usize << ctx.bitdepth) - 1;
    let shift = u32::from(p.scaling_shift);
    let mut offsets = BlockOffsets::new(ctx.seed, row, p.overlap_flag);

    for bx in (0..width).step_by(FG_BLOCK_SIZE) {
        let bw = FG_BLOCK_SIZE.min(width - bx);
        offsets.advance(bx);
        let ystart = if p.overlap_flag && row > 0 { height.min(2) } else { 0 };
        let xstart = if p.overlap_flag && bx > 0 { bw.min(2) } else { 0 };

        for y in 0..height {
            for x in 0..bw {
                let grain = blended_grain(
                    &offsets, ctx.grain, 0, 0, x, y, xstart, ystart, grain_min, grain_max,
                );
                let s = src.at(bx + x, y);
                let scale = i32::from(ctx.scaling[(s.to_i32() as usize).min(bitdepth_max)]);
                let noise = round2(scale * grain, shift);
                dst.set(bx + x, y, P::from_i32((s.to_i32() + noise).clamp(min_value, max_value)));
            }
        }
    }
}

// ============================================================================
// Chroma
// ============================================================================

/// Adds grain to chroma block row `row`.
///
/// `luma` starts at the first luma line of the block row and is
/// `luma_width` samples wide; the last column is repeated when the chroma
/// position needs one past it. `width` and `height` are in chroma samples.
#[allow(clippy::too_many_arguments)]
pub fn apply_chroma_row<P: Pixel>(
    ctx: &GrainContext<'_, P::Grain>,
    plane: &ChromaPlane,
    row: usize,
    mut dst: PlaneSliceMut<'_, P>,
    src: PlaneSlice<'_, P>,
    luma: PlaneSlice<'_, P>,
    luma_width: usize,
    width: usize,
    height: usize,
) {
    let p = ctx.params;
    let (sx, sy) = (usize::from(plane.subx), usize::from(plane.suby));
    let uv = plane.uv & 1;
    let (grain_min, grain_max) = grain_range(ctx.bitdepth);
    let (min_value, max_value) = output_range(p, ctx.bitdepth, Some(plane.is_id));
    let bitdepth_max = (1i32 << ctx.bitdepth) - 1;
    let bd_min_8 = ctx.bitdepth - 8;
    let shift = u32::from(p.scaling_shift);
    let last_luma = luma_width.saturating_sub(1);
    let block_w = FG_BLOCK_SIZE >> sx;
    let mut offsets = BlockOffsets::new(ctx.seed, row, p.overlap_flag);

    for bx in (0..width).step_by(block_w) {
        let bw = block_w.min(width - bx);
        offsets.advance(bx);
        let ystart = if p.overlap_flag && row > 0 { height.min(2 >> sy) } else { 0 };
        let xstart = if p.overlap_flag && bx > 0 { bw.min(2 >> sx) } else { 0 };

        for y in 0..height {
            let ly = y << sy;
            for x in 0..bw {
                let grain = blended_grain(
                    &offsets, ctx.grain, sx, sy, x, y, xstart, ystart, grain_min, grain_max,
                );
                let lx = ((bx + x) << sx).min(last_luma);
                let mut avg = luma.at(lx, ly).to_i32();
                if sx == 1 {
                    avg = (avg + luma.at((lx + 1).min(last_luma), ly).to_i32() + 1) >> 1;
                }
                let s = src.at(bx + x, y).to_i32();
                let index = if p.chroma_scaling_from_luma {
                    avg.clamp(0, bitdepth_max)
                } else {
                    let combined = avg * p.uv_mult_luma[uv] + s * p.uv_mult[uv];
                    ((combined >> 6) + (p.uv_offset[uv] << bd_min_8)).clamp(0, bitdepth_max)
                };
                let noise = round2(i32::from(ctx.scaling[index as usize]) * grain, shift);
                dst.set(bx + x, y, P::from_i32((s + noise).clamp(min_value, max_value)));
            }
        }
    }
}
