//! Grain grid generation.
//!
//! Each plane gets a small noise texture per frame: Gaussian draws from the
//! seeded generator, shaped by a causal autoregressive filter. The block
//! applicator later samples 32x32 windows of it at pseudo-random offsets.
//!
//! # Grid sizes
//!
//! | plane | not subsampled | subsampled |
//! |-------|----------------|------------|
//! | width | 82             | 44         |
//! | height| 73             | 38         |
//!
//! All grids live in a [`GrainLut`] of the luma size; chroma grids use its
//! top-left corner. The extra row is never generated and stays zero.
//!
//! # AR filter
//!
//! Cells at least [`AR_PAD`] away from the top, left and right edges are
//! filtered in raster order with the taps
//!
//! ```text
//! dy = -lag..=0, dx = -lag..=lag, stopping before (0, 0)
//! ```
//!
//! Chroma replaces the stop with one extra tap on the co-located (averaged)
//! luma grain, present only when luma has scaling points.

use grain_core::params::AomFilmGrain;
use grain_core::pixel::GrainEntry;
use tracing::trace;

use crate::gaussian::GAUSSIAN_SEQUENCE;
use crate::rng::RandomState;

/// Luma grid width.
pub const GRAIN_WIDTH: usize = 82;
/// Luma grid height.
pub const GRAIN_HEIGHT: usize = 73;
/// Chroma grid width when horizontally subsampled.
pub const SUB_GRAIN_WIDTH: usize = 44;
/// Chroma grid height when vertically subsampled.
pub const SUB_GRAIN_HEIGHT: usize = 38;
/// Border left unfiltered by the AR pass.
pub const AR_PAD: usize = 3;
/// Edge length of the blocks grain is applied in.
pub const FG_BLOCK_SIZE: usize = 32;

/// Seed salt of the Cb grid.
const CB_SEED_SALT: u16 = 0xb524;
/// Seed salt of the Cr grid.
const CR_SEED_SALT: u16 = 0x49d8;

/// Grain grid storage, one spare row below the luma grid.
pub type GrainLut<G> = [[G; GRAIN_WIDTH]; GRAIN_HEIGHT + 1];

/// Allocates a zeroed grid.
#[inline]
pub fn new_grain_lut<G: GrainEntry>() -> GrainLut<G> {
    [[G::default(); GRAIN_WIDTH]; GRAIN_HEIGHT + 1]
}

/// `(x + 2^(shift-1)) >> shift`, and `x` unchanged for a zero shift.
#[inline(always)]
pub(crate) fn round2(x: i32, shift: u32) -> i32 {
    if shift == 0 {
        x
    } else {
        (x + (1 << (shift - 1))) >> shift
    }
}

/// `(width, height)` of a chroma grid.
#[inline]
pub const fn chroma_grain_size(subx: bool, suby: bool) -> (usize, usize) {
    (
        if subx { SUB_GRAIN_WIDTH } else { GRAIN_WIDTH },
        if suby { SUB_GRAIN_HEIGHT } else { GRAIN_HEIGHT },
    )
}

/// Clip range `[min, max]` of grain cells at `bitdepth`.
#[inline]
pub const fn grain_range(bitdepth: u32) -> (i32, i32) {
    let ctr = 128 << (bitdepth - 8);
    (-ctr, ctr - 1)
}

/// Fills `w` x `h` cells with quantized Gaussian draws.
fn fill_gaussian<G: GrainEntry>(
    lut: &mut GrainLut<G>,
    rng: &mut RandomState,
    w: usize,
    h: usize,
    shift: u32,
) {
    for row in lut.iter_mut().take(h) {
        for cell in row.iter_mut().take(w) {
            let idx = rng.draw_bits(11) as usize;
            *cell = G::from_i32(round2(i32::from(GAUSSIAN_SEQUENCE[idx]), shift));
        }
    }
}

/// Generates the luma grain grid.
///
/// `params` must be sanitized (lag at most 3).
pub fn generate_grain_luma<G: GrainEntry>(
    lut: &mut GrainLut<G>,
    params: &AomFilmGrain,
    seed: u16,
    bitdepth: u32,
) {
    let mut rng = RandomState::new(seed);
    let shift = 4 - (bitdepth - 8) + u32::from(params.grain_scale_shift);
    let (grain_min, grain_max) = grain_range(bitdepth);
    let lag = usize::from(params.ar_coeff_lag.min(3));
    let ar_shift = u32::from(params.ar_coeff_shift);

    fill_gaussian(lut, &mut rng, GRAIN_WIDTH, GRAIN_HEIGHT, shift);

    if lag > 0 {
        for y in AR_PAD..GRAIN_HEIGHT {
            for x in AR_PAD..GRAIN_WIDTH - AR_PAD {
                let mut sum = 0i32;
                let mut idx = 0usize;
                'taps: for dy in y - lag..=y {
                    for dx in x - lag..=x + lag {
                        if dy == y && dx == x {
                            break 'taps;
                        }
                        sum += i32::from(params.ar_coeffs_y[idx]) * lut[dy][dx].to_i32();
                        idx += 1;
                    }
                }
                let grain = lut[y][x].to_i32() + round2(sum, ar_shift);
                lut[y][x] = G::from_i32(grain.clamp(grain_min, grain_max));
            }
        }
    }

    trace!(seed, bitdepth, lag, shift, "generate_grain_luma");
}

/// Generates the grain grid of chroma plane `uv` (0 = Cb, 1 = Cr).
///
/// `luma` must already hold the luma grid of the same frame.
#[allow(clippy::too_many_arguments)]
pub fn generate_grain_chroma<G: GrainEntry>(
    lut: &mut GrainLut<G>,
    luma: &GrainLut<G>,
    params: &AomFilmGrain,
    seed: u16,
    uv: usize,
    subx: bool,
    suby: bool,
    bitdepth: u32,
) {
    let salt = if uv == 0 { CB_SEED_SALT } else { CR_SEED_SALT };
    let mut rng = RandomState::new(seed ^ salt);
    let shift = 4 - (bitdepth - 8) + u32::from(params.grain_scale_shift);
    let (grain_min, grain_max) = grain_range(bitdepth);
    let lag = usize::from(params.ar_coeff_lag.min(3));
    let ar_shift = u32::from(params.ar_coeff_shift);
    let (w, h) = chroma_grain_size(subx, suby);
    let (sx, sy) = (usize::from(subx), usize::from(suby));
    let coeffs_uv = &params.ar_coeffs_uv[uv & 1];

    fill_gaussian(lut, &mut rng, w, h, shift);

    for y in AR_PAD..h {
        for x in AR_PAD..w - AR_PAD {
            let mut sum = 0i32;
            let mut idx = 0usize;
            'taps: for dy in y - lag..=y {
                for dx in x - lag..=x + lag {
                    if dy == y && dx == x {
                        if params.num_y_points == 0 {
                            break 'taps;
                        }
                        let ly = ((y - AR_PAD) << sy) + AR_PAD;
                        let lx = ((x - AR_PAD) << sx) + AR_PAD;
                        let mut avg = 0i32;
                        for row in &luma[ly..=ly + sy] {
                            for cell in &row[lx..=lx + sx] {
                                avg += cell.to_i32();
                            }
                        }
                        let avg = round2(avg, (sx + sy) as u32);
                        sum += avg * i32::from(coeffs_uv[idx]);
                        break 'taps;
                    }
                    sum += i32::from(coeffs_uv[idx]) * lut[dy][dx].to_i32();
                    idx += 1;
                }
            }
            let grain = lut[y][x].to_i32() + round2(sum, ar_shift);
            lut[y][x] = G::from_i32(grain.clamp(grain_min, grain_max));
        }
    }

    trace!(seed, uv, subx, suby, bitdepth, lag, "generate_grain_chroma");
}
