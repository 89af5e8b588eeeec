//! Frame-level grain synthesis.
//!
//! [`apply_film_grain`] adds grain described by one parameter set to a frame.
//! [`FilmGrainSynthesizer`] wraps it for decoders: it picks the parameter set
//! matching the frame from its side data and decides what happens when grain
//! cannot be applied.
//!
//! # Pipeline
//!
//! 1. Check the frame format and the parameter type. The output is left
//!    untouched on error.
//! 2. Copy planes that receive no grain.
//! 3. Generate the grain grids and scaling tables the active planes need.
//! 4. Add grain per plane, one block row at a time (rows run on the rayon
//!    pool with the `parallel` feature).
//!
//! # Example
//!
//! ```rust
//! use grain_core::{AomFilmGrain, FilmGrainParams, Frame, PixelFormat};
//! use grain_synth::apply_film_grain;
//!
//! let input = Frame::new(PixelFormat::Yuv420p, 64, 64).unwrap();
//! let mut out = Frame::new_like(&input).unwrap();
//!
//! let mut grain = AomFilmGrain::default();
//! grain.num_y_points = 2;
//! grain.y_points[0] = [0, 20];
//! grain.y_points[1] = [255, 20];
//! let params = FilmGrainParams::aom(grain, 7);
//!
//! apply_film_grain(&mut out, &input, &params).unwrap();
//! ```

use grain_core::format::GrainLayout;
use grain_core::params::AomFilmGrain;
use grain_core::pixel::Pixel;
use grain_core::{FilmGrainParams, Frame, SampleStorage, select_film_grain_params};
use tracing::{debug, trace, warn};

use crate::block::{ChromaPlane, GrainContext, PlaneSlice, PlaneSliceMut};
use crate::block::{apply_chroma_row, apply_luma_row};
use crate::grain::{FG_BLOCK_SIZE, generate_grain_chroma, generate_grain_luma, new_grain_lut};
use crate::parallel::for_each_block_row;
use crate::scaling::{ScalingLut, build_scaling_lut, new_scaling_lut};
use crate::{SynthError, SynthResult};

// ============================================================================
// Options
// ============================================================================

/// Synthesis options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthOptions {
    /// Process block rows on the rayon pool (ignored without the `parallel` feature).
    pub parallel: bool,
    /// Emit an ungrained copy instead of failing when grain cannot be applied.
    pub passthrough_on_unsupported: bool,
}

impl Default for SynthOptions {
    fn default() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            passthrough_on_unsupported: false,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Adds grain described by `params` to `input`, writing the result to `out`.
///
/// `out` must have the same format and size as `input`; its side data and
/// colour metadata are not touched.
///
/// # Errors
///
/// - [`SynthError::UnsupportedPixelFormat`] if the format cannot carry grain
/// - [`SynthError::FrameMismatch`] if `out` and `input` differ, or a plane
///   no longer has the size the format implies
/// - [`SynthError::NotAomParams`] if `params` is not an AOM set
pub fn apply_film_grain(out: &mut Frame, input: &Frame, params: &FilmGrainParams) -> SynthResult<()> {
    apply_film_grain_with(out, input, params, &SynthOptions::default())
}

/// [`apply_film_grain`] with explicit options.
pub fn apply_film_grain_with(
    out: &mut Frame,
    input: &Frame,
    params: &FilmGrainParams,
    options: &SynthOptions,
) -> SynthResult<()> {
    let format = input.format();
    let layout = format
        .grain_layout()
        .ok_or(SynthError::UnsupportedPixelFormat { format })?;

    if out.format() != format {
        return Err(SynthError::FrameMismatch(format!(
            "output is {}, input is {}",
            out.format(),
            format
        )));
    }
    if out.width() != input.width() || out.height() != input.height() {
        return Err(SynthError::FrameMismatch(format!(
            "output is {}x{}, input is {}x{}",
            out.width(),
            out.height(),
            input.width(),
            input.height()
        )));
    }

    input
        .check_planes()
        .map_err(|e| SynthError::FrameMismatch(format!("input planes: {}", e)))?;
    out.check_planes()
        .map_err(|e| SynthError::FrameMismatch(format!("output planes: {}", e)))?;

    let aom = params.aom_params().ok_or(SynthError::NotAomParams)?.sanitized();
    let is_id = input.color().is_identity_matrix();

    debug!(
        format = %format,
        width = input.width(),
        height = input.height(),
        seed = params.seed,
        "apply_film_grain"
    );

    match format.descriptor().storage {
        SampleStorage::U8 => apply_typed::<u8>(out, input, &aom, params.seed, layout, is_id, options),
        SampleStorage::U16 => {
            apply_typed::<u16>(out, input, &aom, params.seed, layout, is_id, options)
        }
    }
}

// ============================================================================
// Per-storage implementation
// ============================================================================

fn apply_typed<P: Pixel>(
    out: &mut Frame,
    input: &Frame,
    aom: &AomFilmGrain,
    seed: u16,
    layout: GrainLayout,
    is_id: bool,
    options: &SynthOptions,
) -> SynthResult<()> {
    let bitdepth = layout.bit_depth;
    let has_chroma = layout.subsampling.has_chroma();
    let (sx, sy) = (layout.subsampling.ss_x(), layout.subsampling.ss_y());
    let csfl = aom.chroma_scaling_from_luma;
    let chroma_wanted = |uv: usize| has_chroma && (aom.num_uv_points[uv] > 0 || csfl);

    let src = P::planes(input)
        .ok_or_else(|| SynthError::FrameMismatch("input sample storage".into()))?;
    let dst = P::planes_mut(out)
        .ok_or_else(|| SynthError::FrameMismatch("output sample storage".into()))?;
    let num_planes = if has_chroma { 3 } else { 1 };
    if src.len() < num_planes || dst.len() < num_planes {
        return Err(SynthError::FrameMismatch(format!(
            "expected {} planes, got {} in and {} out",
            num_planes,
            src.len(),
            dst.len()
        )));
    }

    // Planes without grain pass through.
    if !aom.luma_active() {
        dst[0].copy_from(&src[0]);
    }
    for uv in 0..2 {
        if has_chroma && !chroma_wanted(uv) {
            dst[1 + uv].copy_from(&src[1 + uv]);
        }
    }

    // Grain grids. The chroma grids read the luma grid, so it is always built.
    let mut grain_y = new_grain_lut::<P::Grain>();
    generate_grain_luma(&mut grain_y, aom, seed, bitdepth);
    let mut grain_uv = [new_grain_lut::<P::Grain>(), new_grain_lut::<P::Grain>()];
    for (uv, lut) in grain_uv.iter_mut().enumerate() {
        if chroma_wanted(uv) {
            generate_grain_chroma(lut, &grain_y, aom, seed, uv, sx == 1, sy == 1, bitdepth);
        }
    }

    // Scaling tables. Chroma scaled from luma reuses the luma table.
    let mut scaling: [ScalingLut; 3] = [new_scaling_lut(); 3];
    if aom.luma_active() || csfl {
        build_scaling_lut(aom.y_points(), bitdepth, &mut scaling[0]);
    }
    for uv in 0..2 {
        if has_chroma && aom.num_uv_points[uv] > 0 {
            build_scaling_lut(aom.uv_points(uv), bitdepth, &mut scaling[1 + uv]);
        }
    }

    let (luma, chroma) = dst.split_at_mut(1);

    if aom.luma_active() {
        let ctx = GrainContext {
            params: aom,
            grain: &grain_y,
            scaling: &scaling[0],
            seed,
            bitdepth,
        };
        apply_luma_plane(&ctx, &mut luma[0], &src[0], options.parallel);
        trace!("luma grain applied");
    }

    for uv in 0..2 {
        if !chroma_wanted(uv) {
            continue;
        }
        let ctx = GrainContext {
            params: aom,
            grain: &grain_uv[uv],
            scaling: if csfl { &scaling[0] } else { &scaling[1 + uv] },
            seed,
            bitdepth,
        };
        let plane = ChromaPlane {
            uv,
            subx: sx == 1,
            suby: sy == 1,
            is_id,
        };
        apply_chroma_plane(
            &ctx,
            &plane,
            &mut chroma[uv],
            &src[1 + uv],
            &src[0],
            options.parallel,
        );
        trace!(uv, "chroma grain applied");
    }

    Ok(())
}

fn apply_luma_plane<P: Pixel>(
    ctx: &GrainContext<'_, P::Grain>,
    dst: &mut grain_core::Plane<P>,
    src: &grain_core::Plane<P>,
    parallel: bool,
) {
    let (width, height) = (src.width(), src.height());
    let (dst_stride, src_stride) = (dst.stride(), src.stride());

    for_each_block_row(dst.data_mut(), dst_stride * FG_BLOCK_SIZE, parallel, |row, lines| {
        let y0 = row * FG_BLOCK_SIZE;
        if y0 >= height {
            return;
        }
        let bh = FG_BLOCK_SIZE.min(height - y0);
        apply_luma_row(
            ctx,
            row,
            PlaneSliceMut::new(lines, dst_stride),
            PlaneSlice::new(&src.data()[y0 * src_stride..], src_stride),
            width,
            bh,
        );
    });
}

fn apply_chroma_plane<P: Pixel>(
    ctx: &GrainContext<'_, P::Grain>,
    plane: &ChromaPlane,
    dst: &mut grain_core::Plane<P>,
    src: &grain_core::Plane<P>,
    luma: &grain_core::Plane<P>,
    parallel: bool,
) {
    let sy = usize::from(plane.suby);
    let block_h = FG_BLOCK_SIZE >> sy;
    let (width, height) = (src.width(), src.height());
    let (luma_width, luma_height) = (luma.width(), luma.height());
    let (dst_stride, src_stride, luma_stride) = (dst.stride(), src.stride(), luma.stride());

    for_each_block_row(dst.data_mut(), dst_stride * block_h, parallel, |row, lines| {
        let ly0 = row * FG_BLOCK_SIZE;
        let cy0 = row * block_h;
        if ly0 >= luma_height || cy0 >= height {
            return;
        }
        let bh = ((FG_BLOCK_SIZE.min(luma_height - ly0) + sy) >> sy).min(height - cy0);
        apply_chroma_row(
            ctx,
            plane,
            row,
            PlaneSliceMut::new(lines, dst_stride),
            PlaneSlice::new(&src.data()[cy0 * src_stride..], src_stride),
            PlaneSlice::new(&luma.data()[ly0 * luma_stride..], luma_stride),
            luma_width,
            width,
            bh,
        );
    });
}

// ============================================================================
// Synthesizer
// ============================================================================

/// Applies the grain carried by frames' side data.
///
/// # Example
///
/// ```rust
/// use grain_core::{AomFilmGrain, FilmGrainParams, Frame, PixelFormat};
/// use grain_synth::{FilmGrainSynthesizer, SynthOptions};
///
/// let mut frame = Frame::new(PixelFormat::Gray8, 16, 16).unwrap();
/// let mut grain = AomFilmGrain::default();
/// grain.num_y_points = 1;
/// grain.y_points[0] = [128, 0];
/// frame.add_film_grain_params(FilmGrainParams::aom(grain, 1)).unwrap();
///
/// let synth = FilmGrainSynthesizer::new(SynthOptions::default());
/// let out = synth.synthesize(&frame).unwrap();
/// assert_eq!(out.film_grain_params().count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilmGrainSynthesizer {
    options: SynthOptions,
}

impl FilmGrainSynthesizer {
    /// Creates a synthesizer.
    pub fn new(options: SynthOptions) -> Self {
        Self { options }
    }

    /// Current options.
    pub fn options(&self) -> &SynthOptions {
        &self.options
    }

    /// Adds grain described by `params` to `input`, writing to `out`.
    pub fn apply(&self, out: &mut Frame, input: &Frame, params: &FilmGrainParams) -> SynthResult<()> {
        apply_film_grain_with(out, input, params, &self.options)
    }

    /// Returns a grained copy of `input` using the parameter set selected
    /// from its side data.
    ///
    /// The grained frame carries the input's colour metadata and side data
    /// minus the grain parameters. With `passthrough_on_unsupported`, frames
    /// that cannot be grained come back as an unmodified copy.
    pub fn synthesize(&self, input: &Frame) -> SynthResult<Frame> {
        match self.try_synthesize(input) {
            Err(e) if self.options.passthrough_on_unsupported && e.is_passthrough() => {
                warn!(format = %input.format(), "{}, passing frame through", e);
                Ok(input.clone())
            }
            other => other,
        }
    }

    fn try_synthesize(&self, input: &Frame) -> SynthResult<Frame> {
        if input.format().grain_layout().is_none() {
            return Err(SynthError::UnsupportedPixelFormat {
                format: input.format(),
            });
        }
        let params = select_film_grain_params(input).ok_or(SynthError::NoApplicableParams)?;

        let mut out = Frame::new_like(input)?;
        self.apply(&mut out, input, params)?;
        out.copy_props_from(input);
        out.remove_film_grain_params();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::PixelFormat;

    fn flat_frame(format: PixelFormat, w: u32, h: u32, value: u16) -> Frame {
        let mut f = Frame::new(format, w, h).unwrap();
        match f.planes_mut() {
            grain_core::FramePlanes::U8(p) => p.iter_mut().for_each(|p| p.fill(value as u8)),
            grain_core::FramePlanes::U16(p) => p.iter_mut().for_each(|p| p.fill(value)),
        }
        f
    }

    fn luma_only(strength: u8) -> AomFilmGrain {
        let mut g = AomFilmGrain::default();
        g.num_y_points = 2;
        g.y_points[0] = [0, strength];
        g.y_points[1] = [255, strength];
        g
    }

    #[test]
    fn test_rejects_packed_format_untouched() {
        let input = flat_frame(PixelFormat::Yuyv422, 8, 8, 10);
        let mut out = flat_frame(PixelFormat::Yuyv422, 8, 8, 99);
        let before = out.clone();
        let err = apply_film_grain(&mut out, &input, &FilmGrainParams::aom(luma_only(50), 1))
            .unwrap_err();
        assert!(matches!(err, SynthError::UnsupportedPixelFormat { .. }));
        assert_eq!(out.planes(), before.planes());
    }

    #[test]
    fn test_rejects_size_mismatch() {
        let input = flat_frame(PixelFormat::Yuv420p, 16, 16, 10);
        let mut out = flat_frame(PixelFormat::Yuv420p, 32, 16, 10);
        let err = apply_film_grain(&mut out, &input, &FilmGrainParams::aom(luma_only(50), 1))
            .unwrap_err();
        assert!(matches!(err, SynthError::FrameMismatch(_)));
    }

    #[test]
    fn test_rejects_resized_plane() {
        let input = flat_frame(PixelFormat::Yuv420p, 16, 16, 10);
        let params = FilmGrainParams::aom(luma_only(50), 1);

        let mut out = Frame::new_like(&input).unwrap();
        if let grain_core::FramePlanes::U8(planes) = out.planes_mut() {
            planes[1] = grain_core::Plane::new(4, 4).unwrap();
        }
        let err = apply_film_grain(&mut out, &input, &params).unwrap_err();
        assert!(matches!(err, SynthError::FrameMismatch(_)));

        let mut bad_input = input.clone();
        if let grain_core::FramePlanes::U8(planes) = bad_input.planes_mut() {
            planes[0] = grain_core::Plane::new(16, 15).unwrap();
        }
        let mut out = Frame::new_like(&input).unwrap();
        let err = apply_film_grain(&mut out, &bad_input, &params).unwrap_err();
        assert!(matches!(err, SynthError::FrameMismatch(_)));
    }

    #[test]
    fn test_rejects_none_codec() {
        let input = flat_frame(PixelFormat::Yuv420p, 16, 16, 10);
        let mut out = Frame::new_like(&input).unwrap();
        let err = apply_film_grain(&mut out, &input, &FilmGrainParams::default()).unwrap_err();
        assert!(matches!(err, SynthError::NotAomParams));
    }

    #[test]
    fn test_chroma_copied_when_inactive() {
        let input = flat_frame(PixelFormat::Yuv420p, 40, 40, 128);
        let mut out = flat_frame(PixelFormat::Yuv420p, 40, 40, 0);
        apply_film_grain(&mut out, &input, &FilmGrainParams::aom(luma_only(80), 3)).unwrap();
        let (o, i) = (out.planes().as_u8().unwrap(), input.planes().as_u8().unwrap());
        assert_eq!(o[1], i[1]);
        assert_eq!(o[2], i[2]);
        assert_ne!(o[0], i[0]);
    }

    #[test]
    fn test_synthesize_without_params() {
        let input = flat_frame(PixelFormat::Yuv420p, 16, 16, 10);
        let synth = FilmGrainSynthesizer::default();
        assert!(matches!(
            synth.synthesize(&input),
            Err(SynthError::NoApplicableParams)
        ));

        let lenient = FilmGrainSynthesizer::new(SynthOptions {
            passthrough_on_unsupported: true,
            ..SynthOptions::default()
        });
        assert_eq!(lenient.synthesize(&input).unwrap().planes(), input.planes());
    }

    #[test]
    fn test_synthesize_passthrough_packed() {
        let mut input = flat_frame(PixelFormat::Nv12, 16, 16, 10);
        input
            .add_film_grain_params(FilmGrainParams::aom(luma_only(50), 1))
            .unwrap();
        let lenient = FilmGrainSynthesizer::new(SynthOptions {
            passthrough_on_unsupported: true,
            ..SynthOptions::default()
        });
        let out = lenient.synthesize(&input).unwrap();
        assert_eq!(out.planes(), input.planes());
        assert_eq!(out.film_grain_params().count(), 1);
    }
}
