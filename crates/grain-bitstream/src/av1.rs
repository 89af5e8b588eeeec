//! AV1 `film_grain_params()` frame header syntax.
//!
//! [`parse_film_grain_params`] reads the syntax elements in their coded form
//! ([`RawFilmGrainParams`]). Inter frames may reuse the parameters of a
//! reference frame; [`GrainReferenceSlots`] keeps the per-slot copies a
//! decoder needs to resolve them. [`RawFilmGrainParams::to_film_grain_params`]
//! converts the coded form into the synthesis model.
//!
//! # Usage
//!
//! ```rust,no_run
//! use grain_bitstream::av1::{FrameInfo, GrainReferenceSlots, SequenceInfo, parse_film_grain_params};
//! use grain_bitstream::reader::BitCursor;
//!
//! # let header: &[u8] = &[];
//! let seq = SequenceInfo::default();
//! let frame = FrameInfo::default();
//! let mut slots = GrainReferenceSlots::default();
//!
//! let mut r = BitCursor::new(header);
//! let coded = parse_film_grain_params(&mut r, &seq, &frame).unwrap();
//! let resolved = slots.load(&coded).unwrap();
//! slots.store(frame.refresh_frame_flags, &resolved);
//! let params = resolved.to_film_grain_params(&seq, &frame);
//! ```

use grain_core::color::ColorProperties;
use grain_core::params::{
    AomFilmGrain, FilmGrainParams, GrainCodec, MAX_UV_POINTS, MAX_Y_POINTS, NUM_UV_COEFFS,
    NUM_Y_COEFFS,
};
use tracing::{debug, trace};

use crate::reader::BitCursor;
use crate::{ParseError, ParseResult};

/// Number of reference frame slots.
pub const NUM_REF_FRAMES: usize = 8;

// ============================================================================
// Header context
// ============================================================================

/// Sequence header fields the grain syntax depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceInfo {
    /// `film_grain_params_present`.
    pub film_grain_params_present: bool,
    /// `mono_chrome`.
    pub mono_chrome: bool,
    /// `subsampling_x`.
    pub subsampling_x: bool,
    /// `subsampling_y`.
    pub subsampling_y: bool,
    /// Sample bit depth (8, 10 or 12).
    pub bit_depth: u8,
    /// Colour description of the sequence.
    pub color: ColorProperties,
}

impl Default for SequenceInfo {
    fn default() -> Self {
        Self {
            film_grain_params_present: true,
            mono_chrome: false,
            subsampling_x: true,
            subsampling_y: true,
            bit_depth: 8,
            color: ColorProperties::default(),
        }
    }
}

/// AV1 frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameType {
    /// `KEY_FRAME`
    #[default]
    Key,
    /// `INTER_FRAME`
    Inter,
    /// `INTRA_ONLY_FRAME`
    IntraOnly,
    /// `SWITCH_FRAME`
    Switch,
}

/// Frame header fields the grain syntax depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// `frame_type`.
    pub frame_type: FrameType,
    /// `show_frame`.
    pub show_frame: bool,
    /// `showable_frame`.
    pub showable_frame: bool,
    /// Upscaled frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// `refresh_frame_flags`.
    pub refresh_frame_flags: u8,
}

impl Default for FrameInfo {
    fn default() -> Self {
        Self {
            frame_type: FrameType::Key,
            show_frame: true,
            showable_frame: false,
            width: 0,
            height: 0,
            refresh_frame_flags: 0xFF,
        }
    }
}

// ============================================================================
// Coded parameters
// ============================================================================

/// `film_grain_params()` syntax elements as coded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilmGrainParams {
    /// `apply_grain`
    pub apply_grain: bool,
    /// `grain_seed`
    pub grain_seed: u16,
    /// `update_grain`
    pub update_grain: bool,
    /// `film_grain_params_ref_idx`
    pub film_grain_params_ref_idx: u8,
    /// `num_y_points`
    pub num_y_points: u8,
    /// `point_y_value`
    pub point_y_value: [u8; MAX_Y_POINTS],
    /// `point_y_scaling`
    pub point_y_scaling: [u8; MAX_Y_POINTS],
    /// `chroma_scaling_from_luma`
    pub chroma_scaling_from_luma: bool,
    /// `num_cb_points`
    pub num_cb_points: u8,
    /// `point_cb_value`
    pub point_cb_value: [u8; MAX_UV_POINTS],
    /// `point_cb_scaling`
    pub point_cb_scaling: [u8; MAX_UV_POINTS],
    /// `num_cr_points`
    pub num_cr_points: u8,
    /// `point_cr_value`
    pub point_cr_value: [u8; MAX_UV_POINTS],
    /// `point_cr_scaling`
    pub point_cr_scaling: [u8; MAX_UV_POINTS],
    /// `grain_scaling_minus_8`
    pub grain_scaling_minus_8: u8,
    /// `ar_coeff_lag`
    pub ar_coeff_lag: u8,
    /// `ar_coeffs_y_plus_128`
    pub ar_coeffs_y_plus_128: [u8; NUM_Y_COEFFS],
    /// `ar_coeffs_cb_plus_128`
    pub ar_coeffs_cb_plus_128: [u8; NUM_UV_COEFFS],
    /// `ar_coeffs_cr_plus_128`
    pub ar_coeffs_cr_plus_128: [u8; NUM_UV_COEFFS],
    /// `ar_coeff_shift_minus_6`
    pub ar_coeff_shift_minus_6: u8,
    /// `grain_scale_shift`
    pub grain_scale_shift: u8,
    /// `cb_mult`
    pub cb_mult: u8,
    /// `cb_luma_mult`
    pub cb_luma_mult: u8,
    /// `cb_offset`
    pub cb_offset: u16,
    /// `cr_mult`
    pub cr_mult: u8,
    /// `cr_luma_mult`
    pub cr_luma_mult: u8,
    /// `cr_offset`
    pub cr_offset: u16,
    /// `overlap_flag`
    pub overlap_flag: bool,
    /// `clip_to_restricted_range`
    pub clip_to_restricted_range: bool,
}

impl Default for RawFilmGrainParams {
    fn default() -> Self {
        Self {
            apply_grain: false,
            grain_seed: 0,
            update_grain: false,
            film_grain_params_ref_idx: 0,
            num_y_points: 0,
            point_y_value: [0; MAX_Y_POINTS],
            point_y_scaling: [0; MAX_Y_POINTS],
            chroma_scaling_from_luma: false,
            num_cb_points: 0,
            point_cb_value: [0; MAX_UV_POINTS],
            point_cb_scaling: [0; MAX_UV_POINTS],
            num_cr_points: 0,
            point_cr_value: [0; MAX_UV_POINTS],
            point_cr_scaling: [0; MAX_UV_POINTS],
            grain_scaling_minus_8: 0,
            ar_coeff_lag: 0,
            ar_coeffs_y_plus_128: [128; NUM_Y_COEFFS],
            ar_coeffs_cb_plus_128: [128; NUM_UV_COEFFS],
            ar_coeffs_cr_plus_128: [128; NUM_UV_COEFFS],
            ar_coeff_shift_minus_6: 0,
            grain_scale_shift: 0,
            cb_mult: 0,
            cb_luma_mult: 0,
            cb_offset: 0,
            cr_mult: 0,
            cr_luma_mult: 0,
            cr_offset: 0,
            overlap_flag: false,
            clip_to_restricted_range: false,
        }
    }
}

/// Reads `num` points with strictly increasing values.
fn read_points(
    r: &mut BitCursor<'_>,
    num: usize,
    values: &mut [u8],
    scaling: &mut [u8],
    what: &'static str,
) -> ParseResult<()> {
    for i in 0..num {
        values[i] = r.byte()?;
        if i > 0 && values[i] <= values[i - 1] {
            return Err(ParseError::InvalidData(what));
        }
        scaling[i] = r.byte()?;
    }
    Ok(())
}

/// Reads `film_grain_params()`.
///
/// Returns reset parameters (`apply_grain` unset) when the sequence carries no
/// grain or the frame is never shown.
pub fn parse_film_grain_params(
    r: &mut BitCursor<'_>,
    seq: &SequenceInfo,
    frame: &FrameInfo,
) -> ParseResult<RawFilmGrainParams> {
    let mut fg = RawFilmGrainParams::default();
    if !seq.film_grain_params_present || (!frame.show_frame && !frame.showable_frame) {
        return Ok(fg);
    }

    fg.apply_grain = r.bit()?;
    if !fg.apply_grain {
        return Ok(fg);
    }
    fg.grain_seed = r.bits(16)? as u16;
    fg.update_grain = if frame.frame_type == FrameType::Inter {
        r.bit()?
    } else {
        true
    };
    if !fg.update_grain {
        fg.film_grain_params_ref_idx = r.bits(3)? as u8;
        trace!(ref_idx = fg.film_grain_params_ref_idx, "film grain from reference");
        return Ok(fg);
    }

    fg.num_y_points = r.bits(4)? as u8;
    if usize::from(fg.num_y_points) > MAX_Y_POINTS {
        return Err(ParseError::InvalidData("num_y_points above 14"));
    }
    read_points(
        r,
        fg.num_y_points.into(),
        &mut fg.point_y_value,
        &mut fg.point_y_scaling,
        "point_y_value not increasing",
    )?;

    fg.chroma_scaling_from_luma = if seq.mono_chrome { false } else { r.bit()? };

    let no_chroma = seq.mono_chrome
        || fg.chroma_scaling_from_luma
        || (seq.subsampling_x && seq.subsampling_y && fg.num_y_points == 0);
    if !no_chroma {
        fg.num_cb_points = r.bits(4)? as u8;
        if usize::from(fg.num_cb_points) > MAX_UV_POINTS {
            return Err(ParseError::InvalidData("num_cb_points above 10"));
        }
        read_points(
            r,
            fg.num_cb_points.into(),
            &mut fg.point_cb_value,
            &mut fg.point_cb_scaling,
            "point_cb_value not increasing",
        )?;
        fg.num_cr_points = r.bits(4)? as u8;
        if usize::from(fg.num_cr_points) > MAX_UV_POINTS {
            return Err(ParseError::InvalidData("num_cr_points above 10"));
        }
        read_points(
            r,
            fg.num_cr_points.into(),
            &mut fg.point_cr_value,
            &mut fg.point_cr_scaling,
            "point_cr_value not increasing",
        )?;
        if seq.subsampling_x
            && seq.subsampling_y
            && (fg.num_cb_points == 0) != (fg.num_cr_points == 0)
        {
            return Err(ParseError::InvalidData("4:2:0 grain needs both or no chroma planes"));
        }
    }

    fg.grain_scaling_minus_8 = r.bits(2)? as u8;
    fg.ar_coeff_lag = r.bits(2)? as u8;
    let lag = usize::from(fg.ar_coeff_lag);
    let num_pos_luma = 2 * lag * (lag + 1);
    let num_pos_chroma = num_pos_luma + usize::from(fg.num_y_points > 0);

    if fg.num_y_points > 0 {
        for c in fg.ar_coeffs_y_plus_128.iter_mut().take(num_pos_luma) {
            *c = r.byte()?;
        }
    }
    if fg.chroma_scaling_from_luma || fg.num_cb_points > 0 {
        for c in fg.ar_coeffs_cb_plus_128.iter_mut().take(num_pos_chroma) {
            *c = r.byte()?;
        }
    }
    if fg.chroma_scaling_from_luma || fg.num_cr_points > 0 {
        for c in fg.ar_coeffs_cr_plus_128.iter_mut().take(num_pos_chroma) {
            *c = r.byte()?;
        }
    }

    fg.ar_coeff_shift_minus_6 = r.bits(2)? as u8;
    fg.grain_scale_shift = r.bits(2)? as u8;
    if fg.num_cb_points > 0 {
        fg.cb_mult = r.byte()?;
        fg.cb_luma_mult = r.byte()?;
        fg.cb_offset = r.bits(9)? as u16;
    }
    if fg.num_cr_points > 0 {
        fg.cr_mult = r.byte()?;
        fg.cr_luma_mult = r.byte()?;
        fg.cr_offset = r.bits(9)? as u16;
    }
    fg.overlap_flag = r.bit()?;
    fg.clip_to_restricted_range = r.bit()?;

    debug!(
        seed = fg.grain_seed,
        num_y_points = fg.num_y_points,
        num_cb_points = fg.num_cb_points,
        num_cr_points = fg.num_cr_points,
        lag = fg.ar_coeff_lag,
        "film_grain_params"
    );
    Ok(fg)
}

impl RawFilmGrainParams {
    /// Converts to the synthesis model, `None` when grain is off.
    ///
    /// Biased syntax elements are unbiased; the set is restricted to the
    /// frame size, bit depth, subsampling and colour description.
    pub fn to_film_grain_params(
        &self,
        seq: &SequenceInfo,
        frame: &FrameInfo,
    ) -> Option<FilmGrainParams> {
        if !self.apply_grain {
            return None;
        }
        let mut aom = AomFilmGrain {
            num_y_points: self.num_y_points,
            chroma_scaling_from_luma: self.chroma_scaling_from_luma,
            num_uv_points: [self.num_cb_points, self.num_cr_points],
            scaling_shift: self.grain_scaling_minus_8 + 8,
            ar_coeff_lag: self.ar_coeff_lag,
            ar_coeff_shift: self.ar_coeff_shift_minus_6 + 6,
            grain_scale_shift: self.grain_scale_shift,
            uv_mult: [i32::from(self.cb_mult) - 128, i32::from(self.cr_mult) - 128],
            uv_mult_luma: [
                i32::from(self.cb_luma_mult) - 128,
                i32::from(self.cr_luma_mult) - 128,
            ],
            uv_offset: [i32::from(self.cb_offset) - 256, i32::from(self.cr_offset) - 256],
            overlap_flag: self.overlap_flag,
            limit_output_range: self.clip_to_restricted_range,
            ..AomFilmGrain::default()
        };
        for i in 0..MAX_Y_POINTS {
            aom.y_points[i] = [self.point_y_value[i], self.point_y_scaling[i]];
        }
        for i in 0..MAX_UV_POINTS {
            aom.uv_points[0][i] = [self.point_cb_value[i], self.point_cb_scaling[i]];
            aom.uv_points[1][i] = [self.point_cr_value[i], self.point_cr_scaling[i]];
        }
        let unbias = |v: u8| (i32::from(v) - 128) as i8;
        for (dst, &src) in aom.ar_coeffs_y.iter_mut().zip(&self.ar_coeffs_y_plus_128) {
            *dst = unbias(src);
        }
        for (dst, &src) in aom.ar_coeffs_uv[0].iter_mut().zip(&self.ar_coeffs_cb_plus_128) {
            *dst = unbias(src);
        }
        for (dst, &src) in aom.ar_coeffs_uv[1].iter_mut().zip(&self.ar_coeffs_cr_plus_128) {
            *dst = unbias(src);
        }

        Some(FilmGrainParams {
            codec: GrainCodec::Aom(aom),
            seed: self.grain_seed,
            width: frame.width,
            height: frame.height,
            subsampling_x: u8::from(seq.subsampling_x),
            subsampling_y: u8::from(seq.subsampling_y),
            bit_depth_luma: seq.bit_depth,
            bit_depth_chroma: if seq.mono_chrome { 0 } else { seq.bit_depth },
            color: seq.color,
        })
    }
}

// ============================================================================
// Reference slots
// ============================================================================

/// Grain parameters saved with each reference frame slot.
#[derive(Debug, Clone, Default)]
pub struct GrainReferenceSlots {
    slots: [Option<RawFilmGrainParams>; NUM_REF_FRAMES],
}

impl GrainReferenceSlots {
    /// Resolves parameters that reuse a reference frame's grain.
    ///
    /// Parameters with `update_grain` set (or grain off) are returned as they
    /// are; otherwise the referenced slot is copied and given the new seed.
    ///
    /// # Errors
    ///
    /// [`ParseError::InvalidReference`] if the slot was never filled.
    pub fn load(&self, coded: &RawFilmGrainParams) -> ParseResult<RawFilmGrainParams> {
        if !coded.apply_grain || coded.update_grain {
            return Ok(coded.clone());
        }
        let idx = coded.film_grain_params_ref_idx;
        let stored = self
            .slots
            .get(usize::from(idx))
            .and_then(Option::as_ref)
            .ok_or(ParseError::InvalidReference { set: idx })?;
        Ok(RawFilmGrainParams {
            grain_seed: coded.grain_seed,
            ..stored.clone()
        })
    }

    /// Saves `params` into every slot named by `refresh_frame_flags`.
    pub fn store(&mut self, refresh_frame_flags: u8, params: &RawFilmGrainParams) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if refresh_frame_flags & (1 << i) != 0 {
                *slot = Some(params.clone());
            }
        }
    }

    /// Stored parameters of slot `idx`.
    pub fn get(&self, idx: usize) -> Option<&RawFilmGrainParams> {
        self.slots.get(idx).and_then(Option::as_ref)
    }
}
