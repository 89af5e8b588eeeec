//! Film grain parameter data model.
//!
//! [`FilmGrainParams`] is what travels with a frame as side data: the seed,
//! the applicability constraints (size, subsampling, bit depth, colour) and
//! the codec-specific model. Only the AOM/AV1 model is defined here
//! ([`AomFilmGrain`]).
//!
//! # Configuration
//!
//! With the `serde` feature, parameters load from YAML. Point lists and
//! coefficient lists are written as plain sequences; their counts are
//! implied by the sequence lengths:
//!
//! ```rust
//! # #[cfg(feature = "serde")] {
//! use grain_core::params::AomFilmGrain;
//!
//! let yaml = "
//! y_points: [[0, 20], [255, 40]]
//! scaling_shift: 10
//! ar_coeff_lag: 1
//! ar_coeffs_y: [4, -8, 4, 10]
//! overlap_flag: true
//! ";
//! let p: AomFilmGrain = serde_yaml::from_str(yaml).unwrap();
//! assert_eq!(p.num_y_points, 2);
//! assert_eq!(p.ar_coeffs_y[3], 10);
//! p.validate().unwrap();
//! # }
//! ```

use crate::color::ColorProperties;
use crate::{Error, Result};

/// Maximum luma scaling points.
pub const MAX_Y_POINTS: usize = 14;
/// Maximum scaling points per chroma plane.
pub const MAX_UV_POINTS: usize = 10;
/// Luma AR taps at lag 3.
pub const NUM_Y_COEFFS: usize = 24;
/// Chroma AR taps at lag 3, including the luma term.
pub const NUM_UV_COEFFS: usize = 25;
/// Parameter sets a single AFGS1 message can carry.
pub const MAX_GRAIN_SETS: usize = 8;

// ============================================================================
// AOM model
// ============================================================================

/// AOM/AV1 film grain model (AV1 bitstream section 6.8.20, unbiased).
///
/// Points are `[value, scaling]` pairs; only the first `num_*_points` entries
/// are meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "doc::AomFilmGrainDoc", into = "doc::AomFilmGrainDoc")
)]
pub struct AomFilmGrain {
    /// Luma scaling points in use (0..=14).
    pub num_y_points: u8,
    /// Luma scaling function, x strictly increasing.
    pub y_points: [[u8; 2]; MAX_Y_POINTS],
    /// Chroma noise is scaled by the luma scaling function.
    pub chroma_scaling_from_luma: bool,
    /// Scaling points in use per chroma plane (0..=10).
    pub num_uv_points: [u8; 2],
    /// Chroma scaling functions.
    pub uv_points: [[[u8; 2]; MAX_UV_POINTS]; 2],
    /// Shift applied to `scaling * grain` (8..=11).
    pub scaling_shift: u8,
    /// AR neighbourhood radius (0..=3).
    pub ar_coeff_lag: u8,
    /// Luma AR coefficients.
    pub ar_coeffs_y: [i8; NUM_Y_COEFFS],
    /// Chroma AR coefficients; the tap after the spatial ones weights luma.
    pub ar_coeffs_uv: [[i8; NUM_UV_COEFFS]; 2],
    /// AR accumulator shift (6..=9).
    pub ar_coeff_shift: u8,
    /// Extra down-shift of the Gaussian draws (0..=3).
    pub grain_scale_shift: u8,
    /// Chroma sample weight in the chroma scaling index (-128..=127).
    pub uv_mult: [i32; 2],
    /// Luma sample weight in the chroma scaling index (-128..=127).
    pub uv_mult_luma: [i32; 2],
    /// Offset of the chroma scaling index (-256..=255).
    pub uv_offset: [i32; 2],
    /// Blend grain across block edges.
    pub overlap_flag: bool,
    /// Clip output to studio range.
    pub limit_output_range: bool,
}

impl Default for AomFilmGrain {
    fn default() -> Self {
        Self {
            num_y_points: 0,
            y_points: [[0; 2]; MAX_Y_POINTS],
            chroma_scaling_from_luma: false,
            num_uv_points: [0; 2],
            uv_points: [[[0; 2]; MAX_UV_POINTS]; 2],
            scaling_shift: 8,
            ar_coeff_lag: 0,
            ar_coeffs_y: [0; NUM_Y_COEFFS],
            ar_coeffs_uv: [[0; NUM_UV_COEFFS]; 2],
            ar_coeff_shift: 6,
            grain_scale_shift: 0,
            uv_mult: [0; 2],
            uv_mult_luma: [0; 2],
            uv_offset: [0; 2],
            overlap_flag: false,
            limit_output_range: false,
        }
    }
}

impl AomFilmGrain {
    /// Active luma points.
    #[inline]
    pub fn y_points(&self) -> &[[u8; 2]] {
        &self.y_points[..(self.num_y_points as usize).min(MAX_Y_POINTS)]
    }

    /// Active points of chroma plane `uv` (0 = Cb, 1 = Cr).
    #[inline]
    pub fn uv_points(&self, uv: usize) -> &[[u8; 2]] {
        &self.uv_points[uv][..(self.num_uv_points[uv] as usize).min(MAX_UV_POINTS)]
    }

    /// Number of spatial AR taps for the current lag.
    #[inline]
    pub fn num_pos_luma(&self) -> usize {
        let lag = self.ar_coeff_lag as usize;
        2 * lag * (lag + 1)
    }

    /// Whether grain is applied to luma.
    #[inline]
    pub fn luma_active(&self) -> bool {
        self.num_y_points > 0
    }

    /// Whether grain is applied to chroma plane `uv`.
    #[inline]
    pub fn chroma_active(&self, uv: usize) -> bool {
        self.num_uv_points[uv] > 0 || self.chroma_scaling_from_luma
    }

    /// Checks every field against the bounds of the AV1 grammar.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParams`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.num_y_points as usize > MAX_Y_POINTS {
            return Err(Error::invalid_params(format!(
                "num_y_points {} exceeds {}",
                self.num_y_points, MAX_Y_POINTS
            )));
        }
        check_increasing("y_points", self.y_points())?;
        for uv in 0..2 {
            if self.num_uv_points[uv] as usize > MAX_UV_POINTS {
                return Err(Error::invalid_params(format!(
                    "num_uv_points[{}] {} exceeds {}",
                    uv, self.num_uv_points[uv], MAX_UV_POINTS
                )));
            }
            check_increasing("uv_points", self.uv_points(uv))?;
        }
        if self.chroma_scaling_from_luma && self.num_uv_points != [0, 0] {
            return Err(Error::invalid_params(
                "chroma_scaling_from_luma requires empty chroma point lists",
            ));
        }
        check_range("scaling_shift", self.scaling_shift as i32, 8, 11)?;
        check_range("ar_coeff_lag", self.ar_coeff_lag as i32, 0, 3)?;
        check_range("ar_coeff_shift", self.ar_coeff_shift as i32, 6, 9)?;
        check_range("grain_scale_shift", self.grain_scale_shift as i32, 0, 3)?;
        for uv in 0..2 {
            check_range("uv_mult", self.uv_mult[uv], -128, 127)?;
            check_range("uv_mult_luma", self.uv_mult_luma[uv], -128, 127)?;
            check_range("uv_offset", self.uv_offset[uv], -256, 255)?;
        }
        Ok(())
    }

    /// Returns a copy with every count and shift clamped into its legal range.
    ///
    /// The result can always be fed to the synthesis engine without indexing
    /// out of bounds, whatever the input. Point ordering is left alone.
    pub fn sanitized(&self) -> Self {
        let mut p = self.clone();
        p.num_y_points = p.num_y_points.min(MAX_Y_POINTS as u8);
        for uv in 0..2 {
            p.num_uv_points[uv] = p.num_uv_points[uv].min(MAX_UV_POINTS as u8);
            p.uv_mult[uv] = p.uv_mult[uv].clamp(-128, 127);
            p.uv_mult_luma[uv] = p.uv_mult_luma[uv].clamp(-128, 127);
            p.uv_offset[uv] = p.uv_offset[uv].clamp(-256, 255);
        }
        if p.chroma_scaling_from_luma {
            p.num_uv_points = [0, 0];
        }
        p.scaling_shift = p.scaling_shift.clamp(8, 11);
        p.ar_coeff_lag = p.ar_coeff_lag.min(3);
        p.ar_coeff_shift = p.ar_coeff_shift.clamp(6, 9);
        p.grain_scale_shift = p.grain_scale_shift.min(3);
        p
    }
}

fn check_increasing(field: &str, points: &[[u8; 2]]) -> Result<()> {
    if points.windows(2).any(|w| w[1][0] <= w[0][0]) {
        return Err(Error::invalid_params(format!(
            "{} values must be strictly increasing",
            field
        )));
    }
    Ok(())
}

fn check_range(field: &str, value: i32, min: i32, max: i32) -> Result<()> {
    if value < min || value > max {
        return Err(Error::invalid_params(format!(
            "{} = {} outside {}..={}",
            field, value, min, max
        )));
    }
    Ok(())
}

// ============================================================================
// Codec-independent wrapper
// ============================================================================

/// Grain model of a parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GrainCodec {
    /// No grain: the set disables synthesis.
    #[default]
    None,
    /// AOM/AV1 model.
    Aom(AomFilmGrain),
}

/// One film grain parameter set attached to a frame.
///
/// `width`, `height` and the bit depths use 0 for "any"; colour fields use
/// their unspecified code points the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FilmGrainParams {
    /// Grain model.
    pub codec: GrainCodec,
    /// RNG seed for this frame.
    pub seed: u16,
    /// Largest frame width the set applies to (0 = any).
    pub width: u32,
    /// Largest frame height the set applies to (0 = any).
    pub height: u32,
    /// log2 horizontal chroma subsampling the set was designed for.
    pub subsampling_x: u8,
    /// log2 vertical chroma subsampling the set was designed for.
    pub subsampling_y: u8,
    /// Luma bit depth (0 = any).
    pub bit_depth_luma: u8,
    /// Chroma bit depth (0 = any).
    pub bit_depth_chroma: u8,
    /// Colour description (unspecified fields match anything).
    pub color: ColorProperties,
}

impl FilmGrainParams {
    /// AOM parameter set with no size, depth or colour restriction.
    ///
    /// Subsampling is left at 4:4:4; set `subsampling_x`/`subsampling_y`
    /// before attaching the set to subsampled frames, since selection
    /// requires an exact match.
    pub fn aom(params: AomFilmGrain, seed: u16) -> Self {
        Self {
            codec: GrainCodec::Aom(params),
            seed,
            ..Default::default()
        }
    }

    /// AOM model, if that is the codec.
    #[inline]
    pub fn aom_params(&self) -> Option<&AomFilmGrain> {
        match &self.codec {
            GrainCodec::Aom(p) => Some(p),
            GrainCodec::None => None,
        }
    }

    /// Mutable AOM model, if that is the codec.
    #[inline]
    pub fn aom_params_mut(&mut self) -> Option<&mut AomFilmGrain> {
        match &mut self.codec {
            GrainCodec::Aom(p) => Some(p),
            GrainCodec::None => None,
        }
    }
}

// ============================================================================
// Sequence form used for serde
// ============================================================================

#[cfg(feature = "serde")]
mod doc {
    use super::*;

    fn is_zero(v: &i32) -> bool {
        *v == 0
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(default)]
    pub(super) struct AomFilmGrainDoc {
        y_points: Vec<[u8; 2]>,
        chroma_scaling_from_luma: bool,
        cb_points: Vec<[u8; 2]>,
        cr_points: Vec<[u8; 2]>,
        scaling_shift: u8,
        ar_coeff_lag: u8,
        ar_coeffs_y: Vec<i8>,
        ar_coeffs_cb: Vec<i8>,
        ar_coeffs_cr: Vec<i8>,
        ar_coeff_shift: u8,
        grain_scale_shift: u8,
        #[serde(skip_serializing_if = "is_zero")]
        cb_mult: i32,
        #[serde(skip_serializing_if = "is_zero")]
        cb_mult_luma: i32,
        #[serde(skip_serializing_if = "is_zero")]
        cb_offset: i32,
        #[serde(skip_serializing_if = "is_zero")]
        cr_mult: i32,
        #[serde(skip_serializing_if = "is_zero")]
        cr_mult_luma: i32,
        #[serde(skip_serializing_if = "is_zero")]
        cr_offset: i32,
        overlap_flag: bool,
        limit_output_range: bool,
    }

    impl Default for AomFilmGrainDoc {
        fn default() -> Self {
            AomFilmGrain::default().into()
        }
    }

    impl From<AomFilmGrain> for AomFilmGrainDoc {
        fn from(p: AomFilmGrain) -> Self {
            let taps = p.num_pos_luma();
            let uv_taps = taps + usize::from(p.luma_active());
            Self {
                y_points: p.y_points().to_vec(),
                chroma_scaling_from_luma: p.chroma_scaling_from_luma,
                cb_points: p.uv_points(0).to_vec(),
                cr_points: p.uv_points(1).to_vec(),
                scaling_shift: p.scaling_shift,
                ar_coeff_lag: p.ar_coeff_lag,
                ar_coeffs_y: p.ar_coeffs_y[..taps.min(NUM_Y_COEFFS)].to_vec(),
                ar_coeffs_cb: p.ar_coeffs_uv[0][..uv_taps.min(NUM_UV_COEFFS)].to_vec(),
                ar_coeffs_cr: p.ar_coeffs_uv[1][..uv_taps.min(NUM_UV_COEFFS)].to_vec(),
                ar_coeff_shift: p.ar_coeff_shift,
                grain_scale_shift: p.grain_scale_shift,
                cb_mult: p.uv_mult[0],
                cb_mult_luma: p.uv_mult_luma[0],
                cb_offset: p.uv_offset[0],
                cr_mult: p.uv_mult[1],
                cr_mult_luma: p.uv_mult_luma[1],
                cr_offset: p.uv_offset[1],
                overlap_flag: p.overlap_flag,
                limit_output_range: p.limit_output_range,
            }
        }
    }

    fn copy_points<const N: usize>(
        field: &str,
        src: &[[u8; 2]],
        dst: &mut [[u8; 2]; N],
    ) -> std::result::Result<u8, String> {
        if src.len() > N {
            return Err(format!("{}: at most {} points, got {}", field, N, src.len()));
        }
        dst[..src.len()].copy_from_slice(src);
        Ok(src.len() as u8)
    }

    fn copy_coeffs<const N: usize>(
        field: &str,
        src: &[i8],
        dst: &mut [i8; N],
    ) -> std::result::Result<(), String> {
        if src.len() > N {
            return Err(format!("{}: at most {} coefficients, got {}", field, N, src.len()));
        }
        dst[..src.len()].copy_from_slice(src);
        Ok(())
    }

    impl TryFrom<AomFilmGrainDoc> for AomFilmGrain {
        type Error = String;

        fn try_from(d: AomFilmGrainDoc) -> std::result::Result<Self, Self::Error> {
            let mut p = AomFilmGrain::default();
            p.num_y_points = copy_points("y_points", &d.y_points, &mut p.y_points)?;
            p.num_uv_points[0] = copy_points("cb_points", &d.cb_points, &mut p.uv_points[0])?;
            p.num_uv_points[1] = copy_points("cr_points", &d.cr_points, &mut p.uv_points[1])?;
            copy_coeffs("ar_coeffs_y", &d.ar_coeffs_y, &mut p.ar_coeffs_y)?;
            copy_coeffs("ar_coeffs_cb", &d.ar_coeffs_cb, &mut p.ar_coeffs_uv[0])?;
            copy_coeffs("ar_coeffs_cr", &d.ar_coeffs_cr, &mut p.ar_coeffs_uv[1])?;
            p.chroma_scaling_from_luma = d.chroma_scaling_from_luma;
            p.scaling_shift = d.scaling_shift;
            p.ar_coeff_lag = d.ar_coeff_lag;
            p.ar_coeff_shift = d.ar_coeff_shift;
            p.grain_scale_shift = d.grain_scale_shift;
            p.uv_mult = [d.cb_mult, d.cr_mult];
            p.uv_mult_luma = [d.cb_mult_luma, d.cr_mult_luma];
            p.uv_offset = [d.cb_offset, d.cr_offset];
            p.overlap_flag = d.overlap_flag;
            p.limit_output_range = d.limit_output_range;
            Ok(p)
        }
    }
}
