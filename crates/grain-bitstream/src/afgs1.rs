//! AOM film grain synthesis (AFGS1) parameter sets.
//!
//! AFGS1 carries up to eight AOM grain parameter sets out of band, typically
//! in ITU-T T.35 metadata. Each set is restricted to a maximum frame size and
//! optionally to a bit depth and colour description, so one payload can serve
//! several renditions of the same content.
//!
//! The state is cumulative: a set may keep its previous model and only
//! change the seed, and the first fully transmitted set of a payload can serve
//! as a prediction reference for the scaling points of later ones.
//!
//! # Usage
//!
//! ```rust,no_run
//! use grain_bitstream::afgs1::{FilmGrainSets, attach_film_grain_sets};
//! use grain_core::{Frame, PixelFormat};
//!
//! # fn payload() -> Vec<u8> { Vec::new() }
//! let mut sets = FilmGrainSets::default();
//! sets.update(&payload()).unwrap();
//!
//! let mut frame = Frame::new(PixelFormat::Yuv420p10, 1920, 1080).unwrap();
//! attach_film_grain_sets(&sets, &mut frame).unwrap();
//! ```

use grain_core::color::{
    ColorPrimaries, ColorProperties, ColorRange, MatrixCoefficients, TransferCharacteristics,
};
use grain_core::params::{
    AomFilmGrain, FilmGrainParams, GrainCodec, MAX_GRAIN_SETS, MAX_UV_POINTS, MAX_Y_POINTS,
};
use grain_core::Frame;
use tracing::{debug, trace, warn};

use crate::reader::BitCursor;
use crate::{ParseError, ParseResult};

/// Cumulative AFGS1 state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilmGrainSets {
    /// Grain synthesis is switched on.
    pub enable: bool,
    /// Parameter sets by index; unused slots have codec `None`.
    pub sets: [FilmGrainParams; MAX_GRAIN_SETS],
}

impl FilmGrainSets {
    /// Applies one AFGS1 payload.
    ///
    /// # Errors
    ///
    /// Any syntax violation resets every set and returns the error.
    pub fn update(&mut self, payload: &[u8]) -> ParseResult<()> {
        match self.parse(payload) {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "discarding film grain sets");
                *self = Self::default();
                Err(e)
            }
        }
    }

    /// Sets carrying an AOM model, with their indices.
    pub fn active_sets(&self) -> impl Iterator<Item = (usize, &FilmGrainParams)> {
        self.sets
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.codec, GrainCodec::Aom(_)))
    }

    fn parse(&mut self, payload: &[u8]) -> ParseResult<()> {
        let mut r = BitCursor::new(payload);

        self.enable = r.bit()?;
        if !self.enable {
            trace!("film grain sets disabled");
            return Ok(());
        }
        r.skip(4)?;
        let num_sets = r.bits(3)? as usize + 1;
        let mut reference: Option<(usize, AomFilmGrain)> = None;

        for n in 0..num_sets {
            let start = r.position();
            let size_is_small = r.bit()?;
            let payload_size = u64::from(r.bits(if size_is_small { 2 } else { 8 })?);
            let set_idx = r.bits(3)? as usize;
            let end = start + payload_size * 8;

            let complete = self.parse_set(&mut r, set_idx, reference.as_ref())?;
            if n == 0 && complete {
                if let GrainCodec::Aom(aom) = &self.sets[set_idx].codec {
                    reference = Some((set_idx, aom.clone()));
                }
            }

            let used = r.position();
            if used > end {
                return Err(ParseError::InvalidData("set exceeds its declared size"));
            }
            r.skip(end - used)?;
        }

        debug!(
            num_sets,
            active = self.active_sets().count(),
            "parsed film grain sets"
        );
        Ok(())
    }

    /// Parses the body of set `idx`. Returns `true` when the model was
    /// transmitted in full.
    fn parse_set(
        &mut self,
        r: &mut BitCursor<'_>,
        idx: usize,
        reference: Option<&(usize, AomFilmGrain)>,
    ) -> ParseResult<bool> {
        if !r.bit()? {
            self.sets[idx] = FilmGrainParams::default();
            return Ok(false);
        }
        let seed = r.bits(16)? as u16;
        if !r.bit()? {
            // Keep the stored model, new seed.
            let set = &mut self.sets[idx];
            if !matches!(set.codec, GrainCodec::Aom(_)) {
                set.codec = GrainCodec::Aom(AomFilmGrain::default());
            }
            set.seed = seed;
            return Ok(false);
        }

        let mut set = FilmGrainParams {
            seed,
            ..FilmGrainParams::default()
        };
        let units = r.bits(4)?;
        set.width = r.bits(12)? << units;
        set.height = r.bits(12)? << units;

        let luma_only = r.bit()?;
        if !luma_only {
            // bit 0: horizontal, bit 1: vertical. Vertical-only is reserved.
            let subsampling = r.bits(2)?;
            if subsampling == 2 {
                return Err(ParseError::Reserved("subsampling"));
            }
            set.subsampling_x = (subsampling & 1) as u8;
            set.subsampling_y = (subsampling >> 1) as u8;
        }

        if r.bit()? {
            set.bit_depth_luma = r.bits(3)? as u8 + 8;
            if !luma_only {
                set.bit_depth_chroma = set.bit_depth_luma;
            }
            if r.bit()? {
                set.color = read_cicp(r)?;
            }
        }

        let predict_scaling = r.bit()?;
        let reference = match reference {
            Some((ref_idx, aom)) if predict_scaling && *ref_idx != idx => Some(aom),
            _ if predict_scaling => {
                return Err(ParseError::InvalidReference { set: idx as u8 });
            }
            _ => None,
        };

        let mut aom = AomFilmGrain::default();
        read_luma_points(r, &mut aom, reference)?;
        let predicted_uv = read_chroma_points(r, &mut aom, reference, luma_only)?;
        read_model(r, &mut aom, predicted_uv)?;

        set.codec = GrainCodec::Aom(aom);
        self.sets[idx] = set;
        Ok(true)
    }
}

/// Parses a payload into a fresh state.
///
/// # Example
///
/// ```rust
/// use grain_bitstream::afgs1::parse_film_grain_sets;
///
/// let sets = parse_film_grain_sets(&[0x00]).unwrap();
/// assert!(!sets.enable);
/// ```
pub fn parse_film_grain_sets(payload: &[u8]) -> ParseResult<FilmGrainSets> {
    let mut sets = FilmGrainSets::default();
    sets.update(payload)?;
    Ok(sets)
}

/// Attaches every AOM set of an enabled state to `frame`.
///
/// # Errors
///
/// [`ParseError::OutOfMemory`] if the side data list cannot grow.
pub fn attach_film_grain_sets(sets: &FilmGrainSets, frame: &mut Frame) -> ParseResult<()> {
    if !sets.enable {
        return Ok(());
    }
    for (idx, set) in sets.active_sets() {
        trace!(idx, width = set.width, height = set.height, "attach film grain set");
        frame.add_film_grain_params(set.clone())?;
    }
    Ok(())
}

// ============================================================================
// Field groups
// ============================================================================

fn read_cicp(r: &mut BitCursor<'_>) -> ParseResult<ColorProperties> {
    let color = ColorProperties {
        primaries: ColorPrimaries(r.byte()?),
        transfer: TransferCharacteristics(r.byte()?),
        matrix: MatrixCoefficients(r.byte()?),
        range: ColorRange::from_full_range_flag(r.bit()?),
    };
    if color.primaries.is_reserved() {
        return Err(ParseError::Reserved("color primaries"));
    }
    if color.transfer.is_reserved() {
        return Err(ParseError::Reserved("transfer characteristics"));
    }
    if color.matrix.is_reserved() {
        return Err(ParseError::Reserved("matrix coefficients"));
    }
    Ok(color)
}

/// Scaling values predicted from `ref_points` with an optional residual.
fn predict_points(
    r: &mut BitCursor<'_>,
    ref_points: &[[u8; 2]],
    out: &mut [[u8; 2]],
) -> ParseResult<()> {
    let scale = r.signed_offset(9, 256)?;
    let offset = r.signed_offset(9, 256)?;
    let bits_res = r.bits(3)?;

    let mut residuals = [0i32; MAX_Y_POINTS];
    let mut granularity = 0;
    if bits_res > 0 {
        for res in residuals.iter_mut().take(ref_points.len()) {
            *res = r.bits(bits_res)? as i32 - (1 << (bits_res - 1));
        }
        granularity = r.bits(3)? as i32;
    }

    for ((dst, src), res) in out.iter_mut().zip(ref_points).zip(residuals) {
        let pred = ((i32::from(src[1]) * scale + 8) >> 4) + offset + res * granularity;
        *dst = [src[0], pred.clamp(0, 255) as u8];
    }
    Ok(())
}

/// Explicit points: x as increments, y with `offset` added.
fn explicit_points(
    r: &mut BitCursor<'_>,
    out: &mut [[u8; 2]],
    bits_inc: u32,
    bits_scaling: u32,
    offset: u32,
) -> ParseResult<()> {
    let mut x = 0u32;
    for point in out.iter_mut() {
        x += r.bits(bits_inc)?;
        if x > 255 {
            return Err(ParseError::InvalidData("scaling point value above 255"));
        }
        let y = r.bits(bits_scaling)? + offset;
        if y > 255 {
            return Err(ParseError::InvalidData("scaling point strength above 255"));
        }
        *point = [x as u8, y as u8];
    }
    Ok(())
}

fn read_luma_points(
    r: &mut BitCursor<'_>,
    aom: &mut AomFilmGrain,
    reference: Option<&AomFilmGrain>,
) -> ParseResult<()> {
    if let Some(ref_aom) = reference {
        if r.bit()? {
            aom.num_y_points = ref_aom.num_y_points;
            let n = ref_aom.y_points().len();
            return predict_points(r, ref_aom.y_points(), &mut aom.y_points[..n]);
        }
    }

    let num = r.bits(4)? as usize;
    if num > MAX_Y_POINTS {
        return Err(ParseError::InvalidData("too many luma scaling points"));
    }
    aom.num_y_points = num as u8;
    if num > 0 {
        let bits_inc = r.bits(3)? + 1;
        let bits_scaling = r.bits(2)? + 5;
        explicit_points(r, &mut aom.y_points[..num], bits_inc, bits_scaling, 0)?;
    }
    Ok(())
}

/// Returns which chroma planes were predicted.
fn read_chroma_points(
    r: &mut BitCursor<'_>,
    aom: &mut AomFilmGrain,
    reference: Option<&AomFilmGrain>,
    luma_only: bool,
) -> ParseResult<[bool; 2]> {
    let mut predicted = [false; 2];
    if luma_only {
        return Ok(predicted);
    }
    aom.chroma_scaling_from_luma = r.bit()?;
    if aom.chroma_scaling_from_luma {
        return Ok(predicted);
    }

    for uv in 0..2 {
        if reference.is_some() {
            predicted[uv] = r.bit()?;
        }
        if let (true, Some(ref_aom)) = (predicted[uv], reference) {
            aom.uv_mult[uv] = ref_aom.uv_mult[uv];
            aom.uv_mult_luma[uv] = ref_aom.uv_mult_luma[uv];
            aom.uv_offset[uv] = ref_aom.uv_offset[uv];
            aom.num_uv_points[uv] = ref_aom.num_uv_points[uv];
            let n = ref_aom.uv_points(uv).len();
            predict_points(r, ref_aom.uv_points(uv), &mut aom.uv_points[uv][..n])?;
            continue;
        }

        let num = r.bits(4)? as usize;
        if num > MAX_UV_POINTS {
            return Err(ParseError::InvalidData("too many chroma scaling points"));
        }
        aom.num_uv_points[uv] = num as u8;
        let bits_inc = r.bits(3)? + 1;
        let bits_scaling = r.bits(2)? + 5;
        let offset = r.bits(8)?;
        explicit_points(r, &mut aom.uv_points[uv][..num], bits_inc, bits_scaling, offset)?;
    }
    Ok(predicted)
}

/// Shifts, AR model and chroma index mapping.
fn read_model(r: &mut BitCursor<'_>, aom: &mut AomFilmGrain, predicted_uv: [bool; 2]) -> ParseResult<()> {
    aom.scaling_shift = r.bits(2)? as u8 + 8;
    aom.ar_coeff_lag = r.bits(2)? as u8;
    let num_pos = aom.num_pos_luma();

    if aom.num_y_points > 0 {
        let ar_bits = r.bits(2)? + 5;
        for c in aom.ar_coeffs_y.iter_mut().take(num_pos) {
            *c = r.signed_offset(ar_bits, 1 << (ar_bits - 1))? as i8;
        }
    }
    let num_pos_uv = num_pos + usize::from(aom.num_y_points > 0);
    for uv in 0..2 {
        if aom.chroma_scaling_from_luma || aom.num_uv_points[uv] > 0 {
            let ar_bits = r.bits(2)? + 5;
            for c in aom.ar_coeffs_uv[uv].iter_mut().take(num_pos_uv) {
                *c = r.signed_offset(ar_bits, 1 << (ar_bits - 1))? as i8;
            }
        }
    }

    aom.ar_coeff_shift = r.bits(2)? as u8 + 6;
    aom.grain_scale_shift = r.bits(2)? as u8;
    for uv in 0..2 {
        if aom.num_uv_points[uv] > 0 && !predicted_uv[uv] {
            aom.uv_mult[uv] = r.signed_offset(8, 128)?;
            aom.uv_mult_luma[uv] = r.signed_offset(8, 128)?;
            aom.uv_offset[uv] = r.signed_offset(9, 256)?;
        }
    }
    aom.overlap_flag = r.bit()?;
    aom.limit_output_range = r.bit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_payload() {
        let sets = parse_film_grain_sets(&[0x7F]).unwrap();
        assert!(!sets.enable);
        assert_eq!(sets.active_sets().count(), 0);
    }

    #[test]
    fn test_empty_payload_is_truncated() {
        assert!(matches!(
            parse_film_grain_sets(&[]),
            Err(ParseError::Truncated { .. })
        ));
    }

    #[test]
    fn test_error_resets_state() {
        let mut sets = FilmGrainSets {
            enable: true,
            ..FilmGrainSets::default()
        };
        sets.sets[2] = FilmGrainParams::aom(AomFilmGrain::default(), 9);
        // enable, reserved, one set, then nothing.
        assert!(sets.update(&[0b1000_0000]).is_err());
        assert_eq!(sets, FilmGrainSets::default());
    }

    #[test]
    fn test_predict_points_clamps() {
        // scale +32 (x2), offset +0, no residual.
        let payload = [0b1001_0000, 0b0100_0000, 0b0000_0000];
        let mut r = BitCursor::new(&payload);
        let mut out = [[0u8; 2]; 2];
        predict_points(&mut r, &[[10, 100], [200, 200]], &mut out).unwrap();
        assert_eq!(out, [[10, 200], [200, 255]]);
        assert_eq!(r.position(), 21);
    }
}
