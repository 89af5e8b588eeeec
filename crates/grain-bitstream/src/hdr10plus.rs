//! HDR10+ dynamic metadata (SMPTE ST 2094-40, application 4).
//!
//! Parsed from the T.35 payload starting at `application_version`. Rational
//! values are kept as their coded numerators; each has a fixed denominator
//! constant and an `f64` accessor.

use tracing::debug;

use crate::reader::BitCursor;
use crate::{ParseError, ParseResult};

/// Denominator of the targeted system display maximum luminance (nits).
pub const LUMINANCE_DEN: u32 = 10_000;
/// Denominator of the actual peak luminance matrix entries.
pub const PEAK_LUMINANCE_DEN: u32 = 15;
/// Denominator of maxscl, average maxrgb and percentile values.
pub const MAXRGB_DEN: u32 = 100_000;
/// Denominator of the bright pixel fraction.
pub const FRACTION_BRIGHT_DEN: u32 = 1_000;
/// Denominator of the knee point coordinates.
pub const KNEE_POINT_DEN: u32 = 4_095;
/// Denominator of the Bezier curve anchors.
pub const BEZIER_ANCHOR_DEN: u32 = 1_023;
/// Denominator of the colour saturation weight.
pub const SATURATION_WEIGHT_DEN: u32 = 8;

/// Largest number of processing windows.
pub const MAX_WINDOWS: usize = 3;

/// Ellipse geometry of a processing window other than the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowGeometry {
    /// Upper left corner (x, y).
    pub upper_left: (u16, u16),
    /// Lower right corner (x, y).
    pub lower_right: (u16, u16),
    /// Ellipse centre (x, y).
    pub center_of_ellipse: (u16, u16),
    /// Clockwise rotation, 0..=179 degrees.
    pub rotation_angle: u8,
    /// Internal ellipse semi-major axis.
    pub semimajor_axis_internal: u16,
    /// External ellipse semi-major axis.
    pub semimajor_axis_external: u16,
    /// External ellipse semi-minor axis.
    pub semiminor_axis_external: u16,
    /// Overlapping windows are layered rather than weighted.
    pub overlap_process_layering: bool,
}

/// One point of the maxrgb distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Percentile {
    /// Percentage, 0..=100.
    pub percentage: u8,
    /// Linearized maxrgb value over [`MAXRGB_DEN`].
    pub percentile: u32,
}

/// Tone mapping curve of a window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToneMapping {
    /// Knee point x over [`KNEE_POINT_DEN`].
    pub knee_point_x: u16,
    /// Knee point y over [`KNEE_POINT_DEN`].
    pub knee_point_y: u16,
    /// Bezier anchors over [`BEZIER_ANCHOR_DEN`], at most 15.
    pub bezier_curve_anchors: Vec<u16>,
}

/// Per-window statistics and mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HdrPlusWindow {
    /// Geometry; `None` for the first window, which covers the frame.
    pub geometry: Option<WindowGeometry>,
    /// Maximum of each of R, G, B over [`MAXRGB_DEN`].
    pub maxscl: [u32; 3],
    /// Average maxrgb over [`MAXRGB_DEN`].
    pub average_maxrgb: u32,
    /// Maxrgb distribution, at most 15 points.
    pub distribution_maxrgb: Vec<Percentile>,
    /// Fraction of bright pixels over [`FRACTION_BRIGHT_DEN`].
    pub fraction_bright_pixels: u16,
    /// Tone mapping curve, if transmitted.
    pub tone_mapping: Option<ToneMapping>,
    /// Colour saturation weight over [`SATURATION_WEIGHT_DEN`], if transmitted.
    pub color_saturation_weight: Option<u8>,
}

impl HdrPlusWindow {
    /// Maxscl per component as a fraction.
    pub fn maxscl_f64(&self) -> [f64; 3] {
        self.maxscl.map(|v| f64::from(v) / f64::from(MAXRGB_DEN))
    }

    /// Average maxrgb as a fraction.
    pub fn average_maxrgb_f64(&self) -> f64 {
        f64::from(self.average_maxrgb) / f64::from(MAXRGB_DEN)
    }
}

/// Rows x columns matrix of 4-bit peak luminance samples.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PeakLuminanceMatrix {
    /// Rows, 2..=25.
    pub rows: u8,
    /// Columns, 2..=25.
    pub cols: u8,
    /// Row-major values over [`PEAK_LUMINANCE_DEN`].
    pub values: Vec<u8>,
}

impl PeakLuminanceMatrix {
    /// Value at (`row`, `col`) as a fraction.
    pub fn get_f64(&self, row: usize, col: usize) -> Option<f64> {
        if row >= usize::from(self.rows) || col >= usize::from(self.cols) {
            return None;
        }
        self.values
            .get(row * usize::from(self.cols) + col)
            .map(|&v| f64::from(v) / f64::from(PEAK_LUMINANCE_DEN))
    }

    fn read(r: &mut BitCursor<'_>) -> ParseResult<Self> {
        let rows = r.bits(5)? as u8;
        let cols = r.bits(5)? as u8;
        if !(2..=25).contains(&rows) || !(2..=25).contains(&cols) {
            return Err(ParseError::InvalidData("peak luminance matrix size"));
        }
        let count = usize::from(rows) * usize::from(cols);
        r.require(count as u64 * 4)?;
        let values = (0..count)
            .map(|_| r.bits(4).map(|v| v as u8))
            .collect::<ParseResult<Vec<u8>>>()?;
        Ok(Self { rows, cols, values })
    }
}

/// ST 2094-40 dynamic metadata of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DynamicHdrPlus {
    /// `application_version`.
    pub application_version: u8,
    /// Processing windows, 1..=3.
    pub windows: Vec<HdrPlusWindow>,
    /// Targeted system display maximum luminance over [`LUMINANCE_DEN`].
    pub targeted_system_display_maximum_luminance: u32,
    /// Targeted system display actual peak luminance, if transmitted.
    pub targeted_system_display_actual_peak_luminance: Option<PeakLuminanceMatrix>,
    /// Mastering display actual peak luminance, if transmitted.
    pub mastering_display_actual_peak_luminance: Option<PeakLuminanceMatrix>,
}

impl DynamicHdrPlus {
    /// Targeted display maximum luminance as a fraction of 10000 nits.
    pub fn targeted_max_luminance_f64(&self) -> f64 {
        f64::from(self.targeted_system_display_maximum_luminance) / f64::from(LUMINANCE_DEN)
    }

    /// Parses metadata starting at `application_version`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Truncated`] if the payload ends early
    /// - [`ParseError::InvalidData`] for out-of-range counts
    pub fn parse(payload: &[u8]) -> ParseResult<Self> {
        let mut r = BitCursor::new(payload);
        let mut meta = Self {
            application_version: r.byte()?,
            ..Self::default()
        };

        let num_windows = r.bits(2)? as usize;
        if num_windows == 0 || num_windows > MAX_WINDOWS {
            return Err(ParseError::InvalidData("num_windows"));
        }
        meta.windows = vec![HdrPlusWindow::default(); num_windows];

        r.require((19 * 8 + 1) * (num_windows as u64 - 1))?;
        for w in meta.windows.iter_mut().skip(1) {
            w.geometry = Some(WindowGeometry {
                upper_left: (r.bits(16)? as u16, r.bits(16)? as u16),
                lower_right: (r.bits(16)? as u16, r.bits(16)? as u16),
                center_of_ellipse: (r.bits(16)? as u16, r.bits(16)? as u16),
                rotation_angle: r.byte()?,
                semimajor_axis_internal: r.bits(16)? as u16,
                semimajor_axis_external: r.bits(16)? as u16,
                semiminor_axis_external: r.bits(16)? as u16,
                overlap_process_layering: r.bit()?,
            });
        }

        meta.targeted_system_display_maximum_luminance = r.bits(27)?;
        if r.bit()? {
            meta.targeted_system_display_actual_peak_luminance =
                Some(PeakLuminanceMatrix::read(&mut r)?);
        }

        for w in meta.windows.iter_mut() {
            for v in w.maxscl.iter_mut() {
                *v = r.bits(17)?;
            }
            w.average_maxrgb = r.bits(17)?;
            let num_percentiles = r.bits(4)? as usize;
            r.require(num_percentiles as u64 * 24)?;
            w.distribution_maxrgb = (0..num_percentiles)
                .map(|_| {
                    Ok(Percentile {
                        percentage: r.bits(7)? as u8,
                        percentile: r.bits(17)?,
                    })
                })
                .collect::<ParseResult<Vec<_>>>()?;
            w.fraction_bright_pixels = r.bits(10)? as u16;
        }

        if r.bit()? {
            meta.mastering_display_actual_peak_luminance = Some(PeakLuminanceMatrix::read(&mut r)?);
        }

        for w in meta.windows.iter_mut() {
            if r.bit()? {
                let knee_point_x = r.bits(12)? as u16;
                let knee_point_y = r.bits(12)? as u16;
                let num_anchors = r.bits(4)? as usize;
                let bezier_curve_anchors = (0..num_anchors)
                    .map(|_| r.bits(10).map(|v| v as u16))
                    .collect::<ParseResult<Vec<_>>>()?;
                w.tone_mapping = Some(ToneMapping {
                    knee_point_x,
                    knee_point_y,
                    bezier_curve_anchors,
                });
            }
        }

        for w in meta.windows.iter_mut() {
            if r.bit()? {
                w.color_saturation_weight = Some(r.bits(6)? as u8);
            }
        }

        debug!(
            version = meta.application_version,
            windows = num_windows,
            max_luminance = meta.targeted_system_display_maximum_luminance,
            "parsed HDR10+ metadata"
        );
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_windows_rejected() {
        // version 1, num_windows 0
        assert!(matches!(
            DynamicHdrPlus::parse(&[0x01, 0x00, 0, 0, 0, 0]),
            Err(ParseError::InvalidData("num_windows"))
        ));
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            DynamicHdrPlus::parse(&[0x01, 0x40]),
            Err(ParseError::Truncated { .. })
        ));
    }

    #[test]
    fn test_matrix_accessor() {
        let m = PeakLuminanceMatrix {
            rows: 2,
            cols: 3,
            values: vec![0, 1, 2, 3, 4, 15],
        };
        assert_eq!(m.get_f64(1, 2), Some(1.0));
        assert_eq!(m.get_f64(0, 1), Some(1.0 / 15.0));
        assert_eq!(m.get_f64(2, 0), None);
    }
}
