//! Colour metadata carried by frames and grain parameter sets.
//!
//! Codes follow ITU-T H.273 (CICP). Each code point is a newtype over the raw
//! byte so values read from a bitstream survive untouched, even when this
//! crate has no name for them.
//!
//! # Usage
//!
//! ```rust
//! use grain_core::color::{ColorProperties, ColorRange, MatrixCoefficients};
//!
//! let mut color = ColorProperties::default();
//! assert!(color.is_unspecified());
//!
//! color.range = ColorRange::Limited;
//! color.matrix = MatrixCoefficients::RGB;
//! assert!(color.is_identity_matrix());
//! ```

use std::fmt;

/// Sample value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorRange {
    /// Not signalled.
    #[default]
    Unspecified,
    /// Studio swing (16..235 luma at 8 bits).
    Limited,
    /// Full swing.
    Full,
}

impl ColorRange {
    /// Maps the one-bit `full_range_flag` of a bitstream.
    #[inline]
    pub const fn from_full_range_flag(full: bool) -> Self {
        if full { Self::Full } else { Self::Limited }
    }
}

macro_rules! cicp_code {
    (
        $(#[$meta:meta])*
        $name:ident, max = $max:expr, reserved = [$($reserved:expr),*],
        { $($(#[$cmeta:meta])* $cname:ident = $cval:expr),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u8);

        impl $name {
            $($(#[$cmeta])* pub const $cname: Self = Self($cval);)*

            /// Largest code point with a defined meaning.
            pub const MAX: u8 = $max;

            /// Returns `true` for "unspecified" (code 2).
            #[inline]
            pub const fn is_unspecified(&self) -> bool {
                self.0 == 2
            }

            /// Returns `true` for reserved code points and codes above [`Self::MAX`].
            #[inline]
            pub const fn is_reserved(&self) -> bool {
                matches!(self.0, $($reserved)|*) || self.0 > $max
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self(2)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

cicp_code!(
    /// Colour primaries (H.273 table 2).
    ColorPrimaries, max = 22, reserved = [0, 3],
    {
        /// ITU-R BT.709
        BT709 = 1,
        /// Unspecified
        UNSPECIFIED = 2,
        /// ITU-R BT.470 System M
        BT470M = 4,
        /// ITU-R BT.601 625 lines
        BT470BG = 5,
        /// ITU-R BT.601 525 lines
        SMPTE170M = 6,
        /// ITU-R BT.2020
        BT2020 = 9,
        /// SMPTE EG 432-1 (Display P3)
        SMPTE432 = 12,
    }
);

cicp_code!(
    /// Transfer characteristics (H.273 table 3).
    TransferCharacteristics, max = 18, reserved = [0, 3],
    {
        /// ITU-R BT.709
        BT709 = 1,
        /// Unspecified
        UNSPECIFIED = 2,
        /// IEC 61966-2-1 (sRGB)
        SRGB = 13,
        /// SMPTE ST 2084 (PQ)
        SMPTE2084 = 16,
        /// ARIB STD-B67 (HLG)
        ARIB_STD_B67 = 18,
    }
);

cicp_code!(
    /// Matrix coefficients (H.273 table 4).
    MatrixCoefficients, max = 17, reserved = [3],
    {
        /// Identity matrix: samples are G, B, R.
        RGB = 0,
        /// ITU-R BT.709
        BT709 = 1,
        /// Unspecified
        UNSPECIFIED = 2,
        /// ITU-R BT.601 625 lines
        BT470BG = 5,
        /// ITU-R BT.601 525 lines
        SMPTE170M = 6,
        /// ITU-R BT.2020 non-constant luminance
        BT2020_NCL = 9,
    }
);

/// Colour description of a frame or a grain parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ColorProperties {
    /// Value range.
    pub range: ColorRange,
    /// Colour primaries.
    pub primaries: ColorPrimaries,
    /// Transfer characteristics.
    pub transfer: TransferCharacteristics,
    /// Matrix coefficients.
    pub matrix: MatrixCoefficients,
}

impl ColorProperties {
    /// Returns `true` when the samples are coded with the identity matrix (RGB).
    #[inline]
    pub fn is_identity_matrix(&self) -> bool {
        self.matrix == MatrixCoefficients::RGB
    }

    /// Returns `true` when every field is unspecified.
    pub fn is_unspecified(&self) -> bool {
        self.range == ColorRange::Unspecified
            && self.primaries.is_unspecified()
            && self.transfer.is_unspecified()
            && self.matrix.is_unspecified()
    }

    /// Returns `true` if any code point is reserved or out of range.
    pub fn has_reserved_codes(&self) -> bool {
        self.primaries.is_reserved() || self.transfer.is_reserved() || self.matrix.is_reserved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_unspecified() {
        let c = ColorProperties::default();
        assert!(c.is_unspecified());
        assert!(!c.is_identity_matrix());
        assert!(!c.has_reserved_codes());
    }

    #[test]
    fn test_reserved_codes() {
        assert!(ColorPrimaries(0).is_reserved());
        assert!(ColorPrimaries(3).is_reserved());
        assert!(ColorPrimaries(23).is_reserved());
        assert!(!ColorPrimaries::BT2020.is_reserved());
        assert!(TransferCharacteristics(19).is_reserved());
        assert!(!TransferCharacteristics::ARIB_STD_B67.is_reserved());
        assert!(!MatrixCoefficients::RGB.is_reserved());
        assert!(MatrixCoefficients(3).is_reserved());
    }

    #[test]
    fn test_range_flag() {
        assert_eq!(ColorRange::from_full_range_flag(true), ColorRange::Full);
        assert_eq!(ColorRange::from_full_range_flag(false), ColorRange::Limited);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_yaml_round_trip() {
        let c = ColorProperties {
            range: ColorRange::Full,
            primaries: ColorPrimaries::BT709,
            transfer: TransferCharacteristics::SRGB,
            matrix: MatrixCoefficients::RGB,
        };
        let text = serde_yaml::to_string(&c).unwrap();
        assert!(text.contains("range: full"));
        let back: ColorProperties = serde_yaml::from_str(&text).unwrap();
        assert_eq!(back, c);
    }
}
