//! ITU-T T.35 metadata routing.
//!
//! Registered user data carries both AOM film grain sets (AFGS1, provider
//! `0x5890`) and HDR10+ dynamic metadata (provider `0x003C`). This module
//! strips the T.35 header and hands the body to the matching parser.
//!
//! # Usage
//!
//! ```rust,no_run
//! use grain_bitstream::afgs1::FilmGrainSets;
//! use grain_bitstream::t35::attach_t35;
//! use grain_core::{Frame, PixelFormat};
//!
//! # let t35: &[u8] = &[];
//! let mut sets = FilmGrainSets::default();
//! let mut frame = Frame::new(PixelFormat::Yuv420p, 1920, 1080).unwrap();
//! attach_t35(t35, &mut sets, &mut frame).unwrap();
//! ```

use grain_core::Frame;
use grain_core::side_data::SideData;
use tracing::trace;

use crate::afgs1::{FilmGrainSets, attach_film_grain_sets};
use crate::hdr10plus::DynamicHdrPlus;
use crate::reader::BitCursor;
use crate::ParseResult;

/// `itu_t_t35_country_code` of the United States.
pub const COUNTRY_CODE_US: u8 = 0xB5;
/// Country code announcing an extension byte.
pub const COUNTRY_CODE_EXTENSION: u8 = 0xFF;
/// Alliance for Open Media provider code.
pub const PROVIDER_AOM: u16 = 0x5890;
/// Samsung provider code (HDR10+).
pub const PROVIDER_SAMSUNG: u16 = 0x003C;
/// Provider oriented code of both AFGS1 and HDR10+.
pub const PROVIDER_ORIENTED_CODE: u16 = 0x0001;
/// ST 2094-40 application identifier.
pub const HDR_PLUS_APPLICATION_ID: u8 = 4;

/// Routed T.35 body, not yet parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum T35Payload<'a> {
    /// AFGS1 payload.
    AomFilmGrain(&'a [u8]),
    /// HDR10+ payload starting at `application_version`.
    HdrPlus(&'a [u8]),
    /// Payload of an unsupported provider.
    Unknown {
        /// `itu_t_t35_country_code`
        country_code: u8,
        /// `itu_t_t35_terminal_provider_code`, 0 if absent
        provider_code: u16,
    },
}

/// Parsed T.35 message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum T35Message {
    /// AOM film grain sets, parsed into a fresh state.
    FilmGrain(FilmGrainSets),
    /// HDR10+ dynamic metadata.
    HdrPlus(DynamicHdrPlus),
    /// Payload of an unsupported provider.
    Unknown {
        /// `itu_t_t35_country_code`
        country_code: u8,
        /// `itu_t_t35_terminal_provider_code`, 0 if absent
        provider_code: u16,
    },
}

/// Strips the T.35 header and routes the body.
///
/// # Errors
///
/// [`crate::ParseError::Truncated`] if the header of a recognized provider is
/// cut short.
pub fn split_t35(payload: &[u8]) -> ParseResult<T35Payload<'_>> {
    let mut r = BitCursor::new(payload);
    let country_code = r.byte()?;
    if country_code == COUNTRY_CODE_EXTENSION {
        r.byte()?;
    }
    let unknown = |provider_code| T35Payload::Unknown {
        country_code,
        provider_code,
    };
    if country_code != COUNTRY_CODE_US {
        return Ok(unknown(0));
    }

    let provider_code = r.bits(16)? as u16;
    match provider_code {
        PROVIDER_AOM => {
            if r.bits(16)? as u16 != PROVIDER_ORIENTED_CODE {
                return Ok(unknown(provider_code));
            }
            Ok(T35Payload::AomFilmGrain(r.rest(payload)))
        }
        PROVIDER_SAMSUNG => {
            if r.bits(16)? as u16 != PROVIDER_ORIENTED_CODE
                || r.byte()? != HDR_PLUS_APPLICATION_ID
            {
                return Ok(unknown(provider_code));
            }
            Ok(T35Payload::HdrPlus(r.rest(payload)))
        }
        _ => Ok(unknown(provider_code)),
    }
}

/// Parses a T.35 message.
///
/// # Example
///
/// ```rust
/// use grain_bitstream::t35::{T35Message, parse_t35};
///
/// // AOM provider, AFGS1 with grain disabled.
/// let msg = parse_t35(&[0xB5, 0x58, 0x90, 0x00, 0x01, 0x00]).unwrap();
/// assert!(matches!(msg, T35Message::FilmGrain(sets) if !sets.enable));
/// ```
pub fn parse_t35(payload: &[u8]) -> ParseResult<T35Message> {
    Ok(match split_t35(payload)? {
        T35Payload::AomFilmGrain(body) => {
            T35Message::FilmGrain(crate::afgs1::parse_film_grain_sets(body)?)
        }
        T35Payload::HdrPlus(body) => T35Message::HdrPlus(DynamicHdrPlus::parse(body)?),
        T35Payload::Unknown {
            country_code,
            provider_code,
        } => T35Message::Unknown {
            country_code,
            provider_code,
        },
    })
}

/// Applies a T.35 message to a stream's grain state and to `frame`.
///
/// AFGS1 bodies update `sets` and attach its sets to `frame`. HDR10+ bodies
/// are validated and attached raw as [`SideData::DynamicHdrPlus`]. Other
/// providers are ignored.
///
/// # Errors
///
/// Parse errors of the body; `sets` is reset on an AFGS1 error.
pub fn attach_t35(payload: &[u8], sets: &mut FilmGrainSets, frame: &mut Frame) -> ParseResult<()> {
    match split_t35(payload)? {
        T35Payload::AomFilmGrain(body) => {
            sets.update(body)?;
            attach_film_grain_sets(sets, frame)
        }
        T35Payload::HdrPlus(body) => {
            DynamicHdrPlus::parse(body)?;
            frame.add_side_data(SideData::DynamicHdrPlus(body.to_vec()))?;
            Ok(())
        }
        T35Payload::Unknown {
            country_code,
            provider_code,
        } => {
            trace!(country_code, provider_code, "ignoring T.35 payload");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_country() {
        assert_eq!(
            split_t35(&[0x26, 0x00, 0x04]).unwrap(),
            T35Payload::Unknown {
                country_code: 0x26,
                provider_code: 0
            }
        );
    }

    #[test]
    fn test_extension_byte_skipped() {
        // 0xFF country code with an extension: never the US code.
        let r = split_t35(&[0xFF, 0xB5, 0x58, 0x90]).unwrap();
        assert!(matches!(r, T35Payload::Unknown { country_code: 0xFF, .. }));
        assert!(split_t35(&[0xFF]).is_err());
    }

    #[test]
    fn test_routes_aom() {
        let data = [0xB5, 0x58, 0x90, 0x00, 0x01, 0xAB, 0xCD];
        assert_eq!(split_t35(&data).unwrap(), T35Payload::AomFilmGrain(&[0xAB, 0xCD]));
    }

    #[test]
    fn test_wrong_oriented_code() {
        let data = [0xB5, 0x58, 0x90, 0x00, 0x02, 0xAB];
        assert_eq!(
            split_t35(&data).unwrap(),
            T35Payload::Unknown {
                country_code: 0xB5,
                provider_code: PROVIDER_AOM
            }
        );
    }

    #[test]
    fn test_routes_hdr_plus() {
        let data = [0xB5, 0x00, 0x3C, 0x00, 0x01, 0x04, 0x01, 0x40];
        assert_eq!(split_t35(&data).unwrap(), T35Payload::HdrPlus(&[0x01, 0x40]));
        // Application 5 is not ST 2094-40.
        let data = [0xB5, 0x00, 0x3C, 0x00, 0x01, 0x05, 0x01];
        assert!(matches!(split_t35(&data).unwrap(), T35Payload::Unknown { .. }));
    }
}
