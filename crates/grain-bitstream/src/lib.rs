//! # grain-bitstream
//!
//! Parsers that produce film grain parameters for `grain-synth`.
//!
//! ## Modules
//!
//! - [`reader`] - MSB-first bit reader with truncation checks
//! - [`afgs1`] - AOM film grain parameter sets (AFGS1)
//! - [`av1`] - AV1 frame header `film_grain_params()` and reference slots
//! - [`t35`] - ITU-T T.35 provider routing
//! - [`hdr10plus`] - HDR10+ (ST 2094-40) dynamic metadata
//!
//! ## Usage
//!
//! ```rust
//! use grain_bitstream::{T35Message, parse_t35};
//!
//! let msg = parse_t35(&[0x26, 0x00]).unwrap();
//! assert!(matches!(msg, T35Message::Unknown { country_code: 0x26, .. }));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize parsed sets and metadata (enabled by default)

#![warn(missing_docs)]

pub mod afgs1;
pub mod av1;
pub mod hdr10plus;
pub mod reader;
pub mod t35;

mod error;

pub use afgs1::{FilmGrainSets, attach_film_grain_sets, parse_film_grain_sets};
pub use av1::{
    FrameInfo, FrameType, GrainReferenceSlots, RawFilmGrainParams, SequenceInfo,
    parse_film_grain_params,
};
pub use error::{ParseError, ParseResult};
pub use hdr10plus::DynamicHdrPlus;
pub use t35::{T35Message, T35Payload, attach_t35, parse_t35, split_t35};
