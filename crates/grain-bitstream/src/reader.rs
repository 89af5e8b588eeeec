//! MSB-first bit reader over a byte slice.
//!
//! Wraps a `bitstream_io` reader and keeps its own bit position so callers can
//! measure how much of a length-prefixed unit they consumed. Reads past the
//! end fail with [`ParseError::Truncated`] before touching the inner reader.
//!
//! # Usage
//!
//! ```rust
//! use grain_bitstream::reader::BitCursor;
//!
//! let mut r = BitCursor::new(&[0b1010_0000, 0xFF]);
//! assert!(r.bit().unwrap());
//! assert_eq!(r.bits(3).unwrap(), 0b010);
//! assert_eq!(r.position(), 4);
//! assert_eq!(r.remaining(), 12);
//! ```

use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader};

use crate::{ParseError, ParseResult};

/// Bit reader with position tracking.
pub struct BitCursor<'a> {
    reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    pos: u64,
    len: u64,
}

impl<'a> BitCursor<'a> {
    /// Starts reading at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: BitReader::endian(Cursor::new(data), BigEndian),
            pos: 0,
            len: data.len() as u64 * 8,
        }
    }

    /// Bits consumed so far.
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bits left.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.len - self.pos
    }

    /// Fails with [`ParseError::Truncated`] unless `needed` bits are left.
    #[inline]
    pub fn require(&self, needed: u64) -> ParseResult<()> {
        if needed > self.remaining() {
            return Err(ParseError::Truncated {
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Reads one bit.
    pub fn bit(&mut self) -> ParseResult<bool> {
        self.require(1)?;
        let b = self.reader.read_bit()?;
        self.pos += 1;
        Ok(b)
    }

    /// Reads an `n`-bit unsigned value (`n <= 32`).
    pub fn bits(&mut self, n: u32) -> ParseResult<u32> {
        debug_assert!(n <= 32);
        if n == 0 {
            return Ok(0);
        }
        self.require(u64::from(n))?;
        let v = self.reader.read::<u32>(n)?;
        self.pos += u64::from(n);
        Ok(v)
    }

    /// Reads an `n`-bit value and subtracts `bias`.
    #[inline]
    pub fn signed_offset(&mut self, n: u32, bias: i32) -> ParseResult<i32> {
        Ok(self.bits(n)? as i32 - bias)
    }

    /// Reads an 8-bit value.
    #[inline]
    pub fn byte(&mut self) -> ParseResult<u8> {
        Ok(self.bits(8)? as u8)
    }

    /// Skips `n` bits.
    pub fn skip(&mut self, mut n: u64) -> ParseResult<()> {
        self.require(n)?;
        while n > 0 {
            let step = n.min(u64::from(u32::MAX));
            self.reader.skip(step as u32)?;
            self.pos += step;
            n -= step;
        }
        Ok(())
    }

    /// Skips to the next byte boundary.
    pub fn byte_align(&mut self) -> ParseResult<()> {
        let pad = (8 - self.pos % 8) % 8;
        self.skip(pad)
    }

    /// Unread whole bytes of `data`, valid on a byte boundary.
    pub fn rest(&self, data: &'a [u8]) -> &'a [u8] {
        let start = (self.pos.div_ceil(8) as usize).min(data.len());
        &data[start..]
    }
}
