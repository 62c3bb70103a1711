//! UTF transcoding on top of [`CharBuf`].
//!
//! Universal character names decode to a 32-bit rune which must land in a
//! byte buffer: [`CharBuf::push_utf8`] appends the 1–4 byte UTF-8 form.
//! The wide-literal paths of the preprocessor re-encode whole buffers with
//! [`CharBuf::to_utf16`] / [`CharBuf::to_utf32`], emitting little-endian
//! element sequences.

use crate::CharBuf;

use std::error::Error;
use std::fmt;

/// A rune too large to encode as UTF-8 (>= `0x20_0000`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeError {
    /// The rejected code point.
    pub rune: u32,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code point {:#x} cannot be encoded as UTF-8", self.rune)
    }
}

impl Error for EncodeError {}

/// A malformed UTF-8 sequence found while re-encoding a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeError {
    /// Byte offset of the offending sequence.
    pub pos: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed UTF-8 sequence at byte {}", self.pos)
    }
}

impl Error for DecodeError {}

impl CharBuf {
    /// Append `rune` in UTF-8.
    ///
    /// Code points below `0x80`/`0x800`/`0x1_0000`/`0x20_0000` take
    /// 1/2/3/4 bytes; anything larger is rejected.
    pub fn push_utf8(&mut self, rune: u32) -> Result<(), EncodeError> {
        if rune < 0x80 {
            self.push(rune as u8);
        } else if rune < 0x800 {
            self.push(0xC0 | (rune >> 6) as u8);
            self.push(0x80 | (rune & 0x3F) as u8);
        } else if rune < 0x1_0000 {
            self.push(0xE0 | (rune >> 12) as u8);
            self.push(0x80 | ((rune >> 6) & 0x3F) as u8);
            self.push(0x80 | (rune & 0x3F) as u8);
        } else if rune < 0x20_0000 {
            self.push(0xF0 | (rune >> 18) as u8);
            self.push(0x80 | ((rune >> 12) & 0x3F) as u8);
            self.push(0x80 | ((rune >> 6) & 0x3F) as u8);
            self.push(0x80 | (rune & 0x3F) as u8);
        } else {
            return Err(EncodeError { rune });
        }
        Ok(())
    }

    /// Re-encode the buffer's UTF-8 content as little-endian UTF-16.
    ///
    /// Runes above the BMP become surrogate pairs.
    pub fn to_utf16(&self) -> Result<CharBuf, DecodeError> {
        let bytes = self.as_bytes();
        let mut out = CharBuf::with_capacity(bytes.len() * 2);
        let mut i = 0;
        while i < bytes.len() {
            let (rune, width) = decode_rune(&bytes[i..]).ok_or(DecodeError { pos: i })?;
            if rune < 0x1_0000 {
                push_u16(&mut out, rune as u16);
            } else {
                push_u16(&mut out, ((rune >> 10) + 0xD7C0) as u16);
                push_u16(&mut out, ((rune & 0x3FF) + 0xDC00) as u16);
            }
            i += width;
        }
        Ok(out)
    }

    /// Re-encode the buffer's UTF-8 content as little-endian UTF-32.
    pub fn to_utf32(&self) -> Result<CharBuf, DecodeError> {
        let bytes = self.as_bytes();
        let mut out = CharBuf::with_capacity(bytes.len() * 4);
        let mut i = 0;
        while i < bytes.len() {
            let (rune, width) = decode_rune(&bytes[i..]).ok_or(DecodeError { pos: i })?;
            push_u16(&mut out, (rune & 0xFFFF) as u16);
            push_u16(&mut out, (rune >> 16) as u16);
            i += width;
        }
        Ok(out)
    }
}

fn push_u16(buf: &mut CharBuf, value: u16) {
    buf.push((value & 0xFF) as u8);
    buf.push((value >> 8) as u8);
}

/// Decode one rune from the front of `bytes`, returning `(rune, width)`.
///
/// Returns `None` for a truncated sequence, a bad continuation byte, or a
/// lead byte announcing more than 4 bytes.
fn decode_rune(bytes: &[u8]) -> Option<(u32, usize)> {
    let lead = *bytes.first()?;
    let width = (lead.leading_ones()) as usize;
    if width == 0 {
        return Some((u32::from(lead), 1));
    }
    if width > bytes.len() {
        return None;
    }
    if bytes[1..width].iter().any(|&b| b & 0xC0 != 0x80) {
        return None;
    }
    match width {
        2 => Some((
            (u32::from(lead & 0x1F) << 6) | u32::from(bytes[1] & 0x3F),
            2,
        )),
        3 => Some((
            (u32::from(lead & 0x0F) << 12)
                | (u32::from(bytes[1] & 0x3F) << 6)
                | u32::from(bytes[2] & 0x3F),
            3,
        )),
        4 => Some((
            (u32::from(lead & 0x07) << 18)
                | (u32::from(bytes[1] & 0x3F) << 12)
                | (u32::from(bytes[2] & 0x3F) << 6)
                | u32::from(bytes[3] & 0x3F),
            4,
        )),
        _ => None,
    }
}
