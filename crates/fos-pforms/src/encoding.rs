//! UTF encoding layer
//!
//! Validates and decodes UTF-8, UTF-16 and UTF-32 input into code points,
//! and encodes formatted code points back. The `format_utf*` methods wrap
//! [`Context::format`] with this conversion; their [`Formatted::written`]
//! counts code units.

use crate::format::{FormatOptions, Formatted};
use crate::{Context, PformsError, Result, MAX_CODE_POINT};

/// Invalid UTF input; offsets are in code units
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UtfError {
    #[error("UTF-8 error: {missing} byte(s) missing at end (offset {offset})")]
    Utf8Truncated { missing: u8, offset: usize },

    #[error("UTF-8 error: byte {byte} top bits not 0x80 (offset {offset})")]
    Utf8BadContinuation { byte: u8, offset: usize },

    #[error("UTF-8 error: {len}-byte character is not allowed (offset {offset})")]
    Utf8TooLong { len: u8, offset: usize },

    #[error("UTF-8 error: code points greater than 0x10ffff are not defined (offset {offset})")]
    Utf8TooLarge { offset: usize },

    #[error("UTF-8 error: code points 0xd800-0xdfff are not defined (offset {offset})")]
    Utf8Surrogate { offset: usize },

    #[error("UTF-8 error: overlong {len}-byte sequence (offset {offset})")]
    Utf8Overlong { len: u8, offset: usize },

    #[error("UTF-8 error: isolated byte with 0x80 bit set (offset {offset})")]
    Utf8Isolated { offset: usize },

    #[error("UTF-8 error: illegal byte (0xfe or 0xff) (offset {offset})")]
    Utf8Illegal { offset: usize },

    #[error("UTF-16 error: missing low surrogate at end (offset {offset})")]
    Utf16MissingLow { offset: usize },

    #[error("UTF-16 error: invalid low surrogate (offset {offset})")]
    Utf16InvalidLow { offset: usize },

    #[error("UTF-16 error: isolated low surrogate (offset {offset})")]
    Utf16IsolatedLow { offset: usize },

    #[error("UTF-32 error: code points 0xd800-0xdfff are not defined (offset {offset})")]
    Utf32Surrogate { offset: usize },

    #[error("UTF-32 error: code points greater than 0x10ffff are not defined (offset {offset})")]
    Utf32TooLarge { offset: usize },
}

impl UtfError {
    /// Numeric code, as understood by [`error_message`](crate::error_message)
    pub fn code(&self) -> i32 {
        match *self {
            UtfError::Utf8Truncated { missing, .. } => -i32::from(missing),
            UtfError::Utf8BadContinuation { byte, .. } => -4 - i32::from(byte),
            UtfError::Utf8TooLong { len, .. } => -6 - i32::from(len),
            UtfError::Utf8TooLarge { .. } => -13,
            UtfError::Utf8Surrogate { .. } => -14,
            UtfError::Utf8Overlong { len, .. } => -13 - i32::from(len),
            UtfError::Utf8Isolated { .. } => -20,
            UtfError::Utf8Illegal { .. } => -21,
            UtfError::Utf16MissingLow { .. } => -22,
            UtfError::Utf16InvalidLow { .. } => -23,
            UtfError::Utf16IsolatedLow { .. } => -24,
            UtfError::Utf32Surrogate { .. } => -25,
            UtfError::Utf32TooLarge { .. } => -26,
        }
    }

    /// Code unit offset of the offending character
    pub fn offset(&self) -> usize {
        match *self {
            UtfError::Utf8Truncated { offset, .. }
            | UtfError::Utf8BadContinuation { offset, .. }
            | UtfError::Utf8TooLong { offset, .. }
            | UtfError::Utf8TooLarge { offset }
            | UtfError::Utf8Surrogate { offset }
            | UtfError::Utf8Overlong { offset, .. }
            | UtfError::Utf8Isolated { offset }
            | UtfError::Utf8Illegal { offset }
            | UtfError::Utf16MissingLow { offset }
            | UtfError::Utf16InvalidLow { offset }
            | UtfError::Utf16IsolatedLow { offset }
            | UtfError::Utf32Surrogate { offset }
            | UtfError::Utf32TooLarge { offset } => offset,
        }
    }
}

fn is_surrogate(c: u32) -> bool {
    (0xD800..=0xDFFF).contains(&c)
}

/// Decode one UTF-8 character starting at `offset`; returns it and its length
fn decode_utf8_char(input: &[u8], offset: usize) -> std::result::Result<(u32, usize), UtfError> {
    let lead = input[offset];
    if lead < 0x80 {
        return Ok((u32::from(lead), 1));
    }
    if lead < 0xC0 {
        return Err(UtfError::Utf8Isolated { offset });
    }
    if lead >= 0xFE {
        return Err(UtfError::Utf8Illegal { offset });
    }

    let extra = match lead {
        0xC0..=0xDF => 1,
        0xE0..=0xEF => 2,
        0xF0..=0xF7 => 3,
        0xF8..=0xFB => 4,
        _ => 5,
    };
    let available = input.len() - offset - 1;
    if available < extra {
        return Err(UtfError::Utf8Truncated { missing: (extra - available) as u8, offset });
    }

    let tail = &input[offset + 1..=offset + extra];
    if let Some(bad) = tail.iter().position(|&b| b & 0xC0 != 0x80) {
        return Err(UtfError::Utf8BadContinuation { byte: bad as u8 + 2, offset });
    }

    let len = extra as u8 + 1;
    let mut value = u32::from(lead) & (0x7F >> len);
    for &b in tail {
        value = (value << 6) | u32::from(b & 0x3F);
    }

    let minimum = match extra {
        1 => 0x80,
        2 => 0x800,
        3 => 0x1_0000,
        4 => 0x20_0000,
        _ => 0x400_0000,
    };
    if value < minimum {
        return Err(UtfError::Utf8Overlong { len, offset });
    }
    if extra > 3 {
        return Err(UtfError::Utf8TooLong { len, offset });
    }
    if value > MAX_CODE_POINT {
        return Err(UtfError::Utf8TooLarge { offset });
    }
    if is_surrogate(value) {
        return Err(UtfError::Utf8Surrogate { offset });
    }
    Ok((value, usize::from(len)))
}

/// Validate and decode UTF-8
pub fn decode_utf8(input: &[u8]) -> std::result::Result<Vec<u32>, UtfError> {
    let mut codes = Vec::with_capacity(input.len());
    let mut offset = 0;
    while offset < input.len() {
        let (c, len) = decode_utf8_char(input, offset)?;
        codes.push(c);
        offset += len;
    }
    Ok(codes)
}

/// Validate and decode UTF-16
pub fn decode_utf16(input: &[u16]) -> std::result::Result<Vec<u32>, UtfError> {
    let mut codes = Vec::with_capacity(input.len());
    let mut offset = 0;
    while offset < input.len() {
        let unit = u32::from(input[offset]);
        match unit & 0xFC00 {
            0xD800 => {
                let Some(&low) = input.get(offset + 1) else {
                    return Err(UtfError::Utf16MissingLow { offset });
                };
                let low = u32::from(low);
                if low & 0xFC00 != 0xDC00 {
                    return Err(UtfError::Utf16InvalidLow { offset });
                }
                codes.push((((unit & 0x3FF) << 10) | (low & 0x3FF)) + 0x1_0000);
                offset += 2;
            }
            0xDC00 => return Err(UtfError::Utf16IsolatedLow { offset }),
            _ => {
                codes.push(unit);
                offset += 1;
            }
        }
    }
    Ok(codes)
}

/// Validate UTF-32
pub fn decode_utf32(input: &[u32]) -> std::result::Result<Vec<u32>, UtfError> {
    for (offset, &c) in input.iter().enumerate() {
        if is_surrogate(c) {
            return Err(UtfError::Utf32Surrogate { offset });
        }
        if c > MAX_CODE_POINT {
            return Err(UtfError::Utf32TooLarge { offset });
        }
    }
    Ok(input.to_vec())
}

/// Check a code point for encoding
fn to_char(c: u32, offset: usize) -> Result<char> {
    char::from_u32(c).ok_or(PformsError::Utf(if is_surrogate(c) {
        UtfError::Utf32Surrogate { offset }
    } else {
        UtfError::Utf32TooLarge { offset }
    }))
}

/// Encode code points as UTF-8; returns the bytes written
///
/// An overflow offset is the index of the code point that did not fit.
pub fn encode_utf8(codes: &[u32], output: &mut [u8]) -> Result<usize> {
    let mut used = 0;
    for (offset, &c) in codes.iter().enumerate() {
        let ch = to_char(c, offset)?;
        let end = used + ch.len_utf8();
        let Some(dst) = output.get_mut(used..end) else {
            return Err(PformsError::Overflow { offset });
        };
        ch.encode_utf8(dst);
        used = end;
    }
    Ok(used)
}

/// Encode code points as UTF-16; returns the units written
pub fn encode_utf16(codes: &[u32], output: &mut [u16]) -> Result<usize> {
    let mut used = 0;
    for (offset, &c) in codes.iter().enumerate() {
        let ch = to_char(c, offset)?;
        let end = used + ch.len_utf16();
        let Some(dst) = output.get_mut(used..end) else {
            return Err(PformsError::Overflow { offset });
        };
        ch.encode_utf16(dst);
        used = end;
    }
    Ok(used)
}

/// Copy code points as UTF-32; returns the units written
pub fn encode_utf32(codes: &[u32], output: &mut [u32]) -> Result<usize> {
    for (offset, &c) in codes.iter().enumerate() {
        to_char(c, offset)?;
    }
    let Some(dst) = output.get_mut(..codes.len()) else {
        return Err(PformsError::Overflow { offset: output.len() });
    };
    dst.copy_from_slice(codes);
    Ok(codes.len())
}

impl Context {
    /// Format UTF-8 text; the options must not set a width hint
    pub fn format_utf8(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        options: FormatOptions,
    ) -> Result<Formatted> {
        check_width(options, 8)?;
        let codes = decode_utf8(input)?;
        self.format_encoded(&codes, output.len(), options, |formatted| {
            encode_utf8(formatted, output)
        })
    }

    /// Format UTF-16 text; the options must set [`FormatOptions::UTF_16`]
    pub fn format_utf16(
        &mut self,
        input: &[u16],
        output: &mut [u16],
        options: FormatOptions,
    ) -> Result<Formatted> {
        check_width(options, 16)?;
        let codes = decode_utf16(input)?;
        self.format_encoded(&codes, output.len(), options, |formatted| {
            encode_utf16(formatted, output)
        })
    }

    /// Format UTF-32 text; the options must set [`FormatOptions::UTF_32`]
    pub fn format_utf32(
        &mut self,
        input: &[u32],
        output: &mut [u32],
        options: FormatOptions,
    ) -> Result<Formatted> {
        check_width(options, 32)?;
        let codes = decode_utf32(input)?;
        self.format_encoded(&codes, output.len(), options, |formatted| {
            encode_utf32(formatted, output)
        })
    }

    /// Format into a code point buffer no longer than the caller's, then encode
    fn format_encoded(
        &mut self,
        codes: &[u32],
        capacity: usize,
        options: FormatOptions,
        encode: impl FnOnce(&[u32]) -> Result<usize>,
    ) -> Result<Formatted> {
        let mut buffer = vec![0u32; capacity];
        let formatted = self.format(codes, &mut buffer, options)?;
        let written = encode(&buffer[..formatted.written])?;
        Ok(Formatted { written, ..formatted })
    }
}

fn check_width(options: FormatOptions, bits: u32) -> Result<()> {
    if options.validate()?.code_unit_bits() != bits {
        return Err(PformsError::BadOptions);
    }
    Ok(())
}
