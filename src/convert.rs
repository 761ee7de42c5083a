//! Conversions between UTF-8 and the sister encodings. These stop at
//! the first malformed sequence and report it, unlike the transforms,
//! which substitute U+FFFD and keep going.
//!
//! Every function measures when called without a target: the return
//! value is the exact byte count the full output needs, and
//! `NotEnoughSpace` cannot occur.

use crate::codepoint::{
    is_bmp, is_surrogate, is_valid_codepoint, SURROGATE_HIGH_END, SURROGATE_HIGH_START,
    SURROGATE_LOW_END, SURROGATE_LOW_START,
};
use crate::cp_iter::read_codepoint;
use crate::error::{ConvertErr, ErrorKind};
use crate::writer::Utf8Writer;
use std::mem;

const SURROGATE_OFFSET: u32 = 0x10000;

/// Wide characters match the platform's `wchar_t`: 16 bits on Windows,
/// 32 bits elsewhere.
#[cfg(windows)]
pub type WideChar = u16;
#[cfg(not(windows))]
pub type WideChar = u32;

/// Code-unit sink for the 16- and 32-bit targets; byte counts come from
/// the unit size. `None` measures.
struct UnitWriter<'a, T> {
    target: Option<&'a mut [T]>,
    units: usize,
}

impl<'a, T: Copy> UnitWriter<'a, T> {
    fn new(target: Option<&'a mut [T]>) -> Self {
        UnitWriter { target, units: 0 }
    }

    fn bytes(&self) -> usize {
        self.units * mem::size_of::<T>()
    }

    fn push(&mut self, unit: T) -> Result<(), ErrorKind> {
        match self.target {
            Some(ref mut buffer) => {
                if self.units >= buffer.len() {
                    return Err(ErrorKind::NotEnoughSpace);
                }
                buffer[self.units] = unit;
                self.units += 1;
            }
            None => self.units += 1,
        }
        Ok(())
    }

    /// Both units or neither: surrogate pairs may not be split.
    fn push_pair(&mut self, high: T, low: T) -> Result<(), ErrorKind> {
        match self.target {
            Some(ref mut buffer) => {
                if self.units + 2 > buffer.len() {
                    return Err(ErrorKind::NotEnoughSpace);
                }
                buffer[self.units] = high;
                buffer[self.units + 1] = low;
                self.units += 2;
            }
            None => self.units += 2,
        }
        Ok(())
    }
}

/// Encode one codepoint to UTF-8. Surrogates and values above U+10FFFF
/// cannot be encoded.
pub fn encode(code_point: u32, target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    if !is_valid_codepoint(code_point) {
        return Err(ConvertErr::new(ErrorKind::InvalidCharacter, 0));
    }
    let mut writer = Utf8Writer::new(target);
    writer
        .push(code_point)
        .map_err(|kind| ConvertErr::new(kind, 0))?;
    Ok(writer.written())
}

/// Decode the first codepoint of `input`, returning it together with
/// the number of bytes it occupied.
pub fn decode(input: &[u8]) -> Result<(u32, usize), ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    read_codepoint(input, 0).map_err(|kind| ConvertErr::new(kind, 0))
}

/// Convert a UCS-2 codepoint to UTF-8. UCS-2 has no surrogate pairing,
/// so surrogate halves are rejected rather than combined.
pub fn ucs2_to_utf8(code_point: u16, target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    if is_surrogate(code_point as u32) {
        return Err(ConvertErr::new(ErrorKind::UnhandledSurrogatePair, 0));
    }
    let mut writer = Utf8Writer::new(target);
    writer
        .push(code_point as u32)
        .map_err(|kind| ConvertErr::new(kind, 0))?;
    Ok(writer.written())
}

pub fn utf8_to_utf16(input: &[u8], target: Option<&mut [u16]>) -> Result<usize, ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    let mut writer = UnitWriter::new(target);
    let mut pos = 0;
    while pos < input.len() {
        let (code_point, consumed) =
            read_codepoint(input, pos).map_err(|kind| ConvertErr::new(kind, writer.bytes()))?;
        if is_bmp(code_point) {
            writer
                .push(code_point as u16)
                .map_err(|kind| ConvertErr::new(kind, writer.bytes()))?;
        } else {
            let offset = code_point - SURROGATE_OFFSET;
            let high = (SURROGATE_HIGH_START + (offset >> 10)) as u16;
            let low = (SURROGATE_LOW_START + (offset & 0x3FF)) as u16;
            writer
                .push_pair(high, low)
                .map_err(|kind| ConvertErr::new(kind, writer.bytes()))?;
        }
        pos += consumed;
    }
    Ok(writer.bytes())
}

pub fn utf8_to_utf32(input: &[u8], target: Option<&mut [u32]>) -> Result<usize, ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    let mut writer = UnitWriter::new(target);
    let mut pos = 0;
    while pos < input.len() {
        let (code_point, consumed) =
            read_codepoint(input, pos).map_err(|kind| ConvertErr::new(kind, writer.bytes()))?;
        writer
            .push(code_point)
            .map_err(|kind| ConvertErr::new(kind, writer.bytes()))?;
        pos += consumed;
    }
    Ok(writer.bytes())
}

pub fn utf16_to_utf8(input: &[u16], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    let mut writer = Utf8Writer::new(target);
    let mut pos = 0;
    while pos < input.len() {
        let unit = input[pos] as u32;
        let code_point = if (SURROGATE_HIGH_START..=SURROGATE_HIGH_END).contains(&unit) {
            if pos + 1 >= input.len() {
                return Err(ConvertErr::new(ErrorKind::InvalidData, writer.written()));
            }
            let low = input[pos + 1] as u32;
            if !(SURROGATE_LOW_START..=SURROGATE_LOW_END).contains(&low) {
                return Err(ConvertErr::new(
                    ErrorKind::UnmatchedHighSurrogatePair,
                    writer.written(),
                ));
            }
            pos += 2;
            SURROGATE_OFFSET + ((unit - SURROGATE_HIGH_START) << 10) + (low - SURROGATE_LOW_START)
        } else if (SURROGATE_LOW_START..=SURROGATE_LOW_END).contains(&unit) {
            return Err(ConvertErr::new(
                ErrorKind::UnmatchedLowSurrogatePair,
                writer.written(),
            ));
        } else {
            pos += 1;
            unit
        };
        writer
            .push(code_point)
            .map_err(|kind| ConvertErr::new(kind, writer.written()))?;
    }
    Ok(writer.written())
}

pub fn utf32_to_utf8(input: &[u32], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    let mut writer = Utf8Writer::new(target);
    for &code_point in input {
        if !is_valid_codepoint(code_point) {
            return Err(ConvertErr::new(
                ErrorKind::InvalidCharacter,
                writer.written(),
            ));
        }
        writer
            .push(code_point)
            .map_err(|kind| ConvertErr::new(kind, writer.written()))?;
    }
    Ok(writer.written())
}

/// Convert UTF-8 to the platform's wide encoding; dispatches to the
/// concrete 16- or 32-bit entry point.
pub fn utf8_to_wide(input: &[u8], target: Option<&mut [WideChar]>) -> Result<usize, ConvertErr> {
    #[cfg(windows)]
    return utf8_to_utf16(input, target);
    #[cfg(not(windows))]
    return utf8_to_utf32(input, target);
}

/// Convert the platform's wide encoding to UTF-8.
pub fn wide_to_utf8(input: &[WideChar], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    #[cfg(windows)]
    return utf16_to_utf8(input, target);
    #[cfg(not(windows))]
    return utf32_to_utf8(input, target);
}
