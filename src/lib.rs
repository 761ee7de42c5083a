//! Functions for working with UTF-8 encoded text: conversion to and
//! from the sister encodings, normalisation, locale-aware case mapping
//! and codepoint-wise seeking, all writing into caller-provided
//! buffers. Passing no target buffer measures the output instead.

pub mod case;
mod codepoint;
pub mod convert;
mod cp_iter;
mod error;
mod hangul;
pub mod normalise;
mod reorder;
pub mod seek;
mod tables;
mod ucd;
mod writer;

pub use case::{
    case_fold, current_locale, set_locale, to_lower, to_lower_locale, to_title, to_title_locale,
    to_upper, to_upper_locale, Locale,
};
pub use convert::{
    decode, encode, ucs2_to_utf8, utf16_to_utf8, utf32_to_utf8, utf8_to_utf16, utf8_to_utf32,
    utf8_to_wide, wide_to_utf8, WideChar,
};
pub use error::{ConvertErr, ErrorKind};
pub use normalise::{quick_check, transform, IsNormalised, Normalisation};
pub use seek::seek;

use crate::codepoint::CodeUnit;

/// Whether `byte` may open a UTF-8 sequence or stand alone. Bare
/// continuation bytes and the byte values UTF-8 never uses fail.
pub fn char_valid(byte: u8) -> bool {
    !matches!(CodeUnit::try_from(byte), Ok(CodeUnit::Continuation) | Err(_))
}

/// Length in bytes of the sequence `byte` opens, `None` when `byte`
/// cannot open one.
pub fn char_length(byte: u8) -> Option<usize> {
    match CodeUnit::try_from(byte) {
        Ok(CodeUnit::Continuation) | Err(_) => None,
        Ok(code_unit) => Some(code_unit.len()),
    }
}

/// Length of `input` in codepoints. Malformed bytes count one each, the
/// same forward progress seeking uses.
pub fn length(input: &[u8]) -> usize {
    cp_iter::CodePoints::new(input).count()
}
