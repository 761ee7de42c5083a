//! fseek-style navigation over UTF-8 text by codepoint offset.

use crate::codepoint::CodeUnit;
use std::io::SeekFrom;

/// Move through `text` by whole codepoints and return the new byte
/// offset, clamped to the span at both ends. A malformed byte counts as
/// one codepoint, so the walk always makes progress.
///
/// `Start` counts from the beginning of the span, `Current` from
/// `position`, `End` from the end of the span backwards.
pub fn seek(text: &[u8], position: usize, from: SeekFrom) -> usize {
    match from {
        SeekFrom::Start(offset) => forward(text, 0, offset as usize),
        SeekFrom::Current(offset) => {
            let position = position.min(text.len());
            if offset >= 0 {
                forward(text, position, offset as usize)
            } else {
                backward(text, position, offset.unsigned_abs() as usize)
            }
        }
        SeekFrom::End(offset) => {
            if offset >= 0 {
                text.len()
            } else {
                backward(text, text.len(), offset.unsigned_abs() as usize)
            }
        }
    }
}

fn forward(text: &[u8], mut position: usize, mut count: usize) -> usize {
    while count > 0 && position < text.len() {
        let step = match CodeUnit::try_from(text[position]) {
            Ok(CodeUnit::Continuation) | Err(_) => 1,
            Ok(code_unit) => code_unit.len(),
        };
        position = (position + step).min(text.len());
        count -= 1;
    }
    position
}

fn backward(text: &[u8], mut position: usize, mut count: usize) -> usize {
    while count > 0 && position > 0 {
        position -= 1;
        // Walk over the continuation bytes to the lead byte.
        while position > 0 && CodeUnit::try_from(text[position]) == Ok(CodeUnit::Continuation) {
            position -= 1;
        }
        count -= 1;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;

    // "ありがとう" plus ASCII tail; each kana is three bytes.
    const MIXED: &[u8] = "ありがとう thanks".as_bytes();

    #[test]
    fn test_seek_start() {
        assert_eq!(seek(MIXED, 0, SeekFrom::Start(0)), 0);
        assert_eq!(seek(MIXED, 0, SeekFrom::Start(2)), 6);
        assert_eq!(seek(MIXED, 0, SeekFrom::Start(5)), 15);
        assert_eq!(seek(MIXED, 0, SeekFrom::Start(6)), 16);
    }

    #[test]
    fn test_seek_start_clamps_past_end() {
        assert_eq!(seek(MIXED, 0, SeekFrom::Start(1000)), MIXED.len());
    }

    #[test]
    fn test_seek_current_forward_and_back() {
        let at = seek(MIXED, 0, SeekFrom::Start(2));
        assert_eq!(seek(MIXED, at, SeekFrom::Current(1)), 9);
        assert_eq!(seek(MIXED, at, SeekFrom::Current(-1)), 3);
        assert_eq!(seek(MIXED, at, SeekFrom::Current(-5)), 0);
        assert_eq!(seek(MIXED, at, SeekFrom::Current(0)), at);
    }

    #[test]
    fn test_seek_end() {
        assert_eq!(seek(MIXED, 0, SeekFrom::End(0)), MIXED.len());
        assert_eq!(seek(MIXED, 0, SeekFrom::End(7)), MIXED.len());
        assert_eq!(seek(MIXED, 0, SeekFrom::End(-6)), 16);
        assert_eq!(seek(MIXED, 0, SeekFrom::End(-100)), 0);
    }

    #[test]
    fn test_seek_malformed_counts_one() {
        let broken = b"a\xFF\xFEb\xC2";
        assert_eq!(seek(broken, 0, SeekFrom::Start(1)), 1);
        assert_eq!(seek(broken, 0, SeekFrom::Start(2)), 2);
        assert_eq!(seek(broken, 0, SeekFrom::Start(3)), 3);
        assert_eq!(seek(broken, 0, SeekFrom::Start(4)), 4);
        // The trailing lead byte has no continuations; the step clamps.
        assert_eq!(seek(broken, 0, SeekFrom::Start(5)), 5);
    }

    #[test]
    fn test_seek_backward_skips_continuations() {
        let text = "naïve".as_bytes();
        let end = text.len();
        assert_eq!(seek(text, end, SeekFrom::Current(-1)), 5);
        assert_eq!(seek(text, end, SeekFrom::Current(-2)), 4);
        // Stepping back over the two-byte ï lands on its lead byte.
        assert_eq!(seek(text, end, SeekFrom::Current(-3)), 2);
    }

    #[test]
    fn test_seek_four_byte() {
        let text = b"\xF0\x9F\x98\xA4!";
        assert_eq!(seek(text, 0, SeekFrom::Start(1)), 4);
        assert_eq!(seek(text, 0, SeekFrom::End(-1)), 4);
        assert_eq!(seek(text, 0, SeekFrom::End(-2)), 0);
    }
}
