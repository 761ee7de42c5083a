use crate::cp_iter::read_lossy;
use crate::error::{ConvertErr, ErrorKind};
use crate::hangul;
use crate::reorder::ReorderBuffer;
use crate::ucd::{
    combining_class, decomposition_mapping, primary_composite, quick_check_value, QuickCheckVal,
};
use crate::writer::Utf8Writer;

// https://www.unicode.org/reports/tr15/#Detecting_Normalization_Forms

#[derive(Debug, PartialEq)]
pub enum IsNormalised {
    Yes,
    No,
    Maybe,
}

/// The four normalisation forms of UAX #15.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Normalisation {
    NFC,
    NFD,
    NFKC,
    NFKD,
}

impl Normalisation {
    fn composing(&self) -> bool {
        matches!(self, Normalisation::NFC | Normalisation::NFKC)
    }

    fn compatibility(&self) -> bool {
        matches!(self, Normalisation::NFKC | Normalisation::NFKD)
    }
}

/// Detect whether `code_points` is already in the given form. `Maybe`
/// means the codepoints could belong to a normalised string but the
/// answer needs the full transform to settle.
pub fn quick_check(code_points: &[u32], normalisation: Normalisation) -> IsNormalised {
    let mut last_canonical_class: u8 = 0;
    let mut result = IsNormalised::Yes;
    for &code_point in code_points {
        let ccc = combining_class(code_point);
        if last_canonical_class > ccc && ccc != 0 {
            return IsNormalised::No;
        }
        match quick_check_value(code_point, normalisation) {
            QuickCheckVal::Yes => {}
            QuickCheckVal::No => return IsNormalised::No,
            QuickCheckVal::Maybe => result = IsNormalised::Maybe,
        }
        last_canonical_class = ccc;
    }
    result
}

/// Normalise UTF-8 `input` into `target`. Malformed sequences consume
/// one byte each and come through as U+FFFD. Without a target the call
/// measures.
pub fn transform(
    input: &[u8],
    target: Option<&mut [u8]>,
    normalisation: Normalisation,
) -> Result<usize, ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    let mut writer = Utf8Writer::new(target);
    let mut buffer = ReorderBuffer::new();
    let mut pos = 0;
    while pos < input.len() {
        // The common case: an ASCII byte followed by another ASCII byte
        // cannot decompose, reorder or compose, so whatever run is
        // pending can be sealed and the byte copied through.
        if input[pos] < 0x80 && pos + 1 < input.len() && input[pos + 1] < 0x80 {
            let result = flush(&mut buffer, normalisation, &mut writer)
                .and_then(|_| writer.push_bytes(&input[pos..pos + 1]));
            if let Err(error) = result {
                return Err(ConvertErr::new(error, writer.written()));
            }
            pos += 1;
            continue;
        }
        let (code_point, consumed) = read_lossy(input, pos);
        pos += consumed;
        if let Err(error) = expand(code_point, normalisation, &mut buffer, &mut writer) {
            return Err(ConvertErr::new(error, writer.written()));
        }
    }
    // Input exhaustion seals the final run.
    if let Err(error) = flush(&mut buffer, normalisation, &mut writer) {
        return Err(ConvertErr::new(error, writer.written()));
    }
    Ok(writer.written())
}

/// Decompose one incoming codepoint and feed the pieces to the run
/// buffer, flushing completed runs along the way.
fn expand(
    code_point: u32,
    normalisation: Normalisation,
    buffer: &mut ReorderBuffer,
    writer: &mut Utf8Writer,
) -> Result<(), ErrorKind> {
    if hangul::is_syllable(code_point) {
        let (l, v, t) = hangul::decompose(code_point);
        take(l, 0, normalisation, buffer, writer)?;
        take(v, 0, normalisation, buffer, writer)?;
        if let Some(t) = t {
            take(t, 0, normalisation, buffer, writer)?;
        }
        return Ok(());
    }
    match decomposition_mapping(code_point, normalisation.compatibility()) {
        Some(mapping) => {
            for &piece in mapping {
                take(piece, combining_class(piece), normalisation, buffer, writer)?;
            }
        }
        None => take(
            code_point,
            combining_class(code_point),
            normalisation,
            buffer,
            writer,
        )?,
    }
    Ok(())
}

fn take(
    code_point: u32,
    ccc: u8,
    normalisation: Normalisation,
    buffer: &mut ReorderBuffer,
    writer: &mut Utf8Writer,
) -> Result<(), ErrorKind> {
    if ccc == 0 {
        // A starter seals the run in progress. Under the composing
        // forms a pair of bare starters may still fuse first: Hangul
        // jamo always, table pairs when nothing sits between them.
        if normalisation.composing() && buffer.len() == 1 {
            let (head, head_ccc) = buffer.as_slice()[0];
            if head_ccc == 0 {
                if let Some(composite) = hangul::compose(head, code_point)
                    .or_else(|| primary_composite(head, code_point))
                {
                    buffer.set_head(composite);
                    return Ok(());
                }
            }
        }
        flush(buffer, normalisation, writer)?;
        buffer.push(code_point, 0);
    } else {
        if buffer.is_full() {
            // Past the Stream-Safe bound; emit what we have so progress
            // is guaranteed on degenerate input.
            flush(buffer, normalisation, writer)?;
        }
        buffer.push(code_point, ccc);
    }
    Ok(())
}

fn flush(
    buffer: &mut ReorderBuffer,
    normalisation: Normalisation,
    writer: &mut Utf8Writer,
) -> Result<(), ErrorKind> {
    if buffer.is_empty() {
        return Ok(());
    }
    if normalisation.composing() {
        compose_run(buffer);
    }
    for &(code_point, _) in buffer.as_slice() {
        writer.push(code_point)?;
    }
    buffer.clear();
    Ok(())
}

/// The composition pass over a sealed run: the starter eats marks left
/// to right, subject to the blocking rule.
fn compose_run(buffer: &mut ReorderBuffer) {
    if buffer.len() < 2 || buffer.as_slice()[0].1 != 0 {
        return;
    }
    let mut last_class: u8 = 0;
    let mut index = 1;
    while index < buffer.len() {
        let (mark, ccc) = buffer.as_slice()[index];
        // A mark is blocked when a retained mark before it has a class
        // at least as high. The tail is class-sorted, so only equality
        // with the previous retained mark can block.
        if last_class == 0 || ccc > last_class {
            if let Some(composite) = primary_composite(buffer.as_slice()[0].0, mark) {
                buffer.set_head(composite);
                buffer.remove(index);
                continue;
            }
        }
        last_class = ccc;
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codepoint::encode_raw;

    fn transformed(input: &[u8], normalisation: Normalisation) -> Vec<u8> {
        let mut buffer = [0u8; 512];
        let size = transform(input, Some(&mut buffer), normalisation).unwrap();
        buffer[..size].to_vec()
    }

    fn encode_all(code_points: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &code_point in code_points {
            let mut buffer = [0u8; 4];
            let size = encode_raw(code_point, &mut buffer);
            bytes.extend_from_slice(&buffer[..size]);
        }
        bytes
    }

    #[test]
    fn test_nfd_mixed_ascii() {
        let output = transformed(b"Bj\xC3\xB6rn Zonderland", Normalisation::NFD);
        assert_eq!(output, b"Bjo\xCC\x88rn Zonderland".to_vec());
        assert_eq!(output.len(), 18);
    }

    #[test]
    fn test_nfd_latin1_precomposed() {
        assert_eq!(
            transformed(b"\xC3\x80", Normalisation::NFD),
            b"A\xCC\x80".to_vec()
        );
    }

    #[test]
    fn test_nfd_cjk_compatibility_ideograph() {
        assert_eq!(
            transformed(b"\xF0\xAF\xA8\x9D", Normalisation::NFD),
            b"\xF0\xAA\x98\x80".to_vec()
        );
    }

    #[test]
    fn test_nfc_recomposes() {
        assert_eq!(
            transformed(b"Bjo\xCC\x88rn", Normalisation::NFC),
            b"Bj\xC3\xB6rn".to_vec()
        );
    }

    #[test]
    fn test_nfd_not_enough_space() {
        let mut buffer = [0u8; 6];
        let result = transform(b"Am\xC3\x87zing", Some(&mut buffer), Normalisation::NFD);
        assert_eq!(result, Err(ConvertErr::new(ErrorKind::NotEnoughSpace, 6)));
        assert_eq!(&buffer, b"AmC\xCC\xA7z");
    }

    #[test]
    fn test_nfd_already_decomposed_is_fixed_point() {
        let input = b"A\xCC\x80 o\xCC\x88".to_vec();
        assert_eq!(transformed(&input, Normalisation::NFD), input);
    }

    #[test]
    fn test_transform_replaces_malformed() {
        assert_eq!(
            transformed(b"a\xCEb", Normalisation::NFD),
            b"a\xEF\xBF\xBDb".to_vec()
        );
        // A truncated tail is a single replacement too.
        assert_eq!(
            transformed(b"a\xCE", Normalisation::NFD),
            b"a\xEF\xBF\xBD".to_vec()
        );
    }

    #[test]
    fn test_hangul_round_trip() {
        let syllable = encode_all(&[0xD4DB]);
        let jamo = encode_all(&[0x1111, 0x1171, 0x11B6]);
        assert_eq!(transformed(&syllable, Normalisation::NFD), jamo);
        assert_eq!(transformed(&jamo, Normalisation::NFC), syllable);
        assert_eq!(transformed(&syllable, Normalisation::NFC), syllable);
    }

    #[test]
    fn test_hangul_boundary_syllables() {
        assert_eq!(
            transformed(&encode_all(&[0xAC00]), Normalisation::NFD),
            encode_all(&[0x1100, 0x1161])
        );
        assert_eq!(
            transformed(&encode_all(&[0xD7A3]), Normalisation::NFD),
            encode_all(&[0x1112, 0x1175, 0x11C2])
        );
    }

    #[test]
    fn test_reorder_sorts_and_is_stable() {
        // 0x315 (class 232) arrives before 0x300 (class 230) and must
        // end up after it; the composition then fuses a + grave.
        let input = encode_all(&[0x61, 0x315, 0x300]);
        assert_eq!(
            transformed(&input, Normalisation::NFD),
            encode_all(&[0x61, 0x300, 0x315])
        );
        assert_eq!(
            transformed(&input, Normalisation::NFC),
            encode_all(&[0xE0, 0x315])
        );
    }

    #[test]
    fn test_composition_blocking() {
        // E + acute + circumflex: the acute composes, the circumflex
        // cannot reach the new starter through an equal-class mark.
        let input = encode_all(&[0x45, 0x301, 0x302]);
        assert_eq!(
            transformed(&input, Normalisation::NFC),
            encode_all(&[0xC9, 0x302])
        );
    }

    #[test]
    fn test_nfkd_compatibility() {
        assert_eq!(
            transformed(&encode_all(&[0xFB04]), Normalisation::NFKD),
            b"ffl".to_vec()
        );
        // NFD leaves compatibility ligatures alone.
        assert_eq!(
            transformed(&encode_all(&[0xFB04]), Normalisation::NFD),
            encode_all(&[0xFB04])
        );
        assert_eq!(
            transformed(&encode_all(&[0xBC]), Normalisation::NFKD),
            encode_all(&[0x31, 0x2044, 0x34])
        );
    }

    #[test]
    fn test_singleton_recomposes_to_preferred_form() {
        // The angstrom sign normalises to the letter under every form.
        assert_eq!(
            transformed(&encode_all(&[0x212B]), Normalisation::NFC),
            encode_all(&[0xC5])
        );
        assert_eq!(
            transformed(&encode_all(&[0x212B]), Normalisation::NFD),
            encode_all(&[0x41, 0x30A])
        );
    }

    #[test]
    fn test_measuring_matches_written() {
        for input in [
            &b"Bj\xC3\xB6rn Zonderland"[..],
            &b"\xC3\x80"[..],
            &encode_all(&[0xD4DB, 0x61, 0x315, 0x300])[..],
        ] {
            for form in [
                Normalisation::NFC,
                Normalisation::NFD,
                Normalisation::NFKC,
                Normalisation::NFKD,
            ] {
                let measured = transform(input, None, form).unwrap();
                let mut buffer = [0u8; 512];
                let written = transform(input, Some(&mut buffer), form).unwrap();
                assert_eq!(measured, written);
            }
        }
    }

    #[test]
    fn test_idempotence() {
        let inputs: Vec<Vec<u8>> = vec![
            b"Bj\xC3\xB6rn".to_vec(),
            encode_all(&[0x212B, 0x390, 0xD4DB, 0x304C]),
            encode_all(&[0x61, 0x315, 0x300, 0x327]),
        ];
        for input in inputs {
            for form in [
                Normalisation::NFC,
                Normalisation::NFD,
                Normalisation::NFKC,
                Normalisation::NFKD,
            ] {
                let once = transformed(&input, form);
                let twice = transformed(&once, form);
                assert_eq!(once, twice);
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            transform(b"", None, Normalisation::NFC),
            Err(ConvertErr::new(ErrorKind::InvalidData, 0))
        );
    }

    #[test]
    fn test_quick_check() {
        // "å" precomposed.
        assert_eq!(
            quick_check(&[0x00E5], Normalisation::NFC),
            IsNormalised::Yes
        );
        // "å" decomposed: the combining mark could belong to either a
        // normalised or an unnormalised string.
        assert_eq!(
            quick_check(&[0x61, 0x030A], Normalisation::NFC),
            IsNormalised::Maybe
        );
        assert_eq!(
            quick_check(&[0x61, 0x030A], Normalisation::NFD),
            IsNormalised::Yes
        );
        assert_eq!(
            quick_check(&[0x00E5], Normalisation::NFD),
            IsNormalised::No
        );
        // Marks out of canonical order fail every form.
        assert_eq!(
            quick_check(&[0x61, 0x315, 0x300], Normalisation::NFD),
            IsNormalised::No
        );
        assert_eq!(
            quick_check(&[0xFB04], Normalisation::NFKC),
            IsNormalised::No
        );
        assert_eq!(quick_check(&[0xFB04], Normalisation::NFC), IsNormalised::Yes);
    }

    // Conformance cases in the style of NormalizationTest.txt:
    //   nfc == toNFC(source) == toNFC(nfc) == toNFC(nfd)
    //   nfd == toNFD(source) == toNFD(nfc) == toNFD(nfd)
    //   nfkc == toNFKC(source); nfkc == toNFC(nfkc) == toNFC(nfkd)
    //   nfkd == toNFKD(source) == toNFD(nfkd)
    #[derive(serde::Deserialize)]
    struct ConformanceCase {
        source: Vec<u32>,
        nfc: Vec<u32>,
        nfd: Vec<u32>,
        nfkc: Vec<u32>,
        nfkd: Vec<u32>,
    }

    fn load_cases() -> Vec<ConformanceCase> {
        let file = std::fs::File::open("resources/normalisation-cases.json").unwrap();
        serde_json::from_reader(std::io::BufReader::new(file)).unwrap()
    }

    #[test]
    fn test_conformance_cases() {
        for case in load_cases() {
            let source = encode_all(&case.source);
            let nfc = encode_all(&case.nfc);
            let nfd = encode_all(&case.nfd);
            let nfkc = encode_all(&case.nfkc);
            let nfkd = encode_all(&case.nfkd);

            assert_eq!(transformed(&source, Normalisation::NFC), nfc);
            assert_eq!(transformed(&nfc, Normalisation::NFC), nfc);
            assert_eq!(transformed(&nfd, Normalisation::NFC), nfc);

            assert_eq!(transformed(&source, Normalisation::NFD), nfd);
            assert_eq!(transformed(&nfc, Normalisation::NFD), nfd);
            assert_eq!(transformed(&nfd, Normalisation::NFD), nfd);

            assert_eq!(transformed(&source, Normalisation::NFKC), nfkc);
            assert_eq!(transformed(&nfkc, Normalisation::NFC), nfkc);
            assert_eq!(transformed(&nfkd, Normalisation::NFC), nfkc);

            assert_eq!(transformed(&source, Normalisation::NFKD), nfkd);
            assert_eq!(transformed(&nfkd, Normalisation::NFD), nfkd);
        }
    }
}
