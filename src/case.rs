// Default casing plus the locale-tailored rules of SpecialCasing.txt
// for Turkish/Azeri and Lithuanian.

use crate::cp_iter::read_lossy;
use crate::error::{ConvertErr, ErrorKind};
use crate::reorder::{ReorderBuffer, RUN_CAPACITY};
use crate::ucd::{case_ignorable, case_mapping, cased, combining_class, CaseKind};
use crate::writer::Utf8Writer;
use std::sync::atomic::{AtomicU8, Ordering};

/// Locales whose casing departs from the default rules. Azeri shares
/// the Turkish dotted/dotless i behaviour, so both map here to
/// `Turkish`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Locale {
    Default,
    Turkish,
    Lithuanian,
}

impl Locale {
    /// Match on the language subtag only; region and script subtags are
    /// ignored, so "tr", "tr-TR" and "az_AZ" all tailor the same way.
    pub fn from_tag(tag: &str) -> Locale {
        let language = tag
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("");
        match language {
            "tr" | "az" => Locale::Turkish,
            "lt" => Locale::Lithuanian,
            _ => Locale::Default,
        }
    }
}

static PROCESS_LOCALE: AtomicU8 = AtomicU8::new(0);

/// Set the process-wide default locale. Transforms read it once at call
/// entry; a concurrent change lands at some run boundary of in-flight
/// calls, so callers that need determinism serialise externally.
pub fn set_locale(locale: Locale) {
    PROCESS_LOCALE.store(locale as u8, Ordering::Relaxed);
}

pub fn current_locale() -> Locale {
    match PROCESS_LOCALE.load(Ordering::Relaxed) {
        1 => Locale::Turkish,
        2 => Locale::Lithuanian,
        _ => Locale::Default,
    }
}

pub fn to_upper(input: &[u8], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Upper, current_locale())
}

pub fn to_upper_locale(
    input: &[u8],
    target: Option<&mut [u8]>,
    locale: Locale,
) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Upper, locale)
}

pub fn to_lower(input: &[u8], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Lower, current_locale())
}

pub fn to_lower_locale(
    input: &[u8],
    target: Option<&mut [u8]>,
    locale: Locale,
) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Lower, locale)
}

pub fn to_title(input: &[u8], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Title, current_locale())
}

pub fn to_title_locale(
    input: &[u8],
    target: Option<&mut [u8]>,
    locale: Locale,
) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Title, locale)
}

/// Case folding is locale-independent; the Turkic fold variants are not
/// provided.
pub fn case_fold(input: &[u8], target: Option<&mut [u8]>) -> Result<usize, ConvertErr> {
    case_transform(input, target, CaseKind::Fold, Locale::Default)
}

fn case_transform(
    input: &[u8],
    target: Option<&mut [u8]>,
    kind: CaseKind,
    locale: Locale,
) -> Result<usize, ConvertErr> {
    if input.is_empty() {
        return Err(ConvertErr::new(ErrorKind::InvalidData, 0));
    }
    let mut writer = Utf8Writer::new(target);
    let mut run = ReorderBuffer::new();
    // Whether the last non-ignorable codepoint was cased; drives both
    // title-case word boundaries and the final-sigma rule.
    let mut word_cased = false;
    let mut pos = 0;
    while pos < input.len() {
        let (code_point, consumed) = read_lossy(input, pos);
        pos += consumed;
        run.clear();
        run.push_unsorted(code_point, combining_class(code_point));
        // Gather the combining marks that belong to this codepoint,
        // leaving one slot free for the mark Lithuanian may insert.
        // Lithuanian needs them in canonical order to find the marks
        // sitting above the base; other locales keep arrival order.
        while pos < input.len() && run.len() < RUN_CAPACITY - 1 {
            let (mark, mark_consumed) = read_lossy(input, pos);
            let ccc = combining_class(mark);
            if ccc == 0 {
                break;
            }
            if locale == Locale::Lithuanian {
                run.push(mark, ccc);
            } else {
                run.push_unsorted(mark, ccc);
            }
            pos += mark_consumed;
        }
        let result = map_run(&mut run, kind, locale, &mut word_cased, input, pos, &mut writer);
        if let Err(error) = result {
            return Err(ConvertErr::new(error, writer.written()));
        }
    }
    Ok(writer.written())
}

fn map_run(
    run: &mut ReorderBuffer,
    kind: CaseKind,
    locale: Locale,
    word_cased: &mut bool,
    input: &[u8],
    after_run: usize,
    writer: &mut Utf8Writer,
) -> Result<(), ErrorKind> {
    let (base, _) = run.as_slice()[0];
    let preceded_by_cased = *word_cased;

    // Title case is a word-boundary state machine: the first cased
    // codepoint of a word takes the title mapping, the rest lowercase.
    let effective = if kind == CaseKind::Title {
        if cased(base) && !preceded_by_cased {
            CaseKind::Title
        } else {
            CaseKind::Lower
        }
    } else {
        kind
    };
    if cased(base) {
        *word_cased = true;
    } else if !case_ignorable(base) {
        *word_cased = false;
    }

    if locale == Locale::Turkish {
        match effective {
            CaseKind::Upper | CaseKind::Title => {
                if base == 0x0069 {
                    // i gains its dot back as a dotted capital; an
                    // explicit combining dot above is absorbed instead.
                    if let Some(index) = find_mark(run, 0x0307) {
                        run.remove(index);
                        writer.push(0x0049)?;
                    } else {
                        writer.push(0x0130)?;
                    }
                    return emit_marks(run, effective, writer);
                }
            }
            CaseKind::Lower => {
                if base == 0x0049 {
                    if let Some(index) = find_mark(run, 0x0307) {
                        run.remove(index);
                        writer.push(0x0069)?;
                    } else {
                        writer.push(0x0131)?;
                    }
                    return emit_marks(run, effective, writer);
                }
                if base == 0x0130 {
                    writer.push(0x0069)?;
                    return emit_marks(run, effective, writer);
                }
            }
            CaseKind::Fold => {}
        }
    }

    if locale == Locale::Lithuanian {
        match effective {
            CaseKind::Upper | CaseKind::Title => {
                // The dot above a soft-dotted base disappears when the
                // base regains its own dot. The run is class-sorted, so
                // an intervening above-mark shows up first and blocks.
                if matches!(base, 0x0069 | 0x006A | 0x012F) {
                    if let Some(index) = first_mark_of_class(run, 230) {
                        if run.as_slice()[index].0 == 0x0307 {
                            run.remove(index);
                        }
                    }
                }
            }
            CaseKind::Lower => {
                // A following above-mark forces the soft dot to be
                // written out between the base and the mark.
                if matches!(base, 0x0049 | 0x004A | 0x012E)
                    && first_mark_of_class(run, 230).is_some()
                {
                    map_base(base, effective, writer)?;
                    run.insert_before_class(0x0307, 230);
                    return emit_marks(run, effective, writer);
                }
            }
            CaseKind::Fold => {}
        }
    }

    // Table 3-17: capital sigma lowercases to the final form when a
    // cased letter comes before it and none comes after, skipping
    // case-ignorables on both sides.
    if base == 0x03A3 && effective == CaseKind::Lower {
        let sigma = if preceded_by_cased && !followed_by_cased(input, after_run) {
            0x03C2
        } else {
            0x03C3
        };
        writer.push(sigma)?;
        return emit_marks(run, effective, writer);
    }

    map_base(base, effective, writer)?;
    emit_marks(run, effective, writer)
}

fn map_base(code_point: u32, kind: CaseKind, writer: &mut Utf8Writer) -> Result<(), ErrorKind> {
    if code_point < 0x80 {
        return writer.push(ascii_mapping(code_point, kind));
    }
    match case_mapping(code_point, kind) {
        Some(mapping) => {
            for &mapped in mapping {
                writer.push(mapped)?;
            }
            Ok(())
        }
        None => writer.push(code_point),
    }
}

fn ascii_mapping(code_point: u32, kind: CaseKind) -> u32 {
    match kind {
        CaseKind::Upper | CaseKind::Title => {
            if (0x61..=0x7A).contains(&code_point) {
                code_point - 0x20
            } else {
                code_point
            }
        }
        CaseKind::Lower | CaseKind::Fold => {
            if (0x41..=0x5A).contains(&code_point) {
                code_point + 0x20
            } else {
                code_point
            }
        }
    }
}

fn emit_marks(run: &ReorderBuffer, kind: CaseKind, writer: &mut Utf8Writer) -> Result<(), ErrorKind> {
    for &(mark, _) in &run.as_slice()[1..] {
        map_base(mark, kind, writer)?;
    }
    Ok(())
}

fn find_mark(run: &ReorderBuffer, code_point: u32) -> Option<usize> {
    run.as_slice()
        .iter()
        .skip(1)
        .position(|&(mark, _)| mark == code_point)
        .map(|index| index + 1)
}

fn first_mark_of_class(run: &ReorderBuffer, ccc: u8) -> Option<usize> {
    run.as_slice()
        .iter()
        .skip(1)
        .position(|&(_, class)| class >= ccc)
        .map(|index| index + 1)
}

fn followed_by_cased(input: &[u8], mut pos: usize) -> bool {
    while pos < input.len() {
        let (code_point, consumed) = read_lossy(input, pos);
        pos += consumed;
        if case_ignorable(code_point) {
            continue;
        }
        return cased(code_point);
    }
    false
}
