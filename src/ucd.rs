use crate::hangul;
use crate::normalise::Normalisation;
use crate::tables;
use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

/// One 1024-codepoint page of a property table. Only pages with at
/// least one entry are stored; lookup walks page, then offset within
/// the page, and falls through to the property default when either is
/// missing.
pub(crate) struct PropertyPage<T: 'static> {
    pub number: u16,
    pub entries: &'static [(u16, T)],
}

fn lookup<T: Copy>(pages: &'static [PropertyPage<T>], code_point: u32) -> Option<T> {
    let number = (code_point >> 10) as u16;
    let page = match pages.binary_search_by_key(&number, |page| page.number) {
        Ok(index) => &pages[index],
        Err(_) => return None,
    };
    let offset = (code_point & 0x3FF) as u16;
    match page.entries.binary_search_by_key(&offset, |entry| entry.0) {
        Ok(index) => Some(page.entries[index].1),
        Err(_) => None,
    }
}

lazy_static! {
    // D114: the primary composites are the canonical decomposables
    // minus the full composition exclusions. The table stores them as
    // pairs; this map serves the composition pass.
    static ref PRIMARY_COMPOSITES: HashMap<(u32, u32), u32> = tables::COMPOSITION_PAIRS
        .iter()
        .map(|&(starter, combiner, composite)| ((starter, combiner), composite))
        .collect();

    // Everything that can appear as the second half of a pair; these
    // are the quick-check Maybes for the composing forms.
    static ref COMPOSING_MARKS: HashSet<u32> = tables::COMPOSITION_PAIRS
        .iter()
        .map(|&(_, combiner, _)| combiner)
        .collect();
}

pub(crate) fn combining_class(code_point: u32) -> u8 {
    lookup(tables::CCC_PAGES, code_point).unwrap_or(0)
}

/// The decomposition for `code_point` under the requested treatment,
/// already expanded to its fixed point. Canonical entries apply to all
/// forms; compatibility entries only when `compatibility` is set.
pub(crate) fn decomposition_mapping(
    code_point: u32,
    compatibility: bool,
) -> Option<&'static [u32]> {
    let (flags, mapping) = lookup(tables::DECOMPOSITION_PAGES, code_point)?;
    if flags & tables::CANONICAL != 0 || compatibility {
        Some(mapping)
    } else {
        None
    }
}

pub(crate) fn primary_composite(starter: u32, combiner: u32) -> Option<u32> {
    PRIMARY_COMPOSITES.get(&(starter, combiner)).copied()
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum QuickCheckVal {
    Yes,
    No,
    Maybe,
}

pub(crate) fn quick_check_value(code_point: u32, normalisation: Normalisation) -> QuickCheckVal {
    match normalisation {
        Normalisation::NFD => decomposing_quick_check(code_point, false),
        Normalisation::NFKD => decomposing_quick_check(code_point, true),
        Normalisation::NFC => composing_quick_check(code_point, false),
        Normalisation::NFKC => composing_quick_check(code_point, true),
    }
}

fn decomposing_quick_check(code_point: u32, compatibility: bool) -> QuickCheckVal {
    if hangul::is_syllable(code_point)
        || decomposition_mapping(code_point, compatibility).is_some()
    {
        QuickCheckVal::No
    } else {
        QuickCheckVal::Yes
    }
}

fn composing_quick_check(code_point: u32, compatibility: bool) -> QuickCheckVal {
    if COMPOSING_MARKS.contains(&code_point)
        || hangul::is_jamo_v(code_point)
        || hangul::is_jamo_t(code_point)
    {
        return QuickCheckVal::Maybe;
    }
    match lookup(tables::DECOMPOSITION_PAGES, code_point) {
        None => QuickCheckVal::Yes,
        Some((flags, mapping)) => {
            if flags & tables::COMPATIBILITY != 0 {
                return if compatibility {
                    QuickCheckVal::No
                } else {
                    QuickCheckVal::Yes
                };
            }
            // A canonical decomposable passes only if its decomposition
            // recomposes to it, i.e. it is not composition-excluded.
            if recomposes_to(mapping, code_point) {
                QuickCheckVal::Yes
            } else {
                QuickCheckVal::No
            }
        }
    }
}

fn recomposes_to(mapping: &[u32], code_point: u32) -> bool {
    if mapping.len() < 2 {
        // Singleton decompositions never recompose.
        return false;
    }
    let mut acc = mapping[0];
    for &mark in &mapping[1..] {
        match primary_composite(acc, mark) {
            Some(composite) => acc = composite,
            None => return false,
        }
    }
    acc == code_point
}

/// Coarse general category: just enough to tell word characters, marks
/// and digits apart for case-mapping context.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum CharClass {
    Letter,
    Mark,
    Number,
    Other,
}

pub(crate) fn char_class(code_point: u32) -> CharClass {
    let ranges = tables::CATEGORY_RANGES;
    let index = match ranges.binary_search_by_key(&code_point, |&(start, _, _)| start) {
        Ok(index) => index,
        Err(0) => return CharClass::Other,
        Err(index) => index - 1,
    };
    let (_, end, class) = ranges[index];
    if code_point <= end {
        class
    } else {
        CharClass::Other
    }
}

/// The slice of Case_Ignorable this crate needs: marks, the modifier
/// letters, and the MidLetter/MidNumLet punctuation.
pub(crate) fn case_ignorable(code_point: u32) -> bool {
    matches!(code_point, 0x27 | 0x2E | 0x3A | 0xB7 | 0x2019 | 0x2027)
        || (0x2B0..=0x2C1).contains(&code_point)
        || char_class(code_point) == CharClass::Mark
}

pub(crate) fn cased(code_point: u32) -> bool {
    !case_ignorable(code_point) && char_class(code_point) == CharClass::Letter
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum CaseKind {
    Upper,
    Lower,
    Title,
    Fold,
}

/// Mappings that differ from identity; `None` means the codepoint maps
/// to itself. Title falls back to upper when no dedicated entry exists.
pub(crate) fn case_mapping(code_point: u32, kind: CaseKind) -> Option<&'static [u32]> {
    match kind {
        CaseKind::Upper => lookup(tables::UPPER_PAGES, code_point),
        CaseKind::Lower => lookup(tables::LOWER_PAGES, code_point),
        CaseKind::Title => lookup(tables::TITLE_PAGES, code_point)
            .or_else(|| lookup(tables::UPPER_PAGES, code_point)),
        CaseKind::Fold => lookup(tables::FOLD_PAGES, code_point),
    }
}
