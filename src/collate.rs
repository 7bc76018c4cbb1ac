//! Hebrew-aware string ordering.
//!
//! The Hebrew block is encoded in alphabet order (א U+05D0 through ת U+05EA),
//! so comparing folded strings code point by code point yields the natural
//! Hebrew ordering, with Latin letters and digits ordering before Hebrew,
//! the same script ordering ICU applies for the `he` locale. The five final
//! letterforms are folded to their base letters so final/base variants of
//! the same letter compare as equals.

use std::cmp::Ordering;

use unicode_script::{Script, UnicodeScript};

pub fn is_hebrew(c: char) -> bool {
    c.script() == Script::Hebrew
}

/// Fold a final letterform to its base letter.
fn fold_final(c: char) -> char {
    match c {
        'ך' => 'כ',
        'ם' => 'מ',
        'ן' => 'נ',
        'ף' => 'פ',
        'ץ' => 'צ',
        _ => c,
    }
}

/// Collation key: case-folded, final letterforms folded.
pub fn sort_key(value: &str) -> String {
    value
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_final)
        .collect()
}

pub fn compare(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}
