//! Small text helpers shared by the detectors and parsers.

use std::borrow::Cow;

/// Fold full-width digits and the punctuation used in period and amount
/// notations down to their ASCII forms.
///
/// Japanese reports frequently mix `２０２４年３月` with `2024年3月`; folding
/// first lets every matcher work on a single alphabet. Strings that contain
/// nothing to fold are returned borrowed.
pub fn fold_fullwidth(s: &str) -> Cow<'_, str> {
    if !s.chars().any(needs_fold) {
        return Cow::Borrowed(s);
    }

    Cow::Owned(s.chars().map(fold_char).collect())
}

fn needs_fold(c: char) -> bool {
    fold_char(c) != c
}

fn fold_char(c: char) -> char {
    match c {
        '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
        '／' => '/',
        'Ｑ' => 'Q',
        'ｑ' => 'q',
        '，' => ',',
        '．' => '.',
        '－' | '−' => '-',
        '（' => '(',
        '）' => ')',
        '＇' => '\'',
        '\u{3000}' => ' ',
        other => other,
    }
}

/// `true` when the cell holds nothing but whitespace.
pub fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}
