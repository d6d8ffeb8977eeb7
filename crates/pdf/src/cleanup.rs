use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

const LIGATURES: [(char, &str); 5] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean the text of one table cell.
///
/// Applies NFKC normalization (full-width digits and punctuation become
/// ASCII), drops replacement characters, and collapses whitespace runs into
/// a single space. Returns `None` when nothing is left.
pub fn clean_cell(text: &str) -> Option<String> {
    let normalized: String = text.nfkc().filter(|c| *c != '\u{FFFD}').collect();

    static RE_SPACES: OnceLock<Regex> = OnceLock::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r"\s+").unwrap());
    let collapsed = re_spaces.replace_all(&normalized, " ");

    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Clean the plain text of a page before keyword matching.
///
/// Only NFC normalization and ligature repair are applied, so full-width
/// keywords still match their full-width occurrences.
pub fn clean_page_text(text: &str) -> String {
    let mut result: String = text.nfc().filter(|c| *c != '\u{FFFD}').collect();
    for (ligature, replacement) in LIGATURES {
        if result.contains(ligature) {
            result = result.replace(ligature, replacement);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_cell_passthrough() {
        assert_eq!(clean_cell("Net sales").as_deref(), Some("Net sales"));
    }

    #[test]
    fn test_clean_cell_folds_fullwidth() {
        assert_eq!(clean_cell("１，２３４").as_deref(), Some("1,234"));
        assert_eq!(clean_cell("２０２４年３月期").as_deref(), Some("2024年3月期"));
    }

    #[test]
    fn test_clean_cell_collapses_whitespace() {
        assert_eq!(clean_cell("  売上\n  高 ").as_deref(), Some("売上 高"));
    }

    #[test]
    fn test_clean_cell_empty() {
        assert_eq!(clean_cell("   "), None);
        assert_eq!(clean_cell("\u{FFFD}"), None);
    }

    #[test]
    fn test_clean_page_text_keeps_fullwidth() {
        assert_eq!(clean_page_text("売上高　２０２４"), "売上高　２０２４");
    }

    #[test]
    fn test_clean_page_text_fixes_ligatures() {
        assert_eq!(clean_page_text("pro\u{FB01}t"), "profit");
    }
}
