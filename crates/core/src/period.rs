//! Period header detection and chronological ordering.
//!
//! A period header is any table cell that names a reporting period: a
//! quarter code (`2024Q1`), a Japanese year-month (`2024年3月期`), a fiscal
//! year (`2024年度`), a slash notation (`2024/3`, `'24/3`) or a bare numeric
//! year (`2024`, `202403`). [`detect`] normalizes all of them to a canonical
//! [`PeriodLabel`]; [`sort_key`] maps canonical labels onto a single numeric
//! axis so summary columns can be ordered.

use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::text::fold_fullwidth;

/// Sort key assigned to headers that carry no digits at all.
pub const UNSORTABLE: u64 = 99_999_999;

/// Width every digit run is right-padded to before it is compared.
const SORT_KEY_WIDTH: usize = 6;

/// Canonical name of a reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodLabel(String);

impl PeriodLabel {
    /// Wrap a literal label that did not come out of [`detect`], such as the
    /// fallback header of a horizontal block.
    pub fn literal(label: impl Into<String>) -> Self {
        PeriodLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric chronological key of this label. See [`sort_key`].
    pub fn sort_key(&self) -> u64 {
        sort_key(&self.0)
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Matcher {
    pattern: Regex,
    format: fn(&Captures<'_>) -> String,
}

/// The ordered notation matchers. Specific notations come first so the
/// generic numeric ones never capture a substring of them.
fn matchers() -> &'static [Matcher] {
    static MATCHERS: OnceLock<Vec<Matcher>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        vec![
            // 2024Q1
            Matcher {
                pattern: Regex::new(r"(?i)(20[0-9]{2}Q[1-4])").unwrap(),
                format: |c| c[1].to_uppercase(),
            },
            // (自 2024年4月1日 ...
            Matcher {
                pattern: Regex::new(r"\(?自\s*([0-9]{4})年([0-9]{1,2})月").unwrap(),
                format: |c| format!("{}/{}", &c[1], &c[2]),
            },
            // 2024年3月期, 2024年3月
            Matcher {
                pattern: Regex::new(r"([0-9]{4})年([0-9]{1,2})月").unwrap(),
                format: |c| format!("{}/{}", &c[1], &c[2]),
            },
            // 2024年度
            Matcher {
                pattern: Regex::new(r"([0-9]{4})年度").unwrap(),
                format: |c| format!("{}年度", &c[1]),
            },
            // '24/3
            Matcher {
                pattern: Regex::new(r"^'?([0-9]{2})/([0-9]{1,2})$").unwrap(),
                format: |c| format!("20{}/{}", &c[1], &c[2]),
            },
            // 2024/3
            Matcher {
                pattern: Regex::new(r"([0-9]{4})/([0-9]{1,2})").unwrap(),
                format: |c| format!("{}/{}", &c[1], &c[2]),
            },
            // 2024, 202403
            Matcher {
                pattern: Regex::new(r"^20[0-9]{2}([0-9]{2})?$").unwrap(),
                format: |c| c[0].to_string(),
            },
        ]
    })
}

/// Classify a single cell as a period header.
///
/// The cell is trimmed and full-width digits are folded before matching.
/// The first matcher that hits wins; `None` means the cell is not a period.
pub fn detect(cell: &str) -> Option<PeriodLabel> {
    let folded = fold_fullwidth(cell.trim());

    matchers().iter().find_map(|matcher| {
        matcher
            .pattern
            .captures(&folded)
            .map(|caps| PeriodLabel((matcher.format)(&caps)))
    })
}

/// Numeric chronological key of a column header.
///
/// The header is uppercased, `/` is removed, `Q` becomes `0`, the `年度`,
/// `年` and `月` markers are removed, and the remaining digits are
/// right-padded with zeros to six places. Headers without digits get
/// [`UNSORTABLE`] so they sort after every period.
pub fn sort_key(header: &str) -> u64 {
    let normalized = fold_fullwidth(header)
        .to_uppercase()
        .replace('/', "")
        .replace('Q', "0")
        .replace("年度", "")
        .replace(['年', '月'], "");

    let digits: String = normalized.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return UNSORTABLE;
    }

    format!("{digits:0<SORT_KEY_WIDTH$}")
        .parse::<u64>()
        .unwrap_or(u64::MAX)
}

/// Stable chronological sort: labels with equal keys keep their order.
pub fn sort_periods(periods: &mut [PeriodLabel]) {
    periods.sort_by_key(PeriodLabel::sort_key);
}
