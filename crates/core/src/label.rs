//! Line-item labels and the "other" disambiguation rule.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The catch-all line item. A single statement may list it several times,
/// once per section, so each occurrence needs its own identity.
pub const OTHER_LABEL: &str = "その他";

/// Identity of a line item within one table.
///
/// Two labels with the same display text are the same item unless both are
/// [`OTHER_LABEL`] occurrences with different ordinals. Ordering compares the
/// display text first, then the ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemLabel {
    display: String,
    ordinal: Option<usize>,
}

impl ItemLabel {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            ordinal: None,
        }
    }

    /// The `n`-th (0-based) occurrence of [`OTHER_LABEL`].
    pub fn other(ordinal: usize) -> Self {
        Self {
            display: OTHER_LABEL.to_string(),
            ordinal: Some(ordinal),
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn ordinal(&self) -> Option<usize> {
        self.ordinal
    }
}

impl fmt::Display for ItemLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display)
    }
}

/// Turn raw first-column texts into item labels.
///
/// Every occurrence of [`OTHER_LABEL`] receives an ordinal equal to the
/// number of earlier occurrences in the same sequence, starting at 0. All
/// other labels pass through unchanged.
pub fn disambiguate<I, S>(labels: I) -> Vec<ItemLabel>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = 0;
    labels
        .into_iter()
        .map(|label| {
            let label = label.into();
            if label == OTHER_LABEL {
                let ordinal = seen;
                seen += 1;
                ItemLabel::other(ordinal)
            } else {
                ItemLabel::new(label)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disambiguate_numbers_each_other_occurrence() {
        let labels = disambiguate(["売上高", "その他", "営業利益", "その他"]);

        assert_eq!(labels[0], ItemLabel::new("売上高"));
        assert_eq!(labels[1], ItemLabel::other(0));
        assert_eq!(labels[2], ItemLabel::new("営業利益"));
        assert_eq!(labels[3], ItemLabel::other(1));
    }

    #[test]
    fn test_disambiguate_keeps_display_text() {
        let labels = disambiguate(["その他", "その他"]);
        assert!(labels.iter().all(|l| l.display() == OTHER_LABEL));
        assert_ne!(labels[0], labels[1]);
    }

    #[test]
    fn test_disambiguate_leaves_regular_duplicates_alone() {
        let labels = disambiguate(["売上高", "売上高"]);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0].ordinal(), None);
    }

    #[test]
    fn test_ordering_is_display_then_ordinal() {
        let mut labels = vec![
            ItemLabel::other(1),
            ItemLabel::new("B"),
            ItemLabel::other(0),
            ItemLabel::new("A"),
        ];
        labels.sort();

        assert_eq!(labels[0], ItemLabel::new("A"));
        assert_eq!(labels[1], ItemLabel::new("B"));
        assert_eq!(labels[2], ItemLabel::other(0));
        assert_eq!(labels[3], ItemLabel::other(1));
    }

    #[test]
    fn test_display_prints_text_only() {
        assert_eq!(ItemLabel::other(3).to_string(), "その他");
    }
}
