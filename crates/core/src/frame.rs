//! Table chunks and the item × period frames built from them.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::label::ItemLabel;
use crate::period::PeriodLabel;
use crate::text::{fold_fullwidth, is_blank};

/// One extracted row. Missing cells are stored as empty strings.
pub type RawRow = Vec<String>;

/// A rectangular block of cells cut out of the intermediate rows.
///
/// Ragged input rows are padded with empty cells to the width of the widest
/// row, so every `(row, col)` inside the bounds is addressable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Chunk {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Self { rows, width }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Cell text, or `""` when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Copy of this chunk without the columns whose cells are all blank.
    pub fn drop_blank_columns(&self) -> Chunk {
        let keep: Vec<usize> = (0..self.width)
            .filter(|&col| self.rows.iter().any(|row| !is_blank(&row[col])))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&col| row[col].clone()).collect())
            .collect();

        Chunk {
            rows,
            width: keep.len(),
        }
    }
}

/// Parse a cell as an amount.
///
/// Full-width digits are folded, surrounding whitespace is trimmed and
/// thousands separators are dropped. Anything that is still not a finite
/// number yields `None`.
pub fn parse_amount(cell: &str) -> Option<f64> {
    let folded = fold_fullwidth(cell);
    let cleaned: String = folded.trim().chars().filter(|&c| c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// What to do when the same item appears twice inside one column slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the first occurrence, in encounter order.
    KeepFirst,
    /// Sum all occurrences. The result is ordered by item label.
    Sum,
}

/// Collapse repeated items of a single-period slice.
pub fn collapse_duplicates(
    pairs: Vec<(ItemLabel, f64)>,
    policy: DuplicatePolicy,
) -> Vec<(ItemLabel, f64)> {
    match policy {
        DuplicatePolicy::KeepFirst => {
            let mut seen = HashSet::new();
            pairs
                .into_iter()
                .filter(|(item, _)| seen.insert(item.clone()))
                .collect()
        }
        DuplicatePolicy::Sum => {
            let mut sums: BTreeMap<ItemLabel, f64> = BTreeMap::new();
            for (item, value) in pairs {
                *sums.entry(item).or_insert(0.0) += value;
            }
            sums.into_iter().collect()
        }
    }
}

/// Values of one period, aligned with the owning frame's items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodColumn {
    pub period: PeriodLabel,
    pub values: Vec<Option<f64>>,
}

/// Item × period table produced from one chunk, or accumulated across the
/// chunks of one slot.
///
/// Items are unique and keep their insertion order. Each period appears at
/// most once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableFrame {
    items: Vec<ItemLabel>,
    columns: Vec<PeriodColumn>,
}

impl TableFrame {
    /// An empty frame over `items`. Duplicate items after the first are
    /// dropped.
    pub fn new(items: Vec<ItemLabel>) -> Self {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.clone()))
            .collect();

        Self {
            items,
            columns: Vec::new(),
        }
    }

    /// A single-period frame. `pairs` must not repeat an item; run them
    /// through [`collapse_duplicates`] first.
    pub fn from_pairs(period: PeriodLabel, pairs: Vec<(ItemLabel, f64)>) -> Self {
        let (items, values): (Vec<_>, Vec<_>) =
            pairs.into_iter().map(|(item, v)| (item, Some(v))).unzip();

        Self {
            items,
            columns: vec![PeriodColumn { period, values }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ItemLabel] {
        &self.items
    }

    pub fn columns(&self) -> &[PeriodColumn] {
        &self.columns
    }

    pub fn periods(&self) -> impl Iterator<Item = &PeriodLabel> {
        self.columns.iter().map(|c| &c.period)
    }

    pub fn has_period(&self, period: &PeriodLabel) -> bool {
        self.columns.iter().any(|c| &c.period == period)
    }

    /// Value at `(item, period)`; `None` when either is absent or the cell
    /// was never filled.
    pub fn value(&self, item: &ItemLabel, period: &PeriodLabel) -> Option<f64> {
        let row = self.items.iter().position(|i| i == item)?;
        self.value_at(row, period)
    }

    pub(crate) fn value_at(&self, row: usize, period: &PeriodLabel) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| &c.period == period)
            .and_then(|c| c.values.get(row).copied().flatten())
    }

    /// Left-join `other` onto this frame by item.
    ///
    /// Rows of `self` are kept as they are; items only present in `other` are
    /// ignored. Periods `self` already has are skipped, so the first frame to
    /// contribute a period wins.
    pub fn left_merge(&mut self, other: &TableFrame) {
        let lookup: HashMap<&ItemLabel, usize> = other
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item, idx))
            .collect();

        for column in &other.columns {
            if self.has_period(&column.period) {
                continue;
            }

            let values = self
                .items
                .iter()
                .map(|item| {
                    lookup
                        .get(item)
                        .and_then(|&idx| column.values.get(idx).copied().flatten())
                })
                .collect();

            self.columns.push(PeriodColumn {
                period: column.period.clone(),
                values,
            });
        }
    }
}
