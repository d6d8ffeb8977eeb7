//! Horizontal merge: one period per chunk, amounts in the last column.
//!
//! Used for reports where each table holds a single period and the
//! consolidation runs across files rather than across columns.

use crate::frame::{collapse_duplicates, parse_amount, Chunk, DuplicatePolicy, TableFrame};
use crate::label::disambiguate;
use crate::period::{detect, PeriodLabel};

/// Rows searched for the period header.
const HEADER_SEARCH_ROWS: usize = 10;

/// Period name used when the header cell is blank.
pub const UNKNOWN_PERIOD: &str = "Unknown_Period";

/// Build the single-period frame of a horizontally laid out chunk.
///
/// Blank columns are dropped first; fewer than two remaining columns means
/// there is nothing to read. The period comes from the first header found
/// in the first ten rows, and data starts on the row below it. Without a
/// header, the top-right cell names the period and data starts on row 0.
///
/// Rows whose last cell does not parse as an amount are dropped. Repeated
/// items are summed, and the frame's items come out in label order.
pub fn merge_horizontal(chunk: &Chunk) -> Option<TableFrame> {
    if chunk.is_empty() {
        return None;
    }

    let table = chunk.drop_blank_columns();
    if table.width() < 2 {
        log::debug!("horizontal: chunk has {} usable columns", table.width());
        return None;
    }
    let last = table.width() - 1;

    let header = table
        .rows()
        .take(HEADER_SEARCH_ROWS)
        .enumerate()
        .find_map(|(row, cells)| cells.iter().find_map(|c| detect(c)).map(|p| (row, p)));

    let (start, period) = match header {
        Some((row, period)) => (row + 1, period),
        None => {
            let fallback = table.cell(0, last).trim();
            let fallback = if fallback.is_empty() {
                UNKNOWN_PERIOD
            } else {
                fallback
            };
            (0, PeriodLabel::literal(fallback))
        }
    };

    let (labels, values): (Vec<&str>, Vec<f64>) = table
        .rows()
        .skip(start)
        .filter_map(|row| {
            let label = row[0].trim();
            if label.is_empty() {
                return None;
            }
            parse_amount(&row[last]).map(|v| (label, v))
        })
        .unzip();

    if labels.is_empty() {
        return None;
    }

    let pairs = disambiguate(labels).into_iter().zip(values).collect();
    let pairs = collapse_duplicates(pairs, DuplicatePolicy::Sum);
    Some(TableFrame::from_pairs(period, pairs))
}
