//! Vertical merge: period headers anywhere in the chunk.
//!
//! Statements laid out vertically carry their period headers above the
//! amount columns, sometimes several header rows deep. Each header cell
//! starts a column slice running from the row below it to the bottom of the
//! chunk; the slices are joined on the item labels of the first column.

use std::collections::HashSet;

use crate::frame::{collapse_duplicates, parse_amount, Chunk, DuplicatePolicy, TableFrame};
use crate::label::disambiguate;
use crate::period::{detect, PeriodLabel};

#[derive(Debug)]
struct PeriodHit {
    row: usize,
    col: usize,
    period: PeriodLabel,
}

/// Every period header in the chunk, in row-major order.
fn scan_headers(chunk: &Chunk) -> Vec<PeriodHit> {
    let mut hits = Vec::new();
    for (row, cells) in chunk.rows().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            if let Some(period) = detect(cell) {
                hits.push(PeriodHit { row, col, period });
            }
        }
    }
    hits
}

/// Build the item × period frame of a vertically laid out chunk.
///
/// The frame's items are the chunk's first-column labels in order of first
/// appearance, so they double as the chunk's item order. Returns `None` when
/// the chunk is empty, has no period header, or has no labelled rows.
///
/// Within a column slice, unparseable amounts count as `0` and a repeated
/// item keeps its first value. A period seen twice only uses its first
/// header cell.
pub fn merge_vertical(chunk: &Chunk) -> Option<TableFrame> {
    if chunk.is_empty() {
        return None;
    }

    let hits = scan_headers(chunk);
    if hits.is_empty() {
        log::debug!("vertical: no period header in {}-row chunk", chunk.height());
        return None;
    }

    let labels = chunk
        .rows()
        .map(|row| row[0].trim())
        .filter(|label| !label.is_empty());
    let mut frame = TableFrame::new(disambiguate(labels));
    if frame.is_empty() {
        return None;
    }

    let mut processed = HashSet::new();
    for hit in hits {
        if !processed.insert(hit.period.clone()) {
            continue;
        }

        let (labels, values): (Vec<&str>, Vec<f64>) = chunk
            .rows()
            .skip(hit.row + 1)
            .map(|row| (row[0].trim(), parse_amount(&row[hit.col]).unwrap_or(0.0)))
            .filter(|(label, _)| !label.is_empty())
            .unzip();

        let pairs = disambiguate(labels).into_iter().zip(values).collect();
        let pairs = collapse_duplicates(pairs, DuplicatePolicy::KeepFirst);
        frame.left_merge(&TableFrame::from_pairs(hit.period, pairs));
    }

    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::ItemLabel;

    fn chunk(rows: &[&[&str]]) -> Chunk {
        Chunk::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn item(s: &str) -> ItemLabel {
        ItemLabel::new(s)
    }

    fn period(s: &str) -> PeriodLabel {
        PeriodLabel::literal(s)
    }

    #[test]
    fn test_merge_vertical_basic() {
        let c = chunk(&[
            &["", "2024Q1", "2024Q2"],
            &["Sales", "100", "120"],
            &["Cost", "40", "50"],
        ]);
        let frame = merge_vertical(&c).unwrap();

        // The header row has a blank label, so it never becomes an item.
        assert_eq!(frame.items(), &[item("Sales"), item("Cost")]);
        assert_eq!(frame.value(&item("Sales"), &period("2024Q1")), Some(100.0));
        assert_eq!(frame.value(&item("Sales"), &period("2024Q2")), Some(120.0));
        assert_eq!(frame.value(&item("Cost"), &period("2024Q1")), Some(40.0));
        assert_eq!(frame.value(&item("Cost"), &period("2024Q2")), Some(50.0));
    }

    #[test]
    fn test_header_label_row_becomes_an_item() {
        let c = chunk(&[&["科目", "2024年3月期"], &["売上高", "1,000"]]);
        let frame = merge_vertical(&c).unwrap();

        assert_eq!(frame.items(), &[item("科目"), item("売上高")]);
        assert_eq!(frame.value(&item("科目"), &period("2024/3")), None);
        assert_eq!(frame.value(&item("売上高"), &period("2024/3")), Some(1000.0));
    }

    #[test]
    fn test_unparseable_amount_becomes_zero() {
        let c = chunk(&[&["", "2024Q1"], &["Sales", "-"]]);
        let frame = merge_vertical(&c).unwrap();
        assert_eq!(frame.value(&item("Sales"), &period("2024Q1")), Some(0.0));
    }

    #[test]
    fn test_duplicate_item_keeps_first_value() {
        let c = chunk(&[&["", "2024Q1"], &["Sales", "100"], &["Sales", "50"]]);
        let frame = merge_vertical(&c).unwrap();
        assert_eq!(frame.items(), &[item("Sales")]);
        assert_eq!(frame.value(&item("Sales"), &period("2024Q1")), Some(100.0));
    }

    #[test]
    fn test_repeated_period_uses_first_header() {
        let c = chunk(&[
            &["", "2024Q1", "2024Q1"],
            &["Sales", "100", "999"],
        ]);
        let frame = merge_vertical(&c).unwrap();
        assert_eq!(frame.columns().len(), 1);
        assert_eq!(frame.value(&item("Sales"), &period("2024Q1")), Some(100.0));
    }

    #[test]
    fn test_stacked_headers_slice_from_their_own_row() {
        let c = chunk(&[
            &["", "2023年度", ""],
            &["A", "1", ""],
            &["", "", "2024年度"],
            &["B", "2", "3"],
        ]);
        let frame = merge_vertical(&c).unwrap();

        assert_eq!(frame.items(), &[item("A"), item("B")]);
        assert_eq!(frame.value(&item("A"), &period("2023年度")), Some(1.0));
        assert_eq!(frame.value(&item("B"), &period("2023年度")), Some(2.0));
        assert_eq!(frame.value(&item("A"), &period("2024年度")), None);
        assert_eq!(frame.value(&item("B"), &period("2024年度")), Some(3.0));
    }

    #[test]
    fn test_other_rows_stay_distinct() {
        let c = chunk(&[
            &["", "2024Q1"],
            &["その他", "5"],
            &["売上高", "100"],
            &["その他", "7"],
        ]);
        let frame = merge_vertical(&c).unwrap();

        assert_eq!(frame.items().len(), 3);
        assert_eq!(frame.value(&ItemLabel::other(0), &period("2024Q1")), Some(5.0));
        assert_eq!(frame.value(&ItemLabel::other(1), &period("2024Q1")), Some(7.0));
    }

    #[test]
    fn test_no_period_header_yields_nothing() {
        let c = chunk(&[&["Sales", "100"], &["Cost", "40"]]);
        assert!(merge_vertical(&c).is_none());
    }

    #[test]
    fn test_empty_chunk_yields_nothing() {
        assert!(merge_vertical(&Chunk::default()).is_none());
    }
}
