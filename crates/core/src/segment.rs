//! Marker rows and the split of intermediate rows into table slots.
//!
//! The extraction step writes one flat sheet: a file marker row per source,
//! followed by a page/table marker row per table, the table rows, and a
//! blank separator. Consolidation walks that sheet back into chunks and
//! groups the k-th table of every file into slot k.

use std::collections::BTreeMap;

use crate::frame::{Chunk, RawRow};
use crate::text::is_blank;

/// Text every file marker row starts with.
pub const FILE_MARKER: &str = "ファイル名:";

/// Text every page/table marker row starts with.
pub const TABLE_MARKER: &str = "--- ページ";

/// Chunks grouped by their position within each file.
pub type Slots = BTreeMap<usize, Vec<Chunk>>;

/// The row written before the tables of `name`.
pub fn file_marker(name: &str) -> RawRow {
    vec![format!("{FILE_MARKER} {name}")]
}

/// The row written before table `table` of `page`, both 1-based.
pub fn table_marker(page: usize, table: usize) -> RawRow {
    vec![format!("{TABLE_MARKER} {page} / テーブル {table} ---")]
}

fn first_cell(row: &[String]) -> &str {
    row.first().map(String::as_str).unwrap_or("")
}

pub fn is_file_marker(row: &[String]) -> bool {
    first_cell(row).contains(FILE_MARKER)
}

pub fn is_table_marker(row: &[String]) -> bool {
    first_cell(row).contains(TABLE_MARKER)
}

/// Marker-like rows removed from a chunk before it is merged. Any `---` in
/// the first cell counts, not only well-formed table markers.
fn is_separator(row: &[String]) -> bool {
    let first = first_cell(row);
    first.contains(FILE_MARKER) || first.contains("---")
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| is_blank(cell))
}

/// Split the sheet at file markers. Each block starts with its marker row.
///
/// Without any file marker the whole sheet is one block. Rows above the
/// first marker belong to no file and are dropped.
pub fn split_files(rows: &[RawRow]) -> Vec<&[RawRow]> {
    let starts: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| is_file_marker(row))
        .map(|(idx, _)| idx)
        .collect();

    if starts.is_empty() {
        return vec![rows];
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(rows.len());
            &rows[start..end]
        })
        .collect()
}

/// Split one file block at page/table markers.
///
/// The stretch before the first marker is a chunk of its own (for a marked
/// file, that is the file marker and its blank separator). Empty stretches
/// are skipped. Without any marker the whole block is one chunk.
pub fn split_tables(file: &[RawRow]) -> Vec<&[RawRow]> {
    let starts: Vec<usize> = file
        .iter()
        .enumerate()
        .filter(|(_, row)| is_table_marker(row))
        .map(|(idx, _)| idx)
        .collect();

    if starts.is_empty() {
        return vec![file];
    }

    let mut chunks = Vec::with_capacity(starts.len() + 1);
    let mut last = 0;
    for &idx in &starts {
        if idx > last {
            chunks.push(&file[last..idx]);
        }
        last = idx;
    }
    if last < file.len() {
        chunks.push(&file[last..]);
    }

    chunks
}

/// Drop marker and fully blank rows from a raw chunk.
pub fn clean_chunk(rows: &[RawRow]) -> Chunk {
    Chunk::new(
        rows.iter()
            .filter(|row| !is_separator(row) && !is_blank_row(row))
            .cloned()
            .collect(),
    )
}

/// Group every file's chunks by position.
///
/// Chunk `k` of each file lands in slot `k`; a chunk that cleans to nothing
/// still takes its position. Slot correspondence is purely positional, so
/// files with different table counts may line up unrelated tables.
pub fn segment(rows: &[RawRow]) -> Slots {
    let mut slots = Slots::new();
    let mut table_counts = Vec::new();

    for file in split_files(rows) {
        let chunks = split_tables(file);
        table_counts.push(chunks.len());

        for (slot, raw) in chunks.into_iter().enumerate() {
            let chunk = clean_chunk(raw);
            if chunk.is_empty() {
                continue;
            }
            slots.entry(slot).or_default().push(chunk);
        }
    }

    if table_counts.windows(2).any(|w| w[0] != w[1]) {
        log::warn!("files have differing table counts {table_counts:?}; slots may not line up");
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> RawRow {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sheet() -> Vec<RawRow> {
        vec![
            file_marker("a.pdf"),
            row(&[]),
            table_marker(1, 1),
            row(&["", "2024Q1"]),
            row(&["Sales", "100"]),
            row(&[]),
            table_marker(2, 1),
            row(&["", "2024Q1"]),
            row(&["Cost", "40"]),
            row(&[]),
            file_marker("b.pdf"),
            row(&[]),
            table_marker(1, 1),
            row(&["", "2024Q2"]),
            row(&["Sales", "120"]),
            row(&[]),
        ]
    }

    #[test]
    fn test_marker_texts() {
        assert_eq!(file_marker("a.pdf"), vec!["ファイル名: a.pdf".to_string()]);
        assert_eq!(
            table_marker(3, 2),
            vec!["--- ページ 3 / テーブル 2 ---".to_string()]
        );
        assert!(is_file_marker(&file_marker("x")));
        assert!(is_table_marker(&table_marker(1, 1)));
        assert!(!is_table_marker(&file_marker("x")));
        assert!(!is_file_marker(&[]));
    }

    #[test]
    fn test_split_files() {
        let rows = sheet();
        let files = split_files(&rows);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].len(), 10);
        assert_eq!(files[1].len(), 6);
        assert!(is_file_marker(&files[1][0]));
    }

    #[test]
    fn test_split_files_without_markers() {
        let rows = vec![row(&["a"]), row(&["b"])];
        assert_eq!(split_files(&rows), vec![rows.as_slice()]);
    }

    #[test]
    fn test_split_files_drops_rows_above_first_marker() {
        let rows = vec![row(&["stray"]), file_marker("a.pdf"), row(&["x"])];
        let files = split_files(&rows);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].len(), 2);
    }

    #[test]
    fn test_split_tables_keeps_preamble_chunk() {
        let rows = sheet();
        let files = split_files(&rows);
        let tables = split_tables(files[0]);

        assert_eq!(tables.len(), 3);
        assert!(is_file_marker(&tables[0][0]));
        assert!(is_table_marker(&tables[1][0]));
        assert!(is_table_marker(&tables[2][0]));
    }

    #[test]
    fn test_clean_chunk_strips_markers_and_blank_rows() {
        let raw = vec![
            table_marker(1, 1),
            row(&["", "2024Q1"]),
            row(&["", " "]),
            row(&["Sales", "100"]),
            row(&["---", ""]),
        ];
        let chunk = clean_chunk(&raw);
        assert_eq!(chunk.height(), 2);
        assert_eq!(chunk.cell(0, 1), "2024Q1");
        assert_eq!(chunk.cell(1, 0), "Sales");
    }

    #[test]
    fn test_segment_groups_by_position() {
        let slots = segment(&sheet());

        // Slot 0 is the file preamble, which cleans to nothing.
        assert!(!slots.contains_key(&0));
        assert_eq!(slots[&1].len(), 2);
        assert_eq!(slots[&2].len(), 1);
        assert_eq!(slots[&1][1].cell(1, 0), "Sales");
        assert_eq!(slots[&2][0].cell(1, 0), "Cost");
    }

    #[test]
    fn test_segment_unmarked_sheet_is_single_slot() {
        let rows = vec![row(&["", "2024Q1"]), row(&["Sales", "1"])];
        let slots = segment(&rows);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[&0][0].height(), 2);
    }
}
