//! Table detection over the text spans of one page.
//!
//! Spans are grouped into rows, neighbouring spans inside a row are merged
//! into cells, and consecutive multi-cell rows form a table region. Columns
//! are the x-intervals that the cells of a region cover, so right-aligned
//! amounts and centred headers land in the same column as long as they
//! overlap.

use super::layout::{is_spaceless_script_char, TextSpan};
use crate::cleanup::clean_cell;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// A run of spans close enough on one row to be read as a single cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSpan {
    pub text: String,
    pub left: f32,
    pub right: f32,
}

impl CellSpan {
    fn center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// A single row: its baseline and the cells on it, left to right.
#[derive(Debug, Clone)]
pub struct TableRowData {
    pub y: f32,
    pub font_size: f32,
    pub cells: Vec<CellSpan>,
}

/// Horizontal extent of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBand {
    pub left: f32,
    pub right: f32,
}

/// A detected table region with its column bands and rows, top to bottom.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row.
    pub top_y: f32,
    pub columns: Vec<ColumnBand>,
    pub rows: Vec<TableRowData>,
}

/// Tuning knobs for the table detection heuristic.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of multi-cell rows for a region to qualify as a table.
    pub min_rows: usize,
    /// Minimum number of columns required.
    pub min_columns: usize,
    /// Maximum number of columns allowed (guards against scattered text).
    pub max_columns: usize,
    /// `y_tolerance = median_font_size * factor` when grouping spans into rows.
    pub y_tolerance_factor: f32,
    /// Two spans on a row belong to the same cell when the gap between them
    /// is below `font_size * cell_gap_factor`.
    pub cell_gap_factor: f32,
    /// A vertical gap above `font_size * row_gap_factor` ends a region.
    pub row_gap_factor: f32,
    /// Single-cell rows tolerated inside a region (section captions such as
    /// `営業外収益`); one more ends it.
    pub max_plain_rows: usize,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 20,
            y_tolerance_factor: 0.3,
            cell_gap_factor: 1.0,
            row_gap_factor: 3.0,
            max_plain_rows: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Table detection pipeline
// ---------------------------------------------------------------------------

/// Detect every table on a page, top to bottom.
pub fn detect_tables(spans: &[TextSpan], config: &TableDetectorConfig) -> Vec<DetectedTable> {
    if spans.is_empty() {
        return Vec::new();
    }

    let y_tolerance = compute_y_tolerance(spans, config.y_tolerance_factor);
    let rows = group_into_rows(spans, y_tolerance, config.cell_gap_factor);

    split_regions(rows, config)
        .into_iter()
        .filter_map(|rows| build_table(rows, config))
        .collect()
}

/// Group spans into rows by baseline and merge each row's spans into cells.
///
/// Rows come out top to bottom (descending Y in PDF space).
pub fn group_into_rows(spans: &[TextSpan], y_tolerance: f32, cell_gap_factor: f32) -> Vec<TableRowData> {
    if spans.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&TextSpan> = spans.iter().collect();
    sorted.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut rows: Vec<TableRowData> = Vec::new();
    let mut current: Vec<&TextSpan> = Vec::new();
    let mut current_y = sorted[0].y;

    for span in sorted {
        if (span.y - current_y).abs() > y_tolerance && !current.is_empty() {
            rows.push(assemble_row(std::mem::take(&mut current), cell_gap_factor));
            current_y = span.y;
        }
        current.push(span);
    }
    if !current.is_empty() {
        rows.push(assemble_row(current, cell_gap_factor));
    }

    rows
}

/// Build a row from spans sharing a baseline, merging neighbours into cells.
fn assemble_row(mut spans: Vec<&TextSpan>, cell_gap_factor: f32) -> TableRowData {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    let font_size = spans.iter().map(|s| s.font_size).fold(0.0, f32::max);

    let mut cells: Vec<CellSpan> = Vec::new();
    for span in spans {
        let max_gap = span.font_size.max(1.0) * cell_gap_factor;
        if let Some(prev) = cells.last_mut() {
            if span.x - prev.right < max_gap {
                if needs_space(&prev.text, &span.text) {
                    prev.text.push(' ');
                }
                prev.text.push_str(&span.text);
                prev.right = prev.right.max(span.right());
                continue;
            }
        }
        cells.push(CellSpan {
            text: span.text.clone(),
            left: span.x,
            right: span.right(),
        });
    }

    TableRowData { y, font_size, cells }
}

fn needs_space(prev: &str, next: &str) -> bool {
    match (prev.chars().next_back(), next.chars().next()) {
        (Some(l), Some(f)) => {
            !(l.is_whitespace()
                || f.is_whitespace()
                || is_spaceless_script_char(l) && is_spaceless_script_char(f))
        }
        _ => false,
    }
}

/// Cut the row sequence into candidate regions.
///
/// A region ends at a vertical gap wider than the configured factor, or once
/// more than `max_plain_rows` single-cell rows follow each other. Leading and
/// trailing single-cell rows are trimmed off every region.
fn split_regions(rows: Vec<TableRowData>, config: &TableDetectorConfig) -> Vec<Vec<TableRowData>> {
    let mut regions: Vec<Vec<TableRowData>> = Vec::new();
    let mut current: Vec<TableRowData> = Vec::new();
    let mut plain_run = 0;

    for row in rows {
        if let Some(prev) = current.last() {
            let gap = prev.y - row.y;
            if gap > prev.font_size.max(row.font_size).max(1.0) * config.row_gap_factor {
                regions.push(std::mem::take(&mut current));
                plain_run = 0;
            }
        }

        if row.cells.len() < config.min_columns {
            plain_run += 1;
            if plain_run > config.max_plain_rows {
                regions.push(std::mem::take(&mut current));
                plain_run = 0;
                continue;
            }
        } else {
            plain_run = 0;
        }
        current.push(row);
    }
    regions.push(current);

    regions
        .into_iter()
        .map(|mut region| {
            while region
                .last()
                .is_some_and(|r| r.cells.len() < config.min_columns)
            {
                region.pop();
            }
            let lead = region
                .iter()
                .take_while(|r| r.cells.len() < config.min_columns)
                .count();
            region.drain(..lead);
            region
        })
        .filter(|region| !region.is_empty())
        .collect()
}

fn build_table(rows: Vec<TableRowData>, config: &TableDetectorConfig) -> Option<DetectedTable> {
    let multi_cell_rows = rows
        .iter()
        .filter(|r| r.cells.len() >= config.min_columns)
        .count();
    if multi_cell_rows < config.min_rows {
        return None;
    }

    let columns = detect_columns(&rows, config.min_columns);
    if columns.len() < config.min_columns || columns.len() > config.max_columns {
        log::trace!("region rejected: {} columns", columns.len());
        return None;
    }

    let top_y = rows.first().map(|r| r.y)?;

    Some(DetectedTable {
        top_y,
        columns,
        rows,
    })
}

/// Merge the x-intervals of every cell on a multi-cell row into column bands.
///
/// Overlapping intervals fall into one band. Single-cell rows do not shape
/// the bands, since captions tend to span several columns.
pub fn detect_columns(rows: &[TableRowData], min_columns: usize) -> Vec<ColumnBand> {
    let mut intervals: Vec<ColumnBand> = rows
        .iter()
        .filter(|r| r.cells.len() >= min_columns)
        .flat_map(|r| r.cells.iter())
        .map(|c| ColumnBand {
            left: c.left,
            right: c.right,
        })
        .collect();

    intervals.sort_by(|a, b| a.left.partial_cmp(&b.left).unwrap_or(std::cmp::Ordering::Equal));

    let mut bands: Vec<ColumnBand> = Vec::new();
    for interval in intervals {
        match bands.last_mut() {
            Some(band) if interval.left <= band.right => {
                band.right = band.right.max(interval.right);
            }
            _ => bands.push(interval),
        }
    }

    bands
}

/// Find the band containing `x`, or the nearest one.
fn assign_column(x: f32, columns: &[ColumnBand]) -> usize {
    let distance = |band: &ColumnBand| {
        if x < band.left {
            band.left - x
        } else if x > band.right {
            x - band.right
        } else {
            0.0
        }
    };

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            distance(a)
                .partial_cmp(&distance(b))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

impl DetectedTable {
    /// The table as rows of cells. Empty cells are `None`; cells sharing a
    /// column on the same row are joined with a space.
    pub fn to_grid(&self) -> Vec<Vec<Option<String>>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Option<String>> = vec![None; self.columns.len()];
                for cell in &row.cells {
                    let Some(text) = clean_cell(&cell.text) else {
                        continue;
                    };
                    let slot = &mut cells[assign_column(cell.center(), &self.columns)];
                    match slot {
                        Some(existing) => {
                            existing.push(' ');
                            existing.push_str(&text);
                        }
                        None => *slot = Some(text),
                    }
                }
                cells
            })
            .collect()
    }
}

/// Compute the Y-tolerance used for row grouping.
///
/// Uses the median font size of all spans multiplied by the given factor.
fn compute_y_tolerance(spans: &[TextSpan], factor: f32) -> f32 {
    let mut sizes: Vec<f32> = spans.iter().map(|s| s.font_size).collect();
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = sizes.get(sizes.len() / 2).copied().unwrap_or(0.0);
    (median * factor).max(1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
