//! Reading and writing the `.xlsx` files on both ends of the pipeline.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use matome_core::frame::RawRow;
use matome_core::naming::{summary_sheet_name, EXTRACTION_SHEET, ITEM_HEADER};
use matome_core::segment::FILE_MARKER;
use matome_core::SummaryFrame;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::prelude::*;

const MARKER_FONT_SIZE: u32 = 20;
const ITEM_COLUMN_WIDTH: f64 = 30.0;

/// Read the intermediate sheet of a workbook as rows of strings.
///
/// Uses the `抽出結果` sheet when present, otherwise the first sheet. There
/// is no header row.
pub fn read_rows(path: &Path) -> Result<Vec<RawRow>, Error> {
    let read_error = |reason: String| Error::WorkbookRead {
        path: path.display().to_string(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| read_error(e.to_string()))?;
    let names = workbook.sheet_names();
    let sheet = names
        .iter()
        .find(|n| n.as_str() == EXTRACTION_SHEET)
        .or_else(|| names.first())
        .cloned()
        .ok_or_else(|| read_error("the workbook has no sheets".to_string()))?;

    log::debug!("reading sheet {sheet} of {}", path.display());
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| read_error(e.to_string()))?;

    Ok(range_rows(&range))
}

/// Rows of a sheet range, anchored at A1.
fn range_rows(range: &Range<Data>) -> Vec<RawRow> {
    let Some((top, left)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<RawRow> = vec![Vec::new(); top as usize];
    rows.extend(range.rows().map(|row| {
        std::iter::repeat(String::new())
            .take(left as usize)
            .chain(row.iter().map(cell_to_string))
            .collect()
    }));
    rows
}

/// Display text of a cell. Integral floats lose their `.0`.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => f!("{v:.0}"),
        Data::Float(v) => v.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => f!("#ERR:{e:?}"),
    }
}

/// Write the intermediate rows to a single `抽出結果` sheet. File marker rows
/// are bold and enlarged.
pub fn write_extraction(path: &Path, rows: &[RawRow]) -> Result<(), Error> {
    let mut workbook = Workbook::new();
    fill_extraction(workbook.add_worksheet(), rows).map_err(|e| write_error(path, e))?;
    workbook.save(path).map_err(|e| write_error(path, e))
}

/// Rows styled as file markers: the first cell begins with the marker.
/// Segmentation is looser and accepts the marker anywhere in the cell.
fn is_styled_marker(row: &[String]) -> bool {
    row.first().is_some_and(|cell| cell.starts_with(FILE_MARKER))
}

fn fill_extraction(sheet: &mut Worksheet, rows: &[RawRow]) -> Result<(), XlsxError> {
    sheet.set_name(EXTRACTION_SHEET)?;
    let marker = Format::new().set_bold().set_font_size(MARKER_FONT_SIZE);

    for (r, row) in rows.iter().enumerate() {
        let r = row_num(r)?;
        let is_marker = is_styled_marker(row);
        if is_marker {
            sheet.set_row_format(r, &marker)?;
        }

        for (c, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let c = col_num(c)?;
            if is_marker {
                sheet.write_string_with_format(r, c, cell, &marker)?;
            } else {
                sheet.write_string(r, c, cell)?;
            }
        }
    }
    Ok(())
}

/// Write one `統合まとめ表_N` sheet per summary: a `共通項目` header followed by
/// the periods, then one row per item.
pub fn write_summaries(path: &Path, summaries: &[SummaryFrame]) -> Result<(), Error> {
    let mut workbook = Workbook::new();
    for (n, summary) in summaries.iter().enumerate() {
        fill_summary(workbook.add_worksheet(), n + 1, summary).map_err(|e| write_error(path, e))?;
    }
    workbook.save(path).map_err(|e| write_error(path, e))
}

fn fill_summary(sheet: &mut Worksheet, n: usize, summary: &SummaryFrame) -> Result<(), XlsxError> {
    sheet.set_name(summary_sheet_name(n))?;
    sheet.set_column_width(0, ITEM_COLUMN_WIDTH)?;

    sheet.write_string(0, 0, ITEM_HEADER)?;
    for (c, period) in summary.periods.iter().enumerate() {
        sheet.write_string(0, col_num(c + 1)?, period.as_str())?;
    }

    for (r, row) in summary.rows.iter().enumerate() {
        let r = row_num(r + 1)?;
        sheet.write_string(r, 0, &row.item)?;
        for (c, value) in row.values.iter().enumerate() {
            sheet.write_number(r, col_num(c + 1)?, *value as f64)?;
        }
    }
    Ok(())
}

fn row_num(index: usize) -> Result<u32, XlsxError> {
    u32::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_num(index: usize) -> Result<u16, XlsxError> {
    u16::try_from(index).map_err(|_| XlsxError::RowColumnLimitError)
}

fn write_error(path: &Path, e: XlsxError) -> Error {
    Error::WorkbookWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
