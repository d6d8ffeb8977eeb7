//! Keyword-filtered table extraction into the intermediate sheet.
//!
//! Reading PDFs is the shell's business; this module only sees documents
//! through [`PageSource`] and turns their tables into marker-delimited rows.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::frame::RawRow;
use crate::segment::{file_marker, table_marker};

/// Cells of one detected table, row by row. `None` marks an empty cell.
pub type RawTable = Vec<Vec<Option<String>>>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to open {name}: {reason}")]
    Open { name: String, reason: String },

    #[error("failed to read page {page}: {reason}")]
    Page { page: usize, reason: String },
}

/// A document the extractor can read. Pages are 1-based.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Plain text of the page, used for keyword matching.
    fn page_text(&self, page: usize) -> Result<String, ExtractError>;

    /// Tables on the page, top to bottom.
    fn page_tables(&self, page: usize) -> Result<Vec<RawTable>, ExtractError>;
}

impl<T: PageSource + ?Sized> PageSource for Box<T> {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn page_text(&self, page: usize) -> Result<String, ExtractError> {
        (**self).page_text(page)
    }

    fn page_tables(&self, page: usize) -> Result<Vec<RawTable>, ExtractError> {
        (**self).page_tables(page)
    }
}

/// Inclusive 1-based page bounds. `None` (or 0) leaves a side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

impl PageRange {
    pub fn new(start: Option<usize>, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// 0-based page indices covered by this range in a document of
    /// `page_count` pages, clamped to the document. `None` when nothing is
    /// left after clamping.
    pub fn resolve(&self, page_count: usize) -> Option<Range<usize>> {
        let start = match self.start {
            Some(s) if s > 0 => s - 1,
            _ => 0,
        };
        let end = match self.end {
            Some(e) if e > 0 => e,
            _ => page_count,
        };

        let start = start.min(page_count);
        let end = end.min(page_count);
        (start < end).then_some(start..end)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |v: Option<usize>| match v {
            Some(n) if n > 0 => n.to_string(),
            _ => "*".to_string(),
        };
        write!(f, "{}..{}", side(self.start), side(self.end))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    /// Source names, in processing order.
    pub files: Vec<String>,
    pub keywords: Vec<String>,
    /// Range applied to files without an entry in `file_ranges`.
    pub range: PageRange,
    /// Per-file ranges keyed by source name. An entry replaces both bounds.
    pub file_ranges: BTreeMap<String, PageRange>,
}

impl ExtractionRequest {
    pub fn range_for(&self, file: &str) -> PageRange {
        self.file_ranges.get(file).copied().unwrap_or(self.range)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionOutcome {
    /// The intermediate sheet, or `None` when nothing was produced.
    pub rows: Option<Vec<RawRow>>,
    /// Tables written across all files.
    pub tables: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract every table on keyword pages of each requested file.
///
/// Every file gets a marker row and a blank row, even when it cannot be
/// opened. A page qualifies when its text contains any keyword; all of its
/// non-empty tables are then written, each under a page/table marker and
/// followed by a blank row. A read failure stops the current file but keeps
/// whatever rows it already produced.
pub fn extract<S, F>(request: &ExtractionRequest, mut open: F) -> ExtractionOutcome
where
    S: PageSource,
    F: FnMut(&str) -> Result<S, ExtractError>,
{
    let mut outcome = ExtractionOutcome::default();

    if request.keywords.iter().all(|k| k.trim().is_empty()) {
        outcome
            .diagnostics
            .push(Diagnostic::error("at least one keyword is required"));
        return outcome;
    }

    let keywords: Vec<&str> = request
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    let mut rows: Vec<RawRow> = Vec::new();
    for name in &request.files {
        log::info!("extracting {name}");
        rows.push(file_marker(name));
        rows.push(Vec::new());

        let source = match open(name) {
            Ok(source) => source,
            Err(err) => {
                outcome.diagnostics.push(Diagnostic::error(err.to_string()));
                continue;
            }
        };

        let range = request.range_for(name);
        let Some(pages) = range.resolve(source.page_count()) else {
            outcome.diagnostics.push(Diagnostic::warning(format!(
                "{name}: page range {range} is empty for a {}-page document; skipped",
                source.page_count()
            )));
            continue;
        };

        match scan_pages(&source, pages, &keywords, &mut rows) {
            Ok(PageScan {
                keyword_pages: 0, ..
            }) => outcome.diagnostics.push(Diagnostic::warning(format!(
                "{name}: no page in range {range} mentions {}",
                keywords.join(", ")
            ))),
            Ok(PageScan {
                keyword_pages,
                tables: 0,
            }) => outcome.diagnostics.push(Diagnostic::info(format!(
                "{name}: {keyword_pages} keyword pages but no tables"
            ))),
            Ok(PageScan { tables, .. }) => {
                outcome.tables += tables;
                outcome
                    .diagnostics
                    .push(Diagnostic::info(format!("{name}: {tables} tables extracted")));
            }
            Err(err) => outcome
                .diagnostics
                .push(Diagnostic::error(format!("{name}: {err}"))),
        }
    }

    if rows.iter().any(|row| !row.is_empty()) {
        outcome.rows = Some(rows);
    }

    outcome
}

/// What one file's page scan found.
#[derive(Debug, Default, PartialEq, Eq)]
struct PageScan {
    /// Pages whose text contains a keyword, with or without tables.
    keyword_pages: usize,
    /// Tables written.
    tables: usize,
}

/// Append the tables of every keyword page in `pages`.
fn scan_pages<S: PageSource>(
    source: &S,
    pages: Range<usize>,
    keywords: &[&str],
    rows: &mut Vec<RawRow>,
) -> Result<PageScan, ExtractError> {
    let mut scan = PageScan::default();

    for index in pages {
        let page = index + 1;
        let text = source.page_text(page)?;
        if !keywords.iter().any(|k| text.contains(k)) {
            continue;
        }
        scan.keyword_pages += 1;

        let tables = source.page_tables(page)?;
        log::debug!("page {page}: keyword hit, {} tables", tables.len());

        for (idx, table) in tables.iter().enumerate() {
            if table.is_empty() {
                continue;
            }

            rows.push(table_marker(page, idx + 1));
            rows.extend(table.iter().map(|row| clean_row(row)));
            rows.push(Vec::new());
            scan.tables += 1;
        }
    }

    Ok(scan)
}

fn clean_row(row: &[Option<String>]) -> RawRow {
    row.iter()
        .map(|cell| cell.as_deref().unwrap_or("").replace('\n', " "))
        .collect()
}
