//! PDF reading for matome.
//!
//! [`PdfDocument`] loads a file with `lopdf`, exposes the plain text of each
//! page for keyword matching, and finds tables by laying out the text spans
//! of a page and grouping them into rows and column bands.

use std::collections::BTreeMap;
use std::path::Path;

use matome_core::{ExtractError, PageSource, RawTable};
use thiserror::Error;

use parser::backend::{LopdfBackend, PageId, PdfBackend};
use parser::table::TableDetectorConfig;

pub mod cleanup;
pub mod parser;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page not found: {0}")]
    PageNotFound(usize),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A loaded PDF document.
///
/// Pages are parsed lazily: text and tables are computed on each call from
/// the in-memory `lopdf` document.
pub struct PdfDocument {
    backend: LopdfBackend,
    pages: BTreeMap<u32, PageId>,
    config: TableDetectorConfig,
}

impl PdfDocument {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        let pages = backend.pages();
        log::debug!("loaded PDF with {} pages", pages.len());

        Ok(Self {
            backend,
            pages,
            config: TableDetectorConfig::default(),
        })
    }

    /// Read and parse the PDF at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    pub fn page_count(&self) -> usize {
        self.backend.page_count()
    }

    fn page_id(&self, page: usize) -> Result<(u32, PageId), PdfError> {
        let number = u32::try_from(page).map_err(|_| PdfError::PageNotFound(page))?;
        self.pages
            .get(&number)
            .map(|id| (number, *id))
            .ok_or(PdfError::PageNotFound(page))
    }

    /// Plain text of a 1-based page.
    pub fn text(&self, page: usize) -> Result<String, PdfError> {
        let (number, _) = self.page_id(page)?;
        let text = self.backend.page_text(number)?;
        Ok(cleanup::clean_page_text(&text))
    }

    /// Tables of a 1-based page, top to bottom, as rows of cells.
    pub fn tables(&self, page: usize) -> Result<Vec<RawTable>, PdfError> {
        let (_, id) = self.page_id(page)?;
        let spans = parser::layout::extract_page_spans(&self.backend, id)?;
        let tables = parser::table::detect_tables(&spans, &self.config);
        log::trace!(
            "page {page}: {} spans, {} tables",
            spans.len(),
            tables.len()
        );

        Ok(tables.iter().map(|t| t.to_grid()).collect())
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> usize {
        PdfDocument::page_count(self)
    }

    fn page_text(&self, page: usize) -> Result<String, ExtractError> {
        self.text(page).map_err(|e| page_error(page, e))
    }

    fn page_tables(&self, page: usize) -> Result<Vec<RawTable>, ExtractError> {
        self.tables(page).map_err(|e| page_error(page, e))
    }
}

fn page_error(page: usize, e: PdfError) -> ExtractError {
    ExtractError::Page {
        page,
        reason: e.to_string(),
    }
}
