//! Core library for matome
//!
//! This crate implements the **Functional Core** of matome, a tool that pulls
//! financial tables out of PDF reports and consolidates them into one
//! item × period summary per table position.
//!
//! # Architecture Overview
//!
//! The project is split the same way as its CLI is used:
//!
//! - **`matome_core`** (this crate): period detection, table merging, slot
//!   segmentation and consolidation, all as pure functions over rows of text
//! - **`pdf`**: turns PDF pages into text and raw tables
//! - **`matome`**: the binary; opens files, reads and writes workbooks, and
//!   prints reports
//!
//! Nothing in this crate touches the filesystem. Extraction sees documents
//! only through the [`extract::PageSource`] trait, and consolidation takes the
//! intermediate sheet as plain rows.
//!
//! # Pipeline
//!
//! 1. [`extract::extract`] walks the keyword pages of each document and writes
//!    the intermediate sheet: a file marker row per source, a page/table
//!    marker row per table, the table rows, and blank separators.
//! 2. [`segment::segment`] splits that sheet back into chunks and groups the
//!    k-th table of every file into slot k.
//! 3. Each chunk is merged into a [`frame::TableFrame`] by
//!    [`vertical::merge_vertical`] or [`horizontal::merge_horizontal`].
//! 4. [`aggregate::consolidate`] joins the frames of each slot on a
//!    [`order::MasterItemOrder`], sorts the periods and fills the gaps.
//!
//! # Example Usage
//!
//! ```rust
//! use matome_core::aggregate::{consolidate, ConsolidationRequest, MergeMode};
//!
//! let rows = vec![
//!     vec!["".to_string(), "2024Q1".to_string(), "2024Q2".to_string()],
//!     vec!["Sales".to_string(), "100".to_string(), "120".to_string()],
//! ];
//! let outcome = consolidate(&ConsolidationRequest {
//!     rows,
//!     mode: MergeMode::Vertical,
//! });
//!
//! assert_eq!(outcome.summaries[0].value("Sales", "2024Q2"), Some(120));
//! ```

pub mod aggregate;
pub mod config;
pub mod diagnostics;
pub mod extract;
pub mod frame;
pub mod horizontal;
pub mod label;
pub mod naming;
pub mod order;
pub mod period;
pub mod segment;
pub mod text;
pub mod vertical;

pub use aggregate::{consolidate, ConsolidationOutcome, ConsolidationRequest, MergeMode, SummaryFrame};
pub use diagnostics::{Diagnostic, Level};
pub use extract::{extract, ExtractError, ExtractionOutcome, ExtractionRequest, PageRange, PageSource, RawTable};
