//! Consolidation of the intermediate sheet into per-slot summary tables.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;
use crate::frame::{Chunk, RawRow, TableFrame};
use crate::horizontal::merge_horizontal;
use crate::label::ItemLabel;
use crate::order::MasterItemOrder;
use crate::period::{sort_periods, PeriodLabel};
use crate::segment::segment;
use crate::vertical::merge_vertical;

/// How each chunk is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Period headers anywhere in the chunk, one column slice per header.
    #[default]
    Vertical,
    /// One period per chunk, amounts in the last column.
    Horizontal,
}

impl MergeMode {
    pub fn merge(self, chunk: &Chunk) -> Option<TableFrame> {
        match self {
            MergeMode::Vertical => merge_vertical(chunk),
            MergeMode::Horizontal => merge_horizontal(chunk),
        }
    }

    /// Suffix appended to the consolidated workbook name.
    pub fn file_suffix(self) -> &'static str {
        match self {
            MergeMode::Vertical => "_縦統合",
            MergeMode::Horizontal => "_横統合",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsolidationRequest {
    /// The intermediate sheet, one entry per row.
    pub rows: Vec<RawRow>,
    pub mode: MergeMode,
}

/// One row of a summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub item: String,
    pub values: Vec<i64>,
}

/// The consolidated table of one slot: items in master order, periods in
/// chronological order, every cell filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryFrame {
    /// Position of the source tables within their files.
    pub slot: usize,
    pub periods: Vec<PeriodLabel>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryFrame {
    pub fn row(&self, item: &str) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.item == item)
    }

    /// Value at `(item, period)` for the first row displaying `item`.
    pub fn value(&self, item: &str, period: &str) -> Option<i64> {
        let col = self.periods.iter().position(|p| p.as_str() == period)?;
        self.row(item).map(|r| r.values[col])
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsolidationOutcome {
    pub summaries: Vec<SummaryFrame>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConsolidationOutcome {
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Consolidate the intermediate sheet.
///
/// Rows are segmented into slots, every chunk of a slot is merged with the
/// requested mode, and each slot that yields at least one frame becomes a
/// [`SummaryFrame`]. Slots come out in ascending slot order.
pub fn consolidate(request: &ConsolidationRequest) -> ConsolidationOutcome {
    let mut outcome = ConsolidationOutcome::default();

    if request.rows.is_empty() {
        outcome
            .diagnostics
            .push(Diagnostic::error("the intermediate sheet has no rows"));
        return outcome;
    }

    for (slot, chunks) in segment(&request.rows) {
        let mut frames = Vec::new();
        let mut order = MasterItemOrder::new();

        for chunk in &chunks {
            match request.mode.merge(chunk) {
                Some(frame) if !frame.is_empty() => {
                    order.extend(frame.items());
                    frames.push(frame);
                }
                _ => log::debug!("slot {slot}: chunk produced no frame"),
            }
        }

        if frames.is_empty() {
            continue;
        }

        log::debug!(
            "slot {slot}: {} frames, {} items",
            frames.len(),
            order.len()
        );
        outcome
            .summaries
            .push(summarize(slot, order.into_vec(), &frames));
    }

    if outcome.summaries.is_empty() {
        outcome.diagnostics.push(Diagnostic::warning(
            "no summary tables could be built; check the merge mode and the period headers",
        ));
    } else {
        outcome.diagnostics.push(Diagnostic::info(format!(
            "built {} summary tables",
            outcome.summaries.len()
        )));
    }

    outcome
}

/// Join the frames of one slot onto the master order.
///
/// Frames are left-joined in encounter order, so an item/period pair seen in
/// two files keeps the first file's value. Missing cells become 0 and
/// amounts are truncated toward zero.
fn summarize(slot: usize, items: Vec<ItemLabel>, frames: &[TableFrame]) -> SummaryFrame {
    let mut joined = TableFrame::new(items);
    for frame in frames {
        joined.left_merge(frame);
    }

    let mut periods: Vec<PeriodLabel> = joined.periods().cloned().collect();
    sort_periods(&mut periods);

    let rows = joined
        .items()
        .iter()
        .enumerate()
        .map(|(idx, item)| SummaryRow {
            item: item.display().to_string(),
            values: periods
                .iter()
                .map(|p| joined.value_at(idx, p).unwrap_or(0.0) as i64)
                .collect(),
        })
        .collect();

    SummaryFrame {
        slot,
        periods,
        rows,
    }
}
