//! Terminal output: diagnostics, summary tables and the `--json` reports.

use colored::Colorize;
use matome_core::{Diagnostic, Level, SummaryFrame};
use serde::Serialize;

use crate::prelude::{eprintln, println, *};

/// Result of `matome extract`, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct ExtractReport {
    /// Workbook written, if anything was found.
    pub output: Option<String>,
    pub tables: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of `matome consolidate`, as printed with `--json`.
#[derive(Debug, Serialize)]
pub struct ConsolidateReport {
    pub output: Option<String>,
    pub summaries: Vec<SummaryFrame>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Echo diagnostics to the log and, unless `quiet`, to stderr.
pub fn diagnostics(diagnostics: &[Diagnostic], quiet: bool) {
    for d in diagnostics {
        match d.level {
            Level::Info => log::info!("{}", d.message),
            Level::Warning => log::warn!("{}", d.message),
            Level::Error => log::error!("{}", d.message),
        }

        if !quiet {
            eprintln!("{} {}", badge(d.level), d.message);
        }
    }
}

fn badge(level: Level) -> String {
    let label = f!("[{level}]");
    match level {
        Level::Info => label.cyan().to_string(),
        Level::Warning => label.yellow().bold().to_string(),
        Level::Error => label.red().bold().to_string(),
    }
}

/// Build a terminal table for one summary.
pub fn summary_table(n: usize, summary: &SummaryFrame) -> prettytable::Table {
    let mut table = new_table();

    let mut header = vec![prettytable::Cell::new(&f!("#{n}").bold().cyan().to_string())];
    header.extend(
        summary
            .periods
            .iter()
            .map(|p| prettytable::Cell::new(&p.as_str().bold().cyan().to_string())),
    );
    table.add_row(prettytable::Row::new(header));

    for row in &summary.rows {
        let mut cells = vec![prettytable::Cell::new(&row.item)];
        cells.extend(
            row.values
                .iter()
                .map(|v| prettytable::Cell::new_align(&v.to_string(), prettytable::format::Alignment::RIGHT)),
        );
        table.add_row(prettytable::Row::new(cells));
    }

    table
}

pub fn summaries(summaries: &[SummaryFrame]) {
    for (i, summary) in summaries.iter().enumerate() {
        summary_table(i + 1, summary).printstd();
        println!();
    }
}

pub fn written(path: &str) {
    println!("{}", f!("Wrote {path}").green().bold());
}

pub fn json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
