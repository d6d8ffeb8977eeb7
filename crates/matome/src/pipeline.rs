use matome_core::{consolidate, ConsolidationOutcome, ConsolidationRequest, Diagnostic, MergeMode};

use crate::consolidate::{finish, ModeArgs};
use crate::extract::{execute, save, ExtractArgs};
use crate::prelude::{println, *};
use crate::report;

#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub extract: ExtractArgs,

    #[command(flatten)]
    pub mode: ModeArgs,
}

/// Extract, write the intermediate workbook, then consolidate the same rows
/// without reading the workbook back.
pub fn run(args: RunArgs, global: crate::Global) -> Result<()> {
    let mode = MergeMode::from(args.mode.mode);
    let extraction = execute(&args.extract)?;

    let Some(source) = save(&args.extract, &extraction)? else {
        report::diagnostics(&extraction.diagnostics, global.json);
        if global.json {
            return report::json(&report::ExtractReport {
                output: None,
                tables: extraction.tables,
                diagnostics: extraction.diagnostics,
            });
        }
        println!("No tables found.");
        return Ok(());
    };

    if !global.json {
        report::written(&source.display().to_string());
    }

    let rows = extraction.rows.unwrap_or_default();
    let consolidation = consolidate(&ConsolidationRequest { rows, mode });

    let diagnostics: Vec<Diagnostic> = extraction
        .diagnostics
        .into_iter()
        .chain(consolidation.diagnostics)
        .collect();

    finish(
        ConsolidationOutcome {
            summaries: consolidation.summaries,
            diagnostics,
        },
        &source,
        mode,
        &args.extract.output_dir,
        &global,
    )
}
