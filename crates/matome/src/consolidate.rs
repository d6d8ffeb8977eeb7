use std::path::{Path, PathBuf};

use matome_core::naming::consolidation_file_name;
use matome_core::{consolidate, ConsolidationOutcome, ConsolidationRequest, MergeMode};

use crate::prelude::{println, *};
use crate::report;

/// How the tables of the intermediate sheet are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Period headers above the amounts; one column per period
    #[default]
    Vertical,
    /// One period per table; amounts in the last column
    Horizontal,
}

impl From<Mode> for MergeMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Vertical => MergeMode::Vertical,
            Mode::Horizontal => MergeMode::Horizontal,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub struct ConsolidateArgs {
    /// Workbook written by `matome extract`
    #[arg(value_name = "XLSX")]
    pub input: PathBuf,

    #[command(flatten)]
    pub mode: ModeArgs,

    /// Directory the workbook is written to
    #[arg(short, long, env = "MATOME_OUTPUT", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ModeArgs {
    /// Integration mode
    #[arg(short, long, env = "MATOME_MODE", value_enum, default_value_t = Mode::Vertical)]
    pub mode: Mode,
}

/// Write the summaries of `outcome` and report them. `source` names the
/// workbook the output name is derived from.
pub fn finish(
    outcome: ConsolidationOutcome,
    source: &Path,
    mode: MergeMode,
    output_dir: &Path,
    global: &crate::Global,
) -> Result<()> {
    report::diagnostics(&outcome.diagnostics, global.json);

    let output = if outcome.is_empty() {
        None
    } else {
        let name = consolidation_file_name(&source.to_string_lossy(), mode);
        let path = output_dir.join(name);
        std::fs::create_dir_all(output_dir)
            .with_context(|| f!("failed to create {}", output_dir.display()))?;
        crate::workbook::write_summaries(&path, &outcome.summaries)?;
        Some(path)
    };

    if global.json {
        return report::json(&report::ConsolidateReport {
            output: output.as_ref().map(|p| p.display().to_string()),
            summaries: outcome.summaries,
            diagnostics: outcome.diagnostics,
        });
    }

    match output {
        Some(path) => {
            report::summaries(&outcome.summaries);
            report::written(&path.display().to_string());
        }
        None => println!("Nothing to consolidate."),
    }
    Ok(())
}

pub fn run(args: ConsolidateArgs, global: crate::Global) -> Result<()> {
    let mode = MergeMode::from(args.mode.mode);
    if global.verbose {
        println!("Input: {}", args.input.display());
        println!("Mode: {mode:?}");
        println!();
    }

    let rows = crate::workbook::read_rows(&args.input)?;
    log::debug!("read {} rows from {}", rows.len(), args.input.display());

    let outcome = consolidate(&ConsolidationRequest { rows, mode });
    finish(outcome, &args.input, mode, &args.output_dir, &global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, clap::Parser)]
    struct Harness {
        #[clap(flatten)]
        args: ConsolidateArgs,
    }

    fn global() -> crate::Global {
        crate::Global {
            verbose: false,
            json: true,
        }
    }

    #[test]
    fn test_mode_flag() {
        let h = Harness::parse_from(["matome", "in.xlsx", "--mode", "horizontal"]);
        assert_eq!(MergeMode::from(h.args.mode.mode), MergeMode::Horizontal);

        let h = Harness::parse_from(["matome", "in.xlsx"]);
        assert_eq!(h.args.mode.mode, Mode::Vertical);
    }

    #[test]
    fn test_run_writes_summary_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("売上_まとめ.xlsx");
        let data: [&[&str]; 4] = [
            &["ファイル名: a.pdf"],
            &["--- ページ 1 / テーブル 1 ---"],
            &["", "2024Q1"],
            &["Sales", "100"],
        ];
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        crate::workbook::write_extraction(&input, &rows).unwrap();

        let args = ConsolidateArgs {
            input: input.clone(),
            mode: ModeArgs { mode: Mode::Vertical },
            output_dir: dir.path().to_path_buf(),
        };
        run(args, global()).unwrap();

        assert!(dir.path().join("売上_縦統合.xlsx").exists());
    }

    #[test]
    fn test_run_fails_on_missing_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConsolidateArgs {
            input: dir.path().join("none.xlsx"),
            mode: ModeArgs { mode: Mode::Horizontal },
            output_dir: dir.path().to_path_buf(),
        };
        assert!(run(args, global()).is_err());
    }

    #[test]
    fn test_finish_writes_nothing_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        finish(
            ConsolidationOutcome::default(),
            Path::new("x.xlsx"),
            MergeMode::Vertical,
            dir.path(),
            &global(),
        )
        .unwrap();
        assert!(!dir.path().join("x_縦統合.xlsx").exists());
    }
}
