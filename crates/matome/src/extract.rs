use std::collections::HashMap;
use std::path::{Path, PathBuf};

use matome_core::config::{parse_range_flag, RangesFile};
use matome_core::diagnostics::has_errors;
use matome_core::naming::extraction_file_name;
use matome_core::{ExtractError, ExtractionOutcome, ExtractionRequest, PageRange};
use pdf::PdfDocument;

use crate::prelude::{println, *};
use crate::report;

#[derive(Debug, Clone, clap::Args)]
pub struct ExtractArgs {
    /// PDF files to read, in order
    #[arg(required = true, value_name = "PDF")]
    pub files: Vec<PathBuf>,

    /// Keywords; a page contributes its tables when its text contains any of them
    #[arg(short, long = "keyword", env = "MATOME_KEYWORDS", value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// First page to read (1-based, inclusive)
    #[arg(long, env = "MATOME_START")]
    pub start: Option<usize>,

    /// Last page to read (1-based, inclusive)
    #[arg(long, env = "MATOME_END")]
    pub end: Option<usize>,

    /// Page range for one file, e.g. `report.pdf=3:12`; either bound may be empty
    #[arg(long = "range", value_name = "NAME=START:END")]
    pub ranges: Vec<String>,

    /// TOML file with `[ranges."file.pdf"]` tables holding `start` and `end`
    #[arg(long, value_name = "PATH")]
    pub ranges_file: Option<PathBuf>,

    /// Directory the workbook is written to
    #[arg(short, long, env = "MATOME_OUTPUT", default_value = ".")]
    pub output_dir: PathBuf,
}

/// Display name of an input, used in markers and to key page ranges.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Build the core request and the name → path lookup used to open files.
pub fn build_request(
    args: &ExtractArgs,
    ranges_file: Option<&str>,
) -> Result<(ExtractionRequest, HashMap<String, PathBuf>), Error> {
    let mut paths = HashMap::new();
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let name = file_name(path);
        if paths.insert(name.clone(), path.clone()).is_some() {
            return Err(Error::DuplicateFile(name));
        }
        files.push(name);
    }

    let mut file_ranges = match ranges_file {
        Some(content) => {
            RangesFile::parse(content)
                .map_err(|e| Error::Ranges(e.to_string()))?
                .ranges
        }
        None => Default::default(),
    };
    for flag in &args.ranges {
        let (name, range) = parse_range_flag(flag).map_err(|e| Error::Ranges(e.to_string()))?;
        file_ranges.insert(name, range);
    }

    for name in file_ranges.keys() {
        if !paths.contains_key(name) {
            log::warn!("page range given for {name}, which is not an input");
        }
    }

    let request = ExtractionRequest {
        files,
        keywords: args.keywords.clone(),
        range: PageRange::new(args.start, args.end),
        file_ranges,
    };
    Ok((request, paths))
}

/// Run the extraction over the PDFs named in `args`.
pub fn execute(args: &ExtractArgs) -> Result<ExtractionOutcome> {
    let ranges_file = match &args.ranges_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| f!("failed to read {}", path.display()))?,
        ),
        None => None,
    };
    let (request, paths) = build_request(args, ranges_file.as_deref())?;

    Ok(matome_core::extract(&request, |name| {
        let path = paths.get(name).ok_or_else(|| ExtractError::Open {
            name: name.to_string(),
            reason: "unknown input".to_string(),
        })?;
        log::info!("reading {}", path.display());
        PdfDocument::open(path).map_err(|e| ExtractError::Open {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }))
}

/// Write the intermediate workbook when something was found. Returns the
/// path written.
pub fn save(args: &ExtractArgs, outcome: &ExtractionOutcome) -> Result<Option<PathBuf>> {
    let Some(rows) = &outcome.rows else {
        return Ok(None);
    };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| f!("failed to create {}", args.output_dir.display()))?;
    let path = args.output_dir.join(extraction_file_name(&args.keywords));
    crate::workbook::write_extraction(&path, rows)?;
    Ok(Some(path))
}

pub fn run(args: ExtractArgs, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Keywords: {}", args.keywords.join(", "));
        println!("Pages: {}", PageRange::new(args.start, args.end));
        println!();
    }

    let outcome = execute(&args)?;
    report::diagnostics(&outcome.diagnostics, global.json);
    let output = save(&args, &outcome)?;

    if global.json {
        report::json(&report::ExtractReport {
            output: output.as_ref().map(|p| p.display().to_string()),
            tables: outcome.tables,
            diagnostics: outcome.diagnostics.clone(),
        })?;
    } else if let Some(path) = &output {
        report::written(&path.display().to_string());
    } else {
        println!("No tables found.");
    }

    if output.is_none() && has_errors(&outcome.diagnostics) {
        return Err(eyre!("extraction failed"));
    }
    Ok(())
}
