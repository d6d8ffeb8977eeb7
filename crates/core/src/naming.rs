//! Output workbook and sheet names.

use crate::aggregate::MergeMode;

/// Sheet holding the intermediate rows.
pub const EXTRACTION_SHEET: &str = "抽出結果";

/// Header of the item column in summary sheets.
pub const ITEM_HEADER: &str = "共通項目";

const SUMMARY_SUFFIX: &str = "_まとめ";
const XLSX: &str = ".xlsx";

/// `売上_利益_まとめ.xlsx` for keywords `[売上, 利益]`; `抽出結果_まとめ.xlsx`
/// when there are none.
pub fn extraction_file_name(keywords: &[String]) -> String {
    let keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();

    let base = if keywords.is_empty() {
        EXTRACTION_SHEET.to_string()
    } else {
        keywords.join("_")
    };
    format!("{base}{SUMMARY_SUFFIX}{XLSX}")
}

/// Name of the consolidated workbook built from `input`.
///
/// The `.xlsx` extension and a trailing `_まとめ` are removed before the mode
/// suffix is added, so `売上_まとめ.xlsx` becomes `売上_縦統合.xlsx`. Any
/// directory part of `input` is dropped.
pub fn consolidation_file_name(input: &str, mode: MergeMode) -> String {
    let file = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let base = match file.rfind(XLSX) {
        Some(idx) => &file[..idx],
        None => file,
    };
    let base = base.strip_suffix(SUMMARY_SUFFIX).unwrap_or(base);

    format!("{base}{}{XLSX}", mode.file_suffix())
}

/// Sheet name of the `n`-th summary table, 1-based.
pub fn summary_sheet_name(n: usize) -> String {
    format!("統合まとめ表_{n}")
}
