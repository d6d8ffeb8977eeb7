#[derive(thiserror::Error, Debug, serde::Serialize)]
pub enum Error {
    #[error("Cannot read workbook {path}: {reason}")]
    WorkbookRead { path: String, reason: String },

    #[error("Cannot write workbook {path}: {reason}")]
    WorkbookWrite { path: String, reason: String },

    #[error("Invalid page ranges: {0}")]
    Ranges(String),

    #[error("Two inputs share the file name {0}")]
    DuplicateFile(String),
}
