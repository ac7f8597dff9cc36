//! Error types for exceltab

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for exceltab operations
pub type Result<T> = std::result::Result<T, ExcelError>;

/// Main error type for all workbook operations
#[derive(Error, Debug)]
pub enum ExcelError {
    /// The read target does not exist
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// The document (or one of its sheets) has no data rows
    #[error("document contains no data rows")]
    EmptyDocument,

    /// The write body is not row-shaped
    #[error("malformed body: {0}")]
    MalformedBody(String),

    /// Corrupt archive, missing part or malformed XML
    #[error("failed to decode workbook: {0}")]
    Decode(String),

    /// Internal invariant violated while serializing
    #[error("failed to encode workbook: {0}")]
    Encode(String),

    /// The destination directory could not be created
    #[error("could not create directory '{path}': {source}")]
    PathCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sheet with the same raw name already exists in the workbook
    #[error("duplicate sheet name: '{0}'")]
    DuplicateSheetName(String),

    /// Sheet name is longer than 31 characters or contains `: \ / ? * [ ]`
    #[error("invalid sheet name: '{0}'")]
    InvalidSheetName(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for ExcelError {
    fn from(err: zip::result::ZipError) -> Self {
        ExcelError::Decode(err.to_string())
    }
}
