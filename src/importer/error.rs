// ==========================================
// Project Site Tracker - Import error types
// ==========================================
// thiserror derive. Row-level variants carry the 1-based row index
// so every failure stays attributable to its source row.
// ==========================================

use thiserror::Error;

/// Import pipeline error type.
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== Row-level errors (collected, never batch-fatal) =====
    #[error("row {row}: site_code and site_name are both empty")]
    EmptyRow { row: usize },

    #[error("row {row}: field {field} failed validation: {message}")]
    Validation {
        row: usize,
        field: String,
        message: String,
    },

    // ===== Commit-phase errors (batch-fatal) =====
    #[error("{unresolved} conflicting row(s) have no resolution; commit refused")]
    ConflictUnresolved { unresolved: usize },

    // ===== Collaborator errors =====
    #[error("repository error: {0}")]
    Repository(#[from] crate::repository::RepositoryError),

    // ===== Catch-all =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result type alias.
pub type PipelineResult<T> = Result<T, ImportError>;
