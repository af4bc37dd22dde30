//! Error types for report import, override management, and grading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraderError {
    /// The report file could not be read or is not a usable delimited table.
    #[error("bad report file {path}: {message}")]
    FileFormat { path: String, message: String },

    /// An overrides import was missing one or more required columns.
    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// An export was attempted on an empty override table.
    #[error("no overrides to export")]
    EmptyExport,

    /// The effective threshold for a student resolved to zero, so the
    /// curve division is undefined. Aborts the whole grading pass.
    #[error("cannot curve score for student {student_id}: effective threshold is 0")]
    ZeroThreshold { student_id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GraderError>;
