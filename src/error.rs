use std::path::PathBuf;

use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::columns::Role;
use crate::mode::ReportMode;

/// Every way a report run can fail. All of them abort the run before the
/// output workbook is committed.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("input file {0} not found")]
    InputNotFound(PathBuf),
    #[error("no CSV or XLSX exports found in {0}")]
    NoInputFiles(PathBuf),
    #[error("workbook {0} has no worksheets")]
    EmptyWorkbook(PathBuf),
    #[error("could not determine the report type, check the file structure")]
    ModeUndetermined,
    #[error("{mode} report requires `_{role}` columns but none were found")]
    MissingRequiredRole { mode: ReportMode, role: Role },
    #[error("{mode} report requires a `{column}` column")]
    MissingColumn { mode: ReportMode, column: String },
    #[error("invalid input {value:?}: {reason}")]
    InvalidOperatorInput { value: String, reason: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook read error: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
