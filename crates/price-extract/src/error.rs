use std::path::PathBuf;

use offer_engine::OfferError;
use shared_types::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported source file type '{extension}': use .xlsx, .xlsm or .pdf")]
    UnsupportedFormat { extension: String },

    #[error("Legacy .xls workbooks are not supported; re-save {0} as .xlsx")]
    LegacyWorkbook(PathBuf),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Workbook has no sheets")]
    EmptyWorkbook,

    #[error("Price list header not found: {0}")]
    HeaderNotFound(#[source] OfferError),

    #[error("Row {row}: {column} value '{value}' is not a number")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    #[error("PDF is password protected")]
    PasswordProtected,

    #[error("PDF looks like a scan ({chars} characters of text); OCR is required")]
    ScannedPdfNeedsOcr { chars: usize },

    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    #[error("No goods lines found in {0}")]
    NoItems(String),

    #[error(transparent)]
    Item(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
