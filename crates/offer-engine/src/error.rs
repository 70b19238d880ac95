use thiserror::Error;

use crate::vocabulary::TotalsCategory;

#[derive(Error, Debug)]
pub enum OfferError {
    #[error("Goods table header not recognised: {0}")]
    TableStructure(String),

    #[error(
        "No goods table found: none of the {tables_checked} table(s) has name, quantity and price or amount columns"
    )]
    NoGoodsTableFound { tables_checked: usize },

    #[error(
        "Goods table has no sample row after header row {header_end}; add one example row to copy formatting from"
    )]
    MissingSampleRow { header_end: usize },

    #[error("Row {row} is out of range for a table with {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("Malformed document package: {0}")]
    Package(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Spreadsheet writer error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A totals row that could not be rewritten. Reported, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Totals row {category:?} (template row {template_row}) skipped: {reason}")]
pub struct TotalsUpdateSkipped {
    pub category: TotalsCategory,
    pub template_row: usize,
    pub reason: String,
}
