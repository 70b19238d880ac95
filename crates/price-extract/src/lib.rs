//! Supplier price list readers
//!
//! Turns an incoming price list into [`LineItem`]s:
//! - `.xlsx` / `.xlsm`: header sniffing on the first sheet (see [`sheet`])
//! - `.pdf`: text layer extraction (see [`pdf`]) followed by column heuristics (see [`text`])
//!
//! Scanned PDFs are reported, not OCR'd.

pub mod error;
pub mod pdf;
pub mod sheet;
pub mod text;

use std::path::Path;

use offer_engine::Vocabulary;
use shared_types::LineItem;
use tracing::info;

pub use error::ExtractError;
pub use sheet::{read_workbook, SheetItems};

/// Source kinds recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Workbook,
    Pdf,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xlsm" => Ok(SourceKind::Workbook),
            "pdf" => Ok(SourceKind::Pdf),
            "xls" => Err(ExtractError::LegacyWorkbook(path.to_path_buf())),
            _ => Err(ExtractError::UnsupportedFormat { extension }),
        }
    }
}

/// Read goods lines from `path`, dispatching on its extension.
pub fn read_items(path: &Path, vocabulary: &Vocabulary) -> Result<Vec<LineItem>, ExtractError> {
    match SourceKind::from_path(path)? {
        SourceKind::Workbook => Ok(read_workbook(path, vocabulary)?.items),
        SourceKind::Pdf => {
            let text = pdf::read_pdf_text(path)?;
            let items = text::parse_items(&text);
            if items.is_empty() {
                return Err(ExtractError::NoItems(format!(
                    "{}: no line looks like name, quantity, price and amount columns",
                    path.display()
                )));
            }
            info!(path = %path.display(), items = items.len(), "PDF price list read");
            Ok(items)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_source_kind_by_extension() {
        assert_eq!(SourceKind::from_path(Path::new("a/price.XLSX")).unwrap(), SourceKind::Workbook);
        assert_eq!(SourceKind::from_path(Path::new("price.xlsm")).unwrap(), SourceKind::Workbook);
        assert_eq!(SourceKind::from_path(Path::new("kp.pdf")).unwrap(), SourceKind::Pdf);
        assert!(matches!(
            SourceKind::from_path(Path::new("old.xls")),
            Err(ExtractError::LegacyWorkbook(_))
        ));
        match SourceKind::from_path(Path::new("notes.txt")) {
            Err(ExtractError::UnsupportedFormat { extension }) => assert_eq!(extension, "txt"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_legacy_workbook_message_names_file() {
        let err = read_items(Path::new("old.xls"), &Vocabulary::default()).unwrap_err();
        assert!(err.to_string().contains("old.xls"));
    }
}
