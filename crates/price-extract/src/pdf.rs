//! Text layer extraction from digital PDFs.

use std::path::Path;

use pdf_extract::extract_text_from_mem;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// Documents with less text than this are treated as scans.
pub const MIN_TEXT_CHARS: usize = 500;

/// Extract the text layer of `pdf_bytes`.
///
/// Fails with [`ExtractError::ScannedPdfNeedsOcr`] when the text layer is too thin to
/// hold a price table.
pub fn extract_text(pdf_bytes: &[u8]) -> Result<String, ExtractError> {
    let raw_text = match extract_text_from_mem(pdf_bytes) {
        Ok(text) => text,
        Err(e) => {
            let message = e.to_string();
            let lower = message.to_lowercase();
            if lower.contains("encrypted") || lower.contains("password") {
                return Err(ExtractError::PasswordProtected);
            }
            if lower.contains("invalid") || lower.contains("malformed") || lower.contains("corrupt")
            {
                return Err(ExtractError::InvalidPdf(message));
            }
            return Err(ExtractError::Pdf(message));
        }
    };

    let chars = raw_text.trim().chars().count();
    if chars < MIN_TEXT_CHARS {
        warn!(chars, "PDF text layer too thin");
        return Err(ExtractError::ScannedPdfNeedsOcr { chars });
    }
    debug!(chars, "PDF text extracted");
    Ok(raw_text)
}

pub fn read_pdf_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    extract_text(&bytes)
}
