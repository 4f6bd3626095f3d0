//! Text extraction from uploaded documents (PDF, DOCX).
//!
//! [`extract_text`] is the typed entry point used by the docs section.
//! [`extract_text_or_empty`] logs the failure and returns `""`, for callers
//! that only care whether any text came out.

mod docx;
mod pdf;

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, error};

pub use docx::extract_docx;
pub use pdf::extract_pdf;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported document type '{0}' (expected .pdf or .docx)")]
    Unsupported(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("{0} contains no extractable text")]
    Empty(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Decide by file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            _ => Err(ParseError::Unsupported(path.display().to_string())),
        }
    }
}

/// Whether `path` looks like a document (as opposed to a dataset).
pub fn is_document(path: &Path) -> bool {
    DocumentKind::from_path(path).is_ok()
}

/// Extract the text of the document at `path`.
///
/// A document that parses but yields only whitespace is reported as
/// [`ParseError::Empty`].
pub fn extract_text(path: &Path) -> Result<String, ParseError> {
    let kind = DocumentKind::from_path(path)?;
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let text = match kind {
        DocumentKind::Pdf => extract_pdf(&bytes)?,
        DocumentKind::Docx => extract_docx(&bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ParseError::Empty(path.display().to_string()));
    }
    debug!(path = %path.display(), ?kind, chars = text.len(), "document text extracted");
    Ok(text)
}

/// [`extract_text`], with every failure logged and mapped to `""`.
pub fn extract_text_or_empty(path: &Path) -> String {
    extract_text(path).unwrap_or_else(|e| {
        error!(path = %path.display(), error = %e, "error extracting document text");
        String::new()
    })
}
