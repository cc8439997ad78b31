//! Text extraction for document sources.
//!
//! The pipeline treats extraction as a black box: bytes plus a file name
//! in, plain UTF-8 text out. PDF goes through `pdf-extract`; plain text
//! and markdown pass through unchanged. Failures surface as
//! [`ExtractError`] before anything is persisted.

use std::path::Path;
use thiserror::Error;

/// Extraction failure. Fatal for the current request; no partial
/// ingestion is committed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source file not found: {0}")]
    Missing(String),
    #[error("unsupported document type: {0}")]
    Unsupported(String),
    #[error("source is not valid UTF-8 text")]
    InvalidText,
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

/// File name extensions treated as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "text"];

/// Extract plain text from in-memory document bytes, dispatching on the
/// source file name's extension.
pub fn extract_bytes(name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string())),
        e if TEXT_EXTENSIONS.contains(&e) => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidText)
        }
        _ => Err(ExtractError::Unsupported(name.to_string())),
    }
}

/// Extract text from a file on disk.
pub fn extract_file(path: &Path) -> Result<String, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::Missing(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    extract_bytes(name, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = extract_bytes("notes.txt", b"Some plain text.").unwrap();
        assert_eq!(text, "Some plain text.");
    }

    #[test]
    fn markdown_passes_through() {
        let text = extract_bytes("readme.md", b"# Heading\n\nBody.").unwrap();
        assert!(text.contains("Heading"));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = extract_bytes("image.png", b"\x89PNG").unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[test]
    fn invalid_utf8_text_is_rejected() {
        let err = extract_bytes("notes.txt", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidText));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = extract_file(Path::new("/nonexistent/source.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Missing(_)));
    }
}
