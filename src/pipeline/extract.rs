//! Text extraction: validate the input path and pull plain text out of a PDF.
//!
//! Extraction is treated as a black box that turns a document into one
//! concatenated string. Page texts are joined with a single space; no layout
//! reconstruction is attempted because the text only feeds a prompt.
//!
//! lopdf parsing is synchronous and CPU-bound, so [`extract_text`] runs it on
//! the blocking pool.

use crate::error::SummaryError;
use lopdf::Document;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Text extracted from the source document. Read-only after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// All page texts joined with a single space.
    pub text: String,
    /// Number of pages in the document.
    pub pages: usize,
}

impl SourceText {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Check that `path` exists, is readable and starts with the `%PDF` magic.
pub fn resolve_local(path: &Path) -> Result<PathBuf, SummaryError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(SummaryError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(SummaryError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SummaryError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(SummaryError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Extract the text of every page of the PDF at `path`.
///
/// # Errors
/// Any [`SummaryError`] of kind `Extraction`: missing or unreadable file,
/// not a PDF, corrupt or encrypted PDF, or a PDF without any text.
pub async fn extract_text(path: &Path) -> Result<SourceText, SummaryError> {
    let path = resolve_local(path)?;

    tokio::task::spawn_blocking(move || extract_text_blocking(&path))
        .await
        .map_err(|e| SummaryError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
pub fn extract_text_blocking(path: &Path) -> Result<SourceText, SummaryError> {
    let document = Document::load(path).map_err(|e| match e {
        lopdf::Error::Decryption(_) => SummaryError::EncryptedPdf {
            path: path.to_path_buf(),
        },
        other => SummaryError::CorruptPdf {
            path: path.to_path_buf(),
            detail: other.to_string(),
        },
    })?;

    // lopdf loads encrypted files without decrypting their strings.
    if document.is_encrypted() {
        return Err(SummaryError::EncryptedPdf {
            path: path.to_path_buf(),
        });
    }

    let pages = document.get_pages();
    let total_pages = pages.len();
    info!("PDF loaded: {} pages", total_pages);

    let mut page_texts = Vec::with_capacity(total_pages);
    for &page_num in pages.keys() {
        match document.extract_text(&[page_num]) {
            Ok(text) => {
                debug!("Page {}: {} chars", page_num, text.len());
                page_texts.push(text);
            }
            Err(e) => warn!("Skipping page {}: text extraction failed: {}", page_num, e),
        }
    }

    let text = page_texts.join(" ");
    if text.trim().is_empty() {
        return Err(SummaryError::NoExtractableText {
            path: path.to_path_buf(),
            pages: total_pages,
        });
    }

    Ok(SourceText {
        text,
        pages: total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryMode;
    use crate::output::StructuredSummary;
    use crate::pipeline::render::render_to_bytes;

    fn sample_pdf(dir: &Path) -> PathBuf {
        let summary = StructuredSummary {
            title: "Plants Turn Light Into Fuel".into(),
            subtitle: "A key process for ecosystems".into(),
            narrative: None,
            bullets: vec!["Uses sunlight".into()],
            link: "https://example.com/photo".into(),
        };
        let bytes = render_to_bytes(&summary, SummaryMode::Lean).unwrap();
        let path = dir.join("source.pdf");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = resolve_local(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, SummaryError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_is_rejected_with_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();
        match resolve_local(&path).unwrap_err() {
            SummaryError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn tiny_file_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"%P").unwrap();
        assert!(matches!(
            resolve_local(&path).unwrap_err(),
            SummaryError::NotAPdf { .. }
        ));
    }

    #[test]
    fn truncated_pdf_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.5\n%garbage with no objects").unwrap();
        let err = extract_text_blocking(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Extraction);
    }

    #[tokio::test]
    async fn extracts_text_from_generated_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_pdf(dir.path());
        let source = extract_text(&path).await.unwrap();
        assert_eq!(source.pages, 1);
        assert!(source.text.contains("Plants Turn Light Into Fuel"), "got: {}", source.text);
        assert!(source.char_count() > 0);
    }
}
