//! Text extraction from uploaded documents.
//!
//! Extraction failures are fatal to a request: the pipeline only ever sees text.

use std::path::Path;
use thiserror::Error;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Errors raised while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Input is larger than the configured upload limit.
    #[error("Document of {size} bytes exceeds the {limit} byte limit")]
    DocumentTooLarge {
        /// Size of the submitted document.
        size: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// Input is malformed or of an unsupported type.
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),
}

/// Interface implemented by document text extractors.
pub trait TextExtractor: Send + Sync {
    /// Produce raw text from document bytes.
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

/// Extracts the text layer of PDF documents.
pub struct PdfExtractor {
    max_bytes: usize,
}

impl PdfExtractor {
    /// Accept PDFs up to `max_bytes`.
    pub const fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        check_size(bytes, self.max_bytes)?;
        if !bytes.starts_with(PDF_SIGNATURE) {
            return Err(ExtractError::UnreadableDocument(
                "file is not a PDF document".into(),
            ));
        }
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|error| {
            ExtractError::UnreadableDocument(format!("failed to read PDF: {error}"))
        })?;
        tracing::debug!(bytes = bytes.len(), chars = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }
}

/// Reads UTF-8 plain text.
pub struct PlainTextExtractor {
    max_bytes: usize,
}

impl PlainTextExtractor {
    /// Accept text files up to `max_bytes`.
    pub const fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        check_size(bytes, self.max_bytes)?;
        String::from_utf8(bytes.to_vec()).map_err(|error| {
            ExtractError::UnreadableDocument(format!("text is not valid UTF-8: {error}"))
        })
    }
}

/// Pick an extractor from a file name: `.pdf` files get the PDF extractor, anything else is
/// read as plain text.
pub fn extractor_for_path(path: &Path, max_bytes: usize) -> Box<dyn TextExtractor> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Box::new(PdfExtractor::new(max_bytes))
    } else {
        Box::new(PlainTextExtractor::new(max_bytes))
    }
}

fn check_size(bytes: &[u8], limit: usize) -> Result<(), ExtractError> {
    if bytes.len() > limit {
        return Err(ExtractError::DocumentTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_extractor_rejects_non_pdf_bytes() {
        let error = PdfExtractor::new(1024)
            .extract(b"just some text")
            .unwrap_err();
        assert!(matches!(error, ExtractError::UnreadableDocument(ref m) if m.contains("not a PDF")));
    }

    #[test]
    fn pdf_extractor_reads_text_layer() {
        let bytes = include_bytes!("../../tests/fixtures/hello.pdf");
        let text = PdfExtractor::new(1024 * 1024)
            .extract(bytes)
            .expect("pdf text");
        let collapsed: String = text.split_whitespace().collect();
        assert!(collapsed.contains("Hellofromfernsum."), "got {text:?}");
    }

    #[test]
    fn pdf_with_broken_structure_is_unreadable() {
        let error = PdfExtractor::new(1024)
            .extract(b"%PDF-1.7\nthis body has no objects and no cross-reference table\n")
            .unwrap_err();
        assert!(matches!(error, ExtractError::UnreadableDocument(ref m) if m.contains("failed to read PDF")));
    }

    #[test]
    fn size_limit_is_checked_first() {
        let error = PdfExtractor::new(4).extract(b"%PDF-1.7").unwrap_err();
        assert!(matches!(
            error,
            ExtractError::DocumentTooLarge { size: 8, limit: 4 }
        ));
    }

    #[test]
    fn plain_text_round_trips_utf8() {
        let text = PlainTextExtractor::new(1024)
            .extract("Résumé. Second sentence.".as_bytes())
            .expect("text");
        assert_eq!(text, "Résumé. Second sentence.");
    }

    #[test]
    fn plain_text_rejects_invalid_utf8() {
        let error = PlainTextExtractor::new(1024)
            .extract(&[0xff, 0xfe, 0xfd])
            .unwrap_err();
        assert!(matches!(error, ExtractError::UnreadableDocument(_)));
    }

    #[test]
    fn extractor_selection_follows_extension() {
        let pdf = extractor_for_path(Path::new("report.PDF"), 1024);
        assert!(pdf.extract(b"plain").is_err());

        let text = extractor_for_path(Path::new("notes.txt"), 1024);
        assert_eq!(text.extract(b"plain").expect("text"), "plain");
    }
}
