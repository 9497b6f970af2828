//! Format-specific text extraction and the dispatcher that isolates per-file failures.
//!
//! The extractor is picked from the file name's extension (case-insensitive):
//!
//! - `.txt` and anything unrecognized – UTF-8 decode that drops invalid sequences.
//! - `.pdf` – text layer per page, followed by OCR of every page when an engine is configured.
//! - `.docx` – body paragraphs, newline-joined.
//! - `.csv`, `.xls`, `.xlsx` – table rows flattened to space-separated cells.
//!
//! Every extractor result passes through [`normalize`](crate::processing::normalize::normalize).
//! Extractor errors and parser panics are logged and turned into empty text; they never fail a
//! batch.

mod document;
pub mod ocr;
mod pdf;
mod plain;
mod tabular;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::processing::normalize::{TextFilter, normalize};

pub use ocr::{OcrEngine, TesseractOcr};

#[cfg(test)]
pub(crate) use pdf::tests::single_page_pdf;

/// Failures raised inside a single format extractor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The PDF could not be parsed.
    #[error("PDF parsing failed: {0}")]
    Pdf(#[from] lopdf::Error),
    /// The `.docx` archive or its XML could not be read.
    #[error("DOCX parsing failed: {0}")]
    Document(#[from] docx_rs::ReaderError),
    /// The CSV input was malformed.
    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),
    /// The workbook could not be opened or read.
    #[error("Spreadsheet parsing failed: {0}")]
    Spreadsheet(#[from] calamine::Error),
    /// An OCR tool exited unsuccessfully.
    #[error("OCR failed: {0}")]
    Ocr(String),
    /// Scratch files or external tools could not be accessed.
    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),
    /// A parser panicked on malformed input.
    #[error("Extractor panicked: {0}")]
    Panicked(String),
}

/// Extractor family selected for a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.txt`
    PlainText,
    /// `.pdf`
    Pdf,
    /// `.docx`
    Document,
    /// `.csv`
    Csv,
    /// `.xls` / `.xlsx`
    Spreadsheet,
    /// Any other extension; decoded as plain text.
    Unknown,
}

impl FileKind {
    /// Classify a file by its extension, ignoring case.
    pub fn from_file_name(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".txt") {
            Self::PlainText
        } else if lower.ends_with(".pdf") {
            Self::Pdf
        } else if lower.ends_with(".docx") {
            Self::Document
        } else if lower.ends_with(".csv") {
            Self::Csv
        } else if lower.ends_with(".xls") || lower.ends_with(".xlsx") {
            Self::Spreadsheet
        } else {
            Self::Unknown
        }
    }
}

/// Result of extracting one file: normalized text, or the reason extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Normalized text, possibly empty.
    Extracted(String),
    /// The extractor failed; the file contributes no text.
    Failed(String),
}

/// Normalized extraction result for a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// Name the file was submitted under.
    pub file_name: String,
    /// Extractor family used.
    pub kind: FileKind,
    /// Tagged extraction result.
    pub outcome: ExtractionOutcome,
}

impl ExtractedDocument {
    /// Normalized text, empty when extraction failed.
    pub fn text(&self) -> &str {
        match &self.outcome {
            ExtractionOutcome::Extracted(text) => text,
            ExtractionOutcome::Failed(_) => "",
        }
    }

    /// Whether the extractor reported an error.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Failed(_))
    }
}

/// Dispatches files to their format extractor and normalizes the output.
#[derive(Clone)]
pub struct Extractor {
    filter: TextFilter,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl Extractor {
    /// Build an extractor with an explicit normalization filter and optional OCR engine.
    pub fn new(filter: TextFilter, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { filter, ocr }
    }

    /// Build an extractor from configuration; OCR uses `pdftoppm` and `tesseract` when enabled.
    pub fn from_config(config: &Config) -> Self {
        let ocr = config
            .ocr_enabled
            .then(|| Arc::new(TesseractOcr::from_config(config)) as Arc<dyn OcrEngine>);
        Self::new(config.text_filter, ocr)
    }

    /// Run the matching format extractor without normalization or failure isolation.
    pub fn extract_raw(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        match FileKind::from_file_name(file_name) {
            FileKind::PlainText | FileKind::Unknown => Ok(plain::decode_lossy(bytes)),
            FileKind::Pdf => pdf::extract_pdf(bytes, self.ocr.as_deref()),
            FileKind::Document => document::extract_docx(bytes),
            FileKind::Csv => tabular::extract_csv(bytes),
            FileKind::Spreadsheet => tabular::extract_spreadsheet(bytes),
        }
    }

    /// Extract and normalize one file, recording a failure instead of returning an error.
    ///
    /// Parser panics are caught and recorded as failures as well.
    pub fn extract_document(&self, file_name: &str, bytes: &[u8]) -> ExtractedDocument {
        let kind = FileKind::from_file_name(file_name);
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.extract_raw(file_name, bytes)))
            .unwrap_or_else(|payload| {
                Err(ExtractionError::Panicked(panic_message(payload.as_ref())))
            });
        let outcome = match result {
            Ok(raw) => ExtractionOutcome::Extracted(normalize(&raw, self.filter)),
            Err(error) => {
                tracing::warn!(
                    file = file_name,
                    kind = ?kind,
                    error = %error,
                    "Failed to extract text"
                );
                ExtractionOutcome::Failed(error.to_string())
            }
        };
        ExtractedDocument {
            file_name: file_name.to_string(),
            kind,
            outcome,
        }
    }

    /// Extract and normalize one file; failures yield an empty string.
    pub fn extract_and_clean(&self, file_name: &str, bytes: &[u8]) -> String {
        self.extract_document(file_name, bytes).text().to_string()
    }
}

/// Human-readable text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(TextFilter::Ascii, None)
    }

    #[test]
    fn dispatch_is_case_insensitive() {
        assert_eq!(FileKind::from_file_name("report.CSV"), FileKind::Csv);
        assert_eq!(FileKind::from_file_name("Scan.Pdf"), FileKind::Pdf);
        assert_eq!(FileKind::from_file_name("notes.TXT"), FileKind::PlainText);
        assert_eq!(FileKind::from_file_name("memo.DOCX"), FileKind::Document);
        assert_eq!(FileKind::from_file_name("book.XLS"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_file_name("book.xlsx"), FileKind::Spreadsheet);
        assert_eq!(FileKind::from_file_name("archive.tar.gz"), FileKind::Unknown);
        assert_eq!(FileKind::from_file_name("README"), FileKind::Unknown);
    }

    #[test]
    fn uppercase_csv_uses_tabular_extractor() {
        let text = extractor().extract_and_clean("report.CSV", b"h1,h2\nleft,right\n");
        assert_eq!(text, "left right");
    }

    #[test]
    fn plain_text_is_normalized() {
        let text = extractor().extract_and_clean("notes.txt", b"Hello   \n\nworld");
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn unknown_extension_falls_back_to_decode() {
        let text = extractor().extract_and_clean("data.log", b"line one\r\nline\xfftwo");
        assert_eq!(text, "line one linetwo");
    }

    #[test]
    fn corrupt_files_become_failed_outcomes() {
        let extractor = extractor();
        for name in ["broken.pdf", "broken.docx", "broken.xlsx"] {
            let document = extractor.extract_document(name, b"not really that format");
            assert!(document.is_failed(), "{name} should fail");
            assert_eq!(document.text(), "");
            assert_eq!(extractor.extract_and_clean(name, b"not really that format"), "");
        }
    }

    struct PanickingOcr;

    impl OcrEngine for PanickingOcr {
        fn recognize_pdf_pages(&self, _pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
            panic!("rasterizer blew up");
        }
    }

    #[test]
    fn extractor_panic_becomes_failed_outcome() {
        let extractor = Extractor::new(TextFilter::Ascii, Some(Arc::new(PanickingOcr)));
        let pdf = pdf::tests::single_page_pdf("Board minutes");

        let document = extractor.extract_document("minutes.pdf", &pdf);

        assert!(document.is_failed());
        assert_eq!(document.text(), "");
        assert!(matches!(
            &document.outcome,
            ExtractionOutcome::Failed(reason) if reason.contains("rasterizer blew up")
        ));
    }

    #[test]
    fn pdf_with_mismatched_font_object_does_not_escape() {
        let mut pdf = pdf::tests::single_page_pdf("Board minutes");
        pdf[71] = b'0';

        let document = extractor().extract_document("bad.pdf", &pdf);

        assert!(document.is_failed());
        assert_eq!(document.text(), "");
    }

    #[test]
    fn panic_messages_are_recovered_from_payloads() {
        let static_payload: Box<dyn Any + Send> = Box::new("static message");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        let opaque_payload: Box<dyn Any + Send> = Box::new(42_u8);

        assert_eq!(panic_message(static_payload.as_ref()), "static message");
        assert_eq!(panic_message(owned_payload.as_ref()), "owned message");
        assert_eq!(panic_message(opaque_payload.as_ref()), "unknown panic");
    }

    #[test]
    fn pdf_text_layer_flows_through_dispatcher() {
        let pdf = pdf::tests::single_page_pdf("Board minutes");
        let document = extractor().extract_document("minutes.pdf", &pdf);
        assert_eq!(document.kind, FileKind::Pdf);
        assert!(document.text().contains("Board minutes"));
    }
}
