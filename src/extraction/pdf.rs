//! Two-phase PDF extraction: embedded text layer first, then OCR of every page.
//!
//! OCR runs on every page, including pages that already have a text layer, so the same content
//! may appear twice in the output. No deduplication is attempted.

use lopdf::Document;

use super::ExtractionError;
use super::ocr::OcrEngine;

/// Extract a PDF's text layer page by page, then append OCR output when an engine is given.
///
/// An unparseable document is an error. A failing OCR pass is logged and the text layer is
/// returned on its own.
pub(crate) fn extract_pdf(
    bytes: &[u8],
    ocr: Option<&dyn OcrEngine>,
) -> Result<String, ExtractionError> {
    let document = Document::load_mem(bytes)?;
    let mut sections = text_layer(&document);
    let text_pages = sections.len();

    if let Some(engine) = ocr {
        match engine.recognize_pdf_pages(bytes) {
            Ok(pages) => {
                sections.extend(pages.into_iter().filter(|page| !page.trim().is_empty()));
            }
            Err(error) => {
                tracing::warn!(error = %error, "OCR pass failed; keeping text layer only");
            }
        }
    }

    tracing::debug!(
        text_pages,
        ocr_pages = sections.len() - text_pages,
        "Extracted PDF text"
    );
    Ok(sections.join("\n"))
}

fn text_layer(document: &Document) -> Vec<String> {
    document
        .get_pages()
        .into_keys()
        .filter_map(|page| match document.extract_text(&[page]) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!(page, error = %error, "Failed to read PDF text layer");
                None
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a one-page PDF whose text layer reads `text`.
    pub(crate) fn single_page_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    struct FixedOcr(Vec<&'static str>);

    impl OcrEngine for FixedOcr {
        fn recognize_pdf_pages(&self, _pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Ok(self.0.iter().map(|page| page.to_string()).collect())
        }
    }

    struct BrokenOcr;

    impl OcrEngine for BrokenOcr {
        fn recognize_pdf_pages(&self, _pdf: &[u8]) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::Ocr("tesseract exploded".into()))
        }
    }

    #[test]
    fn text_layer_precedes_ocr_output() {
        let pdf = single_page_pdf("Invoice total");
        let engine = FixedOcr(vec!["scanned stamp", "   "]);
        let text = extract_pdf(&pdf, Some(&engine)).expect("pdf text");

        let layer = text.find("Invoice total").expect("text layer present");
        let scanned = text.find("scanned stamp").expect("ocr text present");
        assert!(layer < scanned);
        assert!(!text.ends_with("   "));
    }

    #[test]
    fn ocr_failure_keeps_text_layer() {
        let pdf = single_page_pdf("Still readable");
        let text = extract_pdf(&pdf, Some(&BrokenOcr)).expect("pdf text");
        assert!(text.contains("Still readable"));
    }

    #[test]
    fn ocr_disabled_returns_text_layer_only() {
        let pdf = single_page_pdf("Only layer");
        let text = extract_pdf(&pdf, None).expect("pdf text");
        assert!(text.contains("Only layer"));
    }

    #[test]
    fn malformed_pdf_is_an_error() {
        let result = extract_pdf(b"%PDF-1.7 this is not a pdf", Some(&BrokenOcr));
        assert!(matches!(result, Err(ExtractionError::Pdf(_))));
    }
}
