//! Word-processor (`.docx`) paragraph extraction.

use docx_rs::{DocumentChild, ParagraphChild, Run, RunChild};

use super::ExtractionError;

/// Concatenate body paragraphs in document order, one newline between paragraphs.
///
/// Paragraph text includes runs nested in hyperlinks; tabs and breaks inside a run map to
/// `\t` and `\n`. Table contents are not paragraphs of the body and are skipped.
pub(crate) fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = docx_rs::read_docx(bytes)?;
    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => Some(paragraph_text(&paragraph.children)),
            _ => None,
        })
        .collect();
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(&mut text, run),
            ParagraphChild::Hyperlink(link) => text.push_str(&paragraph_text(&link.children)),
            _ => {}
        }
    }
    text
}

fn push_run_text(text: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => text.push_str(&t.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph};
    use std::io::Cursor;

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for paragraph in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*paragraph)));
        }
        let mut buffer = Cursor::new(Vec::new());
        docx.build().pack(&mut buffer).expect("pack docx");
        buffer.into_inner()
    }

    #[test]
    fn paragraphs_are_newline_joined_in_order() {
        let bytes = build_docx(&["Quarterly report", "Revenue grew", "Costs fell"]);
        let text = extract_docx(&bytes).expect("docx text");
        assert_eq!(text, "Quarterly report\nRevenue grew\nCosts fell");
    }

    #[test]
    fn runs_within_a_paragraph_are_concatenated() {
        let paragraph = Paragraph::new()
            .add_run(Run::new().add_text("Hello, "))
            .add_run(Run::new().add_text("world"));
        let mut buffer = Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(paragraph)
            .build()
            .pack(&mut buffer)
            .expect("pack docx");
        let text = extract_docx(buffer.get_ref()).expect("docx text");
        assert_eq!(text, "Hello, world");
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let result = extract_docx(b"PK\x03\x04 truncated");
        assert!(matches!(result, Err(ExtractionError::Document(_))));
    }
}
