use mupdf::{Document, TextPageFlags};

use docmeta_core::{ExtractedText, ExtractorError, TextExtractor};

/// MuPDF-based implementation of [`TextExtractor`].
///
/// This crate is the sole AGPL island; it isolates the mupdf dependency so
/// the rest of the workspace does not link against it directly.
///
/// MuPDF opens documents by path, so each upload is spilled to a private
/// temp directory that is removed when extraction returns.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfExtractor;

impl MupdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for MupdfExtractor {
    fn extract_text(&self, data: &[u8]) -> Result<ExtractedText, ExtractorError> {
        let temp_dir = tempfile::tempdir()?;
        let pdf_path = temp_dir.path().join("upload.pdf");
        std::fs::write(&pdf_path, data)?;

        let path_str = pdf_path
            .to_str()
            .ok_or_else(|| ExtractorError::Open("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| ExtractorError::Open(e.to_string()))?;

        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| ExtractorError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| ExtractorError::Extraction(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| ExtractorError::Extraction(e.to_string()))?;

            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        let page_count = pages_text.len();
        tracing::debug!(page_count, bytes = data.len(), "mupdf extraction finished");

        Ok(ExtractedText::new(pages_text.join("\n"), page_count))
    }
}
