use std::path::Path;

use mupdf::{Document, MetadataName, TextPageFlags};

use policyqa_core::{BackendError, DocumentMetadata, ExtractionMethod, PdfBackend, PdfDocument};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that the lopdf backend and the question-answering
/// code do not transitively depend on it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Mupdf
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;

        Ok(Box::new(MupdfDocument {
            document,
            page_count: page_count.max(0) as usize,
        }))
    }
}

struct MupdfDocument {
    document: Document,
    page_count: usize,
}

impl MupdfDocument {
    fn info(&self, name: MetadataName) -> String {
        // MuPDF reports absent keys as errors or empty strings; both mean "not set".
        self.document.metadata(name).unwrap_or_default()
    }
}

impl PdfDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        let page = self
            .document
            .load_page(index as i32)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        // Block/line iteration, one newline per line, like PyMuPDF's get_text()
        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                page_text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                page_text.push('\n');
            }
        }
        Ok(page_text)
    }

    fn metadata(&self) -> Result<DocumentMetadata, BackendError> {
        Ok(DocumentMetadata {
            title: self.info(MetadataName::Title),
            author: self.info(MetadataName::Author),
            subject: self.info(MetadataName::Subject),
            creator: self.info(MetadataName::Creator),
            producer: self.info(MetadataName::Producer),
            creation_date: self.info(MetadataName::CreationDate),
            modification_date: self.info(MetadataName::ModDate),
        })
    }
}
