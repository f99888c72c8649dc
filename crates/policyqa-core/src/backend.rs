use std::path::Path;

use thiserror::Error;

use crate::{DocumentMetadata, ExtractionMethod};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors only open documents; page iteration, counting and error
/// isolation live in [`crate::extract::extract`] so every backend produces
/// the same data model.
pub trait PdfBackend: Send + Sync {
    /// The method name recorded in [`crate::ExtractionResult::extraction_method`].
    fn method(&self) -> ExtractionMethod;

    /// Open the PDF at `path`. The returned handle is released when dropped.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An open PDF document.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Raw text of the page at 0-based `index`, untrimmed.
    fn page_text(&self, index: usize) -> Result<String, BackendError>;

    /// Document information entries. Missing entries are empty strings.
    fn metadata(&self) -> Result<DocumentMetadata, BackendError>;
}
