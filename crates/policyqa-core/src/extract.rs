//! Page-by-page extraction driver shared by all [`PdfBackend`]s.

use std::path::Path;

use crate::backend::{PdfBackend, PdfDocument};
use crate::{ExtractionResult, PageRecord};

/// Extract every page of the PDF at `path` with `backend`.
///
/// Never fails outright: a document that cannot be opened yields a result
/// with `error` set and no pages, and a page that cannot be read yields a
/// [`PageRecord`] with `error` set while the remaining pages are still read.
pub fn extract(path: &Path, backend: &dyn PdfBackend, include_metadata: bool) -> ExtractionResult {
    let source_file = path.display().to_string();
    let method = backend.method();

    let document = match backend.open(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(path = %source_file, %method, error = %e, "failed to open PDF");
            return ExtractionResult::failed(source_file, method, e);
        }
    };

    let mut result = ExtractionResult::new(source_file, method);
    if let Err(e) = read_document(document.as_ref(), include_metadata, &mut result) {
        tracing::warn!(path = %result.source_file, %method, error = %e, "failed to read PDF metadata");
        return ExtractionResult::failed(result.source_file, method, e);
    }
    // The document handle is released here, before the result is handed out.
    drop(document);

    tracing::info!(
        path = %result.source_file,
        %method,
        pages = result.total_pages,
        failed = result.failed_pages(),
        words = result.total_words(),
        "extraction complete"
    );
    result
}

fn read_document(
    document: &dyn PdfDocument,
    include_metadata: bool,
    result: &mut ExtractionResult,
) -> Result<(), crate::BackendError> {
    let page_count = document.page_count();

    if include_metadata {
        result.metadata = Some(document.metadata()?);
    }

    result.total_pages = page_count;
    result.pages.reserve(page_count);

    for index in 0..page_count {
        let page_number = (index + 1) as u32;
        let record = match document.page_text(index) {
            Ok(raw) => PageRecord::from_raw(page_number, &raw),
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "page extraction failed");
                PageRecord::failed(page_number, e.to_string())
            }
        };
        tracing::debug!(
            page = page_number,
            chars = record.character_count,
            words = record.word_count,
            "page extracted"
        );
        result.pages.push(record);
    }

    Ok(())
}
