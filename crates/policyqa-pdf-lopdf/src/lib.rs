use std::path::Path;

use lopdf::{Dictionary, Object};

use policyqa_core::{BackendError, DocumentMetadata, ExtractionMethod, PdfBackend, PdfDocument};

/// Pure-Rust implementation of [`PdfBackend`] built on lopdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Lopdf
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        let inner = lopdf::Document::load(path).map_err(|e| BackendError::OpenError(e.to_string()))?;

        // get_pages() is keyed by 1-based page number, in document order
        let page_numbers: Vec<u32> = inner.get_pages().keys().copied().collect();
        tracing::debug!(path = %path.display(), pages = page_numbers.len(), "lopdf document loaded");

        Ok(Box::new(LopdfDocument {
            inner,
            page_numbers,
        }))
    }
}

struct LopdfDocument {
    inner: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl LopdfDocument {
    fn info_dictionary(&self) -> Option<&Dictionary> {
        match self.inner.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.inner.get_object(*id).ok()?.as_dict().ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    fn info_string(&self, info: &Dictionary, key: &[u8]) -> String {
        let Ok(obj) = info.get(key) else {
            return String::new();
        };
        let obj = match obj {
            Object::Reference(id) => match self.inner.get_object(*id) {
                Ok(resolved) => resolved,
                Err(_) => return String::new(),
            },
            other => other,
        };
        match obj {
            Object::String(bytes, _) => decode_text_string(bytes),
            Object::Name(name) => String::from_utf8_lossy(name).into_owned(),
            _ => String::new(),
        }
    }

    fn page_number(&self, index: usize) -> Result<u32, BackendError> {
        self.page_numbers.get(index).copied().ok_or_else(|| {
            BackendError::ExtractionError(format!(
                "page index {} out of range (0..{})",
                index,
                self.page_numbers.len()
            ))
        })
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        let number = self.page_number(index)?;
        self.inner
            .extract_text(&[number])
            .map_err(|e| BackendError::ExtractionError(e.to_string()))
    }

    fn metadata(&self) -> Result<DocumentMetadata, BackendError> {
        let Some(info) = self.info_dictionary() else {
            return Ok(DocumentMetadata::default());
        };
        Ok(DocumentMetadata {
            title: self.info_string(info, b"Title"),
            author: self.info_string(info, b"Author"),
            subject: self.info_string(info, b"Subject"),
            creator: self.info_string(info, b"Creator"),
            producer: self.info_string(info, b"Producer"),
            creation_date: self.info_string(info, b"CreationDate"),
            modification_date: self.info_string(info, b"ModDate"),
        })
    }
}

/// Decode a PDF text string: UTF-16BE when it carries the `FE FF` byte order
/// mark, otherwise UTF-8 with a Latin-1 fallback.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
