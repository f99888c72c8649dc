use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod backend;
pub mod config_file;
pub mod extract;
pub mod llm;
pub mod parse;
pub mod prompts;
pub mod serialize;
pub mod session;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, PdfDocument};
pub use config_file::{ConfigError, LlmConfig};
pub use extract::extract;
pub use llm::{CompletionService, LlmError};
pub use parse::{ParseError, parse_answer, parse_evaluation};
pub use serialize::{OutputFormat, SerializeError, render_flat_text, save, save_as};
pub use session::{AnswerSession, Input, SessionError, SessionState, Turn};

/// Which extraction backend produced an [`ExtractionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Mupdf,
    Lopdf,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Mupdf => "mupdf",
            ExtractionMethod::Lopdf => "lopdf",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mupdf" => Ok(ExtractionMethod::Mupdf),
            "lopdf" => Ok(ExtractionMethod::Lopdf),
            other => Err(format!(
                "unknown extraction method '{}' (expected 'mupdf' or 'lopdf')",
                other
            )),
        }
    }
}

/// Text extracted from a single page.
///
/// When `error` is set the page could not be extracted and the remaining
/// fields are zero-valued placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
    /// Length of the raw (untrimmed) text in Unicode scalar values.
    pub character_count: usize,
    pub word_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageRecord {
    /// Build a record from the raw text a backend returned for a page.
    pub fn from_raw(page_number: u32, raw: &str) -> Self {
        let text = raw.trim();
        Self {
            page_number,
            text: text.to_string(),
            character_count: raw.chars().count(),
            word_count: count_words(text),
            error: None,
        }
    }

    /// Placeholder record for a page whose extraction failed.
    pub fn failed(page_number: u32, message: impl Into<String>) -> Self {
        Self {
            page_number,
            text: String::new(),
            character_count: 0,
            word_count: 0,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Count whitespace-separated tokens; an all-whitespace string has zero words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Document information dictionary entries. Missing entries are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub producer: String,
    pub creation_date: String,
    pub modification_date: String,
}

/// Result of extracting one PDF. Built once per [`extract`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub source_file: String,
    pub extraction_method: ExtractionMethod,
    pub total_pages: usize,
    pub pages: Vec<PageRecord>,
    /// Serialized as `{}` when metadata was not requested.
    #[serde(default, with = "metadata_or_empty")]
    pub metadata: Option<DocumentMetadata>,
    /// Set when the document could not be opened or processed at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// An empty result for `source_file`, before any page has been read.
    pub fn new(source_file: impl Into<String>, extraction_method: ExtractionMethod) -> Self {
        Self {
            source_file: source_file.into(),
            extraction_method,
            total_pages: 0,
            pages: Vec::new(),
            metadata: None,
            error: None,
        }
    }

    /// A result describing a document that could not be processed.
    pub fn failed(
        source_file: impl Into<String>,
        extraction_method: ExtractionMethod,
        message: impl fmt::Display,
    ) -> Self {
        Self {
            error: Some(format!("Failed to process PDF: {}", message)),
            ..Self::new(source_file, extraction_method)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Number of pages that carry a per-page error.
    pub fn failed_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_error()).count()
    }

    pub fn total_words(&self) -> usize {
        self.pages.iter().map(|p| p.word_count).sum()
    }
}

mod metadata_or_empty {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    use super::DocumentMetadata;

    pub fn serialize<S: Serializer>(
        value: &Option<DocumentMetadata>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(metadata) => metadata.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DocumentMetadata>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            other => serde_json::from_value(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
