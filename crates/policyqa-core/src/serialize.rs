//! Persisting an [`ExtractionResult`] as JSON or as a flattened text report.
//!
//! The flat-text layout is what the answer session reads back as its
//! document, so its header block and per-page sections must stay stable.

use std::fmt;
use std::io::Write as _;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::ExtractionResult;

const WIDE_RULE_LEN: usize = 50;
const PAGE_RULE_LEN: usize = 20;

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("invalid output format '{0}': expected 'json' or 'txt'")]
    InvalidFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON of the full [`ExtractionResult`].
    Structured,
    /// Human-readable report with one section per page.
    FlatText,
}

impl OutputFormat {
    /// Conventional file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Structured => "json",
            OutputFormat::FlatText => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = SerializeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" | "structured" => Ok(OutputFormat::Structured),
            "txt" | "text" | "flat-text" => Ok(OutputFormat::FlatText),
            other => Err(SerializeError::InvalidFormat(other.to_string())),
        }
    }
}

/// Save `result` to `output_path`, creating or replacing the file.
///
/// The content is rendered in full and written to a temporary file next to
/// the target, which is then renamed into place.
pub fn save(
    result: &ExtractionResult,
    output_path: &Path,
    format: OutputFormat,
) -> Result<(), SerializeError> {
    let content = match format {
        OutputFormat::Structured => {
            let mut json = serde_json::to_string_pretty(result)?;
            json.push('\n');
            json
        }
        OutputFormat::FlatText => render_flat_text(result),
    };

    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.persist(output_path).map_err(|e| e.error)?;

    tracing::info!(path = %output_path.display(), %format, bytes = content.len(), "saved extraction");
    Ok(())
}

/// Like [`save`], with the format given by name (`json` or `txt`).
///
/// An unknown name fails before anything is written.
pub fn save_as(
    result: &ExtractionResult,
    output_path: &Path,
    format: &str,
) -> Result<(), SerializeError> {
    let format = format.parse::<OutputFormat>()?;
    save(result, output_path, format)
}

/// Render the flat-text report for `result`.
pub fn render_flat_text(result: &ExtractionResult) -> String {
    let wide_rule = "=".repeat(WIDE_RULE_LEN);
    let page_rule = "-".repeat(PAGE_RULE_LEN);

    let mut out = format!(
        "PDF: {}\nTotal Pages: {}\nExtraction Method: {}\n{}\n\n",
        result.source_file, result.total_pages, result.extraction_method, wide_rule
    );

    for page in &result.pages {
        out.push_str(&format!(
            "PAGE {}\n{}\nCharacters: {}, Words: {}\n",
            page.page_number, page_rule, page.character_count, page.word_count
        ));
        match &page.error {
            Some(error) => out.push_str(&format!("ERROR: {}\n", error)),
            None => out.push_str(&format!("{}\n", page.text)),
        }
        out.push_str(&format!("\n{}\n\n", wide_rule));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DocumentMetadata, ExtractionMethod, PageRecord};

    fn sample() -> ExtractionResult {
        let mut result = ExtractionResult::new("./doc/handbook.pdf", ExtractionMethod::Mupdf);
        result.pages = vec![
            PageRecord::from_raw(1, "Annual leave is 20 days.\n"),
            PageRecord::failed(2, "failed to extract text: bad xref"),
        ];
        result.total_pages = 2;
        result
    }

    #[test]
    fn flat_text_layout() {
        let text = render_flat_text(&sample());
        let expected = "\
PDF: ./doc/handbook.pdf
Total Pages: 2
Extraction Method: mupdf
==================================================

PAGE 1
--------------------
Characters: 25, Words: 5
Annual leave is 20 days.

==================================================

PAGE 2
--------------------
Characters: 0, Words: 0
ERROR: failed to extract text: bad xref

==================================================

";
        assert_eq!(text, expected);
    }

    #[test]
    fn format_names() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Structured);
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::FlatText);
        assert_eq!(
            "flat-text".parse::<OutputFormat>().unwrap(),
            OutputFormat::FlatText
        );
        assert!(matches!(
            "yaml".parse::<OutputFormat>(),
            Err(SerializeError::InvalidFormat(name)) if name == "yaml"
        ));
    }

    #[test]
    fn structured_output_preserves_non_ascii_and_key_order() {
        let mut result = sample();
        result.pages[0] = PageRecord::from_raw(1, "Congé payé");
        result.metadata = Some(DocumentMetadata {
            title: "Manuel de l'employé".into(),
            ..Default::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        save(&result, &path, OutputFormat::Structured).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"text\": \"Congé payé\""));
        assert!(written.contains("Manuel de l'employé"));
        assert!(written.contains("\n  \"source_file\""));

        let source = written.find("\"source_file\"").unwrap();
        let method = written.find("\"extraction_method\"").unwrap();
        let total = written.find("\"total_pages\"").unwrap();
        let pages = written.find("\"pages\"").unwrap();
        let metadata = written.find("\"metadata\"").unwrap();
        assert!(source < method && method < total && total < pages && pages < metadata);

        let parsed: ExtractionResult = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "stale content that is much longer than the report").unwrap();

        save(&sample(), &path, OutputFormat::FlatText).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("PDF: ./doc/handbook.pdf\n"));
        assert!(!written.contains("stale content"));
    }
}
