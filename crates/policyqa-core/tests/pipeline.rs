//! End-to-end tests for extraction and serialization.
//!
//! A scripted in-memory backend stands in for the PDF libraries so page
//! failures can be produced on demand.

use std::path::Path;

use policyqa_core::{
    BackendError, DocumentMetadata, ExtractionMethod, ExtractionResult, OutputFormat, PdfBackend,
    PdfDocument, SerializeError, extract, save, save_as,
};

struct ScriptedDocument {
    pages: Vec<Result<String, String>>,
}

impl PdfDocument for ScriptedDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        self.pages[index]
            .clone()
            .map_err(BackendError::ExtractionError)
    }

    fn metadata(&self) -> Result<DocumentMetadata, BackendError> {
        Ok(DocumentMetadata {
            title: "Employee Handbook".into(),
            author: "Human Resources".into(),
            ..Default::default()
        })
    }
}

struct ScriptedBackend {
    pages: Vec<Result<String, String>>,
}

impl PdfBackend for ScriptedBackend {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Mupdf
    }

    fn open(&self, path: &Path) -> Result<Box<dyn PdfDocument>, BackendError> {
        if !path.exists() {
            return Err(BackendError::OpenError(format!(
                "no such file: {}",
                path.display()
            )));
        }
        Ok(Box::new(ScriptedDocument {
            pages: self.pages.clone(),
        }))
    }
}

fn handbook_backend() -> ScriptedBackend {
    ScriptedBackend {
        pages: vec![
            Ok("  Welcome to the company.\n".into()),
            Ok("Annual leave: 20 days per year.\nSick leave: 10 days.\n".into()),
            Err("unsupported filter".into()),
            Ok("\n\n".into()),
        ],
    }
}

fn extract_handbook(dir: &Path) -> ExtractionResult {
    let pdf = dir.join("handbook.pdf");
    std::fs::write(&pdf, b"%PDF-1.7 placeholder").unwrap();
    extract(&pdf, &handbook_backend(), true)
}

#[test]
fn page_count_and_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_handbook(dir.path());

    assert!(result.error.is_none());
    assert_eq!(result.total_pages, 4);
    assert_eq!(result.pages.len(), result.total_pages);
    for (i, page) in result.pages.iter().enumerate() {
        assert_eq!(page.page_number as usize, i + 1);
    }
    assert_eq!(result.metadata.as_ref().unwrap().author, "Human Resources");
}

#[test]
fn word_count_matches_trimmed_text() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_handbook(dir.path());

    for page in &result.pages {
        if page.text.is_empty() {
            assert_eq!(page.word_count, 0, "page {}", page.page_number);
        } else {
            assert_eq!(page.word_count, page.text.split_whitespace().count());
        }
    }
    assert_eq!(result.pages[0].word_count, 4);
    assert_eq!(result.pages[3].character_count, 2);
    assert_eq!(result.pages[3].word_count, 0);
}

#[test]
fn failed_page_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_handbook(dir.path());

    let failed = &result.pages[2];
    assert!(failed.error.as_deref().unwrap().contains("unsupported filter"));
    assert_eq!((failed.text.as_str(), failed.character_count, failed.word_count), ("", 0, 0));
    assert!(result.pages[1].error.is_none());
    assert!(result.pages[3].error.is_none());
}

#[test]
fn missing_file_reports_top_level_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract(&dir.path().join("absent.pdf"), &handbook_backend(), true);

    assert!(result.error.as_deref().unwrap().contains("no such file"));
    assert!(result.pages.is_empty());
    assert_eq!(result.total_pages, 0);
    assert!(result.metadata.is_none());
}

#[test]
fn flat_text_contains_pages_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_handbook(dir.path());
    let out = dir.path().join("serialized_pdf.txt");
    save(&result, &out, OutputFormat::FlatText).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains(&format!("Total Pages: {}\n", result.total_pages)));
    assert!(text.contains("Extraction Method: mupdf\n"));
    for page in &result.pages {
        assert!(text.contains(&format!("PAGE {}\n", page.page_number)));
        assert!(text.contains(&format!(
            "Characters: {}, Words: {}\n",
            page.character_count, page.word_count
        )));
        match &page.error {
            Some(error) => assert!(text.contains(&format!("ERROR: {}\n", error))),
            None => assert!(text.contains(&page.text)),
        }
    }
}

#[test]
fn json_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_handbook(dir.path());
    let out = dir.path().join("serialized_pdf.json");
    save_as(&result, &out, "json").unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["extraction_method"], "mupdf");
    assert_eq!(value["total_pages"], 4);
    assert_eq!(value["pages"][2]["error"], "failed to extract text: unsupported filter");
    assert!(value["pages"][0].get("error").is_none());
    assert_eq!(value["metadata"]["title"], "Employee Handbook");
    assert_eq!(value["metadata"]["creation_date"], "");
}

#[test]
fn invalid_format_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let result = extract_handbook(dir.path());
    let out = dir.path().join("out.bogus");

    let err = save_as(&result, &out, "bogus-format").unwrap_err();
    assert!(matches!(err, SerializeError::InvalidFormat(ref f) if f == "bogus-format"));
    assert!(!out.exists());
}
