//! Label-anchored field parsing of free-text model responses.
//!
//! A response is expected to contain lines such as `answer: ...` and
//! `page_number: ...`. Each field ends where the *next* label of its schema
//! starts on a new line, so a value may span several lines of prose. The
//! last field of a schema ends at the first line break. A label followed
//! directly by the terminator has an empty value.
//!
//! A label word that appears at the start of a line inside a value will cut
//! that value short. That is a known limitation of the response format.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("response has no usable 'answer' field")]
    MissingAnswer,
}

/// Where a field's value stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEnd {
    /// At a line break followed (after optional whitespace) by this label.
    NextLabel(&'static str),
    /// At the first line break.
    LineEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub end: FieldEnd,
}

pub const ANSWER_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        label: "answer",
        end: FieldEnd::NextLabel("page_number"),
    },
    FieldSpec {
        label: "page_number",
        end: FieldEnd::NextLabel("reasoning"),
    },
    FieldSpec {
        label: "reasoning",
        end: FieldEnd::NextLabel("data_source"),
    },
    FieldSpec {
        label: "data_source",
        end: FieldEnd::LineEnd,
    },
];

pub const EVALUATION_SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        label: "is_correct",
        end: FieldEnd::NextLabel("score"),
    },
    FieldSpec {
        label: "score",
        end: FieldEnd::NextLabel("reasoning"),
    },
    FieldSpec {
        label: "reasoning",
        end: FieldEnd::LineEnd,
    },
];

/// Answer to a question, parsed from a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    /// Always non-empty.
    pub answer: String,
    pub page_number: Option<String>,
    pub reasoning: Option<String>,
    pub data_source: Option<String>,
}

impl StructuredAnswer {
    /// The four labeled lines shown to the user and handed to the evaluator.
    pub fn render(&self) -> String {
        format!(
            "Answer: {}\nPage Number: {}\nReasoning: {}\nData Source: {}",
            self.answer,
            display_field(&self.page_number),
            display_field(&self.reasoning),
            display_field(&self.data_source),
        )
    }
}

/// The model's judgement of an answer. Values are the model's own words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub is_correct: Option<String>,
    pub score: Option<String>,
    pub reasoning: Option<String>,
}

impl EvaluationResult {
    /// `is_correct` read as a boolean, if it starts with a recognizable word.
    pub fn verdict(&self) -> Option<bool> {
        let value = self.is_correct.as_deref()?.trim().to_ascii_lowercase();
        let word = value
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|w| !w.is_empty())?;
        match word {
            "true" | "yes" | "correct" => Some(true),
            "false" | "no" | "incorrect" => Some(false),
            _ => None,
        }
    }

    /// Leading number of `score` (`"8"`, `"8/10"`, `"7.5 out of 10"`).
    pub fn score_value(&self) -> Option<f64> {
        let value = self.score.as_deref()?.trim();
        let end = value
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(value.len());
        value[..end].parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.is_correct.is_none() && self.score.is_none() && self.reasoning.is_none()
    }
}

pub fn display_field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("None")
}

static ANSWER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_schema(ANSWER_SCHEMA));
static EVALUATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile_schema(EVALUATION_SCHEMA));

impl FieldSpec {
    /// Case-insensitive pattern whose first group is the raw value: everything
    /// after `label:` up to the terminator, which is not part of the value.
    pub fn pattern(&self) -> String {
        let label = regex::escape(self.label);
        match self.end {
            FieldEnd::NextLabel(next) => format!(
                r"(?is){}:(.*?)(?:\n\s*{}:|\z)",
                label,
                regex::escape(next)
            ),
            FieldEnd::LineEnd => format!(r"(?i){}:(.*?)(?:\n|\z)", label),
        }
    }
}

fn compile_schema(schema: &[FieldSpec]) -> Vec<Regex> {
    schema
        .iter()
        .map(|spec| Regex::new(&spec.pattern()).unwrap())
        .collect()
}

/// Extract every field from `text`, one pattern per field, in schema order.
///
/// Each field is located independently; a missing label yields `None`
/// without affecting the others.
fn capture_fields(patterns: &[Regex], text: &str) -> Vec<Option<String>> {
    patterns
        .iter()
        .map(|re| {
            re.captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .collect()
}

/// Parse an answer response. Fails when `answer` is missing or empty.
pub fn parse_answer(text: &str) -> Result<StructuredAnswer, ParseError> {
    let mut fields = capture_fields(&ANSWER_PATTERNS, text).into_iter();
    let mut next = || fields.next().flatten();

    let answer = next().filter(|a| !a.is_empty());
    let page_number = next();
    let reasoning = next();
    let data_source = next();

    let answer = answer.ok_or(ParseError::MissingAnswer)?;
    Ok(StructuredAnswer {
        answer,
        page_number,
        reasoning,
        data_source,
    })
}

/// Parse an evaluation response. Missing fields are left as `None`.
pub fn parse_evaluation(text: &str) -> EvaluationResult {
    let mut fields = capture_fields(&EVALUATION_PATTERNS, text).into_iter();
    let mut next = || fields.next().flatten();

    EvaluationResult {
        is_correct: next(),
        score: next(),
        reasoning: next(),
    }
}
