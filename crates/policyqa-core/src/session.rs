//! Question answering over one document.
//!
//! Every question is answered on its own against the full document text; no
//! conversation history is kept between turns.

use std::path::Path;

use thiserror::Error;

use crate::llm::{CompletionService, LlmError};
use crate::parse::{self, EvaluationResult, ParseError, StructuredAnswer};
use crate::prompts;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
    #[error("could not parse model response: {0}")]
    Parse(#[from] ParseError),
    #[error("failed to read document {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Whether the failure came from the completion service rather than
    /// from the response content.
    pub fn is_upstream(&self) -> bool {
        matches!(self, SessionError::Llm(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for a question.
    Idle,
    /// A question is being answered and evaluated.
    Processing,
    /// The user asked to leave; no further input is accepted.
    Terminated,
}

/// One line of user input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Exit,
    Empty,
    Question(String),
}

impl Input {
    /// `exit` and `bye` (any case, surrounding whitespace ignored) end the session.
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("bye") {
            Input::Exit
        } else if trimmed.is_empty() {
            Input::Empty
        } else {
            Input::Question(trimmed.to_string())
        }
    }
}

/// A completed question: the parsed answer and its evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: StructuredAnswer,
    pub evaluation: EvaluationResult,
}

pub struct AnswerSession<S> {
    document_text: String,
    service: S,
    state: SessionState,
}

impl<S: CompletionService> AnswerSession<S> {
    pub fn new(document_text: impl Into<String>, service: S) -> Self {
        Self {
            document_text: document_text.into(),
            service,
            state: SessionState::Idle,
        }
    }

    /// Start a session over the flattened text file at `path`.
    pub fn from_file(path: &Path, service: S) -> Result<Self, SessionError> {
        let document_text =
            std::fs::read_to_string(path).map_err(|source| SessionError::Document {
                path: path.display().to_string(),
                source,
            })?;
        tracing::info!(
            path = %path.display(),
            chars = document_text.chars().count(),
            "loaded document"
        );
        Ok(Self::new(document_text, service))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document_text(&self) -> &str {
        &self.document_text
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Ask the model to answer `question` from the document.
    pub async fn ask(&self, question: &str) -> Result<StructuredAnswer, SessionError> {
        let prompt = prompts::answer_prompt(&self.document_text, question);
        let raw = self.service.complete(&prompt).await?;
        match parse::parse_answer(&raw) {
            Ok(answer) => Ok(answer),
            Err(e) => {
                tracing::warn!(service = self.service.name(), response = %raw, "answer response missing required field");
                Err(e.into())
            }
        }
    }

    /// Ask the model to grade `rendered_answer`. An evaluation with no
    /// recognizable fields is still `Ok`.
    pub async fn evaluate(
        &self,
        question: &str,
        rendered_answer: &str,
    ) -> Result<EvaluationResult, SessionError> {
        let prompt = prompts::evaluation_prompt(&self.document_text, question, rendered_answer);
        let raw = self.service.complete(&prompt).await?;
        let evaluation = parse::parse_evaluation(&raw);
        if evaluation.is_empty() {
            tracing::warn!(service = self.service.name(), "evaluation response had no recognizable fields");
        }
        Ok(evaluation)
    }

    /// Answer then evaluate one question. The session is back to
    /// [`SessionState::Idle`] afterwards, whether or not it succeeded.
    pub async fn process(&mut self, question: &str) -> Result<Turn, SessionError> {
        self.state = SessionState::Processing;
        let result = self.answer_and_evaluate(question).await;
        self.state = SessionState::Idle;
        result
    }

    async fn answer_and_evaluate(&self, question: &str) -> Result<Turn, SessionError> {
        let answer = self.ask(question).await?;
        let evaluation = self.evaluate(question, &answer.render()).await?;
        Ok(Turn {
            question: question.to_string(),
            answer,
            evaluation,
        })
    }

    /// Move to [`SessionState::Terminated`].
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }
}
