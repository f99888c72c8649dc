use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use policyqa_core::ExtractionResult;
use policyqa_core::parse::display_field;
use policyqa_core::{SessionError, Turn};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the per-page word counts after a PDF has been extracted and saved.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    result: &ExtractionResult,
    saved_to: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Processed {} pages", result.total_pages)?;
    for page in &result.pages {
        match &page.error {
            Some(error) => {
                if color.enabled() {
                    writeln!(
                        w,
                        "Page {}: {} words {}",
                        page.page_number,
                        page.word_count,
                        format!("(failed: {})", error).red()
                    )?;
                } else {
                    writeln!(
                        w,
                        "Page {}: {} words (failed: {})",
                        page.page_number, page.word_count, error
                    )?;
                }
            }
            None => writeln!(w, "Page {}: {} words", page.page_number, page.word_count)?,
        }
    }

    let msg = format!(
        "Saved {} ({} method) to {}",
        result.source_file,
        result.extraction_method,
        saved_to.display()
    );
    if color.enabled() {
        writeln!(w, "{}", msg.dimmed())?;
    } else {
        writeln!(w, "{}", msg)?;
    }
    Ok(())
}

/// Print the parsed answer followed by its self-evaluation.
pub fn print_turn(w: &mut dyn Write, turn: &Turn, color: ColorMode) -> std::io::Result<()> {
    print_header(w, "===== Output =====", color)?;
    writeln!(w, "Answer: {}", turn.answer.answer)?;
    writeln!(w, "Page Number: {}", display_field(&turn.answer.page_number))?;
    writeln!(w, "Reasoning: {}", display_field(&turn.answer.reasoning))?;
    writeln!(w, "Data Source: {}", display_field(&turn.answer.data_source))?;

    print_header(w, "===== Evaluation Output =====", color)?;
    let is_correct = display_field(&turn.evaluation.is_correct);
    match (color.enabled(), turn.evaluation.verdict()) {
        (true, Some(true)) => writeln!(w, "Is Correct: {}", is_correct.green())?,
        (true, Some(false)) => writeln!(w, "Is Correct: {}", is_correct.red())?,
        _ => writeln!(w, "Is Correct: {}", is_correct)?,
    }
    let score = display_field(&turn.evaluation.score);
    match (color.enabled(), turn.evaluation.score_value()) {
        (true, Some(v)) if v >= 7.0 => writeln!(w, "Score: {}", score.green())?,
        (true, Some(v)) if v <= 4.0 => writeln!(w, "Score: {}", score.red())?,
        _ => writeln!(w, "Score: {}", score)?,
    }
    writeln!(w, "Reasoning: {}", display_field(&turn.evaluation.reasoning))?;
    Ok(())
}

/// Report a question that could not be answered. The session carries on.
pub fn print_error(w: &mut dyn Write, err: &SessionError, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}", "Error:".red().bold(), err)?;
    } else {
        writeln!(w, "Error: {}", err)?;
    }

    if err.is_upstream() {
        let hint = "The model service did not respond; you can ask the question again.";
        if color.enabled() {
            writeln!(w, "{}", hint.dimmed())?;
        } else {
            writeln!(w, "{}", hint)?;
        }
    }
    Ok(())
}

fn print_header(w: &mut dyn Write, header: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", header.bold())
    } else {
        writeln!(w, "{}", header)
    }
}
