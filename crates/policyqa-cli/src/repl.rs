use std::io::{BufRead, Write};

use policyqa_core::{AnswerSession, CompletionService, Input};

use crate::output::{self, ColorMode};

const PROMPT: &str = "Enter your question (or type 'exit' or 'bye' to quit): ";
const FAREWELL: &str = "Exiting HR Policy Assistant.";

/// Read questions from `input` until `exit`, `bye` or end of input, answering
/// each one in turn. A failed question is reported and the loop continues.
pub async fn run<S, R, W>(
    session: &mut AnswerSession<S>,
    mut input: R,
    out: &mut W,
    color: ColorMode,
) -> anyhow::Result<()>
where
    S: CompletionService,
    R: BufRead,
    W: Write,
{
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        match Input::classify(&line) {
            Input::Exit => break,
            Input::Empty => continue,
            Input::Question(question) => match session.process(&question).await {
                Ok(turn) => output::print_turn(out, &turn, color)?,
                Err(e) => {
                    tracing::debug!(error = ?e, "question failed");
                    output::print_error(out, &e, color)?;
                }
            },
        }
    }

    session.terminate();
    writeln!(out, "{}", FAREWELL)?;
    Ok(())
}
