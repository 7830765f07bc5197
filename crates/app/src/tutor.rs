//! Terminal front end for a tutoring session.

use std::io::Write;
use std::path::Path;

use services::{AnswerOutcome, SessionError, SessionSnapshot, TutorController};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tutor_core::model::{ImageRef, SessionSummary, StepOutcome};

/// One line of user input during a session.
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Answer(&'a str),
    Image(&'a str),
    Hint,
    Quit,
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        match trimmed {
            ":q" | ":quit" => Input::Quit,
            ":hint" => Input::Hint,
            _ => match trimmed.strip_prefix(":image") {
                Some(rest) => Input::Image(rest.trim()),
                None => Input::Answer(trimmed),
            },
        }
    }
}

/// Read one line, printing `prompt` first. `None` on end of input.
pub async fn read_line<R>(
    lines: &mut tokio::io::Lines<R>,
    prompt: &str,
) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    print!("{prompt}");
    std::io::stdout().flush()?;
    lines.next_line().await
}

/// Drive `session` from `lines` until it completes, the user quits, or input ends.
///
/// # Errors
///
/// Returns I/O errors from the terminal. Session errors are shown and the
/// loop continues, except `InvalidStepData` which abandons the session.
pub async fn run_session<R>(
    session: &TutorController,
    lines: &mut tokio::io::Lines<R>,
) -> Result<Option<SessionSummary>, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let first = session.snapshot();
    println!("Problem: {}", first.problem);
    let mut shown_index = None;

    loop {
        let snapshot = session.snapshot();
        let Some(step) = snapshot.current_step() else {
            break;
        };
        if shown_index != Some(snapshot.current_index) {
            println!();
            println!(
                "Step {} of {}: {}",
                snapshot.current_index + 1,
                snapshot.total_steps(),
                step.instruction()
            );
            shown_index = Some(snapshot.current_index);
        }

        let Some(line) = read_line(lines, "> ").await? else {
            return Ok(None);
        };

        let result = match Input::parse(&line) {
            Input::Quit => return Ok(None),
            Input::Hint => {
                show_hint(session);
                continue;
            }
            Input::Image(raw) => match ImageRef::from_file(Path::new(raw)) {
                Ok(image) => session.submit_answer(None, Some(image)).await,
                Err(err) => Err(SessionError::Validation(err)),
            },
            Input::Answer(text) => session.submit_answer(Some(text), None).await,
        };

        match result {
            Ok(outcome) => print_outcome(&outcome, &snapshot),
            Err(err @ SessionError::InvalidStepData(_)) => {
                println!("This step cannot be attempted ({err}). Please start a new problem.");
                return Ok(None);
            }
            Err(SessionError::Validation(_)) => println!("Please enter your answer."),
            Err(err) => println!("Error: {err}"),
        }
    }

    let summary = session.summary()?;
    println!();
    println!("Congratulations! You have completed all steps.");
    println!(
        "{} of {} steps solved, {} answers checked.",
        summary.passed(),
        summary.total_steps(),
        summary.total_attempts()
    );
    Ok(Some(summary))
}

fn show_hint(session: &TutorController) {
    if !session.toggle_hint() {
        println!("(hint hidden)");
        return;
    }
    let snapshot = session.snapshot();
    match snapshot.current_step().and_then(|step| step.hint()) {
        Some(hint) => println!("Hint: {hint}"),
        None => println!("No hint is available for this step."),
    }
}

fn print_outcome(outcome: &AnswerOutcome, before: &SessionSnapshot) {
    match outcome {
        AnswerOutcome::Retry {
            attempts_remaining,
            explanation,
        } => {
            println!("Incorrect.");
            if let Some(explanation) = explanation {
                println!("{explanation}");
            }
            println!("{attempts_remaining} attempt(s) left.");
        }
        AnswerOutcome::Advanced { outcome, .. } | AnswerOutcome::Completed { outcome } => {
            print_record(outcome, before);
        }
    }
}

fn print_record(record: &StepOutcome, before: &SessionSnapshot) {
    if record.passed {
        println!("Correct!");
        if let Some(explanation) = &record.explanation {
            println!("{explanation}");
        }
        return;
    }

    println!("Out of attempts ({} of {}).", record.attempts, before.max_attempts);
    if let Some(answer) = &record.disclosed_answer {
        println!("The correct answer was: {answer}");
    }
    if let Some(explanation) = &record.explanation {
        println!("Explanation: {explanation}");
    }
}
