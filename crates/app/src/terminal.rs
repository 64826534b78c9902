//! Line-oriented terminal driver for one quiz session.

use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

use quiz_core::model::{Answer, ChoiceLabel, Question, QuizOutcome};
use quiz_core::time::format_countdown;
use services::{
    AdvancePolicy, CompletionReason, Countdown, IntervalTicker, QuizLoopService, QuizSession,
    SessionError, SessionStep, SharedSession,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

/// Stdin split into lines, shared by every prompt of one run.
pub type InputLines = Lines<BufReader<Stdin>>;

#[must_use]
pub fn stdin_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Select(Vec<String>),
    Next,
    Previous,
    Quit,
}

impl Input {
    /// Interpret a line typed while `question` is on screen.
    ///
    /// A line made only of the question's own labels is always a selection,
    /// so a choice labelled `N`, `P` or `Q` stays answerable.
    pub fn parse(line: &str, question: &Question) -> Self {
        let tokens: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();
        let is_label = |token: &&str| {
            question
                .labels()
                .any(|label| label.as_str().eq_ignore_ascii_case(token))
        };
        if !tokens.is_empty() && tokens.iter().all(is_label) {
            return Self::Select(tokens.into_iter().map(str::to_string).collect());
        }

        match line.trim().to_ascii_lowercase().as_str() {
            "" | "n" | "next" => Self::Next,
            "p" | "prev" | "back" => Self::Previous,
            "q" | "quit" => Self::Quit,
            _ => Self::Select(tokens.into_iter().map(str::to_string).collect()),
        }
    }
}

/// Map raw labels onto the question's labels, ignoring ASCII case.
///
/// Unmatched labels are kept verbatim so the session can reject them.
pub fn resolve_answer(question: &Question, raw: &[String]) -> Answer {
    let labels: Vec<ChoiceLabel> = raw
        .iter()
        .map(|input| {
            question
                .labels()
                .find(|label| label.as_str().eq_ignore_ascii_case(input))
                .cloned()
                .unwrap_or_else(|| ChoiceLabel::new(input.as_str()))
        })
        .collect();

    match <[ChoiceLabel; 1]>::try_from(labels) {
        Ok([label]) => Answer::single(label),
        Err(labels) => Answer::multiple(labels),
    }
}

/// Run a session until it completes, then persist and return the outcome.
///
/// Returns `Ok(None)` when the user quits or input ends first.
///
/// # Errors
///
/// Returns an error if stdin fails, the session lock is poisoned, or the
/// result cannot be persisted.
pub async fn play(
    quiz_loop: &QuizLoopService,
    policy: AdvancePolicy,
    lines: &mut InputLines,
) -> Result<Option<QuizOutcome>, Box<dyn Error>> {
    let session = quiz_loop.start_session(policy).await?;
    let timer_seconds = session.timer_seconds();
    let shared: SharedSession = Arc::new(Mutex::new(session));
    let mut countdown = Countdown::spawn(Arc::clone(&shared), IntervalTicker::every_second())?;

    print_help(policy, timer_seconds);
    render(&shared)?;

    loop {
        tokio::select! {
            completed = countdown.completed() => {
                if !completed {
                    return Err("countdown stopped unexpectedly".into());
                }
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed, abandoning session");
                    countdown.cancel();
                    return Ok(None);
                };
                match apply(&shared, &line)? {
                    Flow::Continue => render(&shared)?,
                    Flow::Completed => break,
                    Flow::Quit => {
                        countdown.cancel();
                        return Ok(None);
                    }
                }
            }
        }
    }

    countdown.cancel();
    let snapshot = lock(&shared)?.clone();
    if snapshot.completion_reason() == Some(CompletionReason::TimeExpired) {
        println!("\nTime's up!");
    }
    let outcome = quiz_loop.finish(&snapshot).await?;
    Ok(Some(outcome))
}

/// Ask a yes/no question; anything but `y`/`yes` (or closed input) is no.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn confirm(prompt: &str, lines: &mut InputLines) -> Result<bool, Box<dyn Error>> {
    println!("{prompt} [y/N]");
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub fn print_outcome(outcome: &QuizOutcome) {
    let score = outcome.score;
    println!();
    println!("Score: {}%", score.percentage);
    println!("Correct: {} / {}", score.correct_count, score.total_count);
    println!("{}", score.tier().message());
    if outcome.is_new_record {
        println!("New record!");
    } else {
        println!("Best: {}%", outcome.highest_score());
    }
}

enum Flow {
    Continue,
    Completed,
    Quit,
}

fn apply(shared: &SharedSession, line: &str) -> Result<Flow, SessionError> {
    let mut session = lock(shared)?;
    let input = Input::parse(line, session.current_question());
    let result = match input {
        Input::Quit => return Ok(Flow::Quit),
        Input::Previous => session.retreat().map(|()| SessionStep::Continue),
        Input::Next => session.advance(),
        Input::Select(raw) => {
            let answer = resolve_answer(session.current_question(), &raw);
            session.record_answer(answer).map(|()| SessionStep::Continue)
        }
    };

    match result {
        Ok(SessionStep::Continue) => Ok(Flow::Continue),
        Ok(SessionStep::Completed(_)) | Err(SessionError::Completed) => Ok(Flow::Completed),
        Err(SessionError::Poisoned) => Err(SessionError::Poisoned),
        Err(err) => {
            println!("! {err}");
            Ok(Flow::Continue)
        }
    }
}

fn render(shared: &SharedSession) -> Result<(), SessionError> {
    let session = lock(shared)?;
    let progress = session.progress();
    let question = session.current_question();
    let selected = session.current_answer();

    println!();
    println!(
        "{}  [{}]",
        progress.position_label(),
        progress.countdown_label()
    );
    println!("{}", question.prompt);
    for (label, text) in &question.choices {
        let marker = if selected.is_some_and(|answer| answer.contains(label)) {
            '*'
        } else {
            ' '
        };
        println!(" {marker} {label}) {text}");
    }
    if question.is_multi_answer() {
        println!("(select every correct choice, e.g. A,C)");
    }
    if session.is_first_question() {
        println!("(Enter: next, quit: stop)");
    } else {
        println!("(Enter: next, prev: back, quit: stop)");
    }
    Ok(())
}

fn print_help(policy: AdvancePolicy, timer_seconds: u32) {
    println!("You have {} to finish.", format_countdown(timer_seconds));
    println!("Type a label to answer, Enter or 'n' for next, 'p' for previous, 'q' to quit.");
    println!("When a choice is labelled n, p or q, use next, prev or quit instead.");
    if policy.require_answer_to_advance {
        println!("Every question needs an answer before moving on.");
    }
}

fn lock(shared: &SharedSession) -> Result<MutexGuard<'_, QuizSession>, SessionError> {
    shared.lock().map_err(|_| SessionError::Poisoned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::defaults::default_questions;
    use quiz_core::model::{QuestionDraft, QuestionId};
    use quiz_core::time::fixed_clock;

    fn question_labelled(labels: &[&str]) -> Question {
        let mut draft = QuestionDraft::default();
        draft.prompt = "Pick one".into();
        draft.choices = labels
            .iter()
            .map(|label| (ChoiceLabel::new(*label), format!("option {label}")))
            .collect();
        draft.answer = Some(Answer::single(labels[0]));
        draft.assign_id(QuestionId::new(1)).unwrap()
    }

    #[test]
    fn parse_navigation_words() {
        let question = question_labelled(&["A", "B", "C", "D"]);
        assert_eq!(Input::parse("", &question), Input::Next);
        assert_eq!(Input::parse(" N ", &question), Input::Next);
        assert_eq!(Input::parse("prev", &question), Input::Previous);
        assert_eq!(Input::parse("Q", &question), Input::Quit);
    }

    #[test]
    fn parse_label_lists() {
        let question = question_labelled(&["A", "B", "C", "D"]);
        assert_eq!(Input::parse("b", &question), Input::Select(vec!["b".into()]));
        assert_eq!(
            Input::parse("a, c", &question),
            Input::Select(vec!["a".into(), "c".into()])
        );
    }

    #[test]
    fn labels_named_like_commands_are_selectable() {
        let question = question_labelled(&["N", "P", "Q"]);
        assert_eq!(Input::parse("n", &question), Input::Select(vec!["n".into()]));
        assert_eq!(Input::parse("P", &question), Input::Select(vec!["P".into()]));
        assert_eq!(
            Input::parse("q,n", &question),
            Input::Select(vec!["q".into(), "n".into()])
        );
        assert_eq!(Input::parse("next", &question), Input::Next);
        assert_eq!(Input::parse("prev", &question), Input::Previous);
        assert_eq!(Input::parse("quit", &question), Input::Quit);
        assert_eq!(Input::parse("", &question), Input::Next);
    }

    #[test]
    fn typed_q_answers_instead_of_quitting() {
        let mut draft = QuestionDraft::default();
        draft.prompt = "Which letter follows P?".into();
        draft.choices = [("P", "P"), ("Q", "Q")]
            .into_iter()
            .map(|(label, text)| (ChoiceLabel::new(label), text.to_string()))
            .collect();
        draft.answer = Some(Answer::single("Q"));
        let question = draft.assign_id(QuestionId::new(1)).unwrap();
        let session = QuizSession::new(vec![question], 60, AdvancePolicy::guided(), fixed_clock())
            .unwrap();
        let shared: SharedSession = Arc::new(Mutex::new(session));

        assert!(matches!(apply(&shared, "q").unwrap(), Flow::Continue));
        assert_eq!(
            shared.lock().unwrap().current_answer(),
            Some(&Answer::single("Q"))
        );
        assert!(matches!(apply(&shared, "next").unwrap(), Flow::Completed));
    }

    #[test]
    fn resolve_answer_matches_labels_case_insensitively() {
        let questions = default_questions();
        let question = &questions[0];
        assert_eq!(resolve_answer(question, &["b".into()]), Answer::single("B"));
        assert_eq!(
            resolve_answer(question, &["c".into(), "a".into()]),
            Answer::multiple(["A", "C"])
        );
        assert_eq!(resolve_answer(question, &["z".into()]), Answer::single("z"));
    }
}
