//! Pure grading of a set of answers against a question bank.
//!
//! Grading has no side effects other than a `tracing` warning for questions
//! whose answer key is broken, so a finished session can be replayed in tests
//! without a live session.

use std::collections::HashMap;

use crate::model::{Answer, Question, QuestionError, QuestionId, Score};

/// Full grading result, including questions that could not be graded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grading {
    pub score: Score,
    /// Questions left out of both counts because their answer key names a
    /// label that is not among the choices (or is empty).
    pub skipped: Vec<QuestionError>,
}

/// Returns true if `selected` names exactly the labels of the question's answer.
///
/// An unanswered question is never correct.
#[must_use]
pub fn is_correct(question: &Question, selected: Option<&Answer>) -> bool {
    selected.is_some_and(|answer| question.answer.matches(answer))
}

/// Grade `answers` against `questions`.
///
/// Questions with a broken answer key are reported in `Grading::skipped` and
/// excluded from both the correct and the total count. The result does not
/// depend on question order.
#[must_use]
pub fn grade(questions: &[Question], answers: &HashMap<QuestionId, Answer>) -> Grading {
    let mut correct = 0_u32;
    let mut total = 0_u32;
    let mut skipped = Vec::new();

    for question in questions {
        if let Err(err) = question.validate_answer_key() {
            skipped.push(err);
            continue;
        }
        total = total.saturating_add(1);
        if is_correct(question, answers.get(&question.id)) {
            correct = correct.saturating_add(1);
        }
    }

    Grading {
        score: Score::from_counts(correct, total),
        skipped,
    }
}

/// Grade and log integrity problems, returning only the score.
#[must_use]
pub fn score(questions: &[Question], answers: &HashMap<QuestionId, Answer>) -> Score {
    let grading = grade(questions, answers);
    for err in &grading.skipped {
        tracing::warn!(error = %err, "question skipped while scoring");
    }
    grading.score
}
