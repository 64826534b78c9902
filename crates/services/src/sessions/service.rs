use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use quiz_core::Clock;
use quiz_core::model::{Answer, Question, QuestionId, Score};
use quiz_core::scoring;
use tracing::info;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── POLICY & STATUS ───────────────────────────────────────────────────────────
//

/// Navigation rules fixed at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvancePolicy {
    /// When set, `advance` is rejected until the current question has an answer.
    pub require_answer_to_advance: bool,
}

impl AdvancePolicy {
    /// Every question must be answered before moving on.
    #[must_use]
    pub fn guided() -> Self {
        Self {
            require_answer_to_advance: true,
        }
    }

    /// Questions may be skipped; unanswered ones count as wrong.
    #[must_use]
    pub fn free() -> Self {
        Self {
            require_answer_to_advance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// The user advanced past the last question.
    Finished,
    /// The countdown reached zero.
    TimeExpired,
}

/// Result of a transition that may end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Continue,
    Completed(Score),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt at the quiz.
///
/// Holds a snapshot of the question bank taken at start, the answers given so
/// far and the countdown. `InProgress` until the user advances past the last
/// question or the countdown runs out; `Completed` is terminal and every
/// mutating call after that returns `SessionError::Completed`.
#[derive(Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<QuestionId, Answer>,
    timer_seconds: u32,
    remaining_seconds: u32,
    policy: AdvancePolicy,
    clock: Clock,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    completion: Option<CompletionReason>,
    final_score: Option<Score>,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty, or
    /// `SessionError::InvalidTimer` for a zero countdown.
    pub fn new(
        questions: Vec<Question>,
        timer_seconds: u32,
        policy: AdvancePolicy,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        if timer_seconds == 0 {
            return Err(SessionError::InvalidTimer);
        }

        Ok(Self {
            questions,
            current: 0,
            answers: HashMap::new(),
            timer_seconds,
            remaining_seconds: timer_seconds,
            policy,
            clock,
            started_at: clock.now(),
            completed_at: None,
            completion: None,
            final_score: None,
        })
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        if self.completion.is_some() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    #[must_use]
    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.completion
    }

    #[must_use]
    pub fn policy(&self) -> AdvancePolicy {
        self.policy
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, Answer> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, id: QuestionId) -> Option<&Answer> {
        self.answers.get(&id)
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    #[must_use]
    pub fn current_answer(&self) -> Option<&Answer> {
        self.answer_for(self.current_question().id)
    }

    #[must_use]
    pub fn is_answer_selected(&self) -> bool {
        self.current_answer().is_some()
    }

    #[must_use]
    pub fn is_first_question(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.questions.len()
    }

    #[must_use]
    pub fn timer_seconds(&self) -> u32 {
        self.timer_seconds
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            position: self.current + 1,
            total: self.questions.len(),
            answered: self.answers.len(),
            remaining_seconds: self.remaining_seconds,
            is_complete: self.is_complete(),
        }
    }

    /// Record the answer for the current question, replacing any earlier one.
    ///
    /// An empty answer clears the selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion, or
    /// `SessionError::UnknownLabel` if a label is not a choice of the current
    /// question.
    pub fn record_answer(&mut self, answer: Answer) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        let question = self.current_question();
        let id = question.id;

        if let Some(label) = answer
            .labels()
            .into_iter()
            .find(|label| !question.has_choice(label))
        {
            return Err(SessionError::UnknownLabel {
                id,
                label: label.to_string(),
            });
        }

        if answer.is_empty() {
            self.answers.remove(&id);
        } else {
            self.answers.insert(id, answer);
        }
        Ok(())
    }

    /// Move to the next question, or complete the session from the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion, or
    /// `SessionError::AnswerRequired` when the policy demands an answer first.
    pub fn advance(&mut self) -> Result<SessionStep, SessionError> {
        self.ensure_in_progress()?;
        if self.policy.require_answer_to_advance && !self.is_answer_selected() {
            return Err(SessionError::AnswerRequired);
        }

        if self.is_last_question() {
            return Ok(SessionStep::Completed(
                self.complete(CompletionReason::Finished),
            ));
        }

        self.current += 1;
        Ok(SessionStep::Continue)
    }

    /// Move to the previous question. No-op on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion.
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.current = self.current.saturating_sub(1);
        Ok(())
    }

    /// Count down one second; completes the session when the timer hits zero.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after completion.
    pub fn tick(&mut self) -> Result<SessionStep, SessionError> {
        self.ensure_in_progress()?;
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            return Ok(SessionStep::Completed(
                self.complete(CompletionReason::TimeExpired),
            ));
        }
        Ok(SessionStep::Continue)
    }

    /// The score fixed at completion, or a provisional score while running.
    #[must_use]
    pub fn score(&self) -> Score {
        self.final_score
            .unwrap_or_else(|| scoring::grade(&self.questions, &self.answers).score)
    }

    fn complete(&mut self, reason: CompletionReason) -> Score {
        let score = scoring::score(&self.questions, &self.answers);
        self.final_score = Some(score);
        self.completion = Some(reason);
        self.completed_at = Some(self.clock.now());
        info!(
            ?reason,
            percentage = score.percentage,
            correct = score.correct_count,
            total = score.total_count,
            "quiz session completed"
        );
        score
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        Ok(())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("remaining_seconds", &self.remaining_seconds)
            .field("policy", &self.policy)
            .field("completion", &self.completion)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
