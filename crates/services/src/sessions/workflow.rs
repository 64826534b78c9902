use tracing::{info, warn};

use quiz_core::model::QuizOutcome;

use super::plan::SessionBuilder;
use super::service::{AdvancePolicy, QuizSession};
use crate::Clock;
use crate::error::{QuizLoopError, SessionError};
use crate::question_store::QuestionStore;

/// Orchestrates session start and the persisted end of a session.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    store: QuestionStore,
    shuffle: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, store: QuestionStore) -> Self {
        Self {
            clock,
            store,
            shuffle: false,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    /// Start a session over the current question bank and timer.
    ///
    /// Later edits to the bank do not affect the returned session.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoopError::Session` if the bank is empty.
    pub async fn start_session(&self, policy: AdvancePolicy) -> Result<QuizSession, QuizLoopError> {
        let questions = self.store.load_questions().await;
        let timer_seconds = self.store.load_timer_seconds().await;

        let session = SessionBuilder::new()
            .with_clock(self.clock)
            .with_policy(policy)
            .with_shuffle(self.shuffle)
            .with_timer_seconds(timer_seconds)
            .build(questions)?;

        info!(
            questions = session.questions().len(),
            timer_seconds,
            require_answer = policy.require_answer_to_advance,
            "quiz session started"
        );
        Ok(session)
    }

    /// Persist the result of a completed session and report it.
    ///
    /// Safe to call again after a failed write; the high score only moves up.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` for a running session, or
    /// `QuizLoopError::Store` if the high score cannot be written.
    pub async fn finish(&self, session: &QuizSession) -> Result<QuizOutcome, QuizLoopError> {
        if !session.is_complete() {
            return Err(SessionError::InProgress.into());
        }

        let score = session.score();
        let previous_highest = self.store.load_highest_score().await;
        self.store
            .save_highest_score_if_greater(score.percentage)
            .await
            .inspect_err(|err| warn!(error = %err, "failed to persist highest score"))?;

        let outcome = QuizOutcome::new(score, previous_highest);
        info!(
            percentage = score.percentage,
            previous_highest,
            new_record = outcome.is_new_record,
            "quiz session finished"
        );
        Ok(outcome)
    }
}
