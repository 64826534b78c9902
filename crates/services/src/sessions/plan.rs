use rand::rng;
use rand::seq::SliceRandom;

use quiz_core::Clock;
use quiz_core::model::{DEFAULT_TIMER_SECONDS, Question};

use super::service::{AdvancePolicy, QuizSession};
use crate::error::SessionError;

/// Builds a `QuizSession` from a question bank snapshot.
#[derive(Debug, Clone, Copy)]
pub struct SessionBuilder {
    timer_seconds: u32,
    policy: AdvancePolicy,
    shuffle: bool,
    clock: Clock,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            timer_seconds: DEFAULT_TIMER_SECONDS,
            policy: AdvancePolicy::default(),
            shuffle: false,
            clock: Clock::default(),
        }
    }
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timer_seconds(mut self, timer_seconds: u32) -> Self {
        self.timer_seconds = timer_seconds;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: AdvancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Present questions in random order instead of stored order.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// # Errors
    ///
    /// Returns `SessionError::Empty` for an empty bank or
    /// `SessionError::InvalidTimer` for a zero timer.
    pub fn build(
        self,
        questions: impl IntoIterator<Item = Question>,
    ) -> Result<QuizSession, SessionError> {
        let mut questions: Vec<Question> = questions.into_iter().collect();
        if self.shuffle {
            questions.as_mut_slice().shuffle(&mut rng());
        }
        QuizSession::new(questions, self.timer_seconds, self.policy, self.clock)
    }
}
